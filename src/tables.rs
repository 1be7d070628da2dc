use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::source::Source,
    core::plan::Plan,
    pricing::Manifest,
    quantity::rate::{KilowattHourRate, KilowattRate},
    tariff::Tariff,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_summary_table(plan: &Plan) -> Table {
    let mut table = new_table();
    let mut add_row = |label: &str, value: String| {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Dim),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    };
    add_row("Start", plan.interval.start.format("%a %b %d %H:%M").to_string());
    add_row("End", plan.interval.end.format("%a %b %d %H:%M").to_string());
    add_row("Duration", plan.duration.to_string());
    add_row("Energy", plan.energy.to_string());
    add_row("Power", plan.charging_power.to_string());
    add_row("Energy cost", plan.energy_cost.to_string());
    add_row("Transfer cost", plan.transfer_cost.to_string());
    add_row("Tax", plan.tax_cost.to_string());
    if plan.demand_fee_enabled {
        add_row("Demand cost", plan.demand_cost.to_string());
        if let Some(peak) = &plan.peak_demand {
            add_row(
                "Peak hour",
                format!("{} {} × {}", peak.hour.format("%H:%M"), peak.average_power, peak.rate),
            );
        }
    }
    add_row("Average energy price", plan.average_energy_rate.to_string());
    add_row("Average total price", plan.average_total_rate.to_string());
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(plan.total_cost)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
    ]);
    table
}

pub fn build_timeline_table(plan: &Plan) -> Table {
    let mut table = new_table();
    let mut header = vec!["Date", "Start", "End", "Spot", "Energy rate", "Transfer", "Energy"];
    if plan.demand_fee_enabled {
        header.push("Demand");
    }
    table.set_header(header);

    let average_rate = plan.average_energy_rate;
    for entry in &plan.timeline {
        let mut row = vec![
            Cell::new(entry.interval.start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(entry.interval.start.format("%H:%M")),
            Cell::new(entry.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(entry.spot_price).set_alignment(CellAlignment::Right),
            Cell::new(entry.energy_rate).set_alignment(CellAlignment::Right).fg(
                if entry.energy_rate > average_rate { Color::Red } else { Color::Green },
            ),
            Cell::new(entry.transfer_rate).set_alignment(CellAlignment::Right),
            Cell::new(entry.energy).set_alignment(CellAlignment::Right),
        ];
        if let Some(demand) = entry.demand {
            row.push(if demand.applies {
                Cell::new(demand.rate).set_alignment(CellAlignment::Right).fg(Color::DarkYellow)
            } else {
                Cell::new("–").set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim)
            });
        }
        table.add_row(row);
    }
    table
}

pub fn build_rates_table(tariff: &Tariff, hours: &[DateTime<Local>]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Date".to_string(),
        "Hour".to_string(),
        format!("Transfer, {}", tariff.transfer.unit),
        "Tier".to_string(),
        format!("Demand, {}", tariff.demand.unit),
        "Tier".to_string(),
    ]);
    for hour in hours {
        let transfer = tariff.transfer.tier_at(*hour);
        let demand = tariff.demand.tier_at(*hour);
        table.add_row(vec![
            Cell::new(hour.format("%a %b %d")).add_attribute(Attribute::Dim),
            Cell::new(hour.format("%H:%M")),
            Cell::new(transfer.map_or(KilowattHourRate::ZERO, |tier| tier.rate))
                .set_alignment(CellAlignment::Right),
            Cell::new(transfer.map_or("–", |tier| tier.label.as_str())).add_attribute(Attribute::Dim),
            Cell::new(demand.map_or(KilowattRate::ZERO, |tier| tier.rate))
                .set_alignment(CellAlignment::Right)
                .fg(if demand.is_some() { Color::DarkYellow } else { Color::Reset }),
            Cell::new(demand.map_or("–", |tier| tier.label.as_str())).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_pricings_table(manifest: &Manifest, source: &Source) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "ID", "Name", "Configuration"]);
    for pricing in &manifest.pricings {
        let is_default = pricing.id == manifest.default_id;
        table.add_row(vec![
            Cell::new(if is_default { "★" } else { "" }).fg(Color::Yellow),
            Cell::new(&pricing.id).add_attribute(if is_default {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }),
            Cell::new(&pricing.name),
            Cell::new(
                pricing
                    .config_source(source)
                    .map_or_else(|_| pricing.config_path.clone(), |source| source.to_string()),
            )
            .add_attribute(Attribute::Dim),
        ]);
    }
    table
}
