use chrono::{DateTime, Local};
use clap::Parser;

use crate::{
    api::{source::Source, spot_price},
    cli::{charging::ChargingArgs, tariff::TariffSourceArgs},
    core::{optimizer::Optimizer, slot},
    prelude::*,
    tables::{build_summary_table, build_timeline_table},
};

#[derive(Parser)]
pub struct PlanArgs {
    /// Spot price feed URL or path.
    #[clap(
        long = "prices",
        env = "PRICES",
        default_value = "https://api.spot-hinta.fi/TodayAndDayForward"
    )]
    pub prices: Source,

    /// Evaluation instant, defaults to the current time.
    #[clap(long = "now", env = "NOW")]
    pub now: Option<DateTime<Local>>,

    /// Print the plan as JSON instead of the tables.
    #[clap(long)]
    pub json: bool,

    #[clap(flatten)]
    pub charging: ChargingArgs,

    #[clap(flatten)]
    pub tariff: TariffSourceArgs,
}

/// Find and print the cheapest charging window.
#[instrument(skip_all)]
pub fn plan(args: &PlanArgs) -> Result {
    let now = args.now.unwrap_or_else(Local::now);
    let charging = args.charging.sanitize();
    let tariff = args.tariff.load()?;
    let points = spot_price::fetch(&args.prices)?;
    let slots = slot::normalize(&points, now);
    info!(n_slots = slots.len(), %now, "normalized the price series");

    let plan = Optimizer::builder()
        .slots(&slots)
        .charging_power(charging.power)
        .target_energy(charging.target_energy)
        .tariff(&tariff)
        .include_demand_fee(charging.include_demand_fee)
        .margin(charging.margin)
        .tax(charging.tax)
        .optimize();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    match plan {
        Some(plan) => {
            info!(
                start = %plan.interval.start,
                end = %plan.interval.end,
                total_cost = %plan.total_cost,
                "found the cheapest window",
            );
            println!("{}", build_summary_table(&plan));
            println!("{}", build_timeline_table(&plan));
        }
        None => {
            println!(
                "No charging window covers {} at {} with the known prices.",
                charging.target_energy, charging.power,
            );
        }
    }
    Ok(())
}
