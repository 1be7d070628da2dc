use bon::Builder;

use crate::{
    core::{
        demand::PeakDemand,
        interval::Interval,
        plan::{DemandRate, Plan, TimelineEntry},
        slot::Slot,
    },
    prelude::*,
    quantity::{
        cost::Cost,
        energy::KilowattHours,
        power::Kilowatts,
        rate::{KilowattHourRate, KilowattRate},
        time::Hours,
    },
    tariff::Tariff,
};

/// Exhaustive search of the cheapest contiguous charging window.
#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct Optimizer<'a> {
    slots: &'a [Slot],
    charging_power: Kilowatts,
    target_energy: KilowattHours,
    tariff: &'a Tariff,

    #[builder(default)]
    include_demand_fee: bool,

    /// Electricity retailer margin on top of the spot price.
    #[builder(default)]
    margin: KilowattHourRate,

    /// Electricity tax, charged once per kilowatt-hour regardless of timing.
    #[builder(default)]
    tax: KilowattHourRate,
}

impl<S: optimizer_builder::IsComplete> OptimizerBuilder<'_, S> {
    pub fn optimize(self) -> Option<Plan> {
        self.build().optimize()
    }
}

impl Optimizer<'_> {
    /// Try every slot as the session start and pick the cheapest feasible plan.
    ///
    /// On equal total costs, the earliest start wins.
    #[instrument(
        skip_all,
        fields(n_slots = self.slots.len(), power = %self.charging_power, energy = %self.target_energy),
    )]
    fn optimize(self) -> Option<Plan> {
        if !(self.charging_power.is_finite() && self.charging_power > Kilowatts::ZERO) {
            warn!(charging_power = ?self.charging_power, "the charging power must be positive");
            return None;
        }
        if !(self.target_energy.is_finite() && self.target_energy > KilowattHours::TOLERANCE) {
            warn!(target_energy = ?self.target_energy, "the target energy must be positive");
            return None;
        }

        let mut best: Option<Plan> = None;
        for start_index in 0..self.slots.len() {
            let Some(plan) = self.simulate(start_index) else {
                trace!(start_index, "cannot meet the target energy, stopping");
                // Later starts see even fewer slots:
                break;
            };
            trace!(start_index, total_cost = ?plan.total_cost, "simulated");
            if best.as_ref().is_none_or(|best| plan.total_cost < best.total_cost) {
                best = Some(plan);
            }
        }

        match &best {
            Some(plan) => {
                debug!(start = ?plan.interval.start, total_cost = ?plan.total_cost, "optimized");
            }
            None => {
                debug!("no feasible plan");
            }
        }
        best
    }

    /// Charge from the slot at `start_index` forward until the target energy is met.
    ///
    /// # Returns
    ///
    /// [`None`], if the slots run out before the target energy is met.
    fn simulate(&self, start_index: usize) -> Option<Plan> {
        let mut remaining_energy = self.target_energy;
        let mut duration = Hours::ZERO;
        let mut timeline = Vec::new();

        for slot in &self.slots[start_index..] {
            if remaining_energy <= KilowattHours::TOLERANCE {
                break;
            }
            let hours = slot.duration().min(remaining_energy / self.charging_power);
            if hours <= Hours::ZERO {
                continue;
            }
            let energy = self.charging_power * hours;
            let demand = self.include_demand_fee.then(|| {
                let rate = self.tariff.demand.rate_at(slot.interval.start);
                DemandRate { rate, applies: rate > KilowattRate::ZERO }
            });
            timeline.push(TimelineEntry {
                interval: Interval::starting_at(slot.interval.start, hours),
                duration: hours,
                energy,
                spot_price: slot.spot_price,
                energy_rate: slot.spot_price + self.margin,
                transfer_rate: self.tariff.transfer.rate_at(slot.interval.start),
                demand,
            });
            duration += hours;
            remaining_energy -= energy;
        }

        if remaining_energy > KilowattHours::TOLERANCE {
            return None;
        }
        let (first, last) = (timeline.first()?, timeline.last()?);
        let interval = Interval::new(first.interval.start, last.interval.end);

        let energy_cost: Cost = timeline.iter().map(TimelineEntry::energy_cost).sum();
        let transfer_cost: Cost = timeline.iter().map(TimelineEntry::transfer_cost).sum();
        let tax_cost = self.target_energy * self.tax;
        let peak_demand = if self.include_demand_fee {
            PeakDemand::estimate(
                timeline.iter().map(|entry| (entry.interval.start, entry.duration)),
                self.charging_power,
                &self.tariff.demand,
            )
        } else {
            None
        };
        let demand_cost = peak_demand.as_ref().map_or(Cost::ZERO, PeakDemand::cost);

        let total_cost = energy_cost + transfer_cost + tax_cost + demand_cost;
        Some(Plan {
            interval,
            duration,
            energy: self.target_energy,
            charging_power: self.charging_power,
            margin: self.margin,
            tax: self.tax,
            energy_cost,
            transfer_cost,
            tax_cost,
            demand_cost,
            total_cost,
            average_energy_rate: energy_cost / self.target_energy,
            average_total_rate: total_cost / self.target_energy,
            demand_fee_enabled: self.include_demand_fee,
            peak_demand,
            timeline,
        })
    }
}
