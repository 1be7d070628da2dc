use serde::Serialize;

use crate::{
    core::{demand::PeakDemand, interval::Interval},
    quantity::{
        cost::Cost,
        energy::KilowattHours,
        power::Kilowatts,
        rate::{KilowattHourRate, KilowattRate},
        time::Hours,
    },
};

/// The cheapest contiguous charging session and its cost breakdown.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// From the first charged slot start till the end of the last charged portion.
    pub interval: Interval,

    /// Net charging time, may be shorter than the interval if a slot in between is partially used.
    pub duration: Hours,

    pub energy: KilowattHours,
    pub charging_power: Kilowatts,
    pub margin: KilowattHourRate,
    pub tax: KilowattHourRate,

    pub energy_cost: Cost,
    pub transfer_cost: Cost,
    pub tax_cost: Cost,
    pub demand_cost: Cost,
    pub total_cost: Cost,

    /// Average spot price plus margin.
    pub average_energy_rate: KilowattHourRate,

    /// Average all-inclusive price.
    pub average_total_rate: KilowattHourRate,

    pub demand_fee_enabled: bool,
    pub peak_demand: Option<PeakDemand>,

    /// Only the slots that are actually charged, in order.
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Charged part of the slot.
    pub interval: Interval,

    /// Exact charging time, the interval is rounded to milliseconds.
    pub duration: Hours,

    pub energy: KilowattHours,
    pub spot_price: KilowattHourRate,

    /// Spot price plus margin.
    pub energy_rate: KilowattHourRate,

    pub transfer_rate: KilowattHourRate,

    /// [`None`] when the demand fee is disabled.
    pub demand: Option<DemandRate>,
}

impl TimelineEntry {
    #[must_use]
    pub fn energy_cost(&self) -> Cost {
        self.energy * self.energy_rate
    }

    #[must_use]
    pub fn transfer_cost(&self) -> Cost {
        self.energy * self.transfer_rate
    }
}

#[derive(Copy, Clone, Debug, Serialize)]
pub struct DemandRate {
    pub rate: KilowattRate,

    /// Whether the hour is billed by the demand fee at all.
    pub applies: bool,
}
