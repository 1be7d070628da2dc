use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeDelta, Timelike};
use serde::Serialize;

use crate::{
    prelude::*,
    quantity::{
        Quantity,
        cost::Cost,
        energy::KilowattHours,
        power::Kilowatts,
        rate::KilowattRate,
        time::Hours,
    },
    tariff::Branch,
};

/// Power below this difference is considered equal when picking the peak hour.
const POWER_TOLERANCE: Kilowatts = Quantity(1e-6);

/// The billed peak: the highest hourly average power among the hours the demand fee applies to.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PeakDemand {
    /// Start of the calendar hour with the peak.
    pub hour: DateTime<Local>,

    pub average_power: Kilowatts,

    /// Demand fee rate in force at the start of the peak hour.
    pub rate: KilowattRate,
}

impl PeakDemand {
    #[must_use]
    pub fn cost(&self) -> Cost {
        self.average_power * self.rate
    }

    /// Estimate the billed peak for a charging session.
    ///
    /// Charging portions are `(start, duration)` at constant `power`. They are sliced at
    /// calendar-hour boundaries and accumulated per hour. As every bucket spans one hour, its
    /// energy equals the average power in that hour. Hours where the branch resolves to a zero
    /// rate are not billed.
    ///
    /// # Returns
    ///
    /// [`None`], if the demand fee applies to none of the charged hours.
    pub fn estimate(
        portions: impl IntoIterator<Item = (DateTime<Local>, Hours)>,
        power: Kilowatts,
        branch: &Branch<KilowattRate>,
    ) -> Option<Self> {
        if branch.is_empty() {
            return None;
        }

        let mut buckets = BTreeMap::<DateTime<Local>, KilowattHours>::new();
        for (start, hours) in portions {
            let mut cursor = start;
            let mut remaining = hours;
            while remaining > Hours::TOLERANCE {
                let hour_start = truncate_to_hour(cursor);
                let next_hour = hour_start + TimeDelta::hours(1);
                let until_next_hour = Hours::from(next_hour - cursor);
                let slice = until_next_hour.min(remaining);
                *buckets.entry(hour_start).or_default() += power * slice;
                remaining -= slice;
                // Snap to the boundary, rounded slices must not drift back into this hour.
                cursor =
                    if slice < until_next_hour { cursor + slice.to_time_delta() } else { next_hour };
            }
        }

        let mut peak: Option<Self> = None;
        for (hour, energy) in buckets {
            let rate = branch.rate_at(hour);
            if rate <= KilowattRate::ZERO {
                continue;
            }
            let candidate = Self { hour, average_power: energy / Hours::ONE, rate };
            let is_better = peak.is_none_or(|peak| {
                (candidate.average_power > peak.average_power + POWER_TOLERANCE)
                    || ((candidate.average_power - peak.average_power).abs() <= POWER_TOLERANCE
                        && candidate.rate > peak.rate)
            });
            if is_better {
                peak = Some(candidate);
            }
        }
        trace!(?peak, "estimated the peak demand");
        peak
    }
}

fn truncate_to_hour(timestamp: DateTime<Local>) -> DateTime<Local> {
    timestamp
        - TimeDelta::seconds(i64::from(timestamp.minute() * 60 + timestamp.second()))
        - TimeDelta::nanoseconds(i64::from(timestamp.nanosecond()))
}
