use chrono::{DateTime, Local};
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{
    core::{interval::Interval, point::PricePoint},
    prelude::*,
    quantity::{Quantity, rate::KilowattHourRate, time::Hours},
};

/// Normalized time period with a constant spot price.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Slot {
    pub interval: Interval,
    pub spot_price: KilowattHourRate,
}

impl Slot {
    pub const MIN_DURATION: Hours = Quantity(0.15);
    pub const MAX_DURATION: Hours = Quantity(6.0);

    #[must_use]
    pub fn duration(&self) -> Hours {
        self.interval.duration()
    }
}

/// Turn a raw price series into ordered, non-overlapping slots that have not yet ended.
///
/// Each slot lasts until the next reported start. The last slot, and any slot without a later
/// distinct start, falls back to the median positive gap of the series (one hour if there is
/// none). Durations are clamped to [`Slot::MIN_DURATION`]..=[`Slot::MAX_DURATION`]; points
/// starting inside an earlier clamped slot are dropped. The slot running at `now` is trimmed to
/// start at `now`.
#[instrument(skip_all, fields(n_points = points.len()))]
pub fn normalize(points: &[PricePoint], now: DateTime<Local>) -> Vec<Slot> {
    let points = points
        .iter()
        .copied()
        .filter(|point| point.spot_price.is_finite())
        .sorted_by_key(|point| point.start)
        .collect_vec();
    let fallback_duration = median_gap(&points).unwrap_or(Hours::ONE);

    let mut slots: Vec<Slot> = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        if let Some(last) = slots.last()
            && point.start < last.interval.end
        {
            debug!(start = ?point.start, "dropped the point overlapping the previous slot");
            continue;
        }
        let duration = points[index + 1..]
            .iter()
            .map(|next| Hours::from(next.start - point.start))
            .find(|gap| gap.is_finite() && *gap > Hours::TOLERANCE)
            .unwrap_or(fallback_duration)
            .clamp(Slot::MIN_DURATION, Slot::MAX_DURATION);
        slots.push(Slot {
            interval: Interval::starting_at(point.start, duration),
            spot_price: point.spot_price,
        });
    }

    let slots = slots
        .into_iter()
        .filter_map(|slot| {
            if slot.interval.end <= now {
                return None;
            }
            if slot.interval.start < now {
                // Already running, only the remainder is usable:
                if Hours::from(slot.interval.end - now) <= Hours::TOLERANCE {
                    return None;
                }
                return Some(Slot { interval: slot.interval.with_start(now), ..slot });
            }
            Some(slot)
        })
        .collect_vec();
    debug!(?fallback_duration, n_slots = slots.len(), "normalized");
    slots
}

/// Median of the positive gaps between consecutive starts of the sorted points.
fn median_gap(points: &[PricePoint]) -> Option<Hours> {
    let mut gaps = points
        .iter()
        .tuple_windows()
        .map(|(current, next)| Hours::from(next.start - current.start))
        .filter(|gap| gap.is_finite() && *gap > Hours::TOLERANCE)
        .collect_vec();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_unstable_by_key(|gap| OrderedFloat(gap.0));
    let middle = gaps.len() / 2;
    if gaps.len() % 2 == 0 {
        Some((gaps[middle - 1] + gaps[middle]) / 2.0)
    } else {
        Some(gaps[middle])
    }
}
