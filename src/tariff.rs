//! Tiered, calendar-aware network tariff.
//!
//! A tariff has two branches: the transfer fee (per kilowatt-hour) and the optional demand fee
//! (per kilowatt of the peak hourly average power). Each branch is an ordered list of tiers, and
//! the first tier and interval matching a moment determine the rate.

mod config;
pub mod weekday;

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use enumset::EnumSet;

use self::weekday::Weekday;
use crate::quantity::rate::{KilowattHourRate, KilowattRate};

#[must_use]
pub struct Tariff {
    pub transfer: Branch<KilowattHourRate>,
    pub demand: Branch<KilowattRate>,
}

#[must_use]
pub struct Branch<R> {
    pub unit: String,

    /// Ordered by priority: earlier tiers win.
    pub tiers: Vec<Tier<R>>,
}

impl<R> Branch<R> {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The first tier, by priority, with an interval covering the moment.
    #[must_use]
    pub fn tier_at(&self, timestamp: DateTime<Local>) -> Option<&Tier<R>> {
        let date = timestamp.date_naive();
        let weekday = Weekday::from(timestamp.weekday());
        #[expect(clippy::cast_possible_truncation)]
        let minute = (timestamp.hour() * 60 + timestamp.minute()) as u16;
        self.tiers.iter().filter(|tier| tier.is_active_on(date, weekday)).find(|tier| {
            tier.intervals.iter().any(|interval| interval.contains(weekday, minute))
        })
    }
}

impl<R: Copy + Default> Branch<R> {
    /// Rate in force at the moment, or zero when no tier covers it.
    #[must_use]
    pub fn rate_at(&self, timestamp: DateTime<Local>) -> R {
        self.tier_at(timestamp).map(|tier| tier.rate).unwrap_or_default()
    }
}

#[must_use]
pub struct Tier<R> {
    /// Human-readable tier label for diagnostics.
    pub label: String,

    pub rate: R,

    /// Calendar dates when the tier is in force, both ends inclusive.
    pub dates: RangeInclusive<NaiveDate>,

    pub weekdays: EnumSet<Weekday>,

    /// Non-empty, ordered.
    pub intervals: Vec<DailyInterval>,
}

impl<R> Tier<R> {
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate, weekday: Weekday) -> bool {
        self.dates.contains(&date) && self.weekdays.contains(weekday)
    }
}

/// Time-of-day span in minutes since midnight, never crossing midnight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DailyInterval {
    /// Inclusive.
    pub start_minute: u16,

    /// Exclusive.
    pub end_minute: u16,

    pub days: EnumSet<Weekday>,
}

impl DailyInterval {
    #[must_use]
    pub fn contains(&self, weekday: Weekday, minute: u16) -> bool {
        self.days.contains(weekday) && (self.start_minute..self.end_minute).contains(&minute)
    }
}
