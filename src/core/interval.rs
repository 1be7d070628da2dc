use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::quantity::time::Hours;

#[derive(Copy, Clone, Eq, PartialEq, Serialize)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Exclusive.
    pub end: DateTime<Local>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: DateTime<Local>, duration: Hours) -> Self {
        Self { start, end: start + duration.to_time_delta() }
    }

    pub const fn with_start(mut self, start: DateTime<Local>) -> Self {
        self.start = start;
        self
    }

    #[must_use]
    pub fn duration(self) -> Hours {
        Hours::from(self.end - self.start)
    }
}
