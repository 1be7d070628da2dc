use std::fmt::{Debug, Display, Formatter};

use chrono::TimeDelta;

use crate::quantity::Quantity;

pub type Hours = Quantity<0, 1, 0>;

impl Hours {
    pub const ONE: Self = Self(1.0);

    /// Spans shorter than this are treated as empty.
    pub const TOLERANCE: Self = Self(1e-6);

    /// Convert to a time delta with millisecond resolution.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn to_time_delta(self) -> TimeDelta {
        TimeDelta::milliseconds((self.0 * 3_600_000.0).round() as i64)
    }
}

impl From<TimeDelta> for Hours {
    fn from(time_delta: TimeDelta) -> Self {
        Self(time_delta.as_seconds_f64() / 3600.0)
    }
}

impl Display for Hours {
    /// Human-readable duration, for example `2 h 15 min`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        #[expect(clippy::cast_possible_truncation)]
        let total_minutes = (self.0 * 60.0).round() as i64;
        let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
        match (hours, minutes) {
            (hours, 0) => write!(f, "{hours} h"),
            (0, minutes) => write!(f, "{minutes} min"),
            (hours, minutes) => write!(f, "{hours} h {minutes} min"),
        }
    }
}

impl Debug for Hours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}h", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_time_delta() {
        assert_eq!(Hours::from(TimeDelta::minutes(90)), Quantity(1.5));
    }

    #[test]
    fn test_to_time_delta() {
        assert_eq!(Hours::from(0.15).to_time_delta(), TimeDelta::minutes(9));
    }

    #[test]
    fn test_display() {
        assert_eq!(Hours::from(2.0).to_string(), "2 h");
        assert_eq!(Hours::from(0.25).to_string(), "15 min");
        assert_eq!(Hours::from(4.5).to_string(), "4 h 30 min");
    }
}
