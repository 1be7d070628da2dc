use chrono::{DateTime, Local};

use crate::quantity::rate::KilowattHourRate;

/// Raw spot price as reported by the feed: only the start is known, the duration is inferred.
#[derive(Clone, Copy, Debug, PartialEq, derive_more::Constructor)]
pub struct PricePoint {
    pub start: DateTime<Local>,
    pub spot_price: KilowattHourRate,
}
