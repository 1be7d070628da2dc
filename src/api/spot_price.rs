//! Loosely structured spot price feeds.
//!
//! Feeds disagree on field names and units, so every record goes through an ordered list of
//! extraction attempts and a unit heuristic. Records that do not yield both a start and a price
//! are dropped.

use chrono::{DateTime, Local, NaiveDateTime};
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::{
    api::source::Source,
    core::point::PricePoint,
    prelude::*,
    quantity::rate::KilowattHourRate,
    validation::{first_of, first_string},
};

const START_ALIASES: &[&str] = &[
    "startTime",
    "start_time",
    "startDate",
    "start_date",
    "startDateTime",
    "start_date_time",
    "dateTime",
    "DateTime",
    "time",
    "timestamp",
    "Timestamp",
    "hourUTC",
    "hour_local",
];

const PRICE_ALIASES: &[&str] = &[
    "price",
    "priceEurMwh",
    "price_eur_mwh",
    "priceEurMWh",
    "price_cents",
    "priceCents",
    "value",
    "unitPrice",
    "unit_price",
    "Price",
    "PriceWithTax",
    "PriceWithoutTax",
    "priceWithTax",
    "priceWithoutTax",
];

const UNIT_ALIASES: &[&str] = &["unit", "priceUnit"];

const NAIVE_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Fetch and parse the feed.
#[instrument(skip_all, fields(source = %source))]
pub fn fetch(source: &Source) -> Result<Vec<PricePoint>> {
    info!("Fetching…");
    let points = parse(&source.read_json()?);
    info!(n_points = points.len(), "fetched");
    Ok(points)
}

/// Extract the price points, sorted by start.
///
/// The payload is either the record array itself, or an object holding it under `prices` or
/// `data`. Anything else has no records.
#[must_use]
pub fn parse(payload: &Value) -> Vec<PricePoint> {
    let records = match payload {
        Value::Array(records) => records.as_slice(),
        Value::Object(object) => {
            match object.get("prices").or_else(|| object.get("data")).and_then(Value::as_array) {
                Some(records) => records.as_slice(),
                None => {
                    warn!("the payload holds no price records");
                    &[][..]
                }
            }
        }
        _ => {
            warn!("the payload is neither an array nor an object");
            &[][..]
        }
    };
    let points = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| Some(PricePoint::new(parse_start(record)?, parse_price(record)?)))
        .sorted_by_key(|point| point.start)
        .collect_vec();
    if points.len() != records.len() {
        debug!(n_records = records.len(), n_points = points.len(), "dropped invalid records");
    }
    points
}

fn parse_start(record: &Map<String, Value>) -> Option<DateTime<Local>> {
    match first_of(record, START_ALIASES)? {
        Value::Number(millis) => DateTime::from_timestamp_millis(millis.as_i64()?)
            .map(|timestamp| timestamp.with_timezone(&Local)),
        Value::String(text) => parse_timestamp(text.trim()),
        _ => None,
    }
}

/// RFC 3339, or a naive ISO date-time in the local time zone.
fn parse_timestamp(text: &str) -> Option<DateTime<Local>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Local));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .and_then(|timestamp| timestamp.and_local_timezone(Local).earliest())
}

fn parse_price(record: &Map<String, Value>) -> Option<KilowattHourRate> {
    let raw = match first_of(record, PRICE_ALIASES)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let unit = first_string(record, UNIT_ALIASES).map(str::to_lowercase);
    Some(KilowattHourRate::from(normalize_price(raw, unit.as_deref())))
}

/// Convert the raw price into €/kWh.
///
/// An explicit unit tag wins. Otherwise, values above 500 are taken for €/MWh, and values above 9
/// for cents per kilowatt-hour.
fn normalize_price(raw: f64, unit: Option<&str>) -> f64 {
    match unit {
        Some(unit) if unit.contains("eur/mwh") || unit.contains("€/mwh") => raw / 1000.0,
        Some(unit) if unit.contains("c/kwh") => raw / 100.0,
        _ if raw > 500.0 => raw / 1000.0,
        _ if raw > 9.0 => raw / 100.0,
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalize_price() {
        assert_abs_diff_eq!(normalize_price(45.0, Some("eur/mwh")), 0.045);
        assert_abs_diff_eq!(normalize_price(4.5, Some("€/mwh")), 0.0045);
        assert_abs_diff_eq!(normalize_price(750.0, Some("c/kwh")), 7.5);
        assert_abs_diff_eq!(normalize_price(650.0, None), 0.65);
        assert_abs_diff_eq!(normalize_price(12.5, None), 0.125);
        assert_abs_diff_eq!(normalize_price(9.0, None), 9.0);
        assert_abs_diff_eq!(normalize_price(0.0431, Some("eur/kwh")), 0.0431);
        assert_abs_diff_eq!(normalize_price(-0.002, None), -0.002);
    }

    #[test]
    fn test_spot_hinta_payload() {
        let payload = json!([
            { "Rank": 2, "DateTime": "2025-01-15T11:00:00+02:00", "PriceNoTax": 0.0511, "PriceWithTax": 0.0641 },
            { "Rank": 1, "DateTime": "2025-01-15T10:00:00+02:00", "PriceNoTax": 0.0321, "PriceWithTax": 0.0403 },
        ]);
        let points = parse(&payload);
        assert_eq!(points.len(), 2);
        assert!(points[0].start < points[1].start);
        assert_abs_diff_eq!(points[0].spot_price.0, 0.0403);
        assert_abs_diff_eq!(points[1].spot_price.0, 0.0641);
    }

    #[test]
    fn test_wrapped_payload_with_unit_tag() {
        let payload = json!({
            "prices": [
                { "startTime": "2025-01-15T10:00:00Z", "price": "42.5", "unit": "EUR/MWh" },
            ],
        });
        let points = parse(&payload);
        assert_eq!(points.len(), 1);
        assert_abs_diff_eq!(points[0].spot_price.0, 0.0425);
    }

    #[test]
    fn test_data_payload_with_epoch_millis() {
        let payload = json!({ "data": [{ "timestamp": 1_736_935_200_000_i64, "value": 3.2 }] });
        let points = parse(&payload);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].start.timestamp(), 1_736_935_200);
        assert_abs_diff_eq!(points[0].spot_price.0, 3.2);
    }

    #[test]
    fn test_blank_unit_falls_through() {
        let payload = json!([
            { "startTime": "2025-01-15T10:00:00Z", "price": 4.5, "unit": " ", "priceUnit": "c/kWh" },
        ]);
        assert_abs_diff_eq!(parse(&payload)[0].spot_price.0, 0.045);
    }

    #[test]
    fn test_naive_timestamp_is_local() {
        let payload = json!([{ "start_time": "2025-01-15T10:15", "price_cents": 12.0 }]);
        let points = parse(&payload);
        assert_eq!(points[0].start, Local.with_ymd_and_hms(2025, 1, 15, 10, 15, 0).unwrap());
        assert_eq!(points[0].start.minute(), 15);
        assert_abs_diff_eq!(points[0].spot_price.0, 0.12);
    }

    #[test]
    fn test_first_present_alias_wins() {
        let payload = json!([
            { "startTime": null, "time": "2025-01-15T10:00:00Z", "price": 0.05, "value": 0.07 },
        ]);
        let points = parse(&payload);
        assert_abs_diff_eq!(points[0].spot_price.0, 0.05);
    }

    #[test]
    fn test_invalid_records_dropped() {
        let payload = json!([
            { "startTime": "2025-01-15T10:00:00Z" },
            { "price": 0.05 },
            { "startTime": "yesterday", "price": 0.05 },
            { "startTime": "2025-01-15T11:00:00Z", "price": "n/a" },
            { "startTime": "2025-01-15T12:00:00Z", "price": true },
            42,
            { "startTime": "2025-01-15T13:00:00Z", "price": 0.05 },
        ]);
        assert_eq!(parse(&payload).len(), 1);
    }

    #[test]
    fn test_unsupported_payload() {
        assert!(parse(&json!("prices")).is_empty());
        assert!(parse(&json!({ "prices": {} })).is_empty());
        assert!(parse(&Value::Null).is_empty());
    }

    #[test]
    fn test_duplicates_keep_feed_order() {
        let payload = json!([
            { "startTime": "2025-01-15T10:00:00Z", "price": 0.05 },
            { "startTime": "2025-01-15T09:00:00Z", "price": 0.01 },
            { "startTime": "2025-01-15T10:00:00Z", "price": 0.07 },
        ]);
        let points = parse(&payload);
        assert_eq!(points.len(), 3);
        assert_abs_diff_eq!(points[1].spot_price.0, 0.05);
        assert_abs_diff_eq!(points[2].spot_price.0, 0.07);
    }
}
