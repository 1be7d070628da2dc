//! Tariff document parsing.
//!
//! Every field is validated independently and problems are collected into [`Diagnostics`], so a
//! single load reports everything that is wrong. The tariff is only produced when nothing was
//! reported: a partially valid tariff is never returned.

use chrono::NaiveDate;
use enumset::EnumSet;
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::{
    prelude::*,
    tariff::{Branch, DailyInterval, Tariff, Tier, weekday::Weekday},
    validation::{Diagnostics, ValidationError, first_of, first_string},
};

pub const MINUTES_IN_DAY: u16 = 24 * 60;

const TRANSFER_BRANCH: &str = "siirto";
const DEMAND_BRANCH: &str = "teho";

const TIER_LABEL_ALIASES: &[&str] = &["id", "name"];
const RATE_ALIASES: &[&str] = &["rate", "value", "price", "amount"];
const START_DATE_ALIASES: &[&str] = &["startDate", "start_date", "start", "validFrom"];
const END_DATE_ALIASES: &[&str] = &["endDate", "end_date", "end", "validUntil"];
const TIER_DAY_ALIASES: &[&str] = &["weekdays", "days", "dayOfWeek"];
const INTERVAL_START_ALIASES: &[&str] = &["start", "startTime", "from", "begin"];
const INTERVAL_END_ALIASES: &[&str] = &["end", "endTime", "to", "finish"];
const INTERVAL_DAY_ALIASES: &[&str] = &["days", "day", "weekdays", "dayOfWeek"];

impl Tariff {
    /// Validate the whole document, reporting every problem at once.
    #[instrument(skip_all)]
    pub fn from_json(document: &Value) -> Result<Self, ValidationError> {
        let Some(document) = document.as_object() else {
            return Err(ValidationError::single("tariff", "the document is not an object"));
        };
        let mut diagnostics = Diagnostics::new("tariff");
        let transfer = BranchParser::builder()
            .name(TRANSFER_BRANCH)
            .default_unit("EUR_PER_KWH")
            .optional(false)
            .build()
            .parse(document.get(TRANSFER_BRANCH), &mut diagnostics);
        let demand = BranchParser::builder()
            .name(DEMAND_BRANCH)
            .default_unit("EUR_PER_KW")
            .optional(true)
            .build()
            .parse(document.get(DEMAND_BRANCH), &mut diagnostics);
        let tariff = diagnostics.finish(Self { transfer, demand })?;
        info!(
            n_transfer_tiers = tariff.transfer.tiers.len(),
            n_demand_tiers = tariff.demand.tiers.len(),
            "loaded the tariff",
        );
        Ok(tariff)
    }
}

#[derive(bon::Builder)]
struct BranchParser {
    name: &'static str,
    default_unit: &'static str,

    /// Optional branches may be missing or have no tiers.
    optional: bool,
}

impl BranchParser {
    fn parse<R: From<f64>>(
        &self,
        definition: Option<&Value>,
        diagnostics: &mut Diagnostics,
    ) -> Branch<R> {
        let Some(definition) = definition.and_then(Value::as_object) else {
            if !self.optional {
                diagnostics.report(self.name, "the configuration is missing");
            }
            return Branch { unit: self.default_unit.to_string(), tiers: Vec::new() };
        };
        let unit =
            definition.get("unit").and_then(Value::as_str).unwrap_or(self.default_unit).to_string();
        let tiers = definition
            .get("tiers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(index, tier)| self.parse_tier(index, tier, diagnostics))
            .collect_vec();
        if tiers.is_empty() && !self.optional {
            diagnostics.report(self.name, "no valid tiers are defined");
        }
        Branch { unit, tiers }
    }

    fn parse_tier<R: From<f64>>(
        &self,
        index: usize,
        definition: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Option<Tier<R>> {
        let Some(definition) = definition.as_object() else {
            diagnostics.report(
                format_args!("{} (#{})", self.name, index + 1),
                "the tier definition is missing",
            );
            return None;
        };
        let label = first_string(definition, TIER_LABEL_ALIASES)
            .map_or_else(|| format!("#{}", index + 1), ToString::to_string);
        let context = format!("{} ({label})", self.name);

        let rate = parse_rate(first_of(definition, RATE_ALIASES), &context, diagnostics);
        let dates = parse_dates(definition, &context, diagnostics);
        let weekdays = parse_days(
            first_of(definition, TIER_DAY_ALIASES).map(day_tokens).unwrap_or_default(),
            &context,
            diagnostics,
        );
        let intervals = parse_intervals(
            definition.get("intervals"),
            weekdays.unwrap_or_else(EnumSet::all),
            &context,
            diagnostics,
        );

        Some(Tier {
            label,
            rate: R::from(rate?),
            dates: dates?,
            weekdays: weekdays?,
            intervals: intervals?,
        })
    }
}

fn parse_rate(raw: Option<&Value>, context: &str, diagnostics: &mut Diagnostics) -> Option<f64> {
    let rate = raw.and_then(parse_number).filter(|rate| rate.is_finite() && *rate >= 0.0);
    if rate.is_none() {
        diagnostics.report(context, format_args!("invalid rate ({})", describe(raw)));
    }
    rate
}

fn parse_dates(
    definition: &Map<String, Value>,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<std::ops::RangeInclusive<NaiveDate>> {
    let mut parse_date = |aliases: &[&str], label: &str| {
        let date = first_of(definition, aliases).and_then(Value::as_str).and_then(parse_iso_date);
        if date.is_none() {
            diagnostics.report(context, format_args!("the {label} is missing or invalid"));
        }
        date
    };
    let start_date = parse_date(START_DATE_ALIASES, "start date");
    let end_date = parse_date(END_DATE_ALIASES, "end date");
    let (start_date, end_date) = (start_date?, end_date?);
    if start_date > end_date {
        diagnostics.report(context, "the start date is after the end date");
        return None;
    }
    Some(start_date..=end_date)
}

fn parse_intervals(
    definitions: Option<&Value>,
    default_days: EnumSet<Weekday>,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<DailyInterval>> {
    let mut is_valid = true;
    let mut intervals = Vec::new();
    for (index, definition) in definitions
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        let context = format!("{context} interval {}", index + 1);
        match parse_interval(definition, default_days, &context, diagnostics) {
            Some(parsed) => intervals.extend(parsed),
            None => is_valid = false,
        }
    }
    intervals.retain(|interval| interval.end_minute > interval.start_minute);
    if intervals.is_empty() {
        diagnostics.report(context, "no intervals are defined");
        return None;
    }
    is_valid.then_some(intervals)
}

/// Parse a single interval, splitting it at midnight when it wraps around.
fn parse_interval(
    definition: &Value,
    default_days: EnumSet<Weekday>,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<DailyInterval>> {
    let Some(definition) = definition.as_object() else {
        diagnostics.report(context, "the interval is missing or invalid");
        return None;
    };
    let start_minute =
        parse_time_field(first_of(definition, INTERVAL_START_ALIASES), "start", context, diagnostics);
    let end_minute =
        parse_time_field(first_of(definition, INTERVAL_END_ALIASES), "end", context, diagnostics);
    let day_tokens =
        first_of(definition, INTERVAL_DAY_ALIASES).map(day_tokens).unwrap_or_default();
    let days = if day_tokens.is_empty() {
        Some(default_days)
    } else {
        parse_days(day_tokens, context, diagnostics)
    };
    Some(split_at_midnight(start_minute?, end_minute?, days?))
}

fn split_at_midnight(
    start_minute: u16,
    end_minute: u16,
    days: EnumSet<Weekday>,
) -> Vec<DailyInterval> {
    if start_minute == end_minute {
        vec![DailyInterval { start_minute: 0, end_minute: MINUTES_IN_DAY, days }]
    } else if start_minute < end_minute {
        vec![DailyInterval { start_minute, end_minute, days }]
    } else {
        vec![
            DailyInterval { start_minute, end_minute: MINUTES_IN_DAY, days },
            DailyInterval { start_minute: 0, end_minute, days },
        ]
    }
}

fn parse_time_field(
    raw: Option<&Value>,
    label: &str,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<u16> {
    let Some(raw) = raw else {
        diagnostics.report(context, format_args!("the {label} time is not defined"));
        return None;
    };
    let minute = parse_time_of_day(raw);
    if minute.is_none() {
        diagnostics.report(context, format_args!("invalid {label} time ({})", describe(Some(raw))));
    }
    minute
}

/// Minutes since midnight from `HH:MM`, `HH`, or a fractional number of hours in `0..=24`.
fn parse_time_of_day(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => {
            let hours = number.as_f64().filter(|hours| (0.0..=24.0).contains(hours))?;
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let minutes = (hours * 60.0).round() as u16;
            Some(minutes)
        }
        Value::String(text) => parse_clock(text.trim()),
        _ => None,
    }
}

fn parse_clock(text: &str) -> Option<u16> {
    let (hours, minutes) = text.split_once(':').unwrap_or((text, "00"));
    let is_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if !(1..=2).contains(&hours.len()) || minutes.len() != 2 {
        return None;
    }
    if !is_digits(hours) || !is_digits(minutes) {
        return None;
    }
    let (hours, minutes): (u16, u16) = (hours.parse().ok()?, minutes.parse().ok()?);
    if hours > 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes).filter(|total| *total <= MINUTES_IN_DAY)
}

fn parse_days(
    tokens: Vec<String>,
    context: &str,
    diagnostics: &mut Diagnostics,
) -> Option<EnumSet<Weekday>> {
    let mut days = EnumSet::empty();
    for token in tokens {
        match Weekday::parse_token(&token) {
            Some(parsed) => days |= parsed,
            None => diagnostics.report(context, format_args!("invalid weekday ({token})")),
        }
    }
    if days.is_empty() {
        diagnostics.report(context, "weekdays are not defined");
        return None;
    }
    Some(days)
}

/// Flatten a day filter into separate tokens.
///
/// Accepts a list, a single value, or a string with several tokens separated by whitespace,
/// commas, or semicolons.
fn day_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().flat_map(day_tokens).collect(),
        Value::String(text) => text
            .split(|character: char| character.is_whitespace() || character == ',' || character == ';')
            .filter(|token| !token.is_empty())
            .map(ToString::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let is_iso = text.len() == 10
        && text.bytes().enumerate().all(|(index, byte)| {
            if index == 4 || index == 7 { byte == b'-' } else { byte.is_ascii_digit() }
        });
    if !is_iso {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::{
        quantity::rate::{KilowattHourRate, KilowattRate},
        tariff::weekday::{WEEKEND, WORKDAYS},
    };

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, day, hour, minute, 0).unwrap()
    }

    fn all_year_tier(rate: Value, intervals: Value) -> Value {
        json!({
            "rate": rate,
            "startDate": "2025-01-01",
            "endDate": "2025-12-31",
            "weekdays": [0, 1, 2, 3, 4, 5, 6],
            "intervals": intervals,
        })
    }

    fn transfer_only(tiers: Value) -> Value {
        json!({ "siirto": { "unit": "EUR_PER_KWH", "tiers": tiers } })
    }

    #[test]
    fn test_interval_across_midnight_is_split() {
        let document = transfer_only(json!([
            all_year_tier(json!(0.042), json!([{ "start": "23:00", "end": "01:00" }])),
        ]));
        let tariff = Tariff::from_json(&document).unwrap();
        let tier = &tariff.transfer.tiers[0];
        assert_eq!(tier.intervals.len(), 2);
        assert_eq!((tier.intervals[0].start_minute, tier.intervals[0].end_minute), (1380, 1440));
        assert_eq!((tier.intervals[1].start_minute, tier.intervals[1].end_minute), (0, 60));
        assert_eq!(tariff.transfer.rate_at(at(13, 23, 30)), KilowattHourRate::from(0.042));
        assert_eq!(tariff.transfer.rate_at(at(14, 0, 30)), KilowattHourRate::from(0.042));
        assert_eq!(tariff.transfer.rate_at(at(14, 1, 0)), KilowattHourRate::ZERO);
        assert_eq!(tariff.transfer.rate_at(at(13, 22, 59)), KilowattHourRate::ZERO);
    }

    #[test]
    fn test_invalid_rate_fails_the_whole_configuration() {
        let mut invalid = all_year_tier(json!("abc"), json!([{ "start": "00:00", "end": "00:00" }]));
        invalid["id"] = json!("night");
        let document = transfer_only(json!([
            all_year_tier(json!(0.05), json!([{ "start": "07:00", "end": "22:00" }])),
            invalid,
        ]));
        let error = Tariff::from_json(&document).err().unwrap();
        assert_eq!(error.subject, "tariff");
        assert_eq!(error.messages, vec!["siirto (night): invalid rate (abc)".to_string()]);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let document = json!({
            "siirto": { "tiers": [
                {
                    "rate": -1,
                    "startDate": "2025-12-31",
                    "endDate": "2025-01-01",
                    "weekdays": "someday",
                    "intervals": [{ "start": "25:00", "end": "26" }],
                },
            ]},
            "teho": { "tiers": [{ "rate": 3.0 }] },
        });
        let error = Tariff::from_json(&document).err().unwrap();
        let messages = error.messages;
        assert!(messages.contains(&"siirto (#1): invalid rate (-1)".to_string()), "{messages:?}");
        assert!(messages.contains(&"siirto (#1): the start date is after the end date".to_string()));
        assert!(messages.contains(&"siirto (#1): invalid weekday (someday)".to_string()));
        assert!(messages.contains(&"siirto (#1): weekdays are not defined".to_string()));
        assert!(messages.contains(&"siirto (#1) interval 1: invalid start time (25:00)".to_string()));
        assert!(messages.contains(&"siirto (#1) interval 1: invalid end time (26)".to_string()));
        assert!(messages.contains(&"siirto: no valid tiers are defined".to_string()));
        assert!(messages.contains(&"teho (#1): the start date is missing or invalid".to_string()));
        assert!(messages.contains(&"teho (#1): no intervals are defined".to_string()));
    }

    #[test]
    fn test_missing_transfer_branch() {
        let error = Tariff::from_json(&json!({})).err().unwrap();
        assert_eq!(error.messages, vec!["siirto: the configuration is missing".to_string()]);
    }

    #[test]
    fn test_not_an_object() {
        assert!(Tariff::from_json(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_demand_branch_is_optional() {
        let document = transfer_only(json!([
            all_year_tier(json!(0.05), json!([{ "start": 0, "end": 24 }])),
        ]));
        let tariff = Tariff::from_json(&document).unwrap();
        assert!(tariff.demand.is_empty());
        assert_eq!(tariff.demand.unit, "EUR_PER_KW");
        assert_eq!(tariff.demand.rate_at(at(13, 12, 0)), KilowattRate::ZERO);
    }

    #[test]
    fn test_demand_branch() {
        let mut document = transfer_only(json!([
            all_year_tier(json!(0.05), json!([{ "start": "0", "end": "0" }])),
        ]));
        document["teho"] = json!({
            "unit": "EUR_PER_KW",
            "tiers": [{
                "id": "winter",
                "rate": "3.0",
                "startDate": "2025-01-01",
                "endDate": "2025-03-31",
                "weekdays": "weekdays",
                "intervals": [{ "from": 7, "to": 21 }],
            }],
        });
        let tariff = Tariff::from_json(&document).unwrap();
        let tier = &tariff.demand.tiers[0];
        assert_eq!(tier.label, "winter");
        assert_eq!(tier.weekdays, WORKDAYS);
        assert_eq!(tier.intervals[0].days, WORKDAYS);
        assert_eq!(tariff.demand.rate_at(at(13, 7, 0)), KilowattRate::from(3.0));
        assert_eq!(tariff.demand.rate_at(at(13, 21, 0)), KilowattRate::ZERO);
        assert_eq!(tariff.demand.rate_at(at(18, 12, 0)), KilowattRate::ZERO);
    }

    #[test]
    fn test_equal_start_and_end_is_all_day() {
        let document = transfer_only(json!([
            all_year_tier(json!(0.05), json!([{ "start": "12:00", "end": "12:00" }])),
        ]));
        let tariff = Tariff::from_json(&document).unwrap();
        let interval = tariff.transfer.tiers[0].intervals[0];
        assert_eq!((interval.start_minute, interval.end_minute), (0, MINUTES_IN_DAY));
    }

    #[test]
    fn test_interval_days_override_and_aliases() {
        let document = transfer_only(json!([{
            "name": "weekend nights",
            "value": 0.01,
            "validFrom": "2025-01-01",
            "validUntil": "2025-12-31",
            "days": "mon, tue;wed thu fri la su",
            "intervals": [{ "begin": "22", "finish": "7:00", "dayOfWeek": ["weekend"] }],
        }]));
        let tariff = Tariff::from_json(&document).unwrap();
        let tier = &tariff.transfer.tiers[0];
        assert_eq!(tier.weekdays, EnumSet::all());
        assert_eq!(tier.intervals.len(), 2);
        assert!(tier.intervals.iter().all(|interval| interval.days == WEEKEND));
        assert_eq!(tariff.transfer.rate_at(at(18, 23, 0)), KilowattHourRate::from(0.01));
        assert_eq!(tariff.transfer.rate_at(at(13, 23, 0)), KilowattHourRate::ZERO);
    }

    #[test]
    fn test_midnight_to_midnight_is_discarded() {
        let document = transfer_only(json!([
            all_year_tier(json!(0.05), json!([{ "start": "24:00", "end": "00:00" }])),
        ]));
        let error = Tariff::from_json(&document).err().unwrap();
        assert!(error.messages.contains(&"siirto (#1): no intervals are defined".to_string()));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day(&json!("07:30")), Some(450));
        assert_eq!(parse_time_of_day(&json!("7")), Some(420));
        assert_eq!(parse_time_of_day(&json!(" 24:00 ")), Some(1440));
        assert_eq!(parse_time_of_day(&json!(7.5)), Some(450));
        assert_eq!(parse_time_of_day(&json!(24)), Some(1440));
        assert_eq!(parse_time_of_day(&json!("24:01")), None);
        assert_eq!(parse_time_of_day(&json!("12:60")), None);
        assert_eq!(parse_time_of_day(&json!("1:5")), None);
        assert_eq!(parse_time_of_day(&json!("7.5")), None);
        assert_eq!(parse_time_of_day(&json!(24.5)), None);
        assert_eq!(parse_time_of_day(&json!(-1)), None);
        assert_eq!(parse_time_of_day(&json!(true)), None);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2025-02-28"), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(parse_iso_date("2025-02-30"), None);
        assert_eq!(parse_iso_date("2025-2-28"), None);
        assert_eq!(parse_iso_date("+2025-02-28"), None);
    }

    #[test]
    fn test_sample_configuration() {
        let document = serde_json::from_str(include_str!("../../config/pricing/helen.json")).unwrap();
        let tariff = Tariff::from_json(&document).unwrap();
        assert!(!tariff.transfer.is_empty());
    }
}
