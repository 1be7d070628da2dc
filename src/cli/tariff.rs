use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta};
use clap::Parser;

use crate::{
    api::source::Source,
    prelude::*,
    pricing::Manifest,
    tables::build_rates_table,
    tariff::Tariff,
};

/// Where to take the tariff from.
#[must_use]
#[derive(Parser)]
pub struct TariffSourceArgs {
    /// Tariff configuration URL or path. Overrides the pricing manifest.
    #[clap(long = "tariff", env = "TARIFF")]
    pub tariff: Option<Source>,

    /// Pricing manifest URL or path.
    #[clap(long = "manifest", env = "PRICING_MANIFEST", default_value = "config/pricing/manifest.json")]
    pub manifest: Source,

    /// Pricing identifier in the manifest, defaults to the manifest's default.
    #[clap(long = "pricing", env = "PRICING")]
    pub pricing: Option<String>,
}

impl TariffSourceArgs {
    #[instrument(skip_all)]
    pub fn load(&self) -> Result<Tariff> {
        let source = match &self.tariff {
            Some(source) => source.clone(),
            None => {
                let manifest = Manifest::load(&self.manifest)?;
                let pricing = manifest
                    .resolve(self.pricing.as_deref())
                    .context("the pricing manifest lists no pricings")?;
                if let Some(selected) = &self.pricing
                    && selected.trim() != pricing.id
                {
                    warn!(%selected, fallback = %pricing.id, "the pricing is not listed");
                }
                info!(id = %pricing.id, name = %pricing.name, "selected the pricing");
                pricing.config_source(&self.manifest)?
            }
        };
        let document = source.read_json()?;
        Tariff::from_json(&document).with_context(|| format!("invalid tariff in `{source}`"))
    }
}

#[derive(Parser)]
pub struct TariffArgs {
    #[clap(flatten)]
    pub source: TariffSourceArgs,

    /// Date to print the rates for, defaults to today.
    #[clap(long = "date", env = "DATE")]
    pub date: Option<NaiveDate>,
}

/// Validate the tariff and print the rates in force at the start of every hour of the date.
#[instrument(skip_all)]
pub fn tariff(args: &TariffArgs) -> Result {
    let tariff = args.source.load()?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let hours = hours_of(date);
    ensure!(!hours.is_empty(), "{date} has no representable local hours");
    println!("{}", build_rates_table(&tariff, &hours));
    Ok(())
}

/// Local starts of every hour of the date, skipping non-existent ones.
fn hours_of(date: NaiveDate) -> Vec<DateTime<Local>> {
    (0..24)
        .filter_map(|hour| {
            (date.and_time(NaiveTime::MIN) + TimeDelta::hours(hour))
                .and_local_timezone(Local)
                .earliest()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_hours_of() {
        let hours = hours_of(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert!((23..=24).contains(&hours.len()));
        assert_eq!(hours[0].hour(), 0);
        assert!(hours.iter().tuple_windows().all(|(current, next)| current < next));
    }

    #[test]
    fn test_load_sample_tariff_from_manifest() -> Result {
        let args = TariffSourceArgs {
            tariff: None,
            manifest: Source::Path(
                concat!(env!("CARGO_MANIFEST_DIR"), "/config/pricing/manifest.json").into(),
            ),
            pricing: Some("tehosiirto".to_string()),
        };
        let tariff = args.load()?;
        assert!(!tariff.demand.is_empty());
        Ok(())
    }
}
