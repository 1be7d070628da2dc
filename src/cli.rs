mod charging;
mod plan;
mod pricings;
mod tariff;

use clap::{Parser, Subcommand};

pub use self::{plan::plan, pricings::pricings, tariff::tariff};
use crate::cli::{plan::PlanArgs, pricings::PricingsArgs, tariff::TariffArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the prices, load the tariff, and find the cheapest charging window.
    #[clap(name = "plan")]
    Plan(Box<PlanArgs>),

    /// Validate the tariff and print its hourly rates.
    #[clap(name = "tariff")]
    Tariff(Box<TariffArgs>),

    /// List the pricings from the manifest.
    #[clap(name = "pricings")]
    Pricings(PricingsArgs),
}
