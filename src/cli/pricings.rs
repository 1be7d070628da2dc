use clap::Parser;

use crate::{api::source::Source, pricing::Manifest, prelude::*, tables::build_pricings_table};

#[derive(Parser)]
pub struct PricingsArgs {
    /// Pricing manifest URL or path.
    #[clap(long = "manifest", env = "PRICING_MANIFEST", default_value = "config/pricing/manifest.json")]
    pub manifest: Source,
}

/// List the selectable pricings.
pub fn pricings(args: &PricingsArgs) -> Result {
    let manifest = Manifest::load(&args.manifest)?;
    println!("{}", build_pricings_table(&manifest, &args.manifest));
    Ok(())
}
