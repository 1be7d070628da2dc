//! Manifest of the selectable tariff configurations.

use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::source::Source,
    prelude::*,
    validation::{Diagnostics, ValidationError, first_string},
};

const CONFIG_PATH_ALIASES: &[&str] = &["configPath", "config", "file"];

#[must_use]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub default_id: String,

    /// Non-empty.
    pub pricings: Vec<Pricing>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub id: String,
    pub name: String,

    /// Relative to the manifest, unless absolute.
    pub config_path: String,
}

impl Pricing {
    /// Where the tariff configuration lives, given where the manifest came from.
    pub fn config_source(&self, manifest: &Source) -> Result<Source> {
        manifest.join(&self.config_path)
    }
}

impl Manifest {
    #[instrument(skip_all, fields(source = %source))]
    pub fn load(source: &Source) -> Result<Self> {
        Ok(Self::from_json(&source.read_json()?)?)
    }

    pub fn from_json(document: &Value) -> Result<Self, ValidationError> {
        let Some(document) = document.as_object() else {
            return Err(ValidationError::single("pricing manifest", "the document is not an object"));
        };
        let mut diagnostics = Diagnostics::new("pricing manifest");

        let pricings = document
            .get("pricings")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| Self::parse_entry(index, entry, &mut diagnostics))
            .collect_vec();
        if pricings.is_empty() {
            diagnostics.report("pricings", "no pricings are defined");
        }
        for id in pricings.iter().map(|pricing| pricing.id.as_str()).duplicates() {
            diagnostics.report(format!("pricing {id}"), "the identifier is used more than once");
        }

        let default_id = document
            .get("default")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or_else(|| pricings.first().map(|pricing| pricing.id.as_str()))
            .unwrap_or_default()
            .to_string();
        if default_id.is_empty() {
            diagnostics.report("default", "the default pricing is missing");
        } else if !pricings.iter().any(|pricing| pricing.id == default_id) {
            warn!(%default_id, "the default pricing is not listed, falling back to the first one");
        }

        let manifest = diagnostics.finish(Self { default_id, pricings })?;
        debug!(n_pricings = manifest.pricings.len(), default_id = %manifest.default_id, "loaded");
        Ok(manifest)
    }

    fn parse_entry(index: usize, entry: &Value, diagnostics: &mut Diagnostics) -> Option<Pricing> {
        let Some(entry) = entry.as_object() else {
            diagnostics.report(format!("pricing #{}", index + 1), "the entry is not an object");
            return None;
        };
        let Some(id) = first_string(entry, &["id"]) else {
            diagnostics.report(format!("pricing #{}", index + 1), "the identifier is missing");
            return None;
        };
        let Some(name) = first_string(entry, &["name"]) else {
            diagnostics.report(format!("pricing {id}"), "the name is missing");
            return None;
        };
        let Some(config_path) = first_string(entry, CONFIG_PATH_ALIASES) else {
            diagnostics.report(format!("pricing {id}"), "the configuration path is missing");
            return None;
        };
        Some(Pricing {
            id: id.to_string(),
            name: name.to_string(),
            config_path: config_path.to_string(),
        })
    }

    /// Pick the pricing: the selected one if listed, then the default, then the first one.
    #[must_use]
    pub fn resolve(&self, selected: Option<&str>) -> Option<&Pricing> {
        let find = |id: &str| self.pricings.iter().find(|pricing| pricing.id == id);
        selected
            .map(str::trim)
            .and_then(find)
            .or_else(|| find(&self.default_id))
            .or_else(|| self.pricings.first())
    }
}
