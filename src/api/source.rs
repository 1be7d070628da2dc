use std::{
    convert::Infallible,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde_json::Value;
use ureq::Agent;
use url::Url;

use crate::prelude::*;

/// Location of a JSON document: either a web resource or a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    Path(PathBuf),
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        Ok(parse_web_url(text).map_or_else(|| Self::Path(text.into()), Self::Url))
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source {
    /// Resolve a reference found inside this document, the way a browser resolves links.
    pub fn join(&self, reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if let Some(url) = parse_web_url(reference) {
            return Ok(Self::Url(url));
        }
        match self {
            Self::Url(url) => Ok(Self::Url(
                url.join(reference)
                    .with_context(|| format!("failed to resolve `{reference}` against `{url}`"))?,
            )),
            Self::Path(path) => Ok(Self::Path(
                path.parent().unwrap_or_else(|| Path::new("")).join(reference.trim_start_matches("./")),
            )),
        }
    }

    #[instrument(skip_all, fields(source = %self))]
    pub fn read_json(&self) -> Result<Value> {
        match self {
            Self::Url(url) => {
                debug!("requesting…");
                let agent: Agent = Agent::config_builder()
                    .timeout_global(Some(Duration::from_secs(10)))
                    .build()
                    .into();
                agent
                    .get(url.as_str())
                    .call()
                    .with_context(|| format!("failed to request `{url}`"))?
                    .body_mut()
                    .read_json::<Value>()
                    .with_context(|| format!("failed to read JSON from `{url}`"))
            }
            Self::Path(path) => {
                debug!("reading…");
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse JSON from `{}`", path.display()))
            }
        }
    }
}

/// Absolute HTTP(S) URL, if the text is one. Anything else is a file path.
fn parse_web_url(text: &str) -> Option<Url> {
    Url::parse(text).ok().filter(|url| matches!(url.scheme(), "http" | "https"))
}
