//! Aggregate-then-fail validation of external documents.

use std::fmt::{Display, Formatter};

use serde_json::{Map, Value};

/// One or more problems found in a document, reported together.
#[derive(Debug, derive_more::Error)]
pub struct ValidationError {
    pub subject: &'static str,
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn single(subject: &'static str, message: impl Into<String>) -> Self {
        Self { subject, messages: vec![message.into()] }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to load the {}: {}", self.subject, self.messages.join("; "))
    }
}

/// Collects labeled problems while the independent field validators run.
#[must_use]
pub struct Diagnostics {
    subject: &'static str,
    messages: Vec<String>,
}

impl Diagnostics {
    pub const fn new(subject: &'static str) -> Self {
        Self { subject, messages: Vec::new() }
    }

    pub fn report(&mut self, context: impl Display, message: impl Display) {
        self.messages.push(format!("{context}: {message}"));
    }

    /// Yield the value only when nothing has been reported.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.messages.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { subject: self.subject, messages: self.messages })
        }
    }
}

/// First present, non-null value among the aliases, tried in order.
pub fn first_of<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| object.get(*alias).filter(|value| !value.is_null()))
}

/// Trimmed, non-empty string among the aliases.
pub fn first_string<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        object.get(*alias).and_then(Value::as_str).map(str::trim).filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_finish_ok() {
        assert_eq!(Diagnostics::new("tariff").finish(42).unwrap(), 42);
    }

    #[test]
    fn test_finish_aggregates() {
        let mut diagnostics = Diagnostics::new("tariff");
        diagnostics.report("siirto (#1)", "invalid rate (abc)");
        diagnostics.report("siirto (#2)", "weekdays are not defined");
        let error = diagnostics.finish(()).unwrap_err();
        assert_eq!(error.messages.len(), 2);
        assert_eq!(
            error.to_string(),
            "failed to load the tariff: siirto (#1): invalid rate (abc); siirto (#2): weekdays are not defined",
        );
    }

    #[test]
    fn test_first_of_skips_null() {
        let object = json!({ "start": null, "from": "08:00" });
        let object = object.as_object().unwrap();
        assert_eq!(first_of(object, &["start", "from"]), Some(&json!("08:00")));
        assert_eq!(first_of(object, &["begin"]), None);
    }

    #[test]
    fn test_first_string_trims() {
        let object = json!({ "id": "  ", "name": " Helen " });
        let object = object.as_object().unwrap();
        assert_eq!(first_string(object, &["name"]), Some("Helen"));
        assert_eq!(first_string(object, &["id"]), None);
        assert_eq!(first_string(object, &["id", "name"]), Some("Helen"));
    }
}
