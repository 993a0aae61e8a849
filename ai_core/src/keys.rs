//! Key naming for the shared metrics namespace.
//!
//! All keys are `:`-joined segments under one namespace prefix, with UTC
//! dates (`%Y-%m-%d`) and months (`%Y-%m`) as scoping segments.

use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("ai")
    }
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self, segments: &[&str]) -> String {
        let mut key = self.namespace.clone();
        for segment in segments {
            key.push(':');
            key.push_str(segment);
        }
        key
    }
}

#[must_use]
pub fn date_segment(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[must_use]
pub fn month_segment(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[must_use]
pub fn date_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}
