//! Noise-tolerant identity keys for keyed matching
//!
//! The identity of a record has to survive cosmetic edits to the very fields
//! that identify it ("O'Brien, John" in one roster, "OBRIEN JOHN" in the next).
//! The primary field is normalized; the optional secondary field is trimmed
//! and otherwise used verbatim.

use crate::matching::RowKey;
use crate::record::{Record, Schema};
use serde::{Deserialize, Serialize};

/// Derives identity keys from a primary and an optional secondary column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResolver {
    primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secondary: Option<String>,
}

impl IdentityResolver {
    pub fn new<S: Into<String>>(primary: S) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn with_secondary<S: Into<String>>(mut self, secondary: S) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// Resolve the identity key of `record`, or `None` when it comes out empty.
    ///
    /// The key is a tuple, so the two components can never run into each other
    /// no matter what characters they contain.
    pub fn resolve(&self, schema: &Schema, record: &Record) -> Option<RowKey> {
        let primary = schema
            .position(&self.primary)
            .map(|pos| normalize_identity(record.value(pos)))
            .unwrap_or_default();

        let secondary = self
            .secondary
            .as_deref()
            .and_then(|column| schema.position(column))
            .map(|pos| record.value(pos).trim())
            .filter(|value| !value.is_empty());

        match secondary {
            Some(secondary) => Some(RowKey::Values(vec![primary, secondary.to_string()])),
            None if primary.is_empty() => None,
            None => Some(RowKey::Values(vec![primary])),
        }
    }
}

/// Normalize a primary identity value.
///
/// Whitespace runs collapse to one space, the value is uppercased, periods,
/// commas and apostrophes are dropped and hyphens become spaces.
pub fn normalize_identity(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_uppercase()
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '\'' | '\u{2019}'))
        .map(|c| if c == '-' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
