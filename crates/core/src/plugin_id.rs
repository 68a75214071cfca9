// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin identifiers: a `(category, term)` pair with a canonical
//! `"category/term"` string form.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

/// Identifier for an inventory plugin.
///
/// Ordered by canonical string form so datasets keyed by id serialize in a
/// deterministic order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PluginId {
    category: SmolStr,
    term: SmolStr,
}

/// Error parsing a plugin id from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePluginIdError {
    #[error("plugin id must be \"category/term\", got {0:?}")]
    MissingSeparator(String),

    #[error("plugin id has an empty {0} segment")]
    EmptySegment(&'static str),
}

impl PluginId {
    pub fn new(category: impl Into<SmolStr>, term: impl Into<SmolStr>) -> Self {
        Self { category: category.into(), term: term.into() }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.term)
    }
}

impl FromStr for PluginId {
    type Err = ParsePluginIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, term) = s
            .split_once('/')
            .ok_or_else(|| ParsePluginIdError::MissingSeparator(s.to_string()))?;
        if category.is_empty() {
            return Err(ParsePluginIdError::EmptySegment("category"));
        }
        if term.is_empty() {
            return Err(ParsePluginIdError::EmptySegment("term"));
        }
        Ok(Self::new(category, term))
    }
}

impl PartialOrd for PluginId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PluginId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.category.as_str(), self.term.as_str())
            .cmp(&(other.category.as_str(), other.term.as_str()))
    }
}

impl serde::Serialize for PluginId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PluginId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "plugin_id_tests.rs"]
mod tests;
