// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inventory datasets: ordered, de-duplicable records describing a facet of
//! host state. A dataset emitted under a plugin id replaces any previous
//! dataset for that id downstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::plugin_id::PluginId;
use crate::EntityKey;

/// A record that can be placed in an inventory dataset.
///
/// `sort_key` determines the deterministic order of the dataset before
/// emission.
pub trait Sortable: Serialize {
    fn sort_key(&self) -> String;
}

/// A single serialized inventory record plus its sort key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sort_key: String,
    pub value: Value,
}

/// Serialization failure while building a dataset from typed records.
#[derive(Debug, Error)]
#[error("failed to serialize inventory record {sort_key:?}: {source}")]
pub struct DatasetError {
    pub sort_key: String,
    #[source]
    pub source: serde_json::Error,
}

/// Ordered sequence of inventory records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryDataset(pub Vec<InventoryItem>);

impl InventoryDataset {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a dataset from typed records, serializing each one.
    pub fn from_records<T, I>(records: I) -> Result<Self, DatasetError>
    where
        T: Sortable,
        I: IntoIterator<Item = T>,
    {
        let mut items = Vec::new();
        for record in records {
            let sort_key = record.sort_key();
            let value = serde_json::to_value(&record)
                .map_err(|source| DatasetError { sort_key: sort_key.clone(), source })?;
            items.push(InventoryItem { sort_key, value });
        }
        Ok(Self(items))
    }

    /// Sort records by `sort_key` ascending. Stable, so records sharing a
    /// key keep their insertion order.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The envelope handed to the inventory sink.
///
/// An empty `data` under a known id signals deletion of that id's inventory
/// downstream (deprecation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginOutput {
    pub id: PluginId,
    pub entity_key: EntityKey,
    pub data: InventoryDataset,
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
