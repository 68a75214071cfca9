// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Serialize;

#[derive(Serialize)]
struct HostAlias {
    alias: String,
    source: String,
}

impl Sortable for HostAlias {
    fn sort_key(&self) -> String {
        self.alias.clone()
    }
}

fn alias(name: &str) -> HostAlias {
    HostAlias { alias: name.to_string(), source: "test".to_string() }
}

#[test]
fn from_records_preserves_input_order() {
    let dataset =
        InventoryDataset::from_records(vec![alias("zeta"), alias("alpha")]).unwrap();
    assert_eq!(dataset.0[0].sort_key, "zeta");
    assert_eq!(dataset.0[1].sort_key, "alpha");
}

#[test]
fn sort_orders_by_key_ascending() {
    let mut dataset =
        InventoryDataset::from_records(vec![alias("zeta"), alias("alpha"), alias("mid")])
            .unwrap();
    dataset.sort();
    let keys: Vec<&str> = dataset.0.iter().map(|i| i.sort_key.as_str()).collect();
    assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let mut dataset = InventoryDataset::from_records(vec![
        HostAlias { alias: "same".to_string(), source: "first".to_string() },
        HostAlias { alias: "same".to_string(), source: "second".to_string() },
    ])
    .unwrap();
    dataset.sort();
    assert_eq!(dataset.0[0].value["source"], "first");
    assert_eq!(dataset.0[1].value["source"], "second");
}

#[test]
fn records_serialize_their_fields() {
    let dataset = InventoryDataset::from_records(vec![alias("web-1")]).unwrap();
    assert_eq!(dataset.0[0].value["alias"], "web-1");
    assert_eq!(dataset.0[0].value["source"], "test");
}

#[test]
fn empty_dataset_signals_deletion() {
    let output = PluginOutput {
        id: PluginId::new("metadata", "cloud_instance"),
        entity_key: "host-1".into(),
        data: InventoryDataset::empty(),
    };
    assert!(output.data.is_empty());
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["id"], "metadata/cloud_instance");
}
