// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lookout_core::test_support::test_context_with;
use lookout_core::Config;

#[tokio::test]
async fn emits_redacted_config_fields() {
    let mut config = Config::default();
    config.license_key = "secret".to_string();
    let t = test_context_with(config);

    let plugin = AgentConfigPlugin;
    plugin.run(t.ctx.clone()).await;

    let outputs = t.inventory.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].id, AgentConfigPlugin::plugin_id());

    let license = outputs[0]
        .data
        .0
        .iter()
        .find(|item| item.sort_key == "license_key")
        .unwrap();
    assert_eq!(license.value["value"], "<redacted>");

    // Skiplisted internals never appear.
    assert!(outputs[0].data.0.iter().all(|item| item.sort_key != "files_config_on"));
}

#[tokio::test]
async fn dataset_is_stable_across_runs() {
    let t = test_context_with(Config::default());
    let plugin = AgentConfigPlugin;
    plugin.run(t.ctx.clone()).await;
    plugin.run(t.ctx.clone()).await;

    let outputs = t.inventory.outputs();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].data, outputs[1].data);
}
