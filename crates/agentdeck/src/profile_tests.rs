// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn resolve_falls_back_to_unnamed_profile() {
    let store = ProfileStore::new();
    let profile = store.resolve("nonexistent");
    assert_eq!(profile.name, "nonexistent");
    assert!(profile.system_prompt.is_none());
}

#[test]
fn load_dir_reads_json_profiles_by_stem() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    std::fs::write(
        tmp.path().join("reviewer.json"),
        r#"{"name": "ignored", "system_prompt": "You review code."}"#,
    )?;

    let store = ProfileStore::load_dir(tmp.path());
    let profile = store.get("reviewer").expect("profile loaded");
    assert_eq!(profile.name, "reviewer");
    assert_eq!(profile.system_prompt.as_deref(), Some("You review code."));
    Ok(())
}

#[test]
fn load_dir_on_missing_directory_is_empty_not_error() {
    let store = ProfileStore::load_dir(Path::new("/no/such/directory/agentdeck"));
    assert!(store.get("anything").is_none());
}
