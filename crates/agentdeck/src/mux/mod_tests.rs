// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn resolve_working_directory_defaults_to_cwd() {
    let resolved = resolve_working_directory(None).unwrap();
    assert!(resolved.is_absolute());
    assert!(resolved.is_dir());
}

#[test]
fn resolve_working_directory_rejects_nonexistent_path() {
    let err = resolve_working_directory(Some("/no/such/path/agentdeck-test")).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn resolve_working_directory_canonicalizes_existing_path() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let resolved = resolve_working_directory(Some(tmp.path().to_str().unwrap()))?;
    assert_eq!(resolved, tmp.path().canonicalize()?);
    Ok(())
}
