//! Locating baked datasets and scratch directories for tests.
//!
//! The full-size DWD archives are tens of megabytes each and are not checked
//! in. Tests that need them look them up here and skip when absent.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(|p| p.to_path_buf())
        .unwrap_or(manifest_dir)
}

/// Directories searched for baked files, in order: `$FORECAST_TEST_DATA`,
/// then `testdata/` and `docs/data/` below the workspace root.
pub fn baked_data_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    std::env::var("FORECAST_TEST_DATA")
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain([root.join("testdata"), root.join("docs/data")])
        .collect()
}

/// First existing baked file called `name`.
pub fn find_baked_file(name: &str) -> Option<PathBuf> {
    baked_data_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Scratch directory for baking a dataset, removed on drop.
///
/// # Panics
///
/// Panics if the directory cannot be created.
pub fn temp_dataset_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .unwrap_or_else(|e| panic!("cannot create scratch dataset dir '{}*': {}", prefix, e))
}
