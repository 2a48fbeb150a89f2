//! Environment layer of Settings loading.
//!
//! Kept in its own test binary with a single test so the process-wide
//! environment is not shared with other config tests.

use std::env;
use std::fs;

use tempfile::TempDir;

use treeview::config::{Settings, Variant};
use treeview::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[test]
fn given_env_vars_when_loading_then_override_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("treeview.toml");
    fs::write(&path, "variant = \"keyed\"\n[tree]\nroot_key = \"file\"\n").unwrap();

    env::set_var("TREEVIEW_VARIANT", "indexed");
    env::set_var("TREEVIEW_TREE__ROOT_KEY", "env");
    let result = Settings::load(Some(&path));
    env::remove_var("TREEVIEW_VARIANT");
    env::remove_var("TREEVIEW_TREE__ROOT_KEY");

    let settings = result.expect("load settings");
    assert_eq!(settings.variant, Variant::Indexed);
    assert_eq!(settings.tree.root_key, "env");
    assert_eq!(settings.tree.path_separator, ".");
}
