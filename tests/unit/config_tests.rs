//! Unit tests for configuration parsing, validation and environment
//! overrides.

use std::path::PathBuf;

use ess_runtime::models::{ProcessIdentity, ProcessRole};
use ess_runtime::RuntimeConfig;
use serial_test::serial;

const ENV_KEYS: &[&str] = &[
    "ESS_JOBID",
    "ESS_RANK",
    "ESS_NODENAME",
    "ESS_TMPDIR_BASE",
    "ESS_HNP_URI",
    "ESS_FAULT_TOLERANCE",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn sample_toml() -> &'static str {
    r#"
fault_tolerance = true

[process]
job = 4
rank = 2
role = "app"
nodename = "node17"

[session]
tmpdir_base = "/var/tmp/ess"

[routing]
hnp_uri = "0.0;tcp://10.0.0.1:4000"

[components]
routed = "direct"
"#
}

#[test]
fn parses_full_config() {
    let config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");

    assert!(config.fault_tolerance);
    assert_eq!(config.process.job, Some(4));
    assert_eq!(config.process.rank, Some(2));
    assert_eq!(config.process.role, ProcessRole::App);
    assert_eq!(config.process.nodename.as_deref(), Some("node17"));
    assert_eq!(config.session.tmpdir_base, Some(PathBuf::from("/var/tmp/ess")));
    assert_eq!(config.components.routed.as_deref(), Some("direct"));
    assert_eq!(config.identity(), ProcessIdentity::new(4, 2));
}

#[test]
fn empty_config_uses_defaults() {
    let config = RuntimeConfig::from_toml_str("").expect("empty config");
    assert_eq!(config, RuntimeConfig::default());
    assert!(!config.fault_tolerance);
    assert_eq!(config.identity(), ProcessIdentity::INVALID);
}

#[test]
fn rejects_relative_tmpdir() {
    let err = RuntimeConfig::from_toml_str("[session]\ntmpdir_base = \"relative/dir\"\n")
        .expect_err("relative tmpdir");
    assert!(err.to_string().contains("tmpdir_base"), "got {err}");
}

#[test]
fn rejects_malformed_hnp_uri() {
    let err = RuntimeConfig::from_toml_str("[routing]\nhnp_uri = \"no-address\"\n")
        .expect_err("bad uri");
    assert!(err.to_string().contains("hnp_uri"), "got {err}");
}

#[test]
fn rejects_nodename_with_separator() {
    assert!(RuntimeConfig::from_toml_str("[process]\nnodename = \"a/b\"\n").is_err());
    assert!(RuntimeConfig::from_toml_str("[process]\nnodename = \"  \"\n").is_err());
}

#[test]
fn rejects_unknown_role() {
    assert!(RuntimeConfig::from_toml_str("[process]\nrole = \"worker\"\n").is_err());
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ess.toml");
    std::fs::write(&path, sample_toml()).expect("write config");

    let config = RuntimeConfig::load_from_path(&path).expect("load");
    assert_eq!(config.process.job, Some(4));
}

#[test]
fn load_from_missing_path_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = RuntimeConfig::load_from_path(dir.path().join("absent.toml")).expect_err("missing");
    assert!(err.to_string().starts_with("config: failed to read config"));
}

#[test]
fn process_info_carries_placement() {
    let config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");
    let info = config.process_info();
    assert_eq!(info.name, ProcessIdentity::new(4, 2));
    assert_eq!(info.nodename, "node17");
    assert_eq!(info.tmpdir_base, Some(PathBuf::from("/var/tmp/ess")));
    assert!(info.session.is_none());
}

#[test]
#[serial]
fn env_overrides_replace_file_values() {
    clear_env();
    std::env::set_var("ESS_JOBID", "9");
    std::env::set_var("ESS_RANK", "11");
    std::env::set_var("ESS_NODENAME", "envnode");
    std::env::set_var("ESS_TMPDIR_BASE", "/scratch");
    std::env::set_var("ESS_HNP_URI", "0.0;tcp://head:1");
    std::env::set_var("ESS_FAULT_TOLERANCE", "false");

    let mut config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.identity(), ProcessIdentity::new(9, 11));
    assert_eq!(config.process.nodename.as_deref(), Some("envnode"));
    assert_eq!(config.session.tmpdir_base, Some(PathBuf::from("/scratch")));
    assert_eq!(config.routing.hnp_uri.as_deref(), Some("0.0;tcp://head:1"));
    assert!(!config.fault_tolerance);
}

#[test]
#[serial]
fn unparsable_env_values_are_ignored() {
    clear_env();
    std::env::set_var("ESS_JOBID", "not-a-number");
    std::env::set_var("ESS_HNP_URI", "garbage");
    std::env::set_var("ESS_FAULT_TOLERANCE", "maybe");

    let mut config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.process.job, Some(4));
    assert_eq!(config.routing.hnp_uri.as_deref(), Some("0.0;tcp://10.0.0.1:4000"));
    assert!(config.fault_tolerance);
}

#[test]
#[serial]
fn blank_env_values_are_ignored() {
    clear_env();
    std::env::set_var("ESS_NODENAME", "   ");
    std::env::set_var("ESS_TMPDIR_BASE", "");

    let mut config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.process.nodename.as_deref(), Some("node17"));
    assert_eq!(config.session.tmpdir_base, Some(PathBuf::from("/var/tmp/ess")));
}

#[test]
#[serial]
fn relative_env_tmpdir_fails_validation() {
    clear_env();
    std::env::set_var("ESS_TMPDIR_BASE", "scratch/ess");

    let mut config = RuntimeConfig::from_toml_str(sample_toml()).expect("valid config");
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.session.tmpdir_base, Some(PathBuf::from("scratch/ess")));
    let err = config.validate().expect_err("relative tmpdir");
    assert!(err.to_string().contains("tmpdir_base"), "{err}");
}
