//! Unit tests for error codes and `AppError` mapping.

use std::io;

use ess_runtime::orchestrator::{Stage, StartupError};
use ess_runtime::{AppError, ErrorCode};

#[test]
fn error_code_values_are_stable() {
    assert_eq!(ErrorCode::Error.value(), -1);
    assert_eq!(ErrorCode::OutOfResource.value(), -2);
    assert_eq!(ErrorCode::BadParam.value(), -5);
    assert_eq!(ErrorCode::NotFound.value(), -13);
    assert_eq!(ErrorCode::NotAvailable.value(), -16);
}

#[test]
fn error_code_display_shows_name_and_value() {
    assert_eq!(ErrorCode::NotFound.to_string(), "ERR_NOT_FOUND (-13)");
    assert_eq!(ErrorCode::OutOfResource.name(), "ERR_OUT_OF_RESOURCE");
}

#[test]
fn config_error_maps_to_bad_param() {
    let err = AppError::Config("missing field".into());
    assert_eq!(err.code(), ErrorCode::BadParam);
    assert_eq!(err.to_string(), "config: missing field");
}

#[test]
fn component_error_display_includes_code_name() {
    let err = AppError::component(ErrorCode::Unreachable, "peer gone");
    assert_eq!(err.code(), ErrorCode::Unreachable);
    assert_eq!(err.to_string(), "component: peer gone [ERR_UNREACH]");
}

#[test]
fn io_error_kind_selects_code() {
    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
    assert_eq!(AppError::io("mkdir", &denied).code(), ErrorCode::Permission);

    let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
    let err: AppError = missing.into();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn io_error_context_is_kept() {
    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
    let text = AppError::io("failed to create /tmp/x", &denied).to_string();
    assert!(text.starts_with("io: failed to create /tmp/x"), "got {text}");
}

#[test]
fn toml_error_converts_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
    let err: AppError = parse_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn startup_error_carries_stage_and_code() {
    let failure = StartupError::new(
        Stage::RoutedOpen,
        AppError::component(ErrorCode::NotFound, "no routing module"),
    );
    assert_eq!(failure.stage(), Stage::RoutedOpen);
    assert_eq!(failure.error_name(), "ERR_NOT_FOUND");
    assert!(failure.to_string().starts_with("routed_open failed: "));

    let err: AppError = failure.into();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err.to_string().starts_with("startup: routed_open failed"));
}
