//! Integration tests for logging system

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(true)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_format_selection() {
    let config = LoggingConfig::default();

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn test_level_directives() {
    let directives = LoggingConfig::default()
        .with_level(LogLevel::Warn)
        .filter_directives();

    for target in directive_targets(&directives) {
        if target != "sqlx" {
            assert!(directives.contains(&format!("{target}=warn")));
        }
    }
}

// Each integration test file is its own process, so this is the only
// subscriber installation in this binary.
#[test]
fn test_init_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).unwrap();
    tracing::info!(library = "LES GEANTS", "json logging active");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Config(_))));
}

fn directive_targets(directives: &str) -> Vec<&str> {
    directives
        .split(',')
        .filter_map(|d| d.split('=').next())
        .collect()
}
