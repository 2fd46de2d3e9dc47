use clap::Parser;
use rdtdash::config::{AppConfig, ConfigManager, Theme};
use rdtdash::Args;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.data.dir, None);
    assert_eq!(config.data.metric, "positive_drug_tests");
    assert_eq!(config.data.state_totals, "Chart 6.csv");
    assert_eq!(config.render.format, "svg");
    assert_eq!((config.render.width, config.render.height), (720, 360));
    assert_eq!(config.dashboard.resize_debounce_ms, 150);
    assert_eq!(config.dashboard.event_poll_interval_ms, 25);
    assert_eq!(config.logging.level, "warn");
    assert!(config.validate().is_ok());
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    for section in ["[data]", "[render]", "[theme]", "[dashboard]", "[logging]"] {
        assert!(content.contains(section), "missing {section}");
    }

    // A second write without force must not clobber the file
    assert!(config_manager.write_default_config(false).is_err());
    assert!(config_manager.write_default_config(true).is_ok());
}

#[test]
fn test_user_config_overrides_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().expect("config dir");
    fs::write(
        config_manager.config_path("config.toml"),
        r##"
[data]
dir = "/srv/rdt"
metric = ""

[render]
format = "png"
width = 1024

[theme]
bar = "#ff0000"

[dashboard]
resize_debounce_ms = 300
"##,
    )
    .expect("write config");

    let config = AppConfig::load_from(&config_manager).expect("load config");
    assert_eq!(config.data.dir, Some(PathBuf::from("/srv/rdt")));
    assert_eq!(config.render.format, "png");
    assert_eq!(config.render.width, 1024);
    assert_eq!(config.render.height, 360);
    assert_eq!(config.dashboard.resize_debounce_ms, 300);

    let sources = config.sources();
    assert_eq!(sources.data_dir, PathBuf::from("/srv/rdt"));
    assert_eq!(sources.metric, None);

    let theme = Theme::from_config(&config.theme).expect("theme");
    assert_eq!(theme.bar, plotters::style::RGBColor(255, 0, 0));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().expect("config dir");

    fs::write(
        config_manager.config_path("config.toml"),
        "[theme]\nline = \"blue\"\n",
    )
    .expect("write config");
    assert!(AppConfig::load_from(&config_manager).is_err());

    fs::write(
        config_manager.config_path("config.toml"),
        "[render]\nformat = \"eps\"\n",
    )
    .expect("write config");
    assert!(AppConfig::load_from(&config_manager).is_err());

    fs::write(config_manager.config_path("config.toml"), "[render\n").expect("write config");
    assert!(AppConfig::load_from(&config_manager).is_err());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).expect("load config");
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_cli_args_override_config() {
    let mut config = AppConfig::default();
    let args = Args::try_parse_from([
        "rdtdash",
        "--data-dir",
        "/tmp/rdt",
        "--format",
        "png",
        "--height",
        "480",
        "--debug",
    ])
    .expect("args parse");
    config.apply_args(&args);

    assert_eq!(config.data.dir, Some(PathBuf::from("/tmp/rdt")));
    assert_eq!(config.render.format, "png");
    assert_eq!(config.render.height, 480);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}
