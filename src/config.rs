use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::charts::SourceSettings;
use crate::cli::{Args, ExportFormat};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub data: DataConfig,
    pub render: RenderConfig,
    pub theme: ThemeConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// Where the dashboard sources live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
    pub delimiter: Option<u8>,
    /// METRIC value kept by the jurisdiction chart; empty keeps every row
    pub metric: String,
    pub positive_tests: String,
    pub detection_stages: String,
    pub enforcement_actions: String,
    pub age_groups: String,
    pub state_totals: String,
    pub boundaries: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub out_dir: PathBuf,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub text: String,
    pub muted: String,
    pub grid: String,
    pub line: String,
    pub bar: String,
    pub stage_colors: Vec<String>,
    pub jurisdiction_colors: Vec<String>,
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub resize_debounce_ms: u64,
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            data: DataConfig::default(),
            render: RenderConfig::default(),
            theme: ThemeConfig::default(),
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        let sources = SourceSettings::default();
        Self {
            dir: None,
            delimiter: None,
            metric: sources.metric.unwrap_or_default(),
            positive_tests: sources.positive_tests,
            detection_stages: sources.detection_stages,
            enforcement_actions: sources.enforcement_actions,
            age_groups: sources.age_groups,
            state_totals: sources.state_totals,
            boundaries: sources.boundaries,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("charts"),
            format: "svg".to_string(),
            width: 720,
            height: 360,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#0f172a".to_string(),
            muted: "#94a3b8".to_string(),
            grid: "#e2e8f0".to_string(),
            line: "#2563eb".to_string(),
            bar: "#6366f1".to_string(),
            stage_colors: strings(&["#3b82f6", "#facc15", "#22c55e"]),
            jurisdiction_colors: strings(&[
                "#3b82f6", "#f97316", "#22c55e", "#0ea5e9", "#6366f1", "#a855f7", "#14b8a6",
                "#e11d48",
            ]),
            palette: strings(&[
                "#60a5fa", "#3b82f6", "#2563eb", "#10b981", "#34d399", "#0ea5e9", "#6366f1",
                "#7c3aed",
            ]),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 150,
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_from(&config_manager)
    }

    /// Load defaults merged with the config file managed by `manager`, if present
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        if let Some(user_config) = Self::load_user_config(manager)? {
            config.merge(user_config);
        }
        config.validate()?;
        Ok(config)
    }

    fn load_user_config(manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.data.merge(other.data);
        self.render.merge(other.render);
        self.theme.merge(other.theme);
        self.dashboard.merge(other.dashboard);
        self.logging.merge(other.logging);
    }

    /// Command-line flags override everything loaded from files
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(dir) = &args.data_dir {
            self.data.dir = Some(dir.clone());
        }
        if let Some(dir) = &args.out_dir {
            self.render.out_dir = dir.clone();
        }
        if let Some(format) = args.format {
            self.render.format = format.extension().to_string();
        }
        if let Some(width) = args.width {
            self.render.width = width;
        }
        if let Some(height) = args.height {
            self.render.height = height;
        }
        if args.debug {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.render.width == 0 || self.render.height == 0 {
            return Err(eyre!("render width and height must be greater than 0"));
        }
        self.render.export_format()?;

        if self.dashboard.resize_debounce_ms == 0 || self.dashboard.resize_debounce_ms > 10_000 {
            return Err(eyre!(
                "resize_debounce_ms must be between 1 and 10000, got {}",
                self.dashboard.resize_debounce_ms
            ));
        }
        if self.dashboard.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(eyre!(
                "Invalid logging level: {}. Must be one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        Theme::from_config(&self.theme)?;

        Ok(())
    }

    /// Chart sources with relative names resolved against the data directory
    pub fn sources(&self) -> SourceSettings {
        let defaults = SourceSettings::default();
        SourceSettings {
            data_dir: self.data.dir.clone().unwrap_or(defaults.data_dir),
            positive_tests: self.data.positive_tests.clone(),
            detection_stages: self.data.detection_stages.clone(),
            enforcement_actions: self.data.enforcement_actions.clone(),
            age_groups: self.data.age_groups.clone(),
            state_totals: self.data.state_totals.clone(),
            boundaries: self.data.boundaries.clone(),
            delimiter: self.data.delimiter.unwrap_or(defaults.delimiter),
            metric: Some(self.data.metric.trim().to_string()).filter(|m| !m.is_empty()),
        }
    }
}

// Merge implementations for each config section
impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DataConfig::default();
        if other.dir.is_some() {
            self.dir = other.dir;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.metric != default.metric {
            self.metric = other.metric;
        }
        if other.positive_tests != default.positive_tests {
            self.positive_tests = other.positive_tests;
        }
        if other.detection_stages != default.detection_stages {
            self.detection_stages = other.detection_stages;
        }
        if other.enforcement_actions != default.enforcement_actions {
            self.enforcement_actions = other.enforcement_actions;
        }
        if other.age_groups != default.age_groups {
            self.age_groups = other.age_groups;
        }
        if other.state_totals != default.state_totals {
            self.state_totals = other.state_totals;
        }
        if other.boundaries != default.boundaries {
            self.boundaries = other.boundaries;
        }
    }
}

impl RenderConfig {
    pub fn merge(&mut self, other: Self) {
        let default = RenderConfig::default();
        if other.out_dir != default.out_dir {
            self.out_dir = other.out_dir;
        }
        if other.format != default.format {
            self.format = other.format;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
    }

    pub fn export_format(&self) -> Result<ExportFormat> {
        match self.format.to_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "png" => Ok(ExportFormat::Png),
            other => Err(eyre!("Invalid render format: {}. Must be 'svg' or 'png'", other)),
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.background != default.background {
            self.background = other.background;
        }
        if other.text != default.text {
            self.text = other.text;
        }
        if other.muted != default.muted {
            self.muted = other.muted;
        }
        if other.grid != default.grid {
            self.grid = other.grid;
        }
        if other.line != default.line {
            self.line = other.line;
        }
        if other.bar != default.bar {
            self.bar = other.bar;
        }
        if other.stage_colors != default.stage_colors {
            self.stage_colors = other.stage_colors;
        }
        if other.jurisdiction_colors != default.jurisdiction_colors {
            self.jurisdiction_colors = other.jurisdiction_colors;
        }
        if other.palette != default.palette {
            self.palette = other.palette;
        }
    }
}

impl DashboardConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DashboardConfig::default();
        if other.resize_debounce_ms != default.resize_debounce_ms {
            self.resize_debounce_ms = other.resize_debounce_ms;
        }
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoggingConfig::default();
        if other.level != default.level {
            self.level = other.level;
        }
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let s = s.trim();
    if !s.starts_with('#') || s.len() != 7 || !s.is_ascii() {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

pub fn parse_color(s: &str) -> Result<RGBColor> {
    let (r, g, b) = parse_hex(s)?;
    Ok(RGBColor(r, g, b))
}

fn parse_palette(name: &str, values: &[String]) -> Result<Vec<RGBColor>> {
    if values.is_empty() {
        return Err(eyre!("theme.{} must list at least one color", name));
    }
    values.iter().map(|v| parse_color(v)).collect()
}

/// Theme containing parsed colors ready for drawing
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: RGBColor,
    pub text: RGBColor,
    pub muted: RGBColor,
    pub grid: RGBColor,
    pub line: RGBColor,
    pub bar: RGBColor,
    pub stage_colors: Vec<RGBColor>,
    pub jurisdiction_colors: Vec<RGBColor>,
    pub palette: Vec<RGBColor>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Ok(Self {
            background: parse_color(&config.background)?,
            text: parse_color(&config.text)?,
            muted: parse_color(&config.muted)?,
            grid: parse_color(&config.grid)?,
            line: parse_color(&config.line)?,
            bar: parse_color(&config.bar)?,
            stage_colors: parse_palette("stage_colors", &config.stage_colors)?,
            jurisdiction_colors: parse_palette("jurisdiction_colors", &config.jurisdiction_colors)?,
            palette: parse_palette("palette", &config.palette)?,
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
