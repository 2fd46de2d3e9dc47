//! Data aggregation and chart-state pipeline of the roadside drug testing dashboard.
//!
//! Sources are loaded into typed rows ([`loader`]), reduced into keyed totals
//! ([`aggregate`]) and turned into per-chart views ([`charts`]) under a per-chart
//! [`Selection`]. The [`Dashboard`] drives loads, selections, resizes and tooltips as
//! events, and [`chart_export`] draws the resulting frames.

pub mod aggregate;
pub mod cache;
pub mod chart_export;
pub mod charts;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod format;
pub mod geo;
pub mod loader;
pub mod overlay;
pub mod scale;
pub mod schema;
pub mod selection;
pub mod source;

pub use cache::AggregateCache;
pub use charts::{Chart, ChartKind, ChartView, SourceSettings};
pub use cli::Args;
pub use config::{AppConfig, ConfigManager, Theme};
pub use dashboard::{Content, Dashboard, DashboardEvent, Frame, SlotState};
pub use error::LoadError;
pub use loader::{Dataset, LoadOptions};
pub use selection::{Filter, Selection, SelectionChange};
pub use source::SourceLocator;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "rdtdash";
