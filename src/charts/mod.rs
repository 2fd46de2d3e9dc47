//! The dashboard charts.
//!
//! A chart owns its loaded dataset and aggregate cache. Loading is described by a
//! [`LoadRequest`] that can run on any thread; the result is handed back to the chart
//! with [`Chart::install`]. Views are recomputed from cached aggregates whenever the
//! selection changes.

use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::{AggregationKey, Delta, Entry, Extremes, Totals};
use crate::cache::AggregateCache;
use crate::error::LoadError;
use crate::format::format_number;
use crate::geo::Boundaries;
use crate::loader::{load, Dataset, LoadOptions};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::{Axis, Selection};
use crate::source::SourceLocator;

pub use crate::cli::ChartKind;

pub mod age_groups;
pub mod enforcement;
pub mod jurisdictions;
pub mod stages;
pub mod state_map;
pub mod trend;

pub use age_groups::AgeGroupChart;
pub use enforcement::EnforcementChart;
pub use jurisdictions::JurisdictionChart;
pub use stages::StageChart;
pub use state_map::StateMapChart;
pub use trend::TrendChart;

/// Where each chart reads its data from.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSettings {
    pub data_dir: PathBuf,
    pub positive_tests: String,
    pub detection_stages: String,
    pub enforcement_actions: String,
    pub age_groups: String,
    pub state_totals: String,
    pub boundaries: String,
    pub delimiter: u8,
    pub metric: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            positive_tests: "police_enforcement_2024_positive_drug_tests.csv".to_string(),
            detection_stages: "Chart 3.csv".to_string(),
            enforcement_actions: "Chart 4.csv".to_string(),
            age_groups: "Chart 5.csv".to_string(),
            state_totals: "Chart 6.csv".to_string(),
            boundaries: "states.geojson".to_string(),
            delimiter: b',',
            metric: Some(crate::schema::POSITIVE_DRUG_TESTS.to_string()),
        }
    }
}

impl SourceSettings {
    fn table(&self, name: &str, schema: SourceSchema, metric: bool) -> SourceRequest {
        let mut options = LoadOptions::default().with_delimiter(self.delimiter);
        if metric {
            if let Some(m) = &self.metric {
                options = options.with_metric(m.clone());
            }
        }
        SourceRequest {
            locator: SourceLocator::resolve(&self.data_dir, name),
            schema,
            options,
        }
    }

    fn locator(&self, name: &str) -> SourceLocator {
        SourceLocator::resolve(&self.data_dir, name)
    }
}

/// One delimited source to read.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRequest {
    pub locator: SourceLocator,
    pub schema: SourceSchema,
    pub options: LoadOptions,
}

impl SourceRequest {
    pub fn load(&self) -> Result<Dataset, LoadError> {
        load(&self.locator, &self.schema, &self.options)
    }
}

/// Everything a chart needs loaded. Plain data, safe to move to a worker thread.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub table: SourceRequest,
    pub boundaries: Option<SourceLocator>,
}

impl LoadRequest {
    pub fn run(&self) -> Result<LoadedData, LoadError> {
        let table = self.table.load()?;
        let boundaries = self
            .boundaries
            .as_ref()
            .map(Boundaries::load)
            .transpose()?;
        Ok(LoadedData { table, boundaries })
    }
}

/// Result of a [`LoadRequest`].
#[derive(Clone, Debug, Default)]
pub struct LoadedData {
    pub table: Dataset,
    pub boundaries: Option<Boundaries>,
}

/// Loaded rows plus the aggregates computed from them.
#[derive(Debug, Default)]
pub struct ChartData {
    dataset: Option<Dataset>,
    cache: AggregateCache,
}

impl ChartData {
    pub fn install(&mut self, dataset: Dataset, generation: u64) {
        self.cache.invalidate(generation);
        self.dataset = Some(dataset);
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// `None` until a dataset is installed.
    pub fn totals(
        &mut self,
        dims: &[Dimension],
        measure: Measure,
    ) -> Option<&Totals<AggregationKey>> {
        let dataset = self.dataset.as_ref()?;
        Some(
            self.cache
                .get_or_compute(dataset, &crate::aggregate::KeyShape::of(dims), measure),
        )
    }

    pub fn year_extent(&self) -> Option<(i32, i32)> {
        self.dataset.as_ref().and_then(Dataset::year_extent)
    }
}

/// One chart of the dashboard.
pub trait Chart {
    fn kind(&self) -> ChartKind;

    fn title(&self) -> &'static str;

    /// Selection axes this chart responds to.
    fn axes(&self) -> &'static [Axis] {
        &[]
    }

    fn load_request(&self) -> LoadRequest;

    /// Replace the chart's data with a completed load.
    fn install(&mut self, data: LoadedData, generation: u64);

    fn is_loaded(&self) -> bool;

    /// Aggregate for `selection` and build the view.
    fn view(&mut self, selection: &Selection) -> ChartView;
}

/// Build the chart for `kind` reading from `settings`.
pub fn build(kind: ChartKind, settings: &SourceSettings) -> Box<dyn Chart> {
    match kind {
        ChartKind::Trend => Box::new(TrendChart::new(settings)),
        ChartKind::Jurisdictions => Box::new(JurisdictionChart::new(settings)),
        ChartKind::Stages => Box::new(StageChart::new(settings)),
        ChartKind::Enforcement => Box::new(EnforcementChart::new(settings)),
        ChartKind::AgeGroups => Box::new(AgeGroupChart::new(settings)),
        ChartKind::StateMap => Box::new(StateMapChart::new(settings)),
    }
}

/// A labelled value with its tooltip text.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    pub key: String,
    pub value: f64,
    pub tooltip: Vec<String>,
}

/// Highest, lowest and total of the displayed set.
#[derive(Clone, Debug, PartialEq)]
pub struct Kpi {
    pub extremes: Extremes<String>,
    /// Caption for the total, e.g. `Total 2008–2024` or `Year 2020`.
    pub scope: String,
}

impl Kpi {
    pub fn lines(&self) -> Vec<String> {
        let line = |label: &str, e: &Entry<String>| {
            format!("{}: {} ({})", label, e.key, format_number(e.value))
        };
        vec![
            line("Highest", &self.extremes.highest),
            line("Lowest", &self.extremes.lowest),
            format!("{}: {}", self.scope, format_number(self.extremes.total)),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinePoint {
    pub year: i32,
    pub value: f64,
    pub delta: Option<Delta>,
    pub tooltip: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineView {
    pub points: Vec<LinePoint>,
    pub y_label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarView {
    pub bars: Vec<Datum>,
    /// Bar drawn at full strength while the others are muted.
    pub highlight: Option<String>,
    pub kpi: Option<Kpi>,
    pub x_label: String,
    pub y_label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarGroup {
    pub label: String,
    pub bars: Vec<Datum>,
}

/// Bars clustered by group; `series[i]` names the i-th bar of every group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedBarView {
    pub series: Vec<String>,
    pub groups: Vec<BarGroup>,
    pub y_label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    pub key: String,
    pub value: f64,
    pub percent: f64,
    pub tooltip: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PieView {
    pub slices: Vec<Slice>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapRegion {
    pub name: String,
    pub code: String,
    pub value: f64,
    pub tooltip: Vec<String>,
}

/// Choropleth, share donut and table for one period.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapView {
    pub boundaries: Arc<Boundaries>,
    /// One entry per boundary region, in boundary order.
    pub regions: Vec<MapRegion>,
    /// Upper end of the colour domain; the lower end is 0.
    pub color_max: f64,
    /// Per-state shares sorted by value, descending. Also the table rows.
    pub shares: Vec<Slice>,
    pub kpi: Option<Kpi>,
    pub note: Option<String>,
    pub period: String,
}

/// What a chart hands to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartView {
    Line(LineView),
    Bar(BarView),
    GroupedBar(GroupedBarView),
    Pie(PieView),
    Choropleth(MapView),
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Line(v) => v.points.is_empty(),
            Self::Bar(v) => v.bars.is_empty(),
            Self::GroupedBar(v) => v.groups.iter().all(|g| g.bars.is_empty()),
            Self::Pie(v) => v.slices.is_empty(),
            Self::Choropleth(v) => v.regions.is_empty() && v.shares.is_empty(),
        }
    }

    /// Number of hoverable marks.
    pub fn marks(&self) -> usize {
        match self {
            Self::Line(v) => v.points.len(),
            Self::Bar(v) => v.bars.len(),
            Self::GroupedBar(v) => v.groups.iter().map(|g| g.bars.len()).sum(),
            Self::Pie(v) => v.slices.len(),
            Self::Choropleth(v) => v.regions.len(),
        }
    }

    /// Tooltip lines for mark `index`, counted in [`ChartView::marks`] order.
    pub fn tooltip(&self, index: usize) -> Option<&[String]> {
        match self {
            Self::Line(v) => v.points.get(index).map(|p| p.tooltip.as_slice()),
            Self::Bar(v) => v.bars.get(index).map(|b| b.tooltip.as_slice()),
            Self::GroupedBar(v) => v
                .groups
                .iter()
                .flat_map(|g| g.bars.iter())
                .nth(index)
                .map(|b| b.tooltip.as_slice()),
            Self::Pie(v) => v.slices.get(index).map(|s| s.tooltip.as_slice()),
            Self::Choropleth(v) => v.regions.get(index).map(|r| r.tooltip.as_slice()),
        }
    }

    /// Key/value rows for tabular output.
    pub fn rows(&self) -> Vec<(String, f64)> {
        match self {
            Self::Line(v) => v
                .points
                .iter()
                .map(|p| (p.year.to_string(), p.value))
                .collect(),
            Self::Bar(v) => v.bars.iter().map(|b| (b.key.clone(), b.value)).collect(),
            Self::GroupedBar(v) => v
                .groups
                .iter()
                .flat_map(|g| {
                    g.bars
                        .iter()
                        .map(move |b| (format!("{} / {}", g.label, b.key), b.value))
                })
                .collect(),
            Self::Pie(v) => v.slices.iter().map(|s| (s.key.clone(), s.value)).collect(),
            Self::Choropleth(v) => v.shares.iter().map(|s| (s.key.clone(), s.value)).collect(),
        }
    }

    /// KPI block lines, if the view carries one.
    pub fn kpi_lines(&self) -> Vec<String> {
        match self {
            Self::Bar(BarView { kpi: Some(kpi), .. }) => kpi.lines(),
            Self::Choropleth(v) => match (&v.kpi, &v.note) {
                (Some(kpi), _) => kpi.lines(),
                (None, Some(note)) => vec![note.clone()],
                (None, None) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}
