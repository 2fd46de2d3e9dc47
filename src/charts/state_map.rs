use std::sync::Arc;

use crate::aggregate::{
    by_label, collapse, extremes, nest, percent_of_total, sorted_by_value_desc, KeyPart, Totals,
};
use crate::format::{format_number, format_percent, format_year_range};
use crate::geo::{region_name, Boundaries};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::{Axis, Filter, Selection};
use crate::source::SourceLocator;

use super::{
    Chart, ChartData, ChartKind, ChartView, Kpi, LoadRequest, LoadedData, MapRegion, MapView,
    Slice, SourceRequest, SourceSettings,
};

pub const NO_DATA_NOTE: &str = "No data for this year.";

/// Positive tests per state on a map, with each state's share of the period total.
#[derive(Debug)]
pub struct StateMapChart {
    request: SourceRequest,
    boundaries_locator: SourceLocator,
    data: ChartData,
    boundaries: Arc<Boundaries>,
}

impl StateMapChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(
                &settings.state_totals,
                SourceSchema::state_totals(),
                false,
            ),
            boundaries_locator: settings.locator(&settings.boundaries),
            data: ChartData::default(),
            boundaries: Arc::new(Boundaries::default()),
        }
    }
}

fn display_name(name: &str, code: &str) -> String {
    if name == code {
        name.to_string()
    } else {
        format!("{} ({})", name, code)
    }
}

impl Chart for StateMapChart {
    fn kind(&self) -> ChartKind {
        ChartKind::StateMap
    }

    fn title(&self) -> &'static str {
        "Positive drug tests by state"
    }

    fn axes(&self) -> &'static [Axis] {
        &[Axis::Year]
    }

    fn load_request(&self) -> LoadRequest {
        LoadRequest {
            table: self.request.clone(),
            boundaries: Some(self.boundaries_locator.clone()),
        }
    }

    fn install(&mut self, data: LoadedData, generation: u64) {
        self.data.install(data.table, generation);
        self.boundaries = Arc::new(data.boundaries.unwrap_or_default());
    }

    fn is_loaded(&self) -> bool {
        self.data.is_loaded()
    }

    fn view(&mut self, selection: &Selection) -> ChartView {
        let range = format_year_range(self.data.year_extent());
        let (period, scope) = match selection.year() {
            Filter::All => (range.clone(), format!("Total {}", range)),
            Filter::Only(year) => (year.to_string(), format!("Year {}", year)),
        };
        let mut view = MapView {
            boundaries: Arc::clone(&self.boundaries),
            period: period.clone(),
            color_max: 1.0,
            ..MapView::default()
        };
        let Some(totals) = self
            .data
            .totals(&[Dimension::Year, Dimension::Jurisdiction], Measure::Count)
        else {
            return ChartView::Choropleth(view);
        };

        let nested = nest(totals);
        let current: Totals<KeyPart> = match selection.year() {
            Filter::All => collapse(&nested),
            Filter::Only(year) => nested
                .get(&KeyPart::Year(*year))
                .cloned()
                .unwrap_or_default(),
        };
        let current = by_label(&current);

        let local_max = current.values().copied().fold(0.0_f64, f64::max);
        view.color_max = if local_max > 0.0 { local_max } else { 1.0 };

        view.regions = self
            .boundaries
            .regions()
            .iter()
            .map(|region| {
                let value = current.get(&region.code).copied().unwrap_or(0.0);
                MapRegion {
                    name: region.name.clone(),
                    code: region.code.clone(),
                    value,
                    tooltip: vec![
                        display_name(&region.name, &region.code),
                        format!("{} positives", format_number(value)),
                        format!("Year: {}", period),
                    ],
                }
            })
            .collect();

        let entries = sorted_by_value_desc(&current);
        let values: Vec<f64> = entries.iter().map(|e| e.value).collect();
        view.shares = entries
            .into_iter()
            .zip(percent_of_total(&values))
            .map(|(e, percent)| Slice {
                tooltip: vec![
                    display_name(region_name(&e.key).unwrap_or(e.key.as_str()), &e.key),
                    format!("{} positives", format_number(e.value)),
                    format!("{} of total", format_percent(percent)),
                ],
                key: e.key,
                value: e.value,
                percent,
            })
            .collect();

        let total: f64 = values.iter().sum();
        if total > 0.0 {
            view.kpi = extremes(&current).map(|extremes| Kpi { extremes, scope });
        } else {
            view.note = Some(NO_DATA_NOTE.to_string());
        }
        ChartView::Choropleth(view)
    }
}
