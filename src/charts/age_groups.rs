use crate::aggregate::{by_label, extremes, sorted_by_value_desc, unwrap_single};
use crate::format::{format_number, format_year_range};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::{Axis, Selection};

use super::{
    BarView, Chart, ChartData, ChartKind, ChartView, Datum, Kpi, LoadRequest, LoadedData,
    SourceRequest, SourceSettings,
};

/// Positive tests per driver age group, largest first.
#[derive(Debug)]
pub struct AgeGroupChart {
    request: SourceRequest,
    data: ChartData,
}

impl AgeGroupChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(&settings.age_groups, SourceSchema::age_groups(), false),
            data: ChartData::default(),
        }
    }
}

impl Chart for AgeGroupChart {
    fn kind(&self) -> ChartKind {
        ChartKind::AgeGroups
    }

    fn title(&self) -> &'static str {
        "Positive drug tests by age group"
    }

    fn axes(&self) -> &'static [Axis] {
        &[Axis::Category]
    }

    fn load_request(&self) -> LoadRequest {
        LoadRequest {
            table: self.request.clone(),
            boundaries: None,
        }
    }

    fn install(&mut self, data: LoadedData, generation: u64) {
        self.data.install(data.table, generation);
    }

    fn is_loaded(&self) -> bool {
        self.data.is_loaded()
    }

    /// The category selection highlights one group; totals always cover every group.
    fn view(&mut self, selection: &Selection) -> ChartView {
        // Pre-aggregated sources may carry no year at all.
        let scope = match self.data.year_extent() {
            Some(extent) => format!("Total positives {}", format_year_range(Some(extent))),
            None => "Total positives".to_string(),
        };
        let mut view = BarView {
            highlight: selection.category().only().cloned(),
            x_label: "Age group".to_string(),
            y_label: "Positive tests".to_string(),
            ..BarView::default()
        };
        let Some(totals) = self.data.totals(&[Dimension::AgeGroup], Measure::Count) else {
            return ChartView::Bar(view);
        };
        let totals = by_label(&unwrap_single(totals));
        view.bars = sorted_by_value_desc(&totals)
            .into_iter()
            .map(|e| Datum {
                tooltip: vec![
                    e.key.clone(),
                    format!("{} positive tests", format_number(e.value)),
                ],
                key: e.key,
                value: e.value,
            })
            .collect();
        view.kpi = extremes(&totals).map(|extremes| Kpi { extremes, scope });
        ChartView::Bar(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::schema::Row;
    use crate::selection::Filter;

    fn row(group: &str, count: f64) -> Row {
        Row {
            age_group: Some(group.to_string()),
            count,
            ..Row::default()
        }
    }

    #[test]
    fn sorted_descending_with_highlight() {
        let mut chart = AgeGroupChart::new(&SourceSettings::default());
        chart.install(
            LoadedData {
                table: Dataset::from_rows(
                    "mem",
                    vec![row("0-16", 3.0), row("26-39", 900.0), row("17-25", 1200.0)],
                ),
                boundaries: None,
            },
            1,
        );
        let mut sel = Selection::new();
        sel.select_category(Filter::Only("26-39".to_string()));
        let ChartView::Bar(view) = chart.view(&sel) else {
            panic!("expected bars");
        };
        let keys: Vec<&str> = view.bars.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["17-25", "26-39", "0-16"]);
        assert_eq!(view.highlight.as_deref(), Some("26-39"));
        assert_eq!(view.bars[0].tooltip[1], "1,200 positive tests");
        let kpi = view.kpi.expect("kpi");
        assert_eq!(kpi.scope, "Total positives");
        assert_eq!(kpi.extremes.total, 2103.0);
    }
}
