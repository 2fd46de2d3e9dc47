use crate::aggregate::{period_over_period, sorted_by_key, unwrap_single};
use crate::format::{format_number, format_signed, format_signed_percent};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::Selection;

use super::{
    Chart, ChartData, ChartKind, ChartView, LineView, LinePoint, LoadRequest, LoadedData,
    SourceRequest, SourceSettings,
};

/// Positive tests per year with year-on-year change.
#[derive(Debug)]
pub struct TrendChart {
    request: SourceRequest,
    data: ChartData,
}

impl TrendChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(
                &settings.positive_tests,
                SourceSchema::positive_tests(),
                false,
            ),
            data: ChartData::default(),
        }
    }
}

fn tooltip(year: i32, value: f64, change: Option<(f64, Option<f64>)>) -> Vec<String> {
    let mut lines = vec![
        format!("Year {}", year),
        format!("{} positive tests", format_number(value)),
    ];
    if let Some((delta, Some(pct))) = change {
        lines.push(format!(
            "vs prev year: {} ({})",
            format_signed(delta),
            format_signed_percent(pct)
        ));
    }
    lines
}

impl Chart for TrendChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Trend
    }

    fn title(&self) -> &'static str {
        "Positive drug tests per year"
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

    fn view(&mut self, _selection: &Selection) -> ChartView {
        let y_label = "Positive tests".to_string();
        let Some(totals) = self.data.totals(&[Dimension::Year], Measure::Count) else {
            return ChartView::Line(LineView {
                points: Vec::new(),
                y_label,
            });
        };
        let series = sorted_by_key(&unwrap_single(totals));
        let values: Vec<f64> = series.iter().map(|e| e.value).collect();
        let deltas = period_over_period(&values);

        let points = series
            .into_iter()
            .zip(deltas)
            .filter_map(|(entry, delta)| {
                let year = entry.key.year()?;
                Some(LinePoint {
                    year,
                    value: entry.value,
                    delta,
                    tooltip: tooltip(year, entry.value, delta.map(|d| (d.change, d.percent))),
                })
            })
            .collect();
        ChartView::Line(LineView { points, y_label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::schema::Row;

    fn chart_with(rows: Vec<Row>) -> TrendChart {
        let mut chart = TrendChart::new(&SourceSettings::default());
        chart.install(
            LoadedData {
                table: Dataset::from_rows("mem", rows),
                boundaries: None,
            },
            1,
        );
        chart
    }

    fn row(year: Option<i32>, count: f64) -> Row {
        Row {
            year,
            count,
            ..Row::default()
        }
    }

    #[test]
    fn yearly_series_with_deltas() {
        let mut chart = chart_with(vec![
            row(Some(2021), 4.0),
            row(Some(2020), 5.0),
            row(Some(2020), 3.0),
            row(None, 100.0),
        ]);
        let ChartView::Line(view) = chart.view(&Selection::new()) else {
            panic!("expected a line view");
        };
        let years: Vec<i32> = view.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2020, 2021]);
        assert_eq!(view.points[0].value, 8.0);
        assert!(view.points[0].delta.is_none());
        assert_eq!(
            view.points[1].tooltip,
            vec![
                "Year 2021".to_string(),
                "4 positive tests".to_string(),
                "vs prev year: -4 (-50.0%)".to_string(),
            ]
        );
    }

    #[test]
    fn no_pct_line_after_zero_year() {
        let mut chart = chart_with(vec![row(Some(2020), 0.0), row(Some(2021), 3.0)]);
        let view = chart.view(&Selection::new());
        assert_eq!(view.tooltip(1).map(|t| t.len()), Some(2));
    }

    #[test]
    fn unloaded_chart_is_empty() {
        let mut chart = TrendChart::new(&SourceSettings::default());
        assert!(!chart.is_loaded());
        assert!(chart.view(&Selection::new()).is_empty());
    }
}
