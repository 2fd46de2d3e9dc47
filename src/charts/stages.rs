use crate::aggregate::{by_label, percent_of_total, sorted_by_domain, unwrap_single, Totals};
use crate::format::{format_number, format_percent};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::Selection;

use super::{
    Chart, ChartData, ChartKind, ChartView, LoadRequest, LoadedData, PieView, Slice,
    SourceRequest, SourceSettings,
};

/// Detection stages in testing order.
pub const STAGE_ORDER: [&str; 3] = [
    "Indicator (Stage 1)",
    "Secondary Confirmatory (Stage 2)",
    "Laboratory or Toxicology (Stage 3)",
];

/// Share of positive results per detection stage.
#[derive(Debug)]
pub struct StageChart {
    request: SourceRequest,
    data: ChartData,
}

impl StageChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(
                &settings.detection_stages,
                SourceSchema::detection_stages(),
                false,
            ),
            data: ChartData::default(),
        }
    }
}

impl Chart for StageChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Stages
    }

    fn title(&self) -> &'static str {
        "Positive results by detection stage"
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
        let Some(totals) = self
            .data
            .totals(&[Dimension::DetectionMethod], Measure::Count)
        else {
            return ChartView::Pie(PieView::default());
        };
        let positive: Totals<String> = by_label(&unwrap_single(totals))
            .into_iter()
            .filter(|(_, v)| *v > 0.0)
            .collect();
        let order: Vec<String> = STAGE_ORDER.iter().map(|s| s.to_string()).collect();
        let entries = sorted_by_domain(&positive, &order);
        let values: Vec<f64> = entries.iter().map(|e| e.value).collect();
        let shares = percent_of_total(&values);

        let slices = entries
            .into_iter()
            .zip(shares)
            .map(|(e, percent)| Slice {
                tooltip: vec![
                    e.key.clone(),
                    format!("{} tests", format_number(e.value)),
                    format!("{} of total", format_percent(percent)),
                ],
                key: e.key,
                value: e.value,
                percent,
            })
            .collect();
        ChartView::Pie(PieView { slices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::schema::Row;

    fn row(method: &str, count: f64) -> Row {
        Row {
            detection_method: Some(method.to_string()),
            count,
            ..Row::default()
        }
    }

    #[test]
    fn stage_order_drops_non_positive_and_sums_to_100() {
        let mut chart = StageChart::new(&SourceSettings::default());
        chart.install(
            LoadedData {
                table: Dataset::from_rows(
                    "mem",
                    vec![
                        row("Laboratory or Toxicology (Stage 3)", 25.0),
                        row("Roadside Survey", 10.0),
                        row("Indicator (Stage 1)", 50.0),
                        row("Secondary Confirmatory (Stage 2)", 0.0),
                        row("Indicator (Stage 1)", 15.0),
                    ],
                ),
                boundaries: None,
            },
            1,
        );
        let ChartView::Pie(view) = chart.view(&Selection::new()) else {
            panic!("expected a pie");
        };
        let keys: Vec<&str> = view.slices.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Indicator (Stage 1)",
                "Laboratory or Toxicology (Stage 3)",
                "Roadside Survey"
            ]
        );
        let sum: f64 = view.slices.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(view.slices[0].tooltip[1], "65 tests");
        assert_eq!(view.slices[0].tooltip[2], "65.0% of total");
    }
}
