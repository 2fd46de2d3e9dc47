use crate::aggregate::{by_label, collapse, extremes, nest, sorted_by_value_desc, KeyPart, Totals};
use crate::format::{format_number, format_year_range};
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::{Axis, Filter, Selection};

use super::{
    BarView, Chart, ChartData, ChartKind, ChartView, Datum, Kpi, LoadRequest, LoadedData,
    SourceRequest, SourceSettings,
};

/// Positive tests per jurisdiction for one year or across all years.
#[derive(Debug)]
pub struct JurisdictionChart {
    request: SourceRequest,
    data: ChartData,
}

impl JurisdictionChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(
                &settings.positive_tests,
                SourceSchema::positive_tests(),
                true,
            ),
            data: ChartData::default(),
        }
    }
}

impl Chart for JurisdictionChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Jurisdictions
    }

    fn title(&self) -> &'static str {
        "Positive drug tests by jurisdiction"
    }

    fn axes(&self) -> &'static [Axis] {
        &[Axis::Year]
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

    fn view(&mut self, selection: &Selection) -> ChartView {
        let range = format_year_range(self.data.year_extent());
        let mut view = BarView {
            x_label: "Jurisdiction".to_string(),
            y_label: "Positive tests".to_string(),
            ..BarView::default()
        };
        let Some(totals) = self
            .data
            .totals(&[Dimension::Year, Dimension::Jurisdiction], Measure::Count)
        else {
            return ChartView::Bar(view);
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

        let (scope, suffix) = match selection.year() {
            Filter::All => (format!("Total {}", range), format!("({} total)", range)),
            Filter::Only(year) => (format!("Year {}", year), format!("in {}", year)),
        };
        view.bars = sorted_by_value_desc(&current)
            .into_iter()
            .map(|e| Datum {
                tooltip: vec![
                    e.key.clone(),
                    format!("{} positive tests {}", format_number(e.value), suffix),
                ],
                key: e.key,
                value: e.value,
            })
            .collect();
        view.kpi = extremes(&current).map(|extremes| Kpi { extremes, scope });
        ChartView::Bar(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::schema::Row;

    fn row(year: i32, juris: Option<&str>, count: f64) -> Row {
        Row {
            year: Some(year),
            jurisdiction: juris.map(String::from),
            count,
            ..Row::default()
        }
    }

    fn chart() -> JurisdictionChart {
        let mut chart = JurisdictionChart::new(&SourceSettings::default());
        chart.install(
            LoadedData {
                table: Dataset::from_rows(
                    "mem",
                    vec![
                        row(2008, Some("NSW"), 10.0),
                        row(2008, Some("VIC"), 4.0),
                        row(2024, Some("NSW"), 5.0),
                        row(2024, Some("ACT"), 30.0),
                        row(2024, None, 99.0),
                    ],
                ),
                boundaries: None,
            },
            1,
        );
        chart
    }

    #[test]
    fn all_years_collapses_and_sorts_descending() {
        let mut chart = chart();
        let ChartView::Bar(view) = chart.view(&Selection::new()) else {
            panic!("expected bars");
        };
        let keys: Vec<&str> = view.bars.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["ACT", "NSW", "VIC"]);
        assert_eq!(view.bars[1].value, 15.0);
        assert_eq!(
            view.bars[1].tooltip[1],
            "15 positive tests (2008–2024 total)"
        );
        let kpi = view.kpi.expect("kpi");
        assert_eq!(kpi.scope, "Total 2008–2024");
        assert_eq!(kpi.extremes.total, 49.0);
        assert_eq!(kpi.extremes.lowest.key, "VIC");
    }

    #[test]
    fn single_year_slice() {
        let mut chart = chart();
        let mut sel = Selection::new();
        sel.select_year(Filter::Only(2008));
        let ChartView::Bar(view) = chart.view(&sel) else {
            panic!("expected bars");
        };
        assert_eq!(view.bars.len(), 2);
        assert_eq!(view.bars[0].tooltip[1], "10 positive tests in 2008");
        assert_eq!(view.kpi.map(|k| k.scope), Some("Year 2008".to_string()));
    }

    #[test]
    fn year_without_rows_is_empty() {
        let mut chart = chart();
        let mut sel = Selection::new();
        sel.select_year(Filter::Only(1999));
        let view = chart.view(&sel);
        assert!(view.is_empty());
        assert!(view.kpi_lines().is_empty());
    }
}
