use std::collections::BTreeSet;

use crate::aggregate::{by_label, unwrap_single, Totals};
use crate::format::format_number;
use crate::schema::{Dimension, Measure, SourceSchema};
use crate::selection::{Axis, Selection};

use super::{
    BarGroup, Chart, ChartData, ChartKind, ChartView, Datum, GroupedBarView, LoadRequest,
    LoadedData, SourceRequest, SourceSettings,
};

/// Jurisdictions in display order. Others follow alphabetically.
pub const JURISDICTION_ORDER: [&str; 8] = ["NSW", "QLD", "WA", "SA", "VIC", "TAS", "NT", "ACT"];

/// Fines, arrests and charges per jurisdiction.
#[derive(Debug)]
pub struct EnforcementChart {
    request: SourceRequest,
    data: ChartData,
}

impl EnforcementChart {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            request: settings.table(
                &settings.enforcement_actions,
                SourceSchema::enforcement_actions(),
                false,
            ),
            data: ChartData::default(),
        }
    }

    fn action_totals(&mut self, measure: Measure) -> Option<Totals<String>> {
        self.data
            .totals(&[Dimension::Jurisdiction], measure)
            .map(|t| by_label(&unwrap_single(t)))
    }
}

/// Fixed order first, then anything else alphabetically.
fn ordered_jurisdictions<'a>(present: impl Iterator<Item = &'a String>) -> Vec<String> {
    let present: BTreeSet<&String> = present.collect();
    let mut out: Vec<String> = JURISDICTION_ORDER
        .iter()
        .filter(|j| present.iter().any(|p| p.as_str() == **j))
        .map(|j| j.to_string())
        .collect();
    out.extend(
        present
            .into_iter()
            .filter(|p| !JURISDICTION_ORDER.contains(&p.as_str()))
            .cloned(),
    );
    out
}

impl Chart for EnforcementChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Enforcement
    }

    fn title(&self) -> &'static str {
        "Enforcement actions by jurisdiction"
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

    fn view(&mut self, selection: &Selection) -> ChartView {
        let mut view = GroupedBarView {
            y_label: "Actions".to_string(),
            ..GroupedBarView::default()
        };
        let mut per_action = Vec::with_capacity(Measure::ACTIONS.len());
        for measure in Measure::ACTIONS {
            match self.action_totals(measure) {
                Some(totals) => per_action.push((measure, totals)),
                None => return ChartView::GroupedBar(view),
            }
        }

        let series: Vec<String> =
            ordered_jurisdictions(per_action.iter().flat_map(|(_, t)| t.keys()))
                .into_iter()
                .filter(|j| selection.category().matches(j))
                .collect();
        if series.is_empty() {
            return ChartView::GroupedBar(view);
        }

        view.groups = per_action
            .iter()
            .map(|(measure, totals)| BarGroup {
                label: measure.label().to_string(),
                bars: series
                    .iter()
                    .map(|j| {
                        let value = totals.get(j).copied().unwrap_or(0.0);
                        Datum {
                            key: j.clone(),
                            value,
                            tooltip: vec![
                                format!("{} – {}", j, measure.label()),
                                format!("{} enforcement actions", format_number(value)),
                            ],
                        }
                    })
                    .collect(),
            })
            .collect();
        view.series = series;
        ChartView::GroupedBar(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::schema::Row;
    use crate::selection::Filter;

    fn row(juris: &str, fines: f64, arrests: f64, charges: f64) -> Row {
        Row {
            jurisdiction: Some(juris.to_string()),
            fines,
            arrests,
            charges,
            ..Row::default()
        }
    }

    fn chart() -> EnforcementChart {
        let mut chart = EnforcementChart::new(&SourceSettings::default());
        chart.install(
            LoadedData {
                table: Dataset::from_rows(
                    "mem",
                    vec![
                        row("VIC", 5.0, 1.0, 2.0),
                        row("NSW", 10.0, 0.0, 3.0),
                        row("JBT", 1.0, 1.0, 1.0),
                        row("NSW", 2.0, 4.0, 0.0),
                    ],
                ),
                boundaries: None,
            },
            1,
        );
        chart
    }

    #[test]
    fn groups_are_actions_in_fixed_jurisdiction_order() {
        let mut chart = chart();
        let ChartView::GroupedBar(view) = chart.view(&Selection::new()) else {
            panic!("expected grouped bars");
        };
        assert_eq!(view.series, vec!["NSW", "VIC", "JBT"]);
        let labels: Vec<&str> = view.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Fines", "Arrests", "Charges"]);
        assert_eq!(view.groups[0].bars[0].value, 12.0);
        assert_eq!(view.groups[1].bars[0].value, 4.0);
        assert_eq!(
            view.groups[0].bars[0].tooltip,
            vec!["NSW – Fines".to_string(), "12 enforcement actions".to_string()]
        );
    }

    #[test]
    fn category_filter_keeps_one_jurisdiction() {
        let mut chart = chart();
        let mut sel = Selection::new();
        sel.select_category(Filter::Only("VIC".to_string()));
        let view = chart.view(&sel);
        assert_eq!(view.marks(), 3);
        sel.select_category(Filter::Only("WA".to_string()));
        assert!(chart.view(&sel).is_empty());
    }
}
