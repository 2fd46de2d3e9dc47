mod common;

use rdtdash::aggregate::{
    aggregate_by, by_label, collapse, nest, percent_of_total, period_over_period, sorted_by_key,
    unwrap_single, KeyShape,
};
use rdtdash::charts::{self, ChartKind, ChartView};
use rdtdash::loader::{load, LoadOptions};
use rdtdash::schema::{Dimension, Measure, SourceSchema};
use rdtdash::selection::{Filter, Selection};
use rdtdash::SourceLocator;

fn positive_tests(dir: &std::path::Path) -> rdtdash::Dataset {
    load(
        &SourceLocator::Local(dir.join("police_enforcement_2024_positive_drug_tests.csv")),
        &SourceSchema::positive_tests(),
        &LoadOptions::default().with_metric("positive_drug_tests"),
    )
    .expect("load positive tests")
}

#[test]
fn test_mass_conservation_over_keyed_rows() {
    let (temp_dir, _) = common::sample_data_dir();
    let dataset = positive_tests(temp_dir.path());

    let shape = KeyShape::of(&[Dimension::Jurisdiction]);
    let totals = aggregate_by(dataset.rows(), &shape, Measure::Count);
    let expected: f64 = dataset
        .rows()
        .filter(|r| shape.key_for(r).is_some())
        .map(|r| r.count)
        .sum();
    let actual: f64 = totals.values().sum();
    assert!((actual - expected).abs() < 1e-9);
    // The row without a jurisdiction and the breath-test metric row are both excluded.
    assert!((actual - 2700.5).abs() < 1e-9);
}

#[test]
fn test_nest_then_collapse_matches_single_dimension() {
    let (temp_dir, _) = common::sample_data_dir();
    let dataset = positive_tests(temp_dir.path());

    let nested = nest(&aggregate_by(
        dataset.rows(),
        &KeyShape::of(&[Dimension::Year, Dimension::Jurisdiction]),
        Measure::Count,
    ));
    let collapsed = by_label(&collapse(&nested));
    let direct = by_label(&unwrap_single(&aggregate_by(
        dataset.rows(),
        &KeyShape::of(&[Dimension::Jurisdiction]),
        Measure::Count,
    )));
    assert_eq!(collapsed, direct);
}

#[test]
fn test_trend_series_and_deltas_from_file() {
    let (temp_dir, _) = common::sample_data_dir();
    let dataset = positive_tests(temp_dir.path());

    let series = sorted_by_key(&unwrap_single(&aggregate_by(
        dataset.rows(),
        &KeyShape::of(&[Dimension::Year]),
        Measure::Count,
    )));
    let values: Vec<f64> = series.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![800.0, 650.0, 1290.5]);

    let deltas = period_over_period(&values);
    assert!(deltas[0].is_none());
    let second = deltas[1].expect("second delta");
    assert_eq!(second.change, -150.0);
    assert_eq!(second.percent, Some(-18.75));
}

#[test]
fn test_percent_of_total_bounds() {
    let shares = percent_of_total(&[600.0, 200.0, 200.0]);
    assert!((shares.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    assert!(shares.iter().all(|s| (0.0..=100.0).contains(s)));
    assert_eq!(percent_of_total(&[0.0, 0.0]), vec![0.0, 0.0]);
}

#[test]
fn test_every_chart_view_from_sample_files() {
    let (_temp_dir, settings) = common::sample_data_dir();

    for kind in ChartKind::ALL {
        let mut chart = charts::build(kind, &settings);
        let data = chart.load_request().run().expect("load");
        chart.install(data, 1);
        let view = chart.view(&Selection::new());
        assert!(!view.is_empty(), "{} should have data", kind.as_str());
    }
}

#[test]
fn test_jurisdictions_year_filter_from_file() {
    let (_temp_dir, settings) = common::sample_data_dir();
    let mut chart = charts::build(ChartKind::Jurisdictions, &settings);
    let data = chart.load_request().run().expect("load");
    chart.install(data, 1);

    let all = chart.view(&Selection::new()).rows();
    assert_eq!(
        all,
        vec![
            ("QLD".to_string(), 1500.5),
            ("NSW".to_string(), 900.0),
            ("VIC".to_string(), 300.0),
        ]
    );

    let mut selection = Selection::new();
    selection.select_year(Filter::Only(2021));
    let view = chart.view(&selection);
    assert_eq!(view.rows()[0], ("NSW".to_string(), 400.0));
    assert_eq!(
        view.kpi_lines(),
        vec![
            "Highest: NSW (400)".to_string(),
            "Lowest: VIC (0)".to_string(),
            "Year 2021: 650".to_string(),
        ]
    );

    selection.select_year(Filter::Only(1999));
    assert!(chart.view(&selection).is_empty());
}

#[test]
fn test_trend_sums_every_metric_but_jurisdictions_do_not() {
    let (_temp_dir, settings) = common::sample_data_dir();

    let mut trend = charts::build(ChartKind::Trend, &settings);
    let data = trend.load_request().run().expect("load");
    trend.install(data, 1);
    let ChartView::Line(view) = trend.view(&Selection::new()) else {
        panic!("expected a line view");
    };
    let values: Vec<(i32, f64)> = view.points.iter().map(|p| (p.year, p.value)).collect();
    // 2020 includes the 9000 breath-test row
    assert_eq!(values, vec![(2020, 9800.0), (2021, 650.0), (2022, 1290.5)]);

    let mut jurisdictions = charts::build(ChartKind::Jurisdictions, &settings);
    let data = jurisdictions.load_request().run().expect("load");
    jurisdictions.install(data, 1);
    let mut selection = Selection::new();
    selection.select_year(Filter::Only(2020));
    assert_eq!(
        jurisdictions.view(&selection).rows(),
        vec![("NSW".to_string(), 500.0), ("VIC".to_string(), 300.0)]
    );
}

#[test]
fn test_state_map_with_unmapped_region() {
    let (_temp_dir, settings) = common::sample_data_dir();
    let mut chart = charts::build(ChartKind::StateMap, &settings);
    let data = chart.load_request().run().expect("load");
    chart.install(data, 1);

    let ChartView::Choropleth(view) = chart.view(&Selection::new()) else {
        panic!("expected a map");
    };
    let codes: Vec<(&str, f64)> = view
        .regions
        .iter()
        .map(|r| (r.code.as_str(), r.value))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("NSW", 5000.0),
            ("VIC", 1000.0),
            ("TAS", 0.0),
            ("Other Territories", 0.0),
        ]
    );
    assert_eq!(view.color_max, 5000.0);
    assert_eq!(view.period, "2022–2023");
}
