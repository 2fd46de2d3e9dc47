//! Declared record shape for the dashboard sources.
//!
//! Each source declares which header column feeds which row field and whether the
//! column must be present. The loader validates the header against this once, so
//! aggregation never probes column names at query time.

use std::fmt;

pub const COL_YEAR: &str = "YEAR";
pub const COL_COUNT: &str = "COUNT";
pub const COL_METRIC: &str = "METRIC";
pub const COL_JURISDICTION: &str = "JURISDICTION";
pub const COL_DETECTION_METHOD: &str = "DETECTION_METHOD";
pub const COL_AGE_GROUP: &str = "AGE_GROUP";
pub const COL_SUM_COUNT: &str = "Sum(COUNT)";
pub const COL_SUM_FINES: &str = "Sum(FINES)";
pub const COL_SUM_ARRESTS: &str = "Sum(ARRESTS)";
pub const COL_SUM_CHARGES: &str = "Sum(CHARGES)";

/// Metric value kept by the positive-test charts when a source carries `METRIC`.
pub const POSITIVE_DRUG_TESTS: &str = "positive_drug_tests";

/// Categorical row fields usable as aggregation key components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Year,
    Jurisdiction,
    DetectionMethod,
    AgeGroup,
    Metric,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Jurisdiction => "jurisdiction",
            Self::DetectionMethod => "detection_method",
            Self::AgeGroup => "age_group",
            Self::Metric => "metric",
        }
    }
}

/// Numeric row fields that can be summed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Measure {
    Count,
    Fines,
    Arrests,
    Charges,
}

impl Measure {
    pub const ACTIONS: [Self; 3] = [Self::Fines, Self::Arrests, Self::Charges];

    pub fn label(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Fines => "Fines",
            Self::Arrests => "Arrests",
            Self::Charges => "Charges",
        }
    }
}

/// Row field a source column is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Dimension(Dimension),
    Measure(Measure),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Dimension(d) => f.write_str(d.as_str()),
            Field::Measure(m) => f.write_str(m.label()),
        }
    }
}

/// One column binding in a source schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: String,
    pub field: Field,
    pub required: bool,
}

/// Column bindings for one delimited source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceSchema {
    columns: Vec<ColumnSpec>,
}

impl SourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, column: &str, field: Field) -> Self {
        self.columns.push(ColumnSpec {
            column: column.to_string(),
            field,
            required: true,
        });
        self
    }

    pub fn optional(mut self, column: &str, field: Field) -> Self {
        self.columns.push(ColumnSpec {
            column: column.to_string(),
            field,
            required: false,
        });
        self
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Required columns absent from `header`, in declaration order.
    pub fn missing_required<'a>(&'a self, header: &[String]) -> Vec<&'a str> {
        self.columns
            .iter()
            .filter(|c| c.required && !header.iter().any(|h| h == &c.column))
            .map(|c| c.column.as_str())
            .collect()
    }

    /// Raw police enforcement extract: YEAR, JURISDICTION, METRIC, COUNT.
    pub fn positive_tests() -> Self {
        Self::new()
            .required(COL_YEAR, Field::Dimension(Dimension::Year))
            .required(COL_COUNT, Field::Measure(Measure::Count))
            .optional(COL_JURISDICTION, Field::Dimension(Dimension::Jurisdiction))
            .optional(COL_METRIC, Field::Dimension(Dimension::Metric))
    }

    /// Pre-aggregated counts per detection stage.
    pub fn detection_stages() -> Self {
        Self::new()
            .required(
                COL_DETECTION_METHOD,
                Field::Dimension(Dimension::DetectionMethod),
            )
            .required(COL_SUM_COUNT, Field::Measure(Measure::Count))
    }

    /// Pre-aggregated fines, arrests and charges per jurisdiction.
    pub fn enforcement_actions() -> Self {
        Self::new()
            .required(COL_JURISDICTION, Field::Dimension(Dimension::Jurisdiction))
            .optional(COL_SUM_FINES, Field::Measure(Measure::Fines))
            .optional(COL_SUM_ARRESTS, Field::Measure(Measure::Arrests))
            .optional(COL_SUM_CHARGES, Field::Measure(Measure::Charges))
            .optional(COL_YEAR, Field::Dimension(Dimension::Year))
    }

    /// Pre-aggregated positive counts per age group.
    pub fn age_groups() -> Self {
        Self::new()
            .required(COL_AGE_GROUP, Field::Dimension(Dimension::AgeGroup))
            .required(COL_SUM_COUNT, Field::Measure(Measure::Count))
            .optional(COL_YEAR, Field::Dimension(Dimension::Year))
    }

    /// Pre-aggregated positive counts per year and state.
    pub fn state_totals() -> Self {
        Self::new()
            .required(COL_YEAR, Field::Dimension(Dimension::Year))
            .required(COL_JURISDICTION, Field::Dimension(Dimension::Jurisdiction))
            .required(COL_SUM_COUNT, Field::Measure(Measure::Count))
    }
}

/// One observation, typed once at load time.
///
/// Key fields are `None` when the column is absent, blank, or (for `year`) not an
/// integer; such rows drop out of any aggregation keyed on that field. Measures
/// that fail to parse are stored as `0.0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub year: Option<i32>,
    pub jurisdiction: Option<String>,
    pub detection_method: Option<String>,
    pub age_group: Option<String>,
    pub metric: Option<String>,
    pub count: f64,
    pub fines: f64,
    pub arrests: f64,
    pub charges: f64,
}

impl Row {
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Count => self.count,
            Measure::Fines => self.fines,
            Measure::Arrests => self.arrests,
            Measure::Charges => self.charges,
        }
    }

    pub fn label(&self, dim: Dimension) -> Option<&str> {
        match dim {
            Dimension::Year => None,
            Dimension::Jurisdiction => self.jurisdiction.as_deref(),
            Dimension::DetectionMethod => self.detection_method.as_deref(),
            Dimension::AgeGroup => self.age_group.as_deref(),
            Dimension::Metric => self.metric.as_deref(),
        }
    }

    /// Assign a raw cell to `field`, applying the coercion rules.
    pub(crate) fn set(&mut self, field: Field, raw: Option<&str>) {
        let text = raw.map(str::trim).filter(|s| !s.is_empty());
        match field {
            Field::Dimension(Dimension::Year) => self.year = text.and_then(parse_year),
            Field::Dimension(Dimension::Jurisdiction) => {
                self.jurisdiction = text.map(str::to_string)
            }
            Field::Dimension(Dimension::DetectionMethod) => {
                self.detection_method = text.map(str::to_string)
            }
            Field::Dimension(Dimension::AgeGroup) => self.age_group = text.map(str::to_string),
            Field::Dimension(Dimension::Metric) => self.metric = text.map(str::to_string),
            Field::Measure(m) => {
                let v = text.map(parse_measure).unwrap_or(0.0);
                match m {
                    Measure::Count => self.count = v,
                    Measure::Fines => self.fines = v,
                    Measure::Arrests => self.arrests = v,
                    Measure::Charges => self.charges = v,
                }
            }
        }
    }
}

/// Years must be whole numbers; "2020.0" is accepted, "2020.5" and "N/A" are not.
fn parse_year(s: &str) -> Option<i32> {
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Measures are non-negative counts. Non-numeric, non-finite and negative values
/// contribute nothing. Thousands separators are tolerated.
fn parse_measure(s: &str) -> f64 {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_coercion() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year("2020.0"), Some(2020));
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year("N/A"), None);
    }

    #[test]
    fn measure_coercion() {
        assert_eq!(parse_measure("12"), 12.0);
        assert_eq!(parse_measure("1,234"), 1234.0);
        assert_eq!(parse_measure("N/A"), 0.0);
        assert_eq!(parse_measure("NaN"), 0.0);
        assert_eq!(parse_measure("inf"), 0.0);
        assert_eq!(parse_measure("-40"), 0.0);
        assert_eq!(parse_measure("0"), 0.0);
    }

    #[test]
    fn set_blank_key_is_absent() {
        let mut row = Row::default();
        row.set(Field::Dimension(Dimension::Jurisdiction), Some("  "));
        row.set(Field::Dimension(Dimension::Year), Some(""));
        row.set(Field::Measure(Measure::Count), None);
        assert_eq!(row.jurisdiction, None);
        assert_eq!(row.year, None);
        assert_eq!(row.count, 0.0);
    }

    #[test]
    fn missing_required_columns() {
        let header = vec!["YEAR".to_string(), "METRIC".to_string()];
        let schema = SourceSchema::positive_tests();
        assert_eq!(schema.missing_required(&header), vec![COL_COUNT]);
    }
}
