//! Grouping and summation over rows, plus the derived queries the charts annotate with.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::schema::{Dimension, Measure, Row};

/// One component of an aggregation key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Year(i32),
    Label(String),
}

impl KeyPart {
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Year(y) => Some(*y),
            Self::Label(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Year(y) => y.to_string(),
            Self::Label(s) => s.clone(),
        }
    }
}

/// Ordered tuple of dimension values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey(pub Vec<KeyPart>);

/// The dimensions an [`AggregationKey`] is built from, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyShape(pub Vec<Dimension>);

impl KeyShape {
    pub fn of(dims: &[Dimension]) -> Self {
        Self(dims.to_vec())
    }

    /// Key for `row`, or `None` when any component is absent.
    pub fn key_for(&self, row: &Row) -> Option<AggregationKey> {
        self.0
            .iter()
            .map(|dim| match dim {
                Dimension::Year => row.year.map(KeyPart::Year),
                other => row.label(*other).map(|s| KeyPart::Label(s.to_string())),
            })
            .collect::<Option<Vec<_>>>()
            .map(AggregationKey)
    }
}

/// Grouped totals. Iteration order is unspecified; use the sorting helpers.
pub type Totals<K> = HashMap<K, f64>;

/// Sum `measure_fn` over `rows`, grouped by `key_fn`. Rows with no key are skipped.
pub fn aggregate<'a, R, K, KF, MF>(rows: R, key_fn: KF, measure_fn: MF) -> Totals<K>
where
    R: IntoIterator<Item = &'a Row>,
    K: Eq + Hash,
    KF: Fn(&Row) -> Option<K>,
    MF: Fn(&Row) -> f64,
{
    let mut totals = Totals::new();
    for row in rows {
        if let Some(key) = key_fn(row) {
            *totals.entry(key).or_insert(0.0) += measure_fn(row);
        }
    }
    totals
}

/// [`aggregate`] with a declared key shape and measure.
pub fn aggregate_by<'a, R>(rows: R, shape: &KeyShape, measure: Measure) -> Totals<AggregationKey>
where
    R: IntoIterator<Item = &'a Row>,
{
    aggregate(rows, |r| shape.key_for(r), |r| r.measure(measure))
}

/// Split two-component keys into `outer -> inner -> total`.
pub fn nest(totals: &Totals<AggregationKey>) -> HashMap<KeyPart, Totals<KeyPart>> {
    let mut nested: HashMap<KeyPart, Totals<KeyPart>> = HashMap::new();
    for (key, value) in totals {
        if let [outer, inner] = key.0.as_slice() {
            *nested
                .entry(outer.clone())
                .or_default()
                .entry(inner.clone())
                .or_insert(0.0) += value;
        }
    }
    nested
}

/// Sum the inner maps of a nested aggregate across every outer key.
pub fn collapse<K, I>(nested: &HashMap<K, Totals<I>>) -> Totals<I>
where
    I: Eq + Hash + Clone,
{
    let mut totals = Totals::new();
    for inner in nested.values() {
        for (key, value) in inner {
            *totals.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    totals
}

/// Unwrap one-component keys; keys of any other length are skipped.
pub fn unwrap_single(totals: &Totals<AggregationKey>) -> Totals<KeyPart> {
    totals
        .iter()
        .filter_map(|(k, v)| match k.0.as_slice() {
            [part] => Some((part.clone(), *v)),
            _ => None,
        })
        .collect()
}

/// Re-key by display label.
pub fn by_label(totals: &Totals<KeyPart>) -> Totals<String> {
    let mut out = Totals::new();
    for (k, v) in totals {
        *out.entry(k.label()).or_insert(0.0) += v;
    }
    out
}

/// A key/value pair ready for a scale domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<K> {
    pub key: K,
    pub value: f64,
}

/// Ascending by key (time series).
pub fn sorted_by_key<K: Ord + Clone>(totals: &Totals<K>) -> Vec<Entry<K>> {
    let mut entries: Vec<Entry<K>> = totals
        .iter()
        .map(|(k, v)| Entry {
            key: k.clone(),
            value: *v,
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

/// Descending by value, ties broken by ascending key so output is deterministic.
pub fn sorted_by_value_desc<K: Ord + Clone>(totals: &Totals<K>) -> Vec<Entry<K>> {
    let mut entries: Vec<Entry<K>> = totals
        .iter()
        .map(|(k, v)| Entry {
            key: k.clone(),
            value: *v,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    entries
}

/// Order entries by position in `order`; keys not listed follow, ascending.
pub fn sorted_by_domain<K: Ord + Clone>(totals: &Totals<K>, order: &[K]) -> Vec<Entry<K>> {
    let rank = |k: &K| order.iter().position(|o| o == k).unwrap_or(order.len());
    let mut entries = sorted_by_key(totals);
    entries.sort_by(|a, b| rank(&a.key).cmp(&rank(&b.key)).then_with(|| a.key.cmp(&b.key)));
    entries
}

/// Share of each value in the sum of all values, in percent. Zero sum gives zero shares.
///
/// Negative values count as 0, so every share stays within `[0, 100]`.
pub fn percent_of_total(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    values
        .iter()
        .map(|v| {
            if total > 0.0 {
                v.max(0.0) / total * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Change from the previous period.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    pub change: f64,
    /// Percent change; absent when the previous value is not positive.
    pub percent: Option<f64>,
}

/// Deltas over a series already sorted by period. The first period has none.
pub fn period_over_period(values: &[f64]) -> Vec<Option<Delta>> {
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = values[i - 1];
        let change = value - prev;
        let percent = if prev > 0.0 {
            Some(change / prev * 100.0)
        } else {
            None
        };
        out.push(Some(Delta { change, percent }));
    }
    out
}

/// Highest, lowest and total of a result set.
#[derive(Clone, Debug, PartialEq)]
pub struct Extremes<K> {
    pub highest: Entry<K>,
    pub lowest: Entry<K>,
    pub total: f64,
}

/// KPI summary; `None` for an empty set.
pub fn extremes<K: Ord + Clone>(totals: &Totals<K>) -> Option<Extremes<K>> {
    let sorted = sorted_by_value_desc(totals);
    let highest = sorted.first()?.clone();
    let lowest = sorted.last()?.clone();
    let total = sorted.iter().map(|e| e.value).sum();
    Some(Extremes {
        highest,
        lowest,
        total,
    })
}
