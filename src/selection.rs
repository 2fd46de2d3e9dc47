//! Per-chart filter state.

use std::fmt;

use crate::cli::FilterArg;

/// One filter axis: everything, or exactly one value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Filter<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether `value` passes this filter.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(v) => v == value,
        }
    }

    pub fn only(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(v) => write!(f, "{}", v),
        }
    }
}

impl<T> From<FilterArg<T>> for Filter<T> {
    fn from(arg: FilterArg<T>) -> Self {
        match arg {
            FilterArg::All => Self::All,
            FilterArg::Only(v) => Self::Only(v),
        }
    }
}

/// The filter axes a chart can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Year,
    Category,
}

/// A requested change to one axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    Year(Filter<i32>),
    Category(Filter<String>),
}

impl SelectionChange {
    pub fn axis(&self) -> Axis {
        match self {
            Self::Year(_) => Axis::Year,
            Self::Category(_) => Axis::Category,
        }
    }
}

/// Independent year and category filters for one chart.
///
/// `revision` increases on every effective change and identifies the state a frame
/// was rendered against. Clones are snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    year: Filter<i32>,
    category: Filter<String>,
    revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(&self) -> &Filter<i32> {
        &self.year
    }

    pub fn category(&self) -> &Filter<String> {
        &self.category
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true when the year filter actually changed.
    pub fn select_year(&mut self, year: Filter<i32>) -> bool {
        if self.year == year {
            return false;
        }
        self.year = year;
        self.revision += 1;
        true
    }

    /// Returns true when the category filter actually changed.
    pub fn select_category(&mut self, category: Filter<String>) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category;
        self.revision += 1;
        true
    }

    pub fn apply(&mut self, change: SelectionChange) -> bool {
        match change {
            SelectionChange::Year(y) => self.select_year(y),
            SelectionChange::Category(c) => self.select_category(c),
        }
    }

    /// Back to `All` on both axes. The revision keeps counting so older frames stay stale.
    pub fn reset(&mut self) -> bool {
        let changed = !self.year.is_all() || !self.category.is_all();
        if changed {
            self.year = Filter::All;
            self.category = Filter::All;
            self.revision += 1;
        }
        changed
    }
}
