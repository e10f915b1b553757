use std::collections::BTreeMap;
use tracing::debug;

use super::baseline::BaselineScalars;
use super::catalog::{BaselineScalar, Input, Quantity};
use super::formulas::{self, RowInputs};
use crate::domain::{Dataset, Tag};

/// Computed columns of one evaluation pass, keyed by quantity.
///
/// Owned by a single [`RowEvaluator`]; never shared between requests.
#[derive(Debug, Default, Clone)]
pub struct ColumnCache {
    columns: BTreeMap<Quantity, Vec<f64>>,
    computations: BTreeMap<Quantity, usize>,
}

impl ColumnCache {
    pub fn contains(&self, quantity: Quantity) -> bool {
        self.columns.contains_key(&quantity)
    }

    pub fn column(&self, quantity: Quantity) -> Option<&[f64]> {
        self.columns.get(&quantity).map(Vec::as_slice)
    }

    /// How many times the column for `quantity` has been computed
    pub fn computations(&self, quantity: Quantity) -> usize {
        self.computations.get(&quantity).copied().unwrap_or(0)
    }

    pub fn total_computations(&self) -> usize {
        self.computations.values().sum()
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.columns.keys().copied()
    }

    fn insert(&mut self, quantity: Quantity, values: Vec<f64>) {
        *self.computations.entry(quantity).or_default() += 1;
        self.columns.insert(quantity, values);
    }
}

/// Evaluates catalog quantities over every row of a dataset.
///
/// Dependencies are resolved depth-first and each column is computed once;
/// asking again for a resolved quantity only reads the cache.
pub struct RowEvaluator<'a> {
    dataset: &'a Dataset,
    baseline: Option<&'a BaselineScalars>,
    cache: ColumnCache,
}

impl<'a> RowEvaluator<'a> {
    /// Evaluator for `dataset`. Without baseline scalars, normalized outputs
    /// degrade to zero.
    pub fn new(dataset: &'a Dataset, baseline: Option<&'a BaselineScalars>) -> Self {
        Self {
            dataset,
            baseline,
            cache: ColumnCache::default(),
        }
    }

    /// Resolve `quantity` and its dependencies, returning its column
    pub fn evaluate(&mut self, quantity: Quantity) -> &[f64] {
        self.resolve(quantity);
        self.cache.column(quantity).unwrap_or_default()
    }

    fn resolve(&mut self, quantity: Quantity) {
        if self.cache.contains(quantity) {
            return;
        }
        for input in quantity.dependencies() {
            if let Input::Quantity(dependency) = input {
                self.resolve(*dependency);
            }
        }

        let values: Vec<f64> = (0..self.dataset.len())
            .map(|row| {
                let inputs = RowContext {
                    dataset: self.dataset,
                    cache: &self.cache,
                    baseline: self.baseline,
                    row,
                };
                formulas::evaluate(quantity, &inputs)
            })
            .collect();
        debug!(quantity = %quantity, rows = values.len(), "computed column");
        self.cache.insert(quantity, values);
    }

    /// Value of an already resolved quantity at `row`
    pub fn value(&self, quantity: Quantity, row: usize) -> Option<f64> {
        self.cache.column(quantity).and_then(|c| c.get(row)).copied()
    }

    pub fn cache(&self) -> &ColumnCache {
        &self.cache
    }

    pub fn into_cache(self) -> ColumnCache {
        self.cache
    }
}

struct RowContext<'c> {
    dataset: &'c Dataset,
    cache: &'c ColumnCache,
    baseline: Option<&'c BaselineScalars>,
    row: usize,
}

impl RowInputs for RowContext<'_> {
    fn tag(&self, tag: Tag) -> Option<f64> {
        self.dataset.value(tag.name(), self.row)
    }

    fn quantity(&self, quantity: Quantity) -> Option<f64> {
        self.cache
            .column(quantity)
            .and_then(|c| c.get(self.row))
            .copied()
    }

    fn baseline(&self, scalar: BaselineScalar) -> Option<f64> {
        self.baseline.and_then(|b| b.get(scalar))
    }
}
