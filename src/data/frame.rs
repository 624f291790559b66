use std::collections::BTreeMap;

use super::filter::filtered_set;
use super::loader::{LoadOutcome, load_into};
use super::model::{ColumnBatch, EntityKind, Store, Value};
use super::rows::{CompactRows, Row, RowView};
use crate::aggregate::{AggregateMode, Aggregator, BinningHints, Summary};
use crate::config::FrameConfig;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Dataframe
// ---------------------------------------------------------------------------

/// Point and edge attribute store with a raw view and an optional filtered view.
///
/// `load` always writes the raw view. Every read goes through the active
/// view: the filtered one when installed, the raw one otherwise. Mutation takes
/// `&mut self`, so no read can observe a half-applied load or view swap; readers
/// that must outlive a later load hold a [`Store`] snapshot instead.
#[derive(Debug, Clone, Default)]
pub struct Dataframe {
    config: FrameConfig,
    raw: Store,
    filtered: Option<Store>,
}

impl Dataframe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    // -- Loading --

    /// Merge `columns` into the raw `kind` attributes. See [`load_into`].
    pub fn load(&mut self, columns: ColumnBatch, kind: EntityKind) -> Result<LoadOutcome> {
        load_into(self.raw.set_mut(kind), columns, kind, &self.config.load)
    }

    // -- Views --

    pub fn raw(&self) -> &Store {
        &self.raw
    }

    pub fn active(&self) -> &Store {
        self.filtered.as_ref().unwrap_or(&self.raw)
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered.is_some()
    }

    /// Cheap copy of the active view, unaffected by later loads.
    pub fn snapshot(&self) -> Store {
        self.active().clone()
    }

    /// Make the raw rows at `indices` the active `kind` rows. The other kind is
    /// shared with the raw view.
    pub fn apply_filter(&mut self, kind: EntityKind, indices: &[usize]) -> Result<()> {
        let set = filtered_set(self.raw.set(kind), kind, indices)?;
        let mut view = self.raw.clone();
        view.replace_set(kind, set);
        log::debug!("filtered {kind} view: {} of {} rows", indices.len(), self.raw.num_elements(kind));
        self.filtered = Some(view);
        Ok(())
    }

    /// Install `view` as the active view, returning the previously active one.
    pub fn swap_view(&mut self, view: Store) -> Store {
        let previous = self.filtered.replace(view);
        previous.unwrap_or_else(|| self.raw.clone())
    }

    /// Drop the filtered view; reads go back to the raw rows.
    pub fn reset_view(&mut self) -> Option<Store> {
        self.filtered.take()
    }

    // -- Reads --

    pub fn num_elements(&self, kind: EntityKind) -> usize {
        self.active().num_elements(kind)
    }

    pub fn rows(&self, kind: EntityKind) -> RowView<'_> {
        RowView::new(self.active().set(kind), kind)
    }

    pub fn aggregator(&self, kind: EntityKind) -> Aggregator<'_> {
        Aggregator::new(self.active().set(kind), kind, &self.config.aggregation)
    }

    pub fn get_row_at(&self, index: usize, kind: EntityKind, columns: Option<&[&str]>) -> Result<Row> {
        self.rows(kind).get_row_at(index, columns)
    }

    pub fn get_rows(&self, indices: &[usize], kind: EntityKind) -> Result<Vec<Row>> {
        self.rows(kind).get_rows(indices)
    }

    pub fn get_rows_compact(&self, indices: &[usize], kind: EntityKind) -> Result<CompactRows> {
        self.rows(kind).get_rows_compact(indices)
    }

    pub fn get_column(&self, name: &str, kind: EntityKind) -> Result<&[Value]> {
        self.rows(kind).get_column(name)
    }

    pub fn get_attribute_keys(&self, kind: EntityKind) -> Vec<String> {
        self.rows(kind).get_attribute_keys()
    }

    pub fn aggregate(
        &self,
        indices: &[usize],
        attributes: Option<&[&str]>,
        hints: Option<&BinningHints>,
        mode: AggregateMode,
        kind: EntityKind,
    ) -> Result<BTreeMap<String, Summary>> {
        self.aggregator(kind).aggregate(indices, attributes, hints, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Attribute, DataType};

    fn scores(values: &[i64]) -> ColumnBatch {
        let mut columns = ColumnBatch::new();
        columns.insert(
            "score".into(),
            Attribute::new(DataType::Number, values.iter().map(|v| Value::Integer(*v)).collect()),
        );
        columns
    }

    #[test]
    fn kinds_are_independent() {
        let mut df = Dataframe::new();
        df.load(scores(&[1, 2, 3]), EntityKind::Point).unwrap();
        assert_eq!(df.num_elements(EntityKind::Point), 3);
        assert_eq!(df.num_elements(EntityKind::Edge), 0);
        assert!(df.get_attribute_keys(EntityKind::Edge).is_empty());
    }

    #[test]
    fn filtered_view_and_reset() {
        let mut df = Dataframe::new();
        df.load(scores(&[10, 20, 30]), EntityKind::Point).unwrap();
        df.load(scores(&[7]), EntityKind::Edge).unwrap();

        df.apply_filter(EntityKind::Point, &[2]).unwrap();
        assert!(df.is_filtered());
        assert_eq!(df.num_elements(EntityKind::Point), 1);
        assert_eq!(df.get_column("score", EntityKind::Point).unwrap(), [Value::Integer(30)]);
        assert!(df.active().shares_set(df.raw(), EntityKind::Edge));

        df.reset_view();
        assert_eq!(df.num_elements(EntityKind::Point), 3);
    }

    #[test]
    fn loads_write_raw_and_leave_filtered_view_alone() {
        let mut df = Dataframe::new();
        df.load(scores(&[1, 2]), EntityKind::Point).unwrap();
        df.apply_filter(EntityKind::Point, &[0]).unwrap();

        df.load(scores(&[5, 6]), EntityKind::Point).unwrap();
        assert_eq!(df.get_column("score", EntityKind::Point).unwrap(), [Value::Integer(1)]);
        assert_eq!(
            df.raw().set(EntityKind::Point).get("score").unwrap().values,
            vec![Value::Integer(5), Value::Integer(6)]
        );
    }

    #[test]
    fn snapshots_survive_later_loads() {
        let mut df = Dataframe::new();
        df.load(scores(&[1, 2]), EntityKind::Point).unwrap();
        let before = df.snapshot();
        df.load(scores(&[3, 4]), EntityKind::Point).unwrap();

        let old = before.set(EntityKind::Point).get("score").unwrap();
        assert_eq!(old.values, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn swap_view_returns_previous_active() {
        let mut df = Dataframe::new();
        df.load(scores(&[1, 2]), EntityKind::Point).unwrap();
        let raw = df.snapshot();

        let mut narrowed = raw.clone();
        narrowed.replace_set(EntityKind::Point, Default::default());
        let previous = df.swap_view(narrowed);
        assert_eq!(previous, raw);
        assert_eq!(df.num_elements(EntityKind::Point), 0);
    }

    #[test]
    fn aggregate_reads_active_view() {
        let mut df = Dataframe::new();
        df.load(scores(&[1, 2, 3, 4]), EntityKind::Point).unwrap();
        df.apply_filter(EntityKind::Point, &[0, 1]).unwrap();
        let out = df
            .aggregate(&[0, 1], None, None, AggregateMode::CountBy, EntityKind::Point)
            .unwrap();
        assert_eq!(out["score"].as_count_by().unwrap().num_values, 2);
        assert!(df
            .aggregate(&[2], None, None, AggregateMode::CountBy, EntityKind::Point)
            .is_err());
    }
}
