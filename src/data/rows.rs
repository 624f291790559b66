use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Attribute, AttributeSet, EntityKind, Value};
use crate::error::{FrameError, Result};

/// One materialized row: attribute name → cell.
pub type Row = BTreeMap<String, Value>;

/// Rows sharing one header instead of repeating keys per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactRows {
    pub header: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

/// Read-only row access over one entity kind.
///
/// Every index is bounds-checked against the set's row count; an index past the
/// end fails with [`FrameError::IndexOutOfRange`] rather than yielding a hole.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    set: &'a AttributeSet,
    kind: EntityKind,
}

impl<'a> RowView<'a> {
    pub fn new(set: &'a AttributeSet, kind: EntityKind) -> Self {
        Self { set, kind }
    }

    /// Row at `index`, restricted to `columns` when given.
    pub fn get_row_at(&self, index: usize, columns: Option<&[&str]>) -> Result<Row> {
        self.check_index(index)?;
        match columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    let attr = self.attribute(name)?;
                    Ok((name.to_string(), attr.values[index].clone()))
                })
                .collect(),
            None => Ok(self
                .set
                .attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.values[index].clone()))
                .collect()),
        }
    }

    /// One row per index, in caller order, duplicates included.
    pub fn get_rows(&self, indices: &[usize]) -> Result<Vec<Row>> {
        indices
            .iter()
            .map(|&index| self.get_row_at(index, None))
            .collect()
    }

    pub fn get_rows_compact(&self, indices: &[usize]) -> Result<CompactRows> {
        let header = self.get_attribute_keys();
        let columns: Vec<&Attribute> = self.set.attributes.values().collect();

        let values = indices
            .iter()
            .map(|&index| {
                self.check_index(index)?;
                Ok(columns.iter().map(|attr| attr.values[index].clone()).collect())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompactRows { header, values })
    }

    pub fn get_column(&self, name: &str) -> Result<&'a [Value]> {
        Ok(&self.attribute(name)?.values)
    }

    /// Attribute names in lexicographic order.
    pub fn get_attribute_keys(&self) -> Vec<String> {
        self.set.attributes.keys().cloned().collect()
    }

    fn attribute(&self, name: &str) -> Result<&'a Attribute> {
        self.set
            .attributes
            .get(name)
            .ok_or_else(|| FrameError::UnknownAttribute {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.set.num_elements;
        if index >= len {
            return Err(FrameError::IndexOutOfRange {
                kind: self.kind,
                index,
                len,
            });
        }
        Ok(())
    }
}
