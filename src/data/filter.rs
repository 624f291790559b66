use std::collections::{BTreeMap, BTreeSet};

use super::model::{Attribute, AttributeSet, EntityKind, Value};
use crate::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// Columns absent from the map are unconstrained.
pub type FilterState = BTreeMap<String, BTreeSet<Value>>;

/// Return indices of rows that pass all filters.
///
/// A row passes a column filter when:
/// * The filter set for that column is empty → nothing selected → fails
/// * The row's value for that column is in the selected set → passes
/// * The column does not exist → passes only if `Null` is selected
pub fn matching_indices(set: &AttributeSet, filters: &FilterState) -> Vec<usize> {
    let constraints: Vec<(Option<&Attribute>, &BTreeSet<Value>)> = filters
        .iter()
        .map(|(col, selected)| (set.get(col), selected))
        .collect();

    (0..set.num_elements())
        .filter(|&row| {
            constraints.iter().all(|(column, selected)| match column {
                Some(attr) => selected.contains(&attr.values[row]),
                None => selected.contains(&Value::Null),
            })
        })
        .collect()
}

/// Distinct stored values of `attr` that render as `label`.
///
/// Dates compare on their timestamp, so a calendar-day label selects every
/// timestamp that falls on that day.
pub fn values_labelled(attr: &Attribute, label: &str) -> BTreeSet<Value> {
    attr.values
        .iter()
        .filter(|value| value.label() == label)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Filtered views
// ---------------------------------------------------------------------------

/// Copy the rows at `indices` (in order) into a new attribute set.
pub fn filtered_set(set: &AttributeSet, kind: EntityKind, indices: &[usize]) -> Result<AttributeSet> {
    let len = set.num_elements();
    if let Some(&index) = indices.iter().find(|&&i| i >= len) {
        return Err(FrameError::IndexOutOfRange { kind, index, len });
    }

    let attributes = set
        .attributes()
        .iter()
        .map(|(name, attr)| {
            let values = indices.iter().map(|&i| attr.values[i].clone()).collect();
            (name.clone(), Attribute::new(attr.data_type, values))
        })
        .collect();

    Ok(AttributeSet {
        attributes,
        num_elements: indices.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadConfig;
    use crate::data::loader::load_into;
    use crate::data::model::{ColumnBatch, DataType};

    fn hosts() -> AttributeSet {
        let mut columns = ColumnBatch::new();
        columns.insert(
            "os".into(),
            Attribute::new(DataType::String, ["linux", "mac", "linux", "win"].map(Value::from).to_vec()),
        );
        columns.insert(
            "port".into(),
            Attribute::new(DataType::Number, [22, 443, 80, 443].map(Value::Integer).to_vec()),
        );
        let mut set = AttributeSet::default();
        load_into(&mut set, columns, EntityKind::Point, &LoadConfig::default()).unwrap();
        set
    }

    #[test]
    fn no_filters_selects_everything() {
        assert_eq!(matching_indices(&hosts(), &FilterState::new()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn filters_intersect_across_columns() {
        let mut filters = FilterState::new();
        filters.insert("os".into(), BTreeSet::from([Value::from("linux"), Value::from("win")]));
        filters.insert("port".into(), BTreeSet::from([Value::Integer(443), Value::Integer(80)]));
        assert_eq!(matching_indices(&hosts(), &filters), vec![2, 3]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let mut filters = FilterState::new();
        filters.insert("os".into(), BTreeSet::new());
        assert!(matching_indices(&hosts(), &filters).is_empty());
    }

    #[test]
    fn missing_column_matches_only_null() {
        let mut filters = FilterState::new();
        filters.insert("owner".into(), BTreeSet::from([Value::from("bob")]));
        assert!(matching_indices(&hosts(), &filters).is_empty());
        filters.insert("owner".into(), BTreeSet::from([Value::Null]));
        assert_eq!(matching_indices(&hosts(), &filters).len(), 4);
    }

    #[test]
    fn date_labels_select_every_timestamp_of_the_day() {
        let mut columns = ColumnBatch::new();
        let day = 86_400_000;
        columns.insert(
            "seenDate".into(),
            Attribute::new(DataType::Date, [0, 3_600_000, day].map(Value::Integer).to_vec()),
        );
        let mut set = AttributeSet::default();
        load_into(&mut set, columns, EntityKind::Point, &LoadConfig::default()).unwrap();

        let selected = values_labelled(set.get("seenDate").unwrap(), "01-01-1970");
        assert_eq!(selected.len(), 2);

        let mut filters = FilterState::new();
        filters.insert("seenDate".into(), selected);
        assert_eq!(matching_indices(&set, &filters), vec![0, 1]);

        assert!(values_labelled(set.get("seenDate").unwrap(), "12-31-1999").is_empty());
    }

    #[test]
    fn filtered_set_copies_rows_in_order() {
        let set = hosts();
        let view = filtered_set(&set, EntityKind::Point, &[3, 0]).unwrap();
        assert_eq!(view.num_elements(), 2);
        assert_eq!(view.get("os").unwrap().values, vec![Value::from("win"), Value::from("linux")]);
        assert_eq!(view.get("_title").unwrap().values, vec![Value::Integer(3), Value::Integer(0)]);

        assert!(filtered_set(&set, EntityKind::Point, &[4]).is_err());
    }
}
