/// Aggregation engine: per-attribute summaries over an index subset.
///
/// ```text
///   indices + attribute names
///        │
///        ▼
///   ┌────────────┐   declared type != String      ┌───────────┐
///   │ Aggregator │ ─────── and mode != countBy ──▶ │ histogram │
///   └────────────┘                                └───────────┘
///        │ otherwise                              ┌───────────┐
///        └──────────────────────────────────────▶ │ count_by  │
///                                                 └───────────┘
/// ```
mod count_by;
mod histogram;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::data::model::{AttributeSet, DataType, EntityKind};
use crate::error::{FrameError, Result};

pub use histogram::goal_bin_count;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateMode {
    /// Histograms for non-string columns, counts for string columns.
    #[default]
    Histogram,
    /// Counts for every column.
    CountBy,
}

/// Fixed bin layout for one attribute, used verbatim by the histogram path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinningHint {
    pub num_bins: usize,
    pub bin_width: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl BinningHint {
    /// Reuse the layout of an earlier histogram, e.g. to compare a filtered
    /// selection against the full data.
    pub fn from_histogram(histogram: &Histogram) -> Self {
        Self {
            num_bins: histogram.num_bins,
            bin_width: histogram.bin_width,
            min_value: histogram.min_value,
            max_value: histogram.max_value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinningHints {
    #[serde(
        rename = "_goalNumberOfBins",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub goal_number_of_bins: Option<usize>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, BinningHint>,
}

impl BinningHints {
    pub fn with_goal(goal_number_of_bins: usize) -> Self {
        Self {
            goal_number_of_bins: Some(goal_number_of_bins),
            attributes: BTreeMap::new(),
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&BinningHint> {
        self.attributes.get(attribute)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub num_bins: usize,
    pub bin_width: f64,
    pub num_values: usize,
    /// Lower bound of the first bin.
    pub min_value: f64,
    /// Upper bound of the last bin, inclusive.
    pub max_value: f64,
    pub bins: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBy {
    pub num_values: usize,
    pub num_bins: usize,
    pub bins: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Summary {
    #[serde(rename = "nodata")]
    NoData,
    #[serde(rename = "histogram")]
    Histogram(Histogram),
    #[serde(rename = "countBy")]
    CountBy(CountBy),
}

impl Summary {
    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Summary::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_count_by(&self) -> Option<&CountBy> {
        match self {
            Summary::CountBy(c) => Some(c),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Summarizes attributes of one entity kind. Never mutates the set.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    set: &'a AttributeSet,
    kind: EntityKind,
    config: &'a AggregationConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(set: &'a AttributeSet, kind: EntityKind, config: &'a AggregationConfig) -> Self {
        Self { set, kind, config }
    }

    /// Summarize `attributes` (default: every attribute) over `indices`.
    ///
    /// Names starting with `_` are internal and always skipped.
    pub fn aggregate(
        &self,
        indices: &[usize],
        attributes: Option<&[&str]>,
        hints: Option<&BinningHints>,
        mode: AggregateMode,
    ) -> Result<BTreeMap<String, Summary>> {
        self.check_indices(indices)?;

        let names: Vec<&str> = match attributes {
            Some(names) => names.to_vec(),
            None => self.set.keys().collect(),
        };

        names
            .into_iter()
            .filter(|name| !name.starts_with('_'))
            .map(|name| Ok((name.to_string(), self.summarize(name, indices, hints, mode)?)))
            .collect()
    }

    fn summarize(
        &self,
        name: &str,
        indices: &[usize],
        hints: Option<&BinningHints>,
        mode: AggregateMode,
    ) -> Result<Summary> {
        let attr = self
            .set
            .get(name)
            .ok_or_else(|| FrameError::UnknownAttribute {
                kind: self.kind,
                name: name.to_string(),
            })?;
        let hint = hints.and_then(|h| h.get(name));

        if mode != AggregateMode::CountBy && attr.data_type != DataType::String {
            let goal = hints.and_then(|h| h.goal_number_of_bins);
            histogram::histogram(name, &attr.values, indices, hint, goal, self.config)
        } else {
            Ok(count_by::count_by(&attr.values, indices, hint, self.config))
        }
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        let len = self.set.num_elements();
        match indices.iter().find(|&&index| index >= len) {
            Some(&index) => Err(FrameError::IndexOutOfRange {
                kind: self.kind,
                index,
                len,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadConfig;
    use crate::data::loader::load_into;
    use crate::data::model::{Attribute, ColumnBatch, Value};

    fn mixed_set() -> AttributeSet {
        let mut columns = ColumnBatch::new();
        columns.insert(
            "score".into(),
            Attribute::new(DataType::Number, [1, 2, 2, 3, 100].map(Value::Integer).to_vec()),
        );
        columns.insert(
            "group".into(),
            Attribute::new(DataType::String, ["a", "a", "b", "c", "c"].map(Value::from).to_vec()),
        );
        let mut set = AttributeSet::default();
        load_into(&mut set, columns, EntityKind::Point, &LoadConfig::default()).unwrap();
        set
    }

    #[test]
    fn dispatch_follows_declared_type() {
        let set = mixed_set();
        let config = AggregationConfig::default();
        let agg = Aggregator::new(&set, EntityKind::Point, &config);
        let out = agg
            .aggregate(&[0, 1, 2, 3, 4], None, None, AggregateMode::Histogram)
            .unwrap();

        assert_eq!(out.keys().collect::<Vec<_>>(), ["group", "score"]);
        assert!(out["score"].as_histogram().is_some());
        assert!(out["group"].as_count_by().is_some());
    }

    #[test]
    fn count_by_mode_counts_numbers_too() {
        let set = mixed_set();
        let config = AggregationConfig::default();
        let agg = Aggregator::new(&set, EntityKind::Point, &config);
        let out = agg
            .aggregate(&[1, 2], Some(&["score"]), None, AggregateMode::CountBy)
            .unwrap();
        let counts = out["score"].as_count_by().unwrap();
        assert_eq!(counts.bins, BTreeMap::from([("2".to_string(), 2)]));
    }

    #[test]
    fn internal_attributes_are_skipped_even_when_named() {
        let set = mixed_set();
        let config = AggregationConfig::default();
        let agg = Aggregator::new(&set, EntityKind::Point, &config);
        let out = agg
            .aggregate(&[0], Some(&["_title", "group"]), None, AggregateMode::Histogram)
            .unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), ["group"]);
    }

    #[test]
    fn bad_requests_fail_fast() {
        let set = mixed_set();
        let config = AggregationConfig::default();
        let agg = Aggregator::new(&set, EntityKind::Point, &config);
        assert!(matches!(
            agg.aggregate(&[0, 5], None, None, AggregateMode::Histogram),
            Err(FrameError::IndexOutOfRange { index: 5, len: 5, .. })
        ));
        assert!(matches!(
            agg.aggregate(&[0], Some(&["nope"]), None, AggregateMode::Histogram),
            Err(FrameError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn summaries_serialize_with_type_tags() {
        let nodata = serde_json::to_value(Summary::NoData).unwrap();
        assert_eq!(nodata, serde_json::json!({ "type": "nodata" }));

        let set = mixed_set();
        let config = AggregationConfig::default();
        let agg = Aggregator::new(&set, EntityKind::Point, &config);
        let out = agg
            .aggregate(&[0, 1, 2], None, None, AggregateMode::Histogram)
            .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(
            json["group"],
            serde_json::json!({ "type": "countBy", "numValues": 3, "numBins": 2, "bins": { "a": 2, "b": 1 } })
        );
        assert_eq!(json["score"]["type"], "histogram");
        assert!(json["score"]["binWidth"].is_number());
    }

    #[test]
    fn hints_deserialize_from_request_shape() {
        let hints: BinningHints = serde_json::from_str(
            r#"{ "_goalNumberOfBins": 12,
                 "score": { "numBins": 4, "binWidth": 25, "minValue": 0, "maxValue": 100 } }"#,
        )
        .unwrap();
        assert_eq!(hints.goal_number_of_bins, Some(12));
        assert_eq!(hints.get("score").unwrap().num_bins, 4);
    }
}
