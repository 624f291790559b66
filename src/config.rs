use std::path::Path;

use serde::Deserialize;

use crate::data::model::EntityKind;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Static tables
// ---------------------------------------------------------------------------

/// Visual-encoding columns that are never stored as attributes.
pub const RESERVED_NAMES: &[&str] = &[
    "pointColor",
    "pointSize",
    "pointTitle",
    "pointLabel",
    "edgeLabel",
    "edgeTitle",
    "degree",
];

/// Candidate title columns for points, highest priority first.
pub const POINT_TITLE_FIELDS: &[&str] = &["pointTitle", "node", "label", "ip"];

/// Candidate title columns for edges, highest priority first.
pub const EDGE_TITLE_FIELDS: &[&str] = &["edgeTitle", "edge"];

/// Name of the synthesized title attribute.
pub const TITLE_ATTRIBUTE: &str = "_title";

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// LoadConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadConfig {
    pub reserved_names: Vec<String>,
    pub point_title_fields: Vec<String>,
    pub edge_title_fields: Vec<String>,
    /// Columns whose name contains this marker get numeric values rendered as dates.
    pub date_marker: String,
    /// chrono format string for rendered dates.
    pub date_format: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            reserved_names: owned(RESERVED_NAMES),
            point_title_fields: owned(POINT_TITLE_FIELDS),
            edge_title_fields: owned(EDGE_TITLE_FIELDS),
            date_marker: "Date".to_string(),
            date_format: "%m-%d-%Y".to_string(),
        }
    }
}

impl LoadConfig {
    pub fn title_fields(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Point => &self.point_title_fields,
            EntityKind::Edge => &self.edge_title_fields,
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_names.iter().any(|r| r == name)
    }
}

// ---------------------------------------------------------------------------
// AggregationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationConfig {
    /// Upper bound on buckets in a categorical summary, overflow bucket included.
    pub max_count_buckets: usize,
    pub overflow_key: String,
    pub min_goal_bins: usize,
    pub max_goal_bins: usize,
    /// Above this many values the goal bin count follows log2 instead of sqrt.
    pub log_scale_threshold: usize,
    pub initial_bin_width: f64,
    pub coarse_min_bins: f64,
    pub coarse_max_bins: f64,
    pub refine_floor_bins: usize,
    /// Ceiling on width adjustments across both search phases.
    pub max_search_iterations: usize,
    /// Largest bin count a caller may request through a hint or goal.
    pub max_bins: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_count_buckets: 29,
            overflow_key: "_other".to_string(),
            min_goal_bins: 8,
            max_goal_bins: 30,
            log_scale_threshold: 30,
            initial_bin_width: 10.0,
            coarse_min_bins: 2.0,
            coarse_max_bins: 100.0,
            refine_floor_bins: 4,
            max_search_iterations: 2048,
            max_bins: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub load: LoadConfig,
    pub aggregation: AggregationConfig,
}

impl FrameConfig {
    /// Read a JSON config file; missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
