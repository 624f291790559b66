use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;

use super::model::{Attribute, AttributeSet, ColumnBatch, DataType, EntityKind, Value};
use crate::config::{LoadConfig, TITLE_ATTRIBUTE};
use crate::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// Load outcome
// ---------------------------------------------------------------------------

/// What a call to [`load_into`] did to the attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The batch had no columns.
    Empty,
    /// Every column was reserved or the title column; nothing was stored.
    Discarded,
    Loaded {
        num_elements: usize,
        /// Stored column names, `_title` excluded.
        columns: Vec<String>,
        /// Column the title was copied from, if any.
        title_source: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Merge a batch of columns into the attribute set for `kind`.
///
/// * Reserved visual-encoding columns are dropped.
/// * The highest-priority title column is re-exposed as `_title` instead of
///   being stored under its own name; without one, `_title` is `0..n`.
/// * A batch that keeps no column after this filtering is discarded whole.
/// * Existing columns are overwritten by name, never removed.
///
/// String cells are percent-decoded and numeric cells of date-named columns are
/// rendered as calendar dates. Neither step can fail the load.
///
/// The set is untouched when an error is returned.
pub fn load_into(
    set: &mut AttributeSet,
    mut columns: ColumnBatch,
    kind: EntityKind,
    config: &LoadConfig,
) -> Result<LoadOutcome> {
    let Some(expected) = columns.values().next().map(Attribute::len) else {
        return Ok(LoadOutcome::Empty);
    };
    if let Some((name, attr)) = columns.iter().find(|(_, a)| a.len() != expected) {
        return Err(FrameError::LengthMismatch {
            name: name.clone(),
            expected,
            actual: attr.len(),
        });
    }

    let title_source = pick_title_field(&columns, config.title_fields(kind));
    let title = title_source.as_ref().and_then(|t| columns.remove(t));
    columns.retain(|name, _| !config.is_reserved(name));

    if columns.is_empty() {
        log::debug!("discarding {kind} batch: only reserved or title columns");
        return Ok(LoadOutcome::Discarded);
    }

    let num_elements = expected;
    ensure_no_stale_columns(set, &columns, kind, num_elements)?;

    for (name, attr) in columns.iter_mut() {
        decode_column(name, attr, config);
    }
    let title = match title {
        Some(mut attr) => {
            decode_column(TITLE_ATTRIBUTE, &mut attr, config);
            attr
        }
        None => sequential_title(num_elements),
    };

    let stored: Vec<String> = columns.keys().cloned().collect();
    log::debug!(
        "loaded {num_elements} {kind} rows: columns {stored:?}, title from {:?}",
        title_source
    );

    set.num_elements = num_elements;
    set.attributes.extend(columns);
    set.attributes.insert(TITLE_ATTRIBUTE.to_string(), title);

    Ok(LoadOutcome::Loaded {
        num_elements,
        columns: stored,
        title_source,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First candidate present in the batch, in priority order.
pub fn pick_title_field(columns: &ColumnBatch, prioritized: &[String]) -> Option<String> {
    prioritized
        .iter()
        .find(|field| columns.contains_key(field.as_str()))
        .cloned()
}

fn sequential_title(n: usize) -> Attribute {
    let values = (0..n).map(|i| Value::Integer(i as i64)).collect();
    Attribute::new(DataType::Number, values)
}

/// Columns kept from earlier batches must match the new row count, unless this
/// batch replaces them.
fn ensure_no_stale_columns(
    set: &AttributeSet,
    incoming: &ColumnBatch,
    kind: EntityKind,
    expected: usize,
) -> Result<()> {
    for (name, attr) in &set.attributes {
        if name == TITLE_ATTRIBUTE || incoming.contains_key(name) {
            continue;
        }
        if attr.len() != expected {
            return Err(FrameError::StaleColumnLength {
                kind,
                name: name.clone(),
                expected,
                actual: attr.len(),
            });
        }
    }
    Ok(())
}

fn decode_column(name: &str, attr: &mut Attribute, config: &LoadConfig) {
    let is_date_column = name.contains(config.date_marker.as_str());
    for value in &mut attr.values {
        match value {
            Value::String(raw) if raw.contains('%') => {
                match percent_decode(raw).map(Cow::into_owned) {
                    Some(decoded) => *raw = decoded,
                    None => log::warn!("column '{name}': keeping undecodable value {raw:?}"),
                }
            }
            Value::Integer(_) | Value::Float(_) if is_date_column => {
                let Some(millis) = epoch_millis(value) else {
                    continue;
                };
                match format_epoch_millis(millis, &config.date_format) {
                    Some(text) => *value = Value::Date { millis, text },
                    None => log::warn!("column '{name}': timestamp {millis} is not a valid date"),
                }
            }
            _ => {}
        }
    }
}

fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        _ => None,
    }
}

/// Render epoch milliseconds (UTC) with a chrono format string.
pub fn format_epoch_millis(millis: i64, format: &str) -> Option<String> {
    let dt = DateTime::<Utc>::from_timestamp_millis(millis)?;
    let mut out = String::new();
    write!(out, "{}", dt.format(format)).ok()?;
    Some(out)
}

/// Strict URI-component decoding: every `%` must start a two-digit hex escape
/// and the decoded bytes must be UTF-8.
pub fn percent_decode(raw: &str) -> Option<Cow<'_, str>> {
    let bytes = raw.as_bytes();
    let well_formed = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .all(|(i, _)| {
            bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
        });
    if !well_formed {
        return None;
    }
    percent_decode_str(raw).decode_utf8().ok()
}
