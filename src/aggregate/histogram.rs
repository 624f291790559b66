use super::{BinningHint, Histogram, Summary};
use crate::config::AggregationConfig;
use crate::data::model::Value;
use crate::error::{FrameError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct BinLayout {
    num_bins: usize,
    bin_width: f64,
    bottom: f64,
    top: f64,
}

impl BinLayout {
    /// Single unit-wide bin for a zero-width range.
    fn degenerate(value: f64) -> Self {
        Self {
            num_bins: 1,
            bin_width: 1.0,
            bottom: value,
            top: value + 1.0,
        }
    }

    /// Bin for `value`; values past either end land in the outermost bin.
    fn bin_of(&self, value: f64) -> usize {
        let raw = ((value - self.bottom) / self.bin_width).floor();
        if raw <= 0.0 || raw.is_nan() {
            0
        } else {
            (raw as usize).min(self.num_bins - 1)
        }
    }
}

/// Target bin count for `num_values` values: sqrt rule for small inputs,
/// Sturges' rule above the threshold, clamped to the configured range.
pub fn goal_bin_count(num_values: usize, config: &AggregationConfig) -> usize {
    let n = num_values as f64;
    let goal = if num_values > config.log_scale_threshold {
        n.log2().ceil() as usize + 1
    } else {
        n.sqrt().ceil() as usize
    };
    goal.min(config.max_goal_bins).max(config.min_goal_bins)
}

pub(crate) fn histogram(
    attribute: &str,
    values: &[Value],
    indices: &[usize],
    hint: Option<&BinningHint>,
    goal_number_of_bins: Option<usize>,
    config: &AggregationConfig,
) -> Result<Summary> {
    let selected = present_values(attribute, values, indices)?;
    let num_values = selected.len();
    if num_values == 0 {
        return Ok(Summary::NoData);
    }
    let (min, max) = selected
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let layout = match hint {
        Some(hint) => layout_from_hint(attribute, hint, config)?,
        None if min == max => BinLayout::degenerate(min),
        None => match goal_number_of_bins.filter(|&n| n > 0) {
            Some(num_bins) => {
                check_bin_limit(attribute, num_bins, config)?;
                BinLayout {
                    num_bins,
                    bin_width: (max - min) / num_bins as f64,
                    bottom: min,
                    top: max,
                }
            }
            None => {
                let goal_bins = goal_bin_count(num_values, config);
                search_layout(attribute, min, max, goal_bins, config)?
            }
        },
    };
    log::trace!("histogram '{attribute}': {num_values} values over {min}..{max} -> {layout:?}");

    let mut bins = vec![0usize; layout.num_bins];
    for value in selected {
        bins[layout.bin_of(value)] += 1;
    }

    Ok(Summary::Histogram(Histogram {
        num_bins: layout.num_bins,
        bin_width: layout.bin_width,
        num_values,
        min_value: layout.bottom,
        max_value: layout.top,
        bins,
    }))
}

fn check_bin_limit(attribute: &str, num_bins: usize, config: &AggregationConfig) -> Result<()> {
    if num_bins > config.max_bins {
        return Err(FrameError::InvalidBinningHint {
            attribute: attribute.to_string(),
            reason: format!("{num_bins} bins is above the limit of {}", config.max_bins),
        });
    }
    Ok(())
}

fn layout_from_hint(
    attribute: &str,
    hint: &BinningHint,
    config: &AggregationConfig,
) -> Result<BinLayout> {
    let invalid = |reason: &str| FrameError::InvalidBinningHint {
        attribute: attribute.to_string(),
        reason: reason.to_string(),
    };
    if hint.num_bins == 0 {
        return Err(invalid("numBins must be at least 1"));
    }
    check_bin_limit(attribute, hint.num_bins, config)?;
    if !(hint.bin_width.is_finite() && hint.bin_width > 0.0) {
        return Err(invalid("binWidth must be a positive number"));
    }
    if !(hint.min_value.is_finite() && hint.max_value.is_finite()) {
        return Err(invalid("bounds must be finite"));
    }
    if hint.min_value > hint.max_value {
        return Err(invalid("minValue is above maxValue"));
    }
    if hint.min_value == hint.max_value {
        return Ok(BinLayout::degenerate(hint.min_value));
    }
    Ok(BinLayout {
        num_bins: hint.num_bins,
        bin_width: hint.bin_width,
        bottom: hint.min_value,
        top: hint.max_value,
    })
}

/// Find a "round" bin width: first a power of ten that gives a manageable bin
/// count, then halve or double until the count is close to `goal_bins`, then
/// snap the bounds outward to multiples of the width.
fn search_layout(
    attribute: &str,
    min: f64,
    max: f64,
    goal_bins: usize,
    config: &AggregationConfig,
) -> Result<BinLayout> {
    let range = max - min;
    let mut iterations = 0usize;
    let mut step = || {
        iterations += 1;
        if iterations > config.max_search_iterations || !range.is_finite() {
            Err(FrameError::BinningDidNotConverge {
                attribute: attribute.to_string(),
                iterations,
                min,
                max,
            })
        } else {
            Ok(())
        }
    };

    let mut bin_width = config.initial_bin_width;
    let mut num_bins = range / bin_width;
    while num_bins < config.coarse_min_bins || num_bins >= config.coarse_max_bins || num_bins.is_nan()
    {
        step()?;
        bin_width *= if num_bins < config.coarse_min_bins { 0.1 } else { 10.0 };
        num_bins = range / bin_width;
    }

    let min_bins = config
        .refine_floor_bins
        .max((goal_bins / 2).saturating_sub(1)) as f64;
    let goal_bins = goal_bins as f64;
    while num_bins < min_bins || num_bins > goal_bins || num_bins.is_nan() {
        step()?;
        if num_bins < min_bins {
            bin_width /= 2.0;
        } else {
            bin_width *= 2.0;
        }
        num_bins = range / bin_width;
    }

    // the snapped bounds must still enclose the data after float rounding
    let mut bottom = round_down(min, bin_width);
    if bottom > min {
        bottom -= bin_width;
    }
    let mut top = round_up(max, bin_width);
    if top < max {
        top += bin_width;
    }
    let num_bins = ((top - bottom) / bin_width).round();
    if !(num_bins.is_finite() && bin_width.is_finite() && bin_width > 0.0) {
        return Err(FrameError::BinningDidNotConverge {
            attribute: attribute.to_string(),
            iterations,
            min,
            max,
        });
    }

    Ok(BinLayout {
        num_bins: (num_bins as usize).max(1),
        bin_width,
        bottom,
        top,
    })
}

/// Largest multiple of `multiple` not above `num`. A zero multiple returns `num`.
fn round_down(num: f64, multiple: f64) -> f64 {
    if multiple == 0.0 {
        return num;
    }
    multiple * (num / multiple).floor()
}

/// Smallest multiple of `multiple` not below `num`. A zero multiple returns `num`.
fn round_up(num: f64, multiple: f64) -> f64 {
    if multiple == 0.0 {
        return num;
    }
    multiple * (num / multiple).ceil()
}

/// Numeric readings of the selected rows. `Null` cells are missing data and
/// are skipped; any other non-numeric or non-finite cell is an error.
fn present_values(attribute: &str, values: &[Value], indices: &[usize]) -> Result<Vec<f64>> {
    let mut present = Vec::with_capacity(indices.len());
    for &index in indices {
        let value = &values[index];
        if matches!(value, Value::Null) {
            continue;
        }
        match value.as_f64().filter(|v| v.is_finite()) {
            Some(v) => present.push(v),
            None => {
                return Err(FrameError::NonNumericValue {
                    attribute: attribute.to_string(),
                    index,
                })
            }
        }
    }
    Ok(present)
}
