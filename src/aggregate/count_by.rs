use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use super::{BinningHint, CountBy, Summary};
use crate::config::AggregationConfig;
use crate::data::model::Value;

/// Frequency of each distinct label among the selected rows.
///
/// At most `max_count_buckets` buckets are produced: when there are more
/// distinct labels than that, the most frequent `max_count_buckets - 1` keep
/// their own bucket and the rest are summed into the overflow bucket. Ties
/// keep first-seen order.
///
/// `_hint` is accepted so both summary paths share a signature; it does not
/// affect categorical counts.
pub(crate) fn count_by(
    values: &[Value],
    indices: &[usize],
    _hint: Option<&BinningHint>,
    config: &AggregationConfig,
) -> Summary {
    if indices.is_empty() {
        return Summary::NoData;
    }

    // keyed by label so values that render alike (same-day dates, 1 and 1.0)
    // share a bucket before ranking
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for &index in indices {
        match slots.entry(values[index].label()) {
            Entry::Occupied(slot) => counts[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                counts.push((slot.key().clone(), 1));
                slot.insert(counts.len() - 1);
            }
        }
    }
    // sort_by is stable, so equal counts stay in first-seen order
    counts.sort_by(|(_, a), (_, b)| b.cmp(a));

    let max_buckets = config.max_count_buckets.max(1);
    let split = if counts.len() > max_buckets {
        max_buckets - 1
    } else {
        counts.len()
    };
    let overflow: usize = counts[split..].iter().map(|(_, count)| count).sum();
    counts.truncate(split);

    let mut bins: BTreeMap<String, usize> = counts.into_iter().collect();
    if overflow > 0 {
        // a real category may already be named like the overflow bucket
        *bins.entry(config.overflow_key.clone()).or_insert(0) += overflow;
    }

    Summary::CountBy(CountBy {
        num_values: bins.values().sum(),
        num_bins: bins.len(),
        bins,
    })
}
