//! Invariants of the two summary algorithms over arbitrary data and selections.

use std::collections::HashMap;

use proptest::prelude::*;

use vizframe::{
    AggregateMode, Attribute, BinningHint, BinningHints, ColumnBatch, DataType, Dataframe,
    EntityKind, Summary, Value,
};

// ---------------------------------------------------------------------------
// Strategy generators
// ---------------------------------------------------------------------------

fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => (-1_000_000i64..1_000_000i64).prop_map(Value::Integer),
        3 => (-1e6_f64..1e6_f64).prop_map(Value::Float),
        1 => (0i64..10).prop_map(Value::Integer),
    ]
}

/// Values plus a selection of row indices (possibly empty, possibly all).
fn arb_selection<S>(values: S, max_len: usize) -> impl Strategy<Value = (Vec<Value>, Vec<usize>)>
where
    S: Strategy<Value = Value>,
{
    proptest::collection::vec(values, 1..=max_len).prop_flat_map(|values| {
        let len = values.len();
        (
            Just(values),
            proptest::collection::vec(any::<bool>(), len).prop_map(|mask| {
                mask.iter()
                    .enumerate()
                    .filter_map(|(i, keep)| keep.then_some(i))
                    .collect::<Vec<_>>()
            }),
        )
    })
}

fn arb_category() -> impl Strategy<Value = Value> {
    (0u8..45).prop_map(|c| Value::String(format!("c{c}")))
}

/// Categories `c0..cN` with a random positive count each, `N` in `distinct`.
fn arb_counted_categories(
    distinct: std::ops::RangeInclusive<usize>,
) -> impl Strategy<Value = Vec<usize>> {
    distinct.prop_flat_map(|n| proptest::collection::vec(1usize..6, n))
}

fn arb_hint() -> impl Strategy<Value = BinningHint> {
    (1usize..50, -1e3_f64..1e3_f64, 0.01_f64..100.0).prop_map(|(num_bins, min_value, bin_width)| {
        BinningHint {
            num_bins,
            bin_width,
            min_value,
            max_value: min_value + bin_width * num_bins as f64,
        }
    })
}

fn frame(data_type: DataType, values: Vec<Value>) -> Dataframe {
    let mut columns = ColumnBatch::new();
    columns.insert("v".into(), Attribute::new(data_type, values));
    let mut df = Dataframe::new();
    df.load(columns, EntityKind::Point).unwrap();
    df
}

fn summarize(df: &Dataframe, indices: &[usize], hints: Option<&BinningHints>) -> Summary {
    let mut summaries = df
        .aggregate(indices, Some(&["v"][..]), hints, AggregateMode::Histogram, EntityKind::Point)
        .unwrap();
    summaries.remove("v").unwrap()
}

/// Expand per-category counts into a column, categories interleaved.
fn expand(counts: &[usize]) -> Vec<Value> {
    let mut values = Vec::new();
    let rounds = counts.iter().copied().max().unwrap_or(0);
    for round in 0..rounds {
        for (c, &count) in counts.iter().enumerate() {
            if round < count {
                values.push(Value::String(format!("c{c}")));
            }
        }
    }
    values
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn histogram_bins_account_for_every_selected_value(
        (values, indices) in arb_selection(arb_number(), 200)
    ) {
        let df = frame(DataType::Number, values);
        match summarize(&df, &indices, None) {
            Summary::NoData => prop_assert!(indices.is_empty()),
            Summary::Histogram(h) => {
                prop_assert_eq!(h.num_values, indices.len());
                prop_assert_eq!(h.bins.iter().sum::<usize>(), indices.len());
                prop_assert_eq!(h.bins.len(), h.num_bins);
            }
            other => prop_assert!(false, "unexpected summary {:?}", other),
        }
    }

    #[test]
    fn histogram_bounds_enclose_selected_values(
        (values, indices) in arb_selection(arb_number(), 200)
    ) {
        let df = frame(DataType::Number, values.clone());
        if let Summary::Histogram(h) = summarize(&df, &indices, None) {
            for &i in &indices {
                let v = values[i].as_f64().unwrap();
                prop_assert!(h.min_value <= v, "{} below {}", v, h.min_value);
                prop_assert!(v <= h.max_value, "{} above {}", v, h.max_value);
            }
        }
    }

    #[test]
    fn explicit_hint_is_reproduced_verbatim(
        (values, indices) in arb_selection(arb_number(), 100),
        hint in arb_hint(),
    ) {
        prop_assume!(!indices.is_empty());
        let df = frame(DataType::Number, values);
        let mut hints = BinningHints::default();
        hints.attributes.insert("v".into(), hint);

        let summary = summarize(&df, &indices, Some(&hints));
        let h = summary.as_histogram().unwrap();
        prop_assert_eq!(BinningHint::from_histogram(h), hint);
        prop_assert_eq!(h.bins.iter().sum::<usize>(), indices.len());
    }

    #[test]
    fn goal_bin_count_is_honored(
        (values, indices) in arb_selection(arb_number(), 100),
        goal in 1usize..40,
    ) {
        prop_assume!(!indices.is_empty());
        let df = frame(DataType::Number, values);
        let hints = BinningHints::with_goal(goal);
        let summary = summarize(&df, &indices, Some(&hints));
        let h = summary.as_histogram().unwrap();
        prop_assert!(h.num_bins == goal || h.num_bins == 1);
        prop_assert_eq!(h.bins.iter().sum::<usize>(), indices.len());
    }
}

// ---------------------------------------------------------------------------
// Category counts
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn counts_account_for_every_selected_value(
        (values, indices) in arb_selection(arb_category(), 300)
    ) {
        let df = frame(DataType::String, values);
        match summarize(&df, &indices, None) {
            Summary::NoData => prop_assert!(indices.is_empty()),
            Summary::CountBy(c) => {
                prop_assert_eq!(c.num_values, indices.len());
                prop_assert_eq!(c.bins.values().sum::<usize>(), indices.len());
                prop_assert!(c.num_bins <= 29);
                prop_assert_eq!(c.num_bins, c.bins.len());
            }
            other => prop_assert!(false, "unexpected summary {:?}", other),
        }
    }

    #[test]
    fn overflow_keeps_the_most_frequent_categories(counts in arb_counted_categories(30..=60)) {
        let values = expand(&counts);
        let total = values.len();
        let df = frame(DataType::String, values);
        let all: Vec<usize> = (0..total).collect();

        let summary = summarize(&df, &all, None);
        let c = summary.as_count_by().unwrap();
        prop_assert_eq!(c.num_bins, 29);
        let other = c.bins["_other"];

        let by_label: HashMap<String, usize> = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| (format!("c{i}"), count))
            .collect();
        let kept_min = c
            .bins
            .iter()
            .filter(|(label, _)| label.as_str() != "_other")
            .map(|(label, &count)| {
                assert_eq!(by_label[label], count);
                count
            })
            .min()
            .unwrap();
        let dropped: Vec<usize> = by_label
            .iter()
            .filter(|(label, _)| !c.bins.contains_key(*label))
            .map(|(_, &count)| count)
            .collect();
        prop_assert_eq!(dropped.len(), counts.len() - 28);
        prop_assert_eq!(dropped.iter().sum::<usize>(), other);
        prop_assert!(dropped.iter().all(|&count| count <= kept_min));
    }

    #[test]
    fn at_most_29_categories_keep_their_own_keys(counts in arb_counted_categories(1..=29)) {
        let values = expand(&counts);
        let all: Vec<usize> = (0..values.len()).collect();
        let df = frame(DataType::String, values);

        let summary = summarize(&df, &all, None);
        let c = summary.as_count_by().unwrap();
        prop_assert_eq!(c.num_bins, counts.len());
        prop_assert!(!c.bins.contains_key("_other"));
        for (i, &count) in counts.iter().enumerate() {
            prop_assert_eq!(c.bins[&format!("c{i}")], count);
        }
    }
}
