//! vizframe command line
//!
//! Usage:
//!   vizframe --points hosts.parquet --edges flows.json aggregate --kind point
//!   vizframe --points hosts.csv rows --indices 0,5,9 --compact
//!   vizframe --points hosts.csv dump --columns

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use vizframe::data::filter::{FilterState, matching_indices, values_labelled};
use vizframe::data::ingest::load_file;
use vizframe::serialize::{serialize_columns, serialize_rows};
use vizframe::{AggregateMode, BinningHints, Dataframe, DataType, EntityKind, FrameConfig, Value};

#[derive(Parser, Debug)]
#[command(name = "vizframe")]
#[command(about = "Row access and attribute summaries over point/edge tables")]
#[command(version)]
struct Args {
    /// Point attributes (.json, .csv or .parquet)
    #[arg(long)]
    points: Option<PathBuf>,

    /// Edge attributes (.json, .csv or .parquet)
    #[arg(long)]
    edges: Option<PathBuf>,

    /// JSON file overriding load and aggregation settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Histogram or category counts for each attribute
    Aggregate {
        #[arg(long, default_value = "point")]
        kind: EntityKind,

        /// Attributes to summarize (default: all)
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,

        /// Count categories even for numeric attributes
        #[arg(long)]
        count_by: bool,

        /// Fixed number of histogram bins
        #[arg(long)]
        goal_bins: Option<usize>,

        /// JSON file of per-attribute binning hints
        #[arg(long)]
        hints: Option<PathBuf>,

        /// Only rows where COLUMN equals VALUE (repeatable)
        #[arg(long = "where", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,
    },
    /// Print rows at the given indices
    Rows {
        #[arg(long, default_value = "point")]
        kind: EntityKind,

        #[arg(long, value_delimiter = ',', required = true)]
        indices: Vec<usize>,

        /// One shared header instead of keys per row
        #[arg(long)]
        compact: bool,
    },
    /// Print the whole table
    Dump {
        #[arg(long)]
        compact: bool,

        /// Column-wise instead of row-wise
        #[arg(long)]
        columns: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => FrameConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => FrameConfig::default(),
    };

    let mut frame = Dataframe::with_config(config);
    for (kind, path) in [(EntityKind::Point, &args.points), (EntityKind::Edge, &args.edges)] {
        let Some(path) = path else { continue };
        let batch = load_file(path)?;
        let outcome = frame
            .load(batch, kind)
            .with_context(|| format!("loading {kind} attributes"))?;
        log::info!("{kind}: {outcome:?}");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Aggregate {
            kind,
            attributes,
            count_by,
            goal_bins,
            hints,
            filters,
        } => {
            let mut hints = match hints {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading hints {}", path.display()))?;
                    serde_json::from_str::<BinningHints>(&text).context("parsing hints")?
                }
                None => BinningHints::default(),
            };
            if goal_bins.is_some() {
                hints.goal_number_of_bins = goal_bins;
            }

            let filters = parse_filters(&frame, kind, &filters)?;
            let indices = matching_indices(frame.active().set(kind), &filters);
            let names: Vec<&str> = attributes.iter().map(String::as_str).collect();
            let mode = if count_by {
                AggregateMode::CountBy
            } else {
                AggregateMode::Histogram
            };

            let summaries = frame.aggregate(
                &indices,
                (!names.is_empty()).then_some(names.as_slice()),
                Some(&hints),
                mode,
                kind,
            )?;
            serde_json::to_writer_pretty(&mut out, &summaries)?;
        }
        Command::Rows {
            kind,
            indices,
            compact,
        } => {
            if compact {
                serde_json::to_writer_pretty(&mut out, &frame.get_rows_compact(&indices, kind)?)?;
            } else {
                serde_json::to_writer_pretty(&mut out, &frame.get_rows(&indices, kind)?)?;
            }
        }
        Command::Dump { compact, columns } => {
            if columns {
                serialize_columns(&frame, &mut out)?;
            } else {
                serialize_rows(&frame, &mut out, compact)?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Turn `COLUMN=VALUE` pairs into a filter, reading VALUE by the column's type.
fn parse_filters(frame: &Dataframe, kind: EntityKind, pairs: &[String]) -> Result<FilterState> {
    let set = frame.active().set(kind);
    let mut filters = FilterState::new();
    for pair in pairs {
        let Some((column, raw)) = pair.split_once('=') else {
            bail!("expected COLUMN=VALUE, got '{pair}'");
        };
        let selected = filters.entry(column.to_string()).or_insert_with(BTreeSet::new);
        let Some(attr) = set.get(column) else {
            selected.insert(Value::from(raw));
            continue;
        };
        match attr.data_type {
            DataType::Number => {
                let value = match raw.parse::<i64>() {
                    Ok(i) => Value::Integer(i),
                    Err(_) => Value::Float(
                        raw.parse()
                            .with_context(|| format!("'{raw}' is not a number for '{column}'"))?,
                    ),
                };
                selected.insert(value);
            }
            DataType::Boolean => {
                let flag = raw
                    .parse()
                    .with_context(|| format!("'{raw}' is not a bool for '{column}'"))?;
                selected.insert(Value::Bool(flag));
            }
            // dates are stored with their timestamp; select by the rendered day
            DataType::Date => {
                let matches = values_labelled(attr, raw);
                if matches.is_empty() {
                    log::warn!("no '{column}' value renders as '{raw}'");
                }
                selected.extend(matches);
            }
            DataType::String => {
                selected.insert(Value::from(raw));
            }
        }
    }
    Ok(filters)
}
