//! Columnar point/edge attribute store with histogram and category summaries
//! over arbitrary row subsets.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod serialize;

pub use aggregate::{
    AggregateMode, Aggregator, BinningHint, BinningHints, CountBy, Histogram, Summary,
};
pub use config::{AggregationConfig, FrameConfig, LoadConfig};
pub use data::frame::Dataframe;
pub use data::loader::LoadOutcome;
pub use data::model::{Attribute, AttributeSet, ColumnBatch, DataType, EntityKind, Store, Value};
pub use data::rows::{CompactRows, Row, RowView};
pub use error::{FrameError, Result};
