use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::data::frame::Dataframe;
use crate::data::model::{Attribute, EntityKind};
use crate::data::rows::{CompactRows, Row};
use crate::error::Result;

#[derive(Serialize)]
#[serde(untagged)]
enum RowDump {
    Full(Vec<Row>),
    Compact(CompactRows),
}

/// Write every row of both kinds as JSON: `{ "point": .., "edge": .. }`.
///
/// Rows are objects, or `{ header, values }` when `compact` is set.
pub fn serialize_rows<W: Write>(frame: &Dataframe, writer: W, compact: bool) -> Result<()> {
    let mut dump: BTreeMap<EntityKind, RowDump> = BTreeMap::new();
    for kind in EntityKind::ALL {
        let all: Vec<usize> = (0..frame.num_elements(kind)).collect();
        let rows = if compact {
            RowDump::Compact(frame.get_rows_compact(&all, kind)?)
        } else {
            RowDump::Full(frame.get_rows(&all, kind)?)
        };
        dump.insert(kind, rows);
    }
    serde_json::to_writer(writer, &dump)?;
    Ok(())
}

/// Write every column of both kinds as JSON: `{ kind: { name: { type, values } } }`.
pub fn serialize_columns<W: Write>(frame: &Dataframe, writer: W) -> Result<()> {
    let dump: BTreeMap<EntityKind, &BTreeMap<String, Attribute>> = EntityKind::ALL
        .into_iter()
        .map(|kind| (kind, frame.active().set(kind).attributes()))
        .collect();
    serde_json::to_writer(writer, &dump)?;
    Ok(())
}
