//! Load configuration sources over a live record.
//!
//! The record is serialized to a table, each source's table is deep-merged on
//! top, and the result is deserialized back. Sources apply in order, so later
//! sources override earlier ones key by key.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClapbindError;
use crate::source::{ConfigSource, Table};
use crate::validate::deserialize_table;

/// Serialize a record into a table. The record must serialize as a map.
///
/// Unset optional fields are kept as nulls so they deserialize back to `None`.
pub fn record_table<R: Serialize>(record: &R) -> Result<Table, ClapbindError> {
    let value = serde_json::to_value(record).map_err(|e| ClapbindError::InvalidValue {
        key: "configuration record".into(),
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(table) => Ok(table),
        other => Err(ClapbindError::InvalidValue {
            key: "configuration record".into(),
            reason: format!("expected a map, found {other}"),
        }),
    }
}

/// Load every source over `live`, in order.
///
/// Each source is applied on its own: a source that cannot be read, parsed or
/// deserialized is skipped and the others still take effect. When any source
/// failed, the failures are returned together as [`ClapbindError::Load`] after
/// `live` has been updated with the rest.
pub fn load_sources<R>(
    sources: &[Box<dyn ConfigSource>],
    live: &mut R,
    strict: bool,
) -> Result<(), ClapbindError>
where
    R: Serialize + DeserializeOwned,
{
    let mut base = record_table(&*live)?;
    let mut errors = Vec::new();
    let mut loaded = None;

    for source in sources {
        let origin = source.origin();
        match apply_source::<R>(source.as_ref(), &origin, &base, strict) {
            Ok((table, record)) => {
                tracing::debug!(source = %origin, "configuration source loaded");
                base = table;
                loaded = Some(record);
            }
            Err(e) => {
                tracing::warn!(source = %origin, error = %e, "configuration source skipped");
                errors.push(e);
            }
        }
    }

    if let Some(record) = loaded {
        *live = record;
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClapbindError::Load(errors))
    }
}

fn apply_source<R: DeserializeOwned>(
    source: &dyn ConfigSource,
    origin: &str,
    base: &Table,
    strict: bool,
) -> Result<(Table, R), ClapbindError> {
    let data = source.load()?;
    let merged = deep_merge(base.clone(), data.table);
    let record = deserialize_table::<R>(merged.clone(), origin, data.text.as_deref(), strict)?;
    Ok((merged, record))
}

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a map for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Object(base_tbl)), Value::Object(overlay_tbl)) => {
                base.insert(key, Value::Object(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}
