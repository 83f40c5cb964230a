//! Effective-configuration listing, shown by `--checkcfg`.

use std::fmt;

use crate::error::ClapbindError;
use crate::fieldmap::build_field_map;
use crate::naming::FlagOptions;
use crate::record::Record;

/// Shown for optional fields that hold no value.
pub const NOT_SET: &str = "<not set>";

/// The effective value of every flag-bound field, sorted by flag name.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReport {
    pub entries: Vec<(String, String)>,
}

impl ConfigReport {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration is OK")?;
        for (key, value) in &self.entries {
            write!(f, "\n{key} = {value}")?;
        }
        Ok(())
    }
}

/// List the current value of every leaf in `record`.
pub fn list_values<R: Record + ?Sized>(
    record: &mut R,
    options: &FlagOptions,
) -> Result<ConfigReport, ClapbindError> {
    let map = build_field_map(record, options)?;
    let entries = map
        .iter()
        .map(|field| {
            let value = field
                .leaf()
                .render()
                .unwrap_or_else(|| NOT_SET.to_string());
            (field.name.clone(), value)
        })
        .collect();
    Ok(ConfigReport { entries })
}
