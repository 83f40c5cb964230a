//! Configuration sources.
//!
//! A source produces a [`Table`], whatever its on-disk format. Tables from
//! several sources are deep-merged over the live record by
//! [`load_sources`](crate::merge::load_sources).
//!
//! The table is a JSON object map, which holds the full range of the record's
//! integers. Null entries are dropped while parsing, so `"url": null` or
//! `token: ~` leave the field at its current value.

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use crate::error::ClapbindError;

/// Key/value tree every source is converted to before merging.
pub type Table = Map<String, Value>;

/// Data read from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceData {
    pub table: Table,
    /// Original text, when there is one; used to locate unknown keys.
    pub text: Option<String>,
}

/// Anything that can supply configuration values.
pub trait ConfigSource {
    /// Human-readable origin used in error messages, e.g. a file path.
    fn origin(&self) -> String;

    fn load(&self) -> Result<SourceData, ClapbindError>;
}

/// File formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
    Yaml,
}

impl SourceFormat {
    /// Pick a format from the file extension (`toml`, `json`, `yml`, `yaml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(SourceFormat::Toml),
            "json" => Some(SourceFormat::Json),
            "yml" | "yaml" => Some(SourceFormat::Yaml),
            _ => None,
        }
    }

    /// Parse text into a table. The document root must be a map.
    pub fn parse(self, text: &str) -> Result<Table, String> {
        let value = match self {
            SourceFormat::Toml => {
                let table = toml::from_str::<toml::Table>(text).map_err(|e| e.to_string())?;
                from_toml(toml::Value::Table(table))
            }
            SourceFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string())?,
            SourceFormat::Yaml => {
                if text.trim().is_empty() {
                    return Ok(Table::new());
                }
                serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())?
            }
        };
        match value {
            Value::Object(mut table) => {
                strip_nulls(&mut table);
                Ok(table)
            }
            Value::Null => Ok(Table::new()),
            other => Err(format!("expected a map at the top level, found {}", kind(&other))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

// Datetimes become their TOML text; non-finite floats become null and are dropped.
fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

/// Remove null entries at every map level.
fn strip_nulls(table: &mut Table) {
    table.retain(|_, value| !value.is_null());
    for value in table.values_mut() {
        if let Value::Object(inner) = value {
            strip_nulls(inner);
        }
    }
}

/// A configuration file whose format follows from its extension.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    /// Fails with [`ClapbindError::UnknownFormat`] for an unrecognised extension.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ClapbindError> {
        let path = path.into();
        let format =
            SourceFormat::from_path(&path).ok_or_else(|| ClapbindError::UnknownFormat(path.clone()))?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }
}

impl ConfigSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<SourceData, ClapbindError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| ClapbindError::IoError {
            path: self.path.clone(),
            source: e,
        })?;
        let table = self
            .format
            .parse(&text)
            .map_err(|reason| ClapbindError::ParseError {
                origin: self.origin(),
                reason,
            })?;
        Ok(SourceData {
            table,
            text: Some(text),
        })
    }
}

/// An in-memory table, for programmatic values and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    name: String,
    table: Table,
}

impl TableSource {
    pub fn new(name: &str, table: Table) -> Self {
        Self {
            name: name.to_string(),
            table,
        }
    }

    /// Parse TOML text into a table source.
    pub fn from_toml(name: &str, text: &str) -> Result<Self, ClapbindError> {
        let table = SourceFormat::Toml
            .parse(text)
            .map_err(|reason| ClapbindError::ParseError {
                origin: name.to_string(),
                reason,
            })?;
        Ok(Self::new(name, table))
    }
}

impl ConfigSource for TableSource {
    fn origin(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<SourceData, ClapbindError> {
        Ok(SourceData {
            table: self.table.clone(),
            text: None,
        })
    }
}

/// One [`FileSource`] per path. Unknown extensions are collected into a single
/// [`ClapbindError::Load`] rather than stopping at the first.
pub fn file_sources(paths: &[PathBuf]) -> Result<Vec<Box<dyn ConfigSource>>, ClapbindError> {
    let mut sources: Vec<Box<dyn ConfigSource>> = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();
    for path in paths {
        match FileSource::new(path.clone()) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(sources)
    } else {
        Err(ClapbindError::Load(errors))
    }
}
