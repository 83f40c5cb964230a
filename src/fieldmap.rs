//! Flatten a record into a map from flag name to leaf field.
//!
//! The walk is depth-first over the record's descriptor table. Each leaf gets
//! the name rules from [`naming`](crate::naming); nested records prefix the
//! names inside them with their own converted identifier and the divider.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ClapbindError;
use crate::naming::{self, FlagOptions, FlagTag};
use crate::record::{FieldKind, Fields, Leaf, Record};

/// One leaf field reachable from a record.
pub struct FieldDescriptor<'a> {
    /// Field identifiers from the root record down to the leaf.
    pub path: Vec<&'static str>,
    /// External (flag) name; also the key in the [`FieldMap`].
    pub name: String,
    /// Further names from the tag. Single characters are short flags.
    pub aliases: Vec<String>,
    /// Usage text from the description tag.
    pub usage: Option<&'static str>,
    /// Bound environment variable, when an env prefix is configured.
    pub env: Option<String>,
    leaf: Box<dyn Leaf + 'a>,
}

impl<'a> FieldDescriptor<'a> {
    pub fn leaf(&self) -> &dyn Leaf {
        self.leaf.as_ref()
    }

    pub fn leaf_mut(&mut self) -> &mut (dyn Leaf + 'a) {
        self.leaf.as_mut()
    }

    /// Dotted field path, e.g. `database.pool_size`.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Debug for FieldDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("env", &self.env)
            .field("type", &self.leaf.type_name())
            .finish()
    }
}

/// Flag name → leaf field, for one record instance.
#[derive(Debug, Default)]
pub struct FieldMap<'a> {
    entries: BTreeMap<String, FieldDescriptor<'a>>,
}

impl<'a> FieldMap<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<'a>> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor<'a>> {
        self.entries.get_mut(name)
    }

    /// Flag names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<'a>> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldDescriptor<'a>> {
        self.entries.values_mut()
    }
}

/// Build the field map of `record`.
///
/// Returns an empty map for a record without leaves. Two leaves deriving the
/// same flag name fail with [`ClapbindError::NameCollision`].
pub fn build_field_map<'a, R: Record + ?Sized>(
    record: &'a mut R,
    options: &FlagOptions,
) -> Result<FieldMap<'a>, ClapbindError> {
    let mut map = FieldMap::default();
    walk(record.fields(), "", false, &[], options, &mut map)?;
    Ok(map)
}

// `absolute` is set below a nested record tagged `~name`; the global prefix
// no longer applies there.
fn walk<'a>(
    fields: Fields<'a>,
    prefix: &str,
    absolute: bool,
    path: &[&'static str],
    options: &FlagOptions,
    map: &mut FieldMap<'a>,
) -> Result<(), ClapbindError> {
    for field in fields {
        let name_tag = field.tag(&options.tag);
        let usage = field.tag(&options.desc_tag);
        let mut field_path = path.to_vec();
        field_path.push(field.ident);

        match field.kind {
            FieldKind::Leaf(leaf) => {
                let Some(leaf_name) = naming::leaf_name(field.ident, name_tag, options) else {
                    continue;
                };
                let name = if leaf_name.absolute {
                    leaf_name.name
                } else if absolute {
                    format!("{prefix}{}", leaf_name.name)
                } else {
                    format!("{}{prefix}{}", options.prefix, leaf_name.name)
                };
                if let Some(existing) = map.entries.get(&name) {
                    return Err(ClapbindError::NameCollision {
                        name,
                        first: existing.dotted_path(),
                        second: field_path.join("."),
                    });
                }
                let descriptor = FieldDescriptor {
                    env: options.env_name(&name),
                    path: field_path,
                    name: name.clone(),
                    aliases: leaf_name.aliases,
                    usage,
                    leaf,
                };
                map.entries.insert(name, descriptor);
            }
            FieldKind::Nested { fields, embedded } => {
                // Aliases on a nested record have nothing to attach to and are ignored.
                let divider = &options.divider;
                let (nested_prefix, nested_absolute) = match FlagTag::parse(name_tag) {
                    FlagTag::Skip => continue,
                    FlagTag::Named {
                        name,
                        absolute: true,
                        ..
                    } => (format!("{name}{divider}"), true),
                    FlagTag::Named { name, .. } => (format!("{prefix}{name}{divider}"), absolute),
                    FlagTag::Computed if embedded && options.flatten => (prefix.to_string(), absolute),
                    FlagTag::Computed => {
                        let segment = naming::camel_to_flag(field.ident, divider);
                        (format!("{prefix}{segment}{divider}"), absolute)
                    }
                };
                walk(fields, &nested_prefix, nested_absolute, &field_path, options, map)?;
            }
        }
    }
    Ok(())
}
