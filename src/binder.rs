//! Preserve flag-supplied values across a destructive configuration load.
//!
//! Flags are parsed straight into the live record. Loading configuration
//! sources afterwards may overwrite those fields, so before the load a
//! [`Binder`] snapshots the record. Once the load is done,
//! [`Binder::apply_overrides`] copies back exactly the fields whose flags were
//! supplied.
//!
//! The binder owns the snapshot and remembers the flag names both field maps
//! agreed on. The maps themselves borrow their records, so they are rebuilt
//! when the overrides are applied; holding a mutable view of the live record
//! across the load would lock it.

use std::collections::BTreeSet;

use crate::error::ClapbindError;
use crate::fieldmap::build_field_map;
use crate::naming::FlagOptions;
use crate::record::Record;

/// Deep copy of a record. Owned data cloned through `Clone` shares no storage
/// with `record`.
pub fn snapshot<R: Clone>(record: &R) -> R {
    record.clone()
}

/// A snapshot of the live record plus the flag names of both records.
#[derive(Debug)]
pub struct Binder<R> {
    clone: R,
    names: BTreeSet<String>,
    options: FlagOptions,
}

impl<R: Record + Clone> Binder<R> {
    /// Snapshot `live` and check that its field map and the clone's agree.
    pub fn new(live: &mut R, options: &FlagOptions) -> Result<Self, ClapbindError> {
        let mut clone = snapshot(&*live);

        let live_names = flag_names(live, options).map_err(|e| ClapbindError::FieldMap {
            target: "configuration",
            source: Box::new(e),
        })?;
        let clone_names = flag_names(&mut clone, options).map_err(|e| ClapbindError::FieldMap {
            target: "configuration clone",
            source: Box::new(e),
        })?;
        if live_names != clone_names {
            return Err(ClapbindError::ShapeMismatch);
        }

        tracing::trace!(fields = live_names.len(), "snapshot taken");
        Ok(Self {
            clone,
            names: live_names,
            options: options.clone(),
        })
    }

    /// The snapshot taken at construction.
    pub fn snapshot(&self) -> &R {
        &self.clone
    }

    /// Flag names covered by this binder.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Copy the snapshot's value of every supplied flag into `live`.
    ///
    /// Names that are not fields of the record (`help`, `config`, …) are
    /// skipped. Applying the same names again leaves `live` unchanged.
    /// Returns how many fields were written.
    ///
    /// Takes `&mut self` only because a field map needs mutable access to the
    /// snapshot it is built over. The snapshot itself is never written.
    pub fn apply_overrides<S: AsRef<str>>(
        &mut self,
        supplied: &[S],
        live: &mut R,
    ) -> Result<usize, ClapbindError> {
        let source = build_field_map(&mut self.clone, &self.options)?;
        let mut target = build_field_map(live, &self.options)?;
        if target.len() != self.names.len() || !self.names.iter().all(|n| target.contains(n)) {
            return Err(ClapbindError::ShapeMismatch);
        }

        let mut applied = 0;
        for name in supplied {
            let name = name.as_ref();
            let (Some(from), Some(to)) = (source.get(name), target.get_mut(name)) else {
                continue;
            };
            if to.leaf_mut().assign_from(from.leaf()) {
                tracing::debug!(flag = name, "flag value reapplied");
                applied += 1;
            } else {
                tracing::warn!(
                    flag = name,
                    expected = to.leaf().type_name(),
                    found = from.leaf().type_name(),
                    "flag value not reapplied: type mismatch"
                );
            }
        }
        Ok(applied)
    }
}

fn flag_names<R: Record>(
    record: &mut R,
    options: &FlagOptions,
) -> Result<BTreeSet<String>, ClapbindError> {
    let map = build_field_map(record, options)?;
    Ok(map.names().map(str::to_string).collect())
}
