//! Bind a configuration struct to command-line flags and config files, and
//! merge them so that flags always win.
//!
//! Clapbind turns every leaf field of a (possibly nested) configuration struct
//! into a command-line flag, loads configuration files over the struct, and
//! then puts back exactly the values the user gave on the command line. The
//! result honours one precedence chain for every field:
//!
//! ```text
//! Compiled default      the value the struct was created with
//!        ↑ overridden by
//! Config sources        --config files or discovered files, later wins
//!        ↑ overridden by
//! Environment vars      bound per flag when an env prefix is set
//!        ↑ overridden by
//! Command-line flags    --port 3000
//! ```
//!
//! ```ignore
//! let outcome = Clapbind::builder::<AppConfig>()
//!     .app_name("myapp")
//!     .validator(|c| c.check())
//!     .run(AppConfig::default())?;
//! ```
//!
//! # Why the two-phase merge
//!
//! Loading a source replaces every field it mentions, including fields the
//! user just set with a flag. Rather than teaching the load which fields to
//! leave alone, a merge cycle snapshots the record first, loads every source,
//! and then copies the supplied flag values back from the snapshot:
//!
//! 1. Flags are parsed straight into the live record.
//! 2. A [`Binder`] snapshots the record and checks that its flag names match.
//! 3. Every source is deep-merged over the record ([`load_sources`]).
//! 4. [`Binder::apply_overrides`] restores the fields whose flags were given.
//! 5. The caller's validator runs on the result.
//!
//! Each stage is a [`MergeState`]; a failure aborts the cycle and the error
//! names the stage ([`ClapbindError::Merge`]). With no sources at all the
//! cycle ends right after the flags are parsed.
//!
//! # Describing a record
//!
//! There is no runtime reflection, so a configuration type lists its fields
//! through [`Record`]. Leaves are any [`Scalar`] (the primitives, `String`,
//! and your own enums), `Option` of one, or a `PathBuf`; nested records are
//! walked recursively:
//!
//! ```ignore
//! impl Record for AppConfig {
//!     fn fields(&mut self) -> Fields<'_> {
//!         Fields::new()
//!             .leaf("host", &mut self.host)
//!             .leaf("port", &mut self.port)
//!             .tag("flag", "port p")
//!             .tag("desc", "port to listen on")
//!             .nested("database", &mut self.database)
//!     }
//! }
//! ```
//!
//! The record also derives `Clone`, `Serialize` and `Deserialize`; the load
//! step goes through a JSON object map, so every 64-bit integer survives it.
//!
//! # Flag names
//!
//! Identifiers are split into words and joined with the divider:
//! `pool_size` and `PoolSize` become `pool-size`, `PDFLoader` becomes
//! `pdf-loader`. Nested records prefix their own name, so `database.pool_size`
//! is `--database-pool-size`. A one-letter name is also a short flag (`-i`).
//! The naming tag (key `flag` by default) changes
//! that per field:
//!
//! | Tag | Effect |
//! |-----|--------|
//! | `-` | no flag (on a nested record: none for the whole subtree) |
//! | `name` | replaces the field's own segment |
//! | `name a alias` | extra names; one-letter aliases become short flags |
//! | `~name` | used verbatim, without outer nested or global prefix |
//!
//! Two fields deriving the same name is an error
//! ([`ClapbindError::NameCollision`]).
//!
//! # Sources
//!
//! `--config a.toml,b.yaml` loads the listed files in order. Without it, the
//! builder looks for `{app_name}.toml` along its [`SearchPath`]s and loads
//! every file found ([`SearchMode::Merge`]) or only the highest-priority one
//! ([`SearchMode::FirstMatch`]). TOML, JSON and YAML files are recognised by
//! extension. A null value in a source leaves the field as it was. A source
//! that fails is skipped and reported after the others have been applied.
//!
//! Strict mode is **on by default**: a key the record does not have fails the
//! load with its origin and line number.
//!
//! # Standard flags
//!
//! Every program gets `--config/--cfg`, `--log <LEVEL>`, `--json/-J`,
//! `--trace <AREA,...>`, `--verbose/-v` and `--checkcfg`. The logging flags
//! configure a `tracing` subscriber; `--checkcfg` validates the merged
//! configuration and returns a [`ConfigReport`] instead of running.
//!
//! # Without clap
//!
//! The field map, binder, sources and merge cycle do not depend on clap. The
//! flag layer and the builder sit behind the `clap` Cargo feature, on by
//! default:
//!
//! ```toml
//! clapbind = { version = "...", default-features = false }
//! ```

pub mod binder;
pub mod error;
pub mod fieldmap;
pub mod file;
pub mod logging;
pub mod merge;
pub mod naming;
pub mod ops;
pub mod record;
pub mod resolve;
pub mod source;
pub mod types;

#[cfg(feature = "clap")]
mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod validate;

#[cfg(test)]
mod fixtures;

pub use binder::{Binder, snapshot};
#[cfg(feature = "clap")]
pub use builder::{Clapbind, ClapbindBuilder, Invocation, Outcome};
#[cfg(feature = "clap")]
pub use cli::{StandardArgs, apply_matches, register_flags, supplied_names};
pub use error::{BoxError, ClapbindError};
pub use fieldmap::{FieldDescriptor, FieldMap, build_field_map};
pub use logging::{LogLevel, LoggingSettings};
pub use merge::load_sources;
pub use naming::{FieldValidator, FlagOptions};
pub use ops::ConfigReport;
pub use record::{Fields, Leaf, Record, Scalar};
pub use resolve::{MergeContext, Validator};
pub use source::{ConfigSource, FileSource, SourceData, SourceFormat, Table, TableSource};
pub use types::{MergeState, SearchMode, SearchPath};
