//! The merge cycle: preserve flag values, load sources, reapply flags, validate.
//!
//! Flags are parsed into the live record before [`run`] is called. From there:
//!
//! 1. Snapshot the record in a [`Binder`] (`Preserved`)
//! 2. Load every source over the record (`Loaded`)
//! 3. Copy supplied flag values back from the snapshot (`Reapplied`)
//! 4. Run the caller's validator, if any (`Validated`)
//!
//! Any failure aborts the cycle and is wrapped with the stage it happened in.
//! The result realizes the precedence default < source < flag.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::binder::Binder;
use crate::error::{BoxError, ClapbindError};
use crate::merge::load_sources;
use crate::naming::FlagOptions;
use crate::record::Record;
use crate::source::ConfigSource;
use crate::types::MergeState;

/// Caller-supplied check run on the merged record.
pub type Validator<R> = Arc<dyn Fn(&R) -> Result<(), BoxError> + Send + Sync>;

/// Everything one merge cycle needs, built per invocation.
pub struct MergeContext<R> {
    sources: Vec<Box<dyn ConfigSource>>,
    supplied: Vec<String>,
    options: FlagOptions,
    strict: bool,
    validator: Option<Validator<R>>,
}

impl<R> Default for MergeContext<R> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            supplied: Vec::new(),
            options: FlagOptions::default(),
            strict: false,
            validator: None,
        }
    }
}

impl<R> fmt::Debug for MergeContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origins: Vec<String> = self.sources.iter().map(|s| s.origin()).collect();
        f.debug_struct("MergeContext")
            .field("sources", &origins)
            .field("supplied", &self.supplied)
            .field("options", &self.options)
            .field("strict", &self.strict)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl<R> MergeContext<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn sources(mut self, sources: Vec<Box<dyn ConfigSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Flag names whose values were given on the command line or through env.
    pub fn supplied<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.supplied.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn options(mut self, options: FlagOptions) -> Self {
        self.options = options;
        self
    }

    /// Reject keys the record does not have.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn shared_validator(mut self, validator: Option<Validator<R>>) -> Self {
        self.validator = validator;
        self
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Run the cycle over `live`, whose flags have already been parsed.
///
/// With no sources there is nothing to protect flag values from, so the cycle
/// goes straight to `Done` without snapshotting or validating.
pub fn run<R>(ctx: &MergeContext<R>, live: &mut R) -> Result<MergeState, ClapbindError>
where
    R: Record + Clone + Serialize + DeserializeOwned,
{
    let mut state = MergeState::FlagsParsed;
    if ctx.sources.is_empty() {
        tracing::debug!("no configuration sources");
        return Ok(MergeState::Done);
    }

    let mut binder = Binder::new(live, &ctx.options).map_err(|e| e.at(MergeState::Preserved))?;
    state = advance(state, MergeState::Preserved);

    load_sources(&ctx.sources, live, ctx.strict).map_err(|e| e.at(MergeState::Loaded))?;
    state = advance(state, MergeState::Loaded);

    let applied = binder
        .apply_overrides(&ctx.supplied, live)
        .map_err(|e| e.at(MergeState::Reapplied))?;
    tracing::debug!(applied, "flag values reapplied");
    state = advance(state, MergeState::Reapplied);

    if let Some(validator) = &ctx.validator {
        validator(live).map_err(|e| ClapbindError::Validation(e).at(MergeState::Validated))?;
        state = advance(state, MergeState::Validated);
    }

    Ok(advance(state, MergeState::Done))
}

fn advance(from: MergeState, to: MergeState) -> MergeState {
    tracing::debug!(from = %from, to = %to, "merge stage complete");
    to
}
