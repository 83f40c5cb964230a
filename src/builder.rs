use std::ffi::OsString;
use std::fmt;

use clap::{ArgMatches, Args, Command, FromArgMatches};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cli::{self, StandardArgs};
use crate::error::{BoxError, ClapbindError};
use crate::file;
use crate::logging;
use crate::naming::FlagOptions;
use crate::ops::{self, ConfigReport};
use crate::record::Record;
use crate::resolve::{self, MergeContext, Validator};
use crate::source::{self, ConfigSource};
use crate::types::{MergeState, SearchMode, SearchPath};

/// Entry point for building a program around a configuration record.
pub struct Clapbind;

impl Clapbind {
    pub fn builder<R>() -> ClapbindBuilder<R> {
        ClapbindBuilder::new()
    }
}

/// What a run produced.
#[derive(Debug)]
pub enum Outcome<R> {
    /// Configuration merged; the program should carry on with it.
    Run(Invocation<R>),
    /// `--checkcfg` was given and the configuration validated. The program
    /// should print the report and exit successfully.
    ConfigChecked(ConfigReport),
}

/// The merged configuration and everything parsed along the way.
#[derive(Debug)]
pub struct Invocation<R> {
    pub config: R,
    /// Full matches, for the program's own arguments and subcommands.
    pub matches: ArgMatches,
    pub standard: StandardArgs,
    /// Origins of the configuration sources that were loaded.
    pub sources: Vec<String>,
    pub state: MergeState,
}

/// Builder for a command line bound to a configuration record.
///
/// Controls three things:
///
/// - **Flags**: which record fields become flags and how they are named
///   ([`bind_flags()`](Self::bind_flags), [`env_prefix()`](Self::env_prefix), ...).
/// - **Discovery**: [`search_paths()`](Self::search_paths) and
///   [`search_mode()`](Self::search_mode), used when `--config` is not given.
/// - **Checking**: [`strict()`](Self::strict) and [`validator()`](Self::validator).
pub struct ClapbindBuilder<R> {
    app_name: Option<String>,
    version: Option<String>,
    about: Option<String>,
    command: Option<Command>,
    options: FlagOptions,
    bind_flags: bool,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    strict: bool,
    init_logging: bool,
    validator: Option<Validator<R>>,
}

impl<R> fmt::Debug for ClapbindBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClapbindBuilder")
            .field("app_name", &self.app_name)
            .field("version", &self.version)
            .field("options", &self.options)
            .field("bind_flags", &self.bind_flags)
            .field("file_name", &self.file_name)
            .field("search_paths", &self.search_paths)
            .field("search_mode", &self.search_mode)
            .field("strict", &self.strict)
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl<R> ClapbindBuilder<R> {
    fn new() -> Self {
        Self {
            app_name: None,
            version: None,
            about: None,
            command: None,
            options: FlagOptions::default(),
            bind_flags: true,
            file_name: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            strict: true,
            init_logging: true,
            validator: None,
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - `file_name` → `"{app_name}.toml"`
    /// - `search_paths` → `[SearchPath::Platform]`
    /// - the command name, when no [`command()`](Self::command) is given
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Start from an existing command, e.g. one carrying the program's own
    /// arguments and subcommands. Its name stands in for a missing app name.
    pub fn command(mut self, cmd: Command) -> Self {
        self.command = Some(cmd);
        self
    }

    /// Register a flag for every record field (default: `true`).
    pub fn bind_flags(mut self, bind: bool) -> Self {
        self.bind_flags = bind;
        self
    }

    /// Replace all flag naming options at once.
    pub fn flag_options(mut self, options: FlagOptions) -> Self {
        self.options = options;
        self
    }

    /// Tag key holding flag name overrides (default: `"flag"`).
    pub fn tag(mut self, key: &str) -> Self {
        self.options.tag = key.to_string();
        self
    }

    /// Tag key holding flag help text (default: `"desc"`).
    pub fn desc_tag(mut self, key: &str) -> Self {
        self.options.desc_tag = key.to_string();
        self
    }

    pub fn divider(mut self, divider: &str) -> Self {
        self.options.divider = divider.to_string();
        self
    }

    pub fn env_divider(mut self, divider: &str) -> Self {
        self.options.env_divider = divider.to_string();
        self
    }

    /// Bind every record flag to `{prefix}{FLAG_NAME}`. Unset by default.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.options.env_prefix = prefix.to_string();
        self
    }

    /// Prefix for every record flag name.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.options.prefix = prefix.to_string();
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.options.flatten = flatten;
        self
    }

    /// Check each raw flag value before it is written into the record.
    pub fn field_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.options.validator = Some(std::sync::Arc::new(f));
        self
    }

    /// Override the config file name (default: `"{app_name}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Install the log subscriber from the standard flags (default: `true`).
    pub fn init_logging(mut self, init: bool) -> Self {
        self.init_logging = init;
        self
    }

    /// Check the merged configuration. Required for `--checkcfg`.
    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.validator = Some(std::sync::Arc::new(f));
        self
    }

    fn effective_app_name(&self) -> Result<String, ClapbindError> {
        if let Some(name) = &self.app_name {
            return Ok(name.clone());
        }
        self.command
            .as_ref()
            .map(|cmd| cmd.get_name().to_string())
            .ok_or(ClapbindError::AppNameRequired)
    }

    fn effective_file_name(&self) -> Result<String, ClapbindError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        let app = self.effective_app_name()?;
        Ok(format!("{app}.toml"))
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        if let Some(paths) = &self.search_paths {
            return paths.clone();
        }
        vec![SearchPath::Platform]
    }

    fn build_command(&self, app_name: &str) -> Command {
        let mut cmd = self
            .command
            .clone()
            .unwrap_or_else(|| Command::new(app_name.to_string()));
        if let Some(version) = &self.version {
            cmd = cmd.version(version.clone());
        }
        if let Some(about) = &self.about {
            cmd = cmd.about(about.clone());
        }
        StandardArgs::augment_args(cmd)
    }

    /// `--config` paths if any were given, otherwise the discovered files.
    fn select_sources(
        &self,
        standard: &StandardArgs,
        app_name: &str,
    ) -> Result<Vec<Box<dyn ConfigSource>>, ClapbindError> {
        if !standard.config.is_empty() {
            return source::file_sources(&standard.config);
        }
        let file_name = self.effective_file_name()?;
        let found = file::discover_config_files(
            &self.effective_search_paths(),
            &file_name,
            app_name,
            self.search_mode,
        )?;
        source::file_sources(&found)
    }
}

impl<R> ClapbindBuilder<R>
where
    R: Record + Clone + Serialize + DeserializeOwned,
{
    /// Parse the process arguments and merge the configuration.
    ///
    /// `--help`, `--version` and usage errors print and exit the way clap does.
    pub fn run(self, config: R) -> Result<Outcome<R>, ClapbindError> {
        match self.run_from(config, std::env::args_os()) {
            Err(ClapbindError::Cli(e)) => e.exit(),
            other => other,
        }
    }

    /// Like [`run`](Self::run) with explicit arguments; the first is the
    /// program name. Clap errors, help and version included, are returned.
    pub fn run_from<I, T>(self, mut config: R, args: I) -> Result<Outcome<R>, ClapbindError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let app_name = self.effective_app_name()?;
        let mut cmd = self.build_command(&app_name);
        if self.bind_flags {
            cmd = cli::register_flags(cmd, &mut config, &self.options)?;
        }

        let matches = cmd.try_get_matches_from(args)?;
        let standard = StandardArgs::from_arg_matches(&matches)?;
        if self.init_logging {
            logging::init_logging(&standard.logging())?;
        }
        if standard.checkcfg && self.validator.is_none() {
            return Err(ClapbindError::NoValidator);
        }

        let supplied = if self.bind_flags {
            cli::apply_matches(&matches, &mut config, &self.options)
                .map_err(|e| e.at(MergeState::FlagsParsed))?
        } else {
            Vec::new()
        };
        tracing::debug!(app = %app_name, supplied = ?supplied, "flags parsed");

        let sources = self
            .select_sources(&standard, &app_name)
            .map_err(|e| e.at(MergeState::Loaded))?;
        let origins: Vec<String> = sources.iter().map(|s| s.origin()).collect();

        let ctx = MergeContext::new()
            .sources(sources)
            .supplied(supplied)
            .options(self.options.clone())
            .strict(self.strict)
            .shared_validator(self.validator.clone());
        let state = resolve::run(&ctx, &mut config)?;

        if standard.checkcfg {
            // A cycle without sources skips validation; --checkcfg never does.
            if !ctx.has_sources()
                && let Some(validator) = &self.validator
            {
                validator(&config)
                    .map_err(|e| ClapbindError::Validation(e).at(MergeState::Validated))?;
            }
            let report = ops::list_values(&mut config, &self.options)?;
            tracing::info!("configuration is OK");
            return Ok(Outcome::ConfigChecked(report));
        }

        Ok(Outcome::Run(Invocation {
            config,
            matches,
            standard,
            sources: origins,
            state,
        }))
    }
}
