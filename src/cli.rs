//! Clap adapter.
//!
//! This module is the **optional integration layer** between the clap-free core
//! (field maps, binder, merge cycle) and the [clap](https://docs.rs/clap) CLI
//! parser. It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! It does three things:
//!
//! - [`register_flags`] adds one long flag per leaf field of a record to a
//!   [`Command`], named by the field map.
//! - [`apply_matches`] writes the values that were actually given (on the
//!   command line or through a bound environment variable) into the record and
//!   reports their names. Those names are what the merge cycle reapplies.
//! - [`StandardArgs`] is a derive group with `--config`, `--log`, `--json`,
//!   `--trace`, `--verbose` and `--checkcfg`, embedded into every program.

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Command};

use crate::error::ClapbindError;
use crate::fieldmap::{FieldDescriptor, build_field_map};
use crate::logging::{LogLevel, LoggingSettings};
use crate::naming::FlagOptions;
use crate::record::Record;

/// Flags every program gets.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     standard: StandardArgs,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct StandardArgs {
    /// Configuration files to load, in order. Later files override earlier ones.
    #[arg(
        long = "config",
        visible_alias = "cfg",
        value_name = "PATH",
        value_delimiter = ','
    )]
    pub config: Vec<PathBuf>,

    /// Log level.
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log: LogLevel,

    /// Write log records as JSON.
    #[arg(short = 'J', long)]
    pub json: bool,

    /// Enable trace output for these areas ("all" for everything).
    #[arg(long, value_name = "AREA", value_delimiter = ',')]
    pub trace: Vec<String>,

    /// Shorthand for debug-level logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Validate the configuration, print it and exit.
    #[arg(long)]
    pub checkcfg: bool,
}

impl StandardArgs {
    pub fn logging(&self) -> LoggingSettings {
        LoggingSettings {
            level: self.log,
            json: self.json,
            trace_areas: self.trace.clone(),
            verbose: self.verbose,
        }
    }
}

/// Add one flag per leaf of `record` to `cmd`. A one-letter name is
/// registered as its short form too.
///
/// A flag name, alias or short form already defined on `cmd` fails with
/// [`ClapbindError::FlagConflict`]. `help` and `-h` are always taken, as are
/// `version` and `-V` when the command has a version.
pub fn register_flags<R: Record + ?Sized>(
    mut cmd: Command,
    record: &mut R,
    options: &FlagOptions,
) -> Result<Command, ClapbindError> {
    let map = build_field_map(record, options)?;
    for field in map.iter() {
        check_free(&cmd, field)?;
        cmd = cmd.arg(flag_arg(field));
    }
    tracing::trace!(flags = map.len(), "record flags registered");
    Ok(cmd)
}

fn flag_arg(field: &FieldDescriptor<'_>) -> Arg {
    let leaf = field.leaf();
    let mut arg = Arg::new(field.name.clone())
        .long(field.name.clone())
        .action(ArgAction::Set)
        .value_name(value_name(leaf.type_name()));
    if let Some(c) = single_char(&field.name) {
        arg = arg.short(c);
    }

    if leaf.is_switch() {
        arg = arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true");
    }
    if let Some(default) = leaf.render() {
        arg = arg.default_value(default);
    }
    if let Some(usage) = field.usage {
        arg = arg.help(usage);
    }
    if let Some(env) = &field.env {
        arg = arg.env(env.clone());
    }
    for alias in &field.aliases {
        match single_char(alias) {
            Some(c) => arg = arg.visible_short_alias(c),
            None => arg = arg.visible_alias(alias.clone()),
        }
    }
    arg
}

fn single_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn value_name(type_name: &str) -> String {
    let inner = type_name
        .strip_prefix("core::option::Option<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(type_name);
    let short = inner.rsplit("::").next().unwrap_or(inner);
    short.to_ascii_uppercase()
}

fn check_free(cmd: &Command, field: &FieldDescriptor<'_>) -> Result<(), ClapbindError> {
    let mut longs = vec![field.name.as_str()];
    let mut shorts: Vec<char> = single_char(&field.name).into_iter().collect();
    for alias in &field.aliases {
        match single_char(alias) {
            Some(c) => shorts.push(c),
            None => longs.push(alias.as_str()),
        }
    }

    let has_version = cmd.get_version().is_some() || cmd.get_long_version().is_some();
    for long in &longs {
        let taken = *long == "help"
            || (has_version && *long == "version")
            || cmd.get_arguments().any(|a| {
                a.get_id().as_str() == *long
                    || a.get_long() == Some(*long)
                    || a.get_all_aliases()
                        .is_some_and(|aliases| aliases.contains(long))
            });
        if taken {
            return Err(ClapbindError::FlagConflict(long.to_string()));
        }
    }
    for short in shorts {
        let taken = short == 'h'
            || (has_version && short == 'V')
            || cmd.get_arguments().any(|a| {
                a.get_short() == Some(short)
                    || a.get_all_short_aliases()
                        .is_some_and(|aliases| aliases.contains(&short))
            });
        if taken {
            return Err(ClapbindError::FlagConflict(short.to_string()));
        }
    }
    Ok(())
}

fn was_supplied(matches: &ArgMatches, id: &str) -> bool {
    matches!(
        matches.value_source(id),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

/// Every argument id whose value came from the command line or environment.
pub fn supplied_names(matches: &ArgMatches) -> Vec<String> {
    matches
        .ids()
        .map(|id| id.as_str())
        .filter(|id| was_supplied(matches, id))
        .map(str::to_string)
        .collect()
}

/// Write supplied flag values into `record` and return their names.
///
/// Flags left at their default are not touched, so values already in the
/// record stay. Each value passes the per-field validator from `options`
/// first, then is parsed for the field's type; either failing gives
/// [`ClapbindError::InvalidFlagValue`].
pub fn apply_matches<R: Record + ?Sized>(
    matches: &ArgMatches,
    record: &mut R,
    options: &FlagOptions,
) -> Result<Vec<String>, ClapbindError> {
    let mut map = build_field_map(record, options)?;
    let mut supplied = Vec::new();

    for field in map.iter_mut() {
        if !was_supplied(matches, &field.name) {
            continue;
        }
        let Some(raw) = matches.try_get_one::<String>(&field.name).ok().flatten() else {
            continue;
        };
        let name = field.name.clone();
        let invalid = |reason: String| ClapbindError::InvalidFlagValue {
            name: name.clone(),
            value: raw.clone(),
            reason,
        };
        if let Some(validator) = &options.validator {
            validator(&name, raw).map_err(invalid)?;
        }
        field.leaf_mut().set_raw(raw).map_err(invalid)?;
        tracing::trace!(flag = %name, value = %raw, "flag value set");
        supplied.push(name);
    }
    Ok(supplied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Counter, TestConfig};
    use crate::record::Fields;
    use std::sync::Arc;

    fn command(config: &mut TestConfig, options: &FlagOptions) -> Command {
        register_flags(Command::new("test"), config, options).unwrap()
    }

    fn parse(args: &[&str]) -> (TestConfig, Vec<String>) {
        let options = FlagOptions::default();
        let mut config = TestConfig::default();
        let matches = command(&mut config, &options)
            .try_get_matches_from(args)
            .unwrap();
        let supplied = apply_matches(&matches, &mut config, &options).unwrap();
        (config, supplied)
    }

    #[test]
    fn registers_one_flag_per_leaf() {
        let mut config = TestConfig::default();
        let cmd = command(&mut config, &FlagOptions::default());
        let mut longs: Vec<&str> = cmd.get_arguments().filter_map(|a| a.get_long()).collect();
        longs.sort();
        assert_eq!(
            longs,
            vec!["database-pool-size", "database-url", "debug", "host", "port"]
        );
        let port = cmd
            .get_arguments()
            .find(|a| a.get_id() == "port")
            .unwrap();
        assert_eq!(port.get_help().map(|h| h.to_string()).as_deref(), Some("The port number."));
    }

    #[test]
    fn supplied_values_written_and_reported() {
        let (config, supplied) = parse(&["test", "--port", "3000", "--database-url", "pg://x"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.database.url.as_deref(), Some("pg://x"));
        assert_eq!(config.host, "localhost");

        let mut supplied = supplied;
        supplied.sort();
        assert_eq!(supplied, vec!["database-url", "port"]);
    }

    #[test]
    fn unsupplied_flags_leave_record_alone() {
        let (config, supplied) = parse(&["test"]);
        assert_eq!(config, TestConfig::default());
        assert!(supplied.is_empty());
    }

    #[test]
    fn bool_flag_forms() {
        let (config, _) = parse(&["test", "--debug"]);
        assert!(config.debug);

        let options = FlagOptions::default();
        let mut config = TestConfig {
            debug: true,
            ..TestConfig::default()
        };
        let matches = command(&mut config, &options)
            .try_get_matches_from(["test", "--debug=false"])
            .unwrap();
        let supplied = apply_matches(&matches, &mut config, &options).unwrap();
        assert!(!config.debug);
        assert_eq!(supplied, vec!["debug"]);
    }

    #[test]
    fn bad_value_is_invalid_flag_value() {
        let options = FlagOptions::default();
        let mut config = TestConfig::default();
        let matches = command(&mut config, &options)
            .try_get_matches_from(["test", "--port", "eighty"])
            .unwrap();
        let err = apply_matches(&matches, &mut config, &options).unwrap_err();
        match err {
            ClapbindError::InvalidFlagValue { name, value, .. } => {
                assert_eq!(name, "port");
                assert_eq!(value, "eighty");
            }
            other => panic!("Expected InvalidFlagValue, got {other:?}"),
        }
    }

    #[test]
    fn field_validator_runs_before_assignment() {
        let options = FlagOptions {
            validator: Some(Arc::new(|name, raw| {
                if name == "host" && raw.contains(' ') {
                    Err("host may not contain spaces".into())
                } else {
                    Ok(())
                }
            })),
            ..FlagOptions::default()
        };
        let mut config = TestConfig::default();
        let matches = command(&mut config, &options)
            .try_get_matches_from(["test", "--host", "a b"])
            .unwrap();
        let err = apply_matches(&matches, &mut config, &options).unwrap_err();
        assert!(err.to_string().contains("spaces"));
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn aliases_become_short_and_long_flags() {
        #[derive(Clone, Default)]
        struct Tagged {
            level: u8,
        }
        impl Record for Tagged {
            fn fields(&mut self) -> Fields<'_> {
                Fields::new()
                    .leaf("level", &mut self.level)
                    .tag("flag", "level l lvl")
            }
        }
        let options = FlagOptions::default();
        let mut record = Tagged::default();
        let cmd = register_flags(Command::new("test"), &mut record, &options).unwrap();

        for args in [
            ["test", "-l", "3"],
            ["test", "--lvl", "3"],
            ["test", "--level", "3"],
        ] {
            let matches = cmd.clone().try_get_matches_from(args).unwrap();
            let mut record = Tagged::default();
            let supplied = apply_matches(&matches, &mut record, &options).unwrap();
            assert_eq!(record.level, 3);
            assert_eq!(supplied, vec!["level"]);
        }
    }

    #[test]
    fn conflicting_flag_rejected() {
        let cmd = Command::new("test").arg(Arg::new("port").long("port"));
        let mut config = TestConfig::default();
        let err = register_flags(cmd, &mut config, &FlagOptions::default()).unwrap_err();
        assert!(matches!(err, ClapbindError::FlagConflict(name) if name == "port"));
    }

    #[test]
    fn help_name_is_reserved() {
        #[derive(Clone, Default)]
        struct Helpful {
            help: bool,
        }
        impl Record for Helpful {
            fn fields(&mut self) -> Fields<'_> {
                Fields::new().leaf("help", &mut self.help)
            }
        }
        let err = register_flags(
            Command::new("test"),
            &mut Helpful::default(),
            &FlagOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClapbindError::FlagConflict(_)));
    }

    #[test]
    fn standard_flag_names_are_taken() {
        #[derive(Clone, Default)]
        struct Verbose {
            verbose: bool,
        }
        impl Record for Verbose {
            fn fields(&mut self) -> Fields<'_> {
                Fields::new().leaf("verbose", &mut self.verbose)
            }
        }
        let cmd = StandardArgs::augment_args(Command::new("test"));
        let err =
            register_flags(cmd, &mut Verbose::default(), &FlagOptions::default()).unwrap_err();
        assert!(matches!(err, ClapbindError::FlagConflict(name) if name == "verbose"));
    }

    #[test]
    fn one_letter_name_gets_short_flag() {
        let options = FlagOptions::default();
        let mut counter = Counter::default();
        let cmd = register_flags(Command::new("test"), &mut counter, &options).unwrap();
        let arg = cmd.get_arguments().find(|a| a.get_id() == "i").unwrap();
        assert_eq!(arg.get_short(), Some('i'));
        assert_eq!(arg.get_long(), Some("i"));

        let matches = cmd.try_get_matches_from(["test", "-i", "77"]).unwrap();
        let supplied = apply_matches(&matches, &mut counter, &options).unwrap();
        assert_eq!(counter.i, 77);
        assert_eq!(supplied, vec!["i"]);
    }

    #[test]
    fn one_letter_name_conflicts_with_standard_short() {
        #[derive(Clone, Default)]
        struct Short {
            v: u8,
        }
        impl Record for Short {
            fn fields(&mut self) -> Fields<'_> {
                Fields::new().leaf("v", &mut self.v)
            }
        }
        let cmd = StandardArgs::augment_args(Command::new("test"));
        let err =
            register_flags(cmd, &mut Short::default(), &FlagOptions::default()).unwrap_err();
        assert!(matches!(err, ClapbindError::FlagConflict(name) if name == "v"));
    }

    #[test]
    fn supplied_names_skips_defaults() {
        let mut config = TestConfig::default();
        let cmd = command(&mut config, &FlagOptions::default());
        let matches = cmd.try_get_matches_from(["test", "--host", "h"]).unwrap();
        assert_eq!(supplied_names(&matches), vec!["host"]);
    }

    #[test]
    fn standard_args_parse() {
        use clap::Parser;

        #[derive(Debug, Parser)]
        struct TestCli {
            #[command(flatten)]
            standard: StandardArgs,
        }

        let cli = TestCli::try_parse_from([
            "test",
            "--cfg",
            "a.toml,b.yaml",
            "--config",
            "c.json",
            "--log",
            "DEBUG",
            "-J",
            "--trace",
            "parser,merge",
            "-v",
            "--checkcfg",
        ])
        .unwrap();
        let s = cli.standard;
        assert_eq!(
            s.config,
            vec![
                PathBuf::from("a.toml"),
                PathBuf::from("b.yaml"),
                PathBuf::from("c.json")
            ]
        );
        assert_eq!(s.log, LogLevel::Debug);
        assert!(s.json && s.verbose && s.checkcfg);
        assert_eq!(s.logging().trace_areas, vec!["parser", "merge"]);

        let defaults = TestCli::try_parse_from(["test"]).unwrap().standard;
        assert_eq!(defaults.log, LogLevel::Info);
        assert!(defaults.config.is_empty());
    }

    #[test]
    fn value_names_from_types() {
        assert_eq!(value_name("u16"), "U16");
        assert_eq!(value_name("alloc::string::String"), "STRING");
        assert_eq!(
            value_name("core::option::Option<alloc::string::String>"),
            "STRING"
        );
    }
}
