use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use clapbind::{
    Binder, Clapbind, ClapbindBuilder, ClapbindError, Fields, FlagOptions, MergeContext,
    MergeState, Outcome, Record, TableSource,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    workers: u32,
    mode: String,
    cache: Cache,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: 4,
            mode: "fast".into(),
            cache: Cache::default(),
        }
    }
}

impl Record for Settings {
    fn fields(&mut self) -> Fields<'_> {
        Fields::new()
            .leaf("workers", &mut self.workers)
            .tag("flag", "workers w")
            .leaf("mode", &mut self.mode)
            .nested("cache", &mut self.cache)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
struct Cache {
    dir: PathBuf,
    ttl_secs: Option<u64>,
}

impl Record for Cache {
    fn fields(&mut self) -> Fields<'_> {
        Fields::new()
            .path("dir", &mut self.dir)
            .optional("ttl_secs", &mut self.ttl_secs)
    }
}

fn builder() -> ClapbindBuilder<Settings> {
    Clapbind::builder::<Settings>()
        .app_name("clapbind-it")
        .search_paths(vec![])
        .init_logging(false)
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn settings(args: &[&str]) -> Settings {
    match builder().run_from(Settings::default(), args.iter().copied()) {
        Ok(Outcome::Run(inv)) => inv.config,
        other => panic!("Expected Run, got {other:?}"),
    }
}

#[test]
fn defaults_without_flags_or_files() {
    assert_eq!(settings(&["prog"]), Settings::default());
}

#[test]
fn file_overrides_default_and_flag_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "it.toml",
        "workers = 16\nmode = \"safe\"\n[cache]\nttl_secs = 60\n",
    );

    let s = settings(&["prog", "--config", path.as_str(), "-w", "2"]);
    assert_eq!(s.workers, 2);
    assert_eq!(s.mode, "safe");
    assert_eq!(s.cache.ttl_secs, Some(60));
}

#[test]
fn flag_equal_to_default_still_wins() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "it.toml", "workers = 16\n");

    let s = settings(&["prog", "--config", path.as_str(), "--workers", "4"]);
    assert_eq!(s.workers, 4);
}

#[test]
fn formats_mix_across_config_files() {
    let dir = TempDir::new().unwrap();
    let toml = write(dir.path(), "a.toml", "workers = 8\nmode = \"toml\"\n");
    let json = write(dir.path(), "b.json", r#"{"mode": "json"}"#);
    let yaml = write(dir.path(), "c.yml", "cache:\n  dir: /var/cache/it\n");
    let list = format!("{toml},{json},{yaml}");

    let s = settings(&["prog", "--cfg", list.as_str()]);
    assert_eq!(s.workers, 8);
    assert_eq!(s.mode, "json");
    assert_eq!(s.cache.dir, PathBuf::from("/var/cache/it"));
}

#[test]
fn null_in_config_file_leaves_field_alone() {
    let dir = TempDir::new().unwrap();
    let json = write(dir.path(), "c.json", r#"{"mode": null, "workers": 9}"#);
    let yaml = write(dir.path(), "d.yaml", "cache:\n  ttl_secs: ~\n");
    let list = format!("{json},{yaml}");

    let s = settings(&["prog", "--config", list.as_str()]);
    assert_eq!(s.workers, 9);
    assert_eq!(s.mode, "fast");
    assert_eq!(s.cache.ttl_secs, None);
}

#[test]
fn broken_file_is_reported_after_the_rest_load() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.toml", "workers = [[\n");
    let good = write(dir.path(), "good.toml", "workers = 12\n");
    let list = format!("{bad},{good}");

    let err = builder()
        .run_from(
            Settings::default(),
            ["prog", "--config", list.as_str()].iter().copied(),
        )
        .unwrap_err();
    assert_eq!(err.stage(), Some(MergeState::Loaded));
    match err.root() {
        ClapbindError::Load(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].to_string().contains("bad.toml"));
        }
        other => panic!("Expected Load, got {other:?}"),
    }
}

#[test]
fn checkcfg_lists_merged_values() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "it.toml", "mode = \"checked\"\n");

    let outcome = builder()
        .validator(|s: &Settings| {
            if s.workers == 0 {
                return Err("workers must be positive".into());
            }
            Ok(())
        })
        .run_from(
            Settings::default(),
            ["prog", "--checkcfg", "--config", path.as_str()]
                .iter()
                .copied(),
        )
        .unwrap();

    match outcome {
        Outcome::ConfigChecked(report) => {
            assert_eq!(report.get("mode"), Some("checked"));
            assert_eq!(report.get("workers"), Some("4"));
            assert_eq!(report.get("cache-ttl-secs"), Some("<not set>"));
            assert!(report.to_string().starts_with("configuration is OK"));
        }
        Outcome::Run(_) => panic!("Expected ConfigChecked"),
    }
}

#[test]
fn merge_cycle_without_clap_parsing() {
    let mut live = Settings::default();
    live.workers = 77;

    let ctx = MergeContext::<Settings>::new()
        .source(TableSource::from_toml("inline", "workers = 33\nmode = \"inline\"").unwrap())
        .supplied(["workers"]);
    let state = clapbind::resolve::run(&ctx, &mut live).unwrap();

    assert_eq!(state, MergeState::Done);
    assert_eq!(live.workers, 77);
    assert_eq!(live.mode, "inline");
}

#[test]
fn binder_restores_only_named_fields() {
    let mut live = Settings::default();
    live.workers = 9;
    live.mode = "flagged".into();

    let mut binder = Binder::new(&mut live, &FlagOptions::default()).unwrap();
    live.workers = 1;
    live.mode = "from file".into();
    let applied = binder.apply_overrides(&["mode"], &mut live).unwrap();

    assert_eq!(applied, 1);
    assert_eq!(live.workers, 1);
    assert_eq!(live.mode, "flagged");
}
