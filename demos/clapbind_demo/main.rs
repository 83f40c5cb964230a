//! # clapbind demo application
//!
//! A sample CLI that shows how a program is built around clapbind. It prints
//! the configuration it ended up with, colored by `display.color`.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example clapbind_demo -- --help
//! cargo run --example clapbind_demo -- --server-port 8080
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature              | How to exercise it                                                   |
//! |----------------------|----------------------------------------------------------------------|
//! | Compiled defaults    | `cargo run --example clapbind_demo`                                  |
//! | Discovered file      | Create `clapbind-demo.toml` in cwd, then run with no flags           |
//! | Explicit files       | `cargo run --example clapbind_demo -- --config a.toml,b.yaml`        |
//! | Env var              | `CLAPBIND_DEMO_SERVER_PORT=9999 cargo run --example clapbind_demo`   |
//! | Flag beats file      | `cargo run --example clapbind_demo -- --config a.toml -p 1234`       |
//! | Verbatim flag name   | `cargo run --example clapbind_demo -- --color blue`                  |
//! | Config check         | `cargo run --example clapbind_demo -- --checkcfg`                    |
//! | Logging              | `cargo run --example clapbind_demo -- --log debug --trace clapbind`  |

mod config;

use clapbind::{Clapbind, Outcome, SearchPath};

use config::DemoConfig;

const RESET: &str = "\x1b[0m";

fn check(config: &DemoConfig) -> Result<(), clapbind::BoxError> {
    if config.server.port == 0 {
        return Err("server.port must not be 0".into());
    }
    if !matches!(config.display.format.as_str(), "table" | "plain") {
        return Err(format!("unknown display.format '{}'", config.display.format).into());
    }
    Ok(())
}

fn echo(config: &DemoConfig, sources: &[String]) {
    let color = config.display.color.ansi();
    let token = config.server.token.as_deref().unwrap_or("<not set>");
    let entries = [
        ("name", config.name.clone()),
        ("server.host", config.server.host.clone()),
        ("server.port", config.server.port.to_string()),
        (
            "server.max_connections",
            config.server.max_connections.to_string(),
        ),
        ("server.token", token.to_string()),
        ("display.color", config.display.color.to_string()),
        ("display.format", config.display.format.clone()),
    ];

    if sources.is_empty() {
        println!("{color}(no configuration files){RESET}");
    } else {
        println!("{color}loaded: {}{RESET}", sources.join(", "));
    }

    if config.display.format == "plain" {
        for (key, value) in &entries {
            println!("{key}={value}");
        }
    } else {
        let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &entries {
            println!("{color}{key:<width$}{RESET}  {value}");
        }
    }
}

fn main() {
    let outcome = Clapbind::builder::<DemoConfig>()
        .app_name("clapbind-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sample program showing clapbind's flag and file merging")
        .env_prefix("CLAPBIND_DEMO_")
        .search_paths(vec![
            SearchPath::Platform,
            SearchPath::Home(".clapbind-demo"),
            SearchPath::Cwd,
        ])
        .validator(check)
        .run(DemoConfig::default());

    match outcome {
        Ok(Outcome::Run(invocation)) => {
            tracing::info!(sources = invocation.sources.len(), "configuration ready");
            echo(&invocation.config, &invocation.sources);
        }
        Ok(Outcome::ConfigChecked(report)) => println!("{report}"),
        Err(e) => {
            eprintln!("Error:\n{e}");
            std::process::exit(1);
        }
    }
}
