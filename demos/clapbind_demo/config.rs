//! Configuration records for the clapbind demo application.
//!
//! [`DemoConfig`] holds two nested records, [`ServerConfig`] and
//! [`DisplayConfig`]. With the env prefix `CLAPBIND_DEMO_` every flag also
//! reads an environment variable:
//!
//! | Flag                        | Env var                              | File key                 |
//! |-----------------------------|--------------------------------------|--------------------------|
//! | `--name`                    | `CLAPBIND_DEMO_NAME`                 | `name`                   |
//! | `--server-host`             | `CLAPBIND_DEMO_SERVER_HOST`          | `server.host`            |
//! | `--server-port`, `-p`       | `CLAPBIND_DEMO_SERVER_PORT`          | `server.port`            |
//! | `--server-max-connections`  | `CLAPBIND_DEMO_SERVER_MAX_CONNECTIONS` | `server.max_connections` |
//! | `--server-token`            | `CLAPBIND_DEMO_SERVER_TOKEN`         | `server.token`           |
//! | `--color`                   | `CLAPBIND_DEMO_COLOR`                | `display.color`          |
//! | `--display-format`          | `CLAPBIND_DEMO_DISPLAY_FORMAT`       | `display.format`         |
//!
//! `--color` is tagged `~color`, so it skips the `display-` prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use clapbind::{Fields, Record, Scalar};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub name: String,
    pub server: ServerConfig,
    pub display: DisplayConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            name: "clapbind-demo".into(),
            server: ServerConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Record for DemoConfig {
    fn fields(&mut self) -> Fields<'_> {
        Fields::new()
            .leaf("name", &mut self.name)
            .tag("desc", "name shown in the banner")
            .nested("server", &mut self.server)
            .nested("display", &mut self.display)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            max_connections: 100,
            token: None,
        }
    }
}

impl Record for ServerConfig {
    fn fields(&mut self) -> Fields<'_> {
        Fields::new()
            .leaf("host", &mut self.host)
            .tag("desc", "address to bind")
            .leaf("port", &mut self.port)
            .tag("flag", "port p")
            .tag("desc", "port to listen on")
            .leaf("max_connections", &mut self.max_connections)
            .tag("desc", "connection limit")
            .optional("token", &mut self.token)
            .tag("desc", "access token")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: Color,
    pub format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: Color::Yellow,
            format: "table".into(),
        }
    }
}

impl Record for DisplayConfig {
    fn fields(&mut self) -> Fields<'_> {
        Fields::new()
            .leaf("color", &mut self.color)
            .tag("flag", "~color")
            .tag("desc", "output color")
            .leaf("format", &mut self.format)
            .tag("desc", "table or plain")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub fn ansi(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
        };
        f.write_str(s)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            other => Err(format!("unknown color '{other}'")),
        }
    }
}

impl Scalar for Color {
    fn parse_flag(raw: &str) -> Result<Self, String> {
        raw.parse()
    }
}
