//! Server configuration.
//!
//! Values are layered: command-line flags (or their `SPYSRV_*` environment
//! variables) win over an optional YAML file, which wins over the built-in
//! defaults.
//!
//! ```yaml
//! server:
//!   bind: 0.0.0.0
//!   port: 8080
//!   backlog: 5
//! mode:
//!   http: true
//! workers:
//!   num_workers: 4
//! static_files:
//!   www_root: /srv/www
//! ```

use std::fs;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_EXEC: &str = "/bin/cat";
pub const DEFAULT_BACKLOG: u32 = 5;
pub const DEFAULT_NUM_WORKERS: usize = 4;
pub const DEFAULT_WWW_ROOT: &str = "./www";

/// Command-line flags. Every value is optional so that the YAML file can
/// fill in whatever was not given explicitly.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "spysrv")]
#[command(about = "Forking TCP server with a preforked static HTTP mode")]
#[command(version)]
pub struct Args {
    /// YAML configuration file
    #[arg(long, env = "SPYSRV_CONFIG")]
    pub config: Option<String>,

    /// Address to bind the listening socket to
    #[arg(long, env = "SPYSRV_BIND")]
    pub bind: Option<String>,

    /// Server port
    #[arg(long, env = "SPYSRV_PORT")]
    pub port: Option<u16>,

    /// Program to execute for each connection
    #[arg(long, env = "SPYSRV_EXEC")]
    pub exec: Option<String>,

    /// Listening socket backlog
    #[arg(long, env = "SPYSRV_BACKLOG")]
    pub backlog: Option<u32>,

    /// Enable the HTTP server
    #[arg(long, env = "SPYSRV_HTTP")]
    pub http: bool,

    /// awk one-liner, overrides --exec
    #[arg(long, env = "SPYSRV_AWK")]
    pub awk: Option<String>,

    /// Number of HTTP workers
    #[arg(long = "num_workers", env = "SPYSRV_NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Web root. Must not end with '/'
    #[arg(long = "www_root", env = "SPYSRV_WWW_ROOT")]
    pub www_root: Option<String>,
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub mode: ModeSection,
    pub workers: WorkersSection,
    pub static_files: StaticFilesSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub backlog: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModeSection {
    pub http: Option<bool>,
    pub exec: Option<String>,
    pub awk: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkersSection {
    pub num_workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StaticFilesSection {
    pub www_root: Option<String>,
}

impl FileConfig {
    pub fn from_yaml(text: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })
    }

    pub fn read(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }
}

/// What the server does with an accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Serve static files from `www_root` with a fixed worker pool.
    Http,
    /// Hand every connection to a freshly spawned program.
    Exec(Program),
}

/// The external program run per connection in exec mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// Path of an executable, run without arguments.
    Path(String),
    /// An awk one-liner, passed as awk's only argument.
    Awk(String),
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub backlog: u32,
    pub mode: Mode,
    pub num_workers: usize,
    pub www_root: String,
}

impl Config {
    /// Parses the process arguments (and config file, if any).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let file = match args.config.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let awk = args
            .awk
            .or(file.mode.awk)
            .filter(|one_liner| !one_liner.is_empty());

        let mode = if args.http || file.mode.http.unwrap_or(false) {
            Mode::Http
        } else if let Some(one_liner) = awk {
            Mode::Exec(Program::Awk(one_liner))
        } else {
            let exec = args
                .exec
                .or(file.mode.exec)
                .unwrap_or_else(|| DEFAULT_EXEC.to_string());
            Mode::Exec(Program::Path(exec))
        };

        let config = Self {
            bind: args
                .bind
                .or(file.server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: args.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            backlog: args
                .backlog
                .or(file.server.backlog)
                .unwrap_or(DEFAULT_BACKLOG),
            mode,
            num_workers: args
                .num_workers
                .or(file.workers.num_workers)
                .unwrap_or(DEFAULT_NUM_WORKERS),
            www_root: args
                .www_root
                .or(file.static_files.www_root)
                .unwrap_or_else(|| DEFAULT_WWW_ROOT.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.www_root.ends_with('/') {
            return Err(ConfigError::TrailingSeparator(self.www_root.clone()));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::NotPositive("num_workers"));
        }
        if self.backlog == 0 {
            return Err(ConfigError::NotPositive("backlog"));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
