use clap::Args;
use serde::Deserialize;

use logplay_engine::{ReplayError, DEFAULT_PROVIDER, MATCH_ALL};

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub speed: Option<f64>,
    pub provider: Option<String>,
    pub regexp: Option<String>,
    pub verbose: Option<bool>,
}

pub fn load_config(path: &str) -> Result<Config, ReplayError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReplayError::config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| ReplayError::config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct PlayArgs {
    /// Log file to replay.
    pub file: String,

    /// Print information about each packet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Playback speed multiplier. Default is 1.0
    #[arg(short, long)]
    pub speed: Option<f64>,

    /// Bus endpoint where packets should be published
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Regular expression of channels to play (matched against the whole name)
    #[arg(short = 'e', long)]
    pub regexp: Option<String>,

    /// Path to optional TOML config with defaults for the flags above
    #[arg(long, default_value = "logplay.toml", env = "LOGPLAY_CONFIG")]
    pub config: String,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Final configuration after the merge: config file < CLI flags.
pub struct Effective {
    pub file: String,
    pub verbose: bool,
    pub speed: f64,
    pub provider: String,
    pub regexp: String,
}

impl Effective {
    pub fn new(args: &PlayArgs) -> Result<Self, ReplayError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };

        Ok(Self {
            file: args.file.clone(),
            verbose: args.verbose || cfg.verbose.unwrap_or(false),
            speed: args.speed.or(cfg.speed).unwrap_or(1.0),
            provider: args
                .provider
                .clone()
                .or(cfg.provider)
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            regexp: args
                .regexp
                .clone()
                .or(cfg.regexp)
                .unwrap_or_else(|| MATCH_ALL.to_string()),
        })
    }
}
