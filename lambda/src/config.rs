//! Tunables for the shell and the layout engines.
//!
//! Loaded from `$LAMBDA_CONFIG`, else `./lambda.toml`, else defaults. Every
//! table and key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub reduction: ReductionConfig,
    pub tree: TreeConfig,
    pub tromp: TrompConfig,
    pub prettify: PrettifyConfig,
    pub repl: ReplConfig,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ReductionConfig {
    /// Contractions allowed before full reduction gives up.
    pub step_limit: usize,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        ReductionConfig { step_limit: 1000 }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct TreeConfig {
    pub box_height: f64,
    pub min_box_width: f64,
    pub char_width: f64,
    pub text_padding: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub padding: f64,
    pub min_canvas_width: f64,
    pub min_canvas_height: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            box_height: 36.0,
            min_box_width: 44.0,
            char_width: 9.0,
            text_padding: 16.0,
            horizontal_gap: 24.0,
            vertical_gap: 48.0,
            padding: 24.0,
            min_canvas_width: 240.0,
            min_canvas_height: 160.0,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct TrompConfig {
    /// Pixels per grid unit.
    pub scale: f64,
}

impl Default for TrompConfig {
    fn default() -> Self {
        TrompConfig { scale: 8.0 }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct PrettifyConfig {
    /// Canonical forms shorter than this are not worth collapsing...
    pub min_length: usize,
    /// ...unless the entry is one of these.
    pub always: Vec<String>,
}

impl Default for PrettifyConfig {
    fn default() -> Self {
        PrettifyConfig {
            min_length: 8,
            always: ["ZERO", "ONE", "TWO", "THREE", "TRUE", "FALSE"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ReplConfig {
    pub prompt: String,
    pub history: Option<PathBuf>,
    /// Line suffix that continues input onto the next line. Must not be
    /// something a term can end with.
    pub continuation: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "λ> ".to_string(),
            history: Some(std::env::temp_dir().join("lambda.history")),
            continuation: "&".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os("LAMBDA_CONFIG") {
            tracing::debug!(path = ?path, "loading config from LAMBDA_CONFIG");
            return Self::load(path);
        }
        let local = Path::new("lambda.toml");
        if local.exists() {
            tracing::debug!("loading ./lambda.toml");
            return Self::load(local);
        }
        Ok(Self::default())
    }
}
