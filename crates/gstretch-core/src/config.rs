//! Stretch configuration management.
//!
//! Defaults are read from a YAML file found on a small search path and fall
//! back to built-in values when no file is present.

use crate::stretch::MatchStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};

/// Canonical list of candidate config file names we search for on disk.
pub const CONFIG_FILENAMES: &[&str] = &["gstretch.yml", "gstretch.yaml"];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "GSTRETCH_CONFIG";

/// Resolution of the empirical histogram.
pub const DEFAULT_HISTOGRAM_BINS: usize = 50_000;

/// Public handle that stores the loaded configuration, its source path, and warnings.
pub struct StretchConfigHandle {
    pub config: StretchConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl StretchConfigHandle {
    fn with_config(config: StretchConfig, source: Option<PathBuf>, warnings: Vec<String>) -> Self {
        Self {
            config,
            source,
            warnings,
        }
    }
}

/// Complete configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StretchConfig {
    pub defaults: StretchDefaults,
}

impl StretchConfig {
    fn sanitize(mut self) -> Self {
        self.defaults.sanitize();
        self
    }

    /// Render the configuration as YAML, e.g. for `gstretch init`.
    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }
}

/// Default stretch parameter values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchDefaults {
    /// Half-width of the reference distribution, in standard deviations
    pub cutoff_sd: f64,
    /// Number of output bins (output values are 0..num_output_bins-1)
    pub num_output_bins: usize,
    /// Resolution of the empirical histogram
    pub histogram_bins: usize,
    /// No-data value used when the input carries none, or when the input
    /// sentinel cannot be stored in an integer output
    pub default_nodata: f64,
    /// How empirical quantiles are located in the reference CDF
    pub match_strategy: MatchStrategy,
    /// Rasters with fewer rows than this are processed on the calling thread
    pub parallel_row_threshold: usize,
}

impl StretchDefaults {
    pub(crate) fn sanitize(&mut self) {
        if !self.cutoff_sd.is_finite() || self.cutoff_sd <= 0.0 {
            self.cutoff_sd = 3.0;
        }
        self.cutoff_sd = self.cutoff_sd.clamp(0.1, 20.0);
        self.num_output_bins = self.num_output_bins.clamp(2, 1 << 20);
        self.histogram_bins = self.histogram_bins.clamp(2, 1 << 24);
        if !self.default_nodata.is_finite() {
            self.default_nodata = -32768.0;
        }
        self.default_nodata = self.default_nodata.trunc();
        // Written into i32 cells, and must stay distinguishable from bin indices
        let representable = self.default_nodata >= i32::MIN as f64
            && self.default_nodata <= i32::MAX as f64;
        let collides = self.default_nodata >= 0.0 && self.default_nodata < self.num_output_bins as f64;
        if !representable || collides {
            self.default_nodata = -32768.0;
        }
    }
}

impl Default for StretchDefaults {
    fn default() -> Self {
        Self {
            cutoff_sd: 3.0,
            num_output_bins: 1024,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            default_nodata: -32768.0,
            match_strategy: MatchStrategy::Binary,
            parallel_row_threshold: 64,
        }
    }
}

/// Load the configuration, trying each candidate path in order.
///
/// Never fails: problems are collected as warnings and the built-in
/// defaults are used.
pub fn load_stretch_config(custom_path: Option<&Path>) -> StretchConfigHandle {
    let mut warnings = Vec::new();
    let candidates = get_config_candidates(custom_path);

    for candidate in candidates {
        if !candidate.exists() || !candidate.is_file() {
            continue;
        }

        match fs::read_to_string(&candidate) {
            Ok(contents) => match serde_yaml::from_str::<StretchConfig>(&contents) {
                Ok(config) => {
                    let sanitized = config.sanitize();
                    let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                    return StretchConfigHandle::with_config(sanitized, Some(source), warnings);
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse stretch config {}: {}",
                    candidate.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read stretch config {}: {}",
                candidate.display(),
                err
            )),
        }
    }

    StretchConfigHandle::with_config(StretchConfig::default(), None, warnings)
}

/// Get list of config file candidates to try
fn get_config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(dir) = user_config_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(dir.join(name));
        }
    }

    candidates
}

/// `~/gstretch`, where `gstretch init` writes its defaults.
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("gstretch"))
}

static CONFIG_HANDLE: OnceLock<StretchConfigHandle> = OnceLock::new();
static LOG_CONFIG_ONCE: Once = Once::new();

/// Access the global configuration (loaded once per process).
///
/// `custom_path` only has an effect on the first call.
pub fn stretch_config_handle(custom_path: Option<&Path>) -> &'static StretchConfigHandle {
    CONFIG_HANDLE.get_or_init(|| load_stretch_config(custom_path))
}

/// Log the config source and warnings the first time it is requested.
pub fn log_config_usage() {
    LOG_CONFIG_ONCE.call_once(|| {
        let handle = stretch_config_handle(None);
        if let Some(source) = &handle.source {
            log::info!("Loaded stretch config from {}", source.display());
        } else {
            log::info!("Using built-in stretch defaults");
        }

        for warning in &handle.warnings {
            log::warn!("Config warning: {}", warning);
        }
    });
}
