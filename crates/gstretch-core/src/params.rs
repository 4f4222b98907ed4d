//! Tool parameters given as plain string arguments
//!
//! Hosts that drive the tool with a list of strings can pass either the four
//! positional values `input output cutoff bins` or flags such as
//! `--input=dem.tif -o out.tif --cutoff 2.5 --bins=255`.

use std::path::{Path, PathBuf};

use crate::config::StretchDefaults;
use crate::error::StretchError;
use crate::stretch::StretchParams;

const PARAMETERS_NOT_SET: &str = "Tool parameters have not been set.";
const PARAMETERS_INVALID: &str = "One or more of the input parameters have not been set properly.";

/// Parameters of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cutoff_sd: f64,
    pub num_output_bins: usize,
}

impl StretchArgs {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, defaults: &StretchDefaults) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            cutoff_sd: defaults.cutoff_sd,
            num_output_bins: defaults.num_output_bins,
        }
    }

    /// Parse host-style string arguments.
    ///
    /// Relative paths are resolved against `working_directory` when one is
    /// given. Cutoff and bin count fall back to `defaults` when omitted.
    pub fn from_args(
        args: &[String],
        defaults: &StretchDefaults,
        working_directory: Option<&Path>,
    ) -> Result<Self, StretchError> {
        if args.is_empty() {
            return Err(StretchError::config(PARAMETERS_NOT_SET));
        }

        let mut input: Option<String> = None;
        let mut output: Option<String> = None;
        let mut cutoff_sd = defaults.cutoff_sd;
        let mut num_output_bins = defaults.num_output_bins;

        if args.iter().any(|a| a.starts_with('-') && parse_number::<f64>(a).is_none()) {
            let mut i = 0;
            while i < args.len() {
                let arg = strip_quotes(&args[i]);
                let (key, inline_value) = match arg.split_once('=') {
                    Some((key, value)) => (key.to_lowercase(), Some(value.to_string())),
                    None => (arg.to_lowercase(), None),
                };
                let known = matches!(
                    key.as_str(),
                    "-i" | "--input"
                        | "-o"
                        | "--output"
                        | "--cutoff"
                        | "--cutoff_sd"
                        | "--bins"
                        | "--num_bins"
                        | "--num_output_bins"
                );
                if !known {
                    log::warn!("Ignoring unrecognized argument '{}'", arg);
                    i += 1;
                    continue;
                }

                let value = match inline_value {
                    Some(value) => value,
                    None => {
                        i += 1;
                        match args.get(i) {
                            Some(next) => strip_quotes(next),
                            None => {
                                return Err(StretchError::config(format!(
                                    "Missing value for argument '{}'",
                                    key
                                )))
                            }
                        }
                    }
                };

                match key.as_str() {
                    "-i" | "--input" => input = Some(value),
                    "-o" | "--output" => output = Some(value),
                    "--cutoff" | "--cutoff_sd" => cutoff_sd = parse_cutoff(&value)?,
                    _ => num_output_bins = parse_bins(&value)?,
                }
                i += 1;
            }
        } else {
            input = args.first().map(|a| strip_quotes(a));
            output = args.get(1).map(|a| strip_quotes(a));
            if let Some(value) = args.get(2) {
                cutoff_sd = parse_cutoff(&strip_quotes(value))?;
            }
            if let Some(value) = args.get(3) {
                num_output_bins = parse_bins(&strip_quotes(value))?;
            }
        }

        let (input, output) = match (input, output) {
            (Some(input), Some(output)) if !input.is_empty() && !output.is_empty() => {
                (input, output)
            }
            _ => return Err(StretchError::config(PARAMETERS_INVALID)),
        };

        let args = Self {
            input: resolve(&input, working_directory),
            output: resolve(&output, working_directory),
            cutoff_sd,
            num_output_bins,
        };
        args.validate()?;
        Ok(args)
    }

    pub fn validate(&self) -> Result<(), StretchError> {
        if self.input.as_os_str().is_empty() || self.output.as_os_str().is_empty() {
            return Err(StretchError::config(PARAMETERS_INVALID));
        }
        if self.input == self.output {
            return Err(StretchError::config(format!(
                "Output file must differ from the input file: {}",
                self.input.display()
            )));
        }
        if !self.cutoff_sd.is_finite() || self.cutoff_sd <= 0.0 {
            return Err(StretchError::config(format!(
                "Cutoff must be a positive number of standard deviations, got {}",
                self.cutoff_sd
            )));
        }
        if self.num_output_bins < 2 {
            return Err(StretchError::config(format!(
                "Number of output bins must be at least 2, got {}",
                self.num_output_bins
            )));
        }
        Ok(())
    }

    /// Stretch parameters for this invocation, the rest taken from `defaults`.
    pub fn to_params(&self, defaults: &StretchDefaults) -> StretchParams {
        StretchParams {
            cutoff_sd: self.cutoff_sd,
            num_output_bins: self.num_output_bins,
            ..StretchParams::from_defaults(defaults)
        }
    }
}

fn strip_quotes(arg: &str) -> String {
    arg.replace(['"', '\''], "")
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse::<T>().ok()
}

fn parse_cutoff(value: &str) -> Result<f64, StretchError> {
    parse_number::<f64>(value).ok_or_else(|| {
        StretchError::config(format!("Cutoff value '{}' is not a number", value))
    })
}

fn parse_bins(value: &str) -> Result<usize, StretchError> {
    parse_number::<usize>(value).ok_or_else(|| {
        StretchError::config(format!(
            "Number of output bins '{}' is not a positive integer",
            value
        ))
    })
}

fn resolve(path: &str, working_directory: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(path);
    match working_directory {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}
