use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{ConfigError, SinkError};
use crate::schema::Columns;

pub const FILENAME: &str = "filename";
pub const COLUMNS: &str = "columns";
pub const SEPARATOR: &str = "separator";

/// Raw values of the recognized table parameters, as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkParams {
    pub filename: Option<String>,
    pub columns: Option<String>,
    pub separator: Option<String>,
}

impl SinkParams {
    /// Extracts `filename`, `columns` and `separator` from `key = value`
    /// arguments. Anything else is skipped.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = SinkParams::default();

        for arg in args {
            let arg = arg.as_ref();
            let slot = [
                (FILENAME, &mut params.filename),
                (COLUMNS, &mut params.columns),
                (SEPARATOR, &mut params.separator),
            ]
            .into_iter()
            .find_map(|(key, slot)| string_parameter(key, arg).map(|value| (key, slot, value)));

            match slot {
                Some((key, slot, value)) => {
                    if slot.is_some() {
                        warn!(key, "parameter given more than once, keeping the last value");
                    }
                    *slot = Some(value);
                }
                None => debug!(arg, "ignoring unrecognized table argument"),
            }
        }

        params
    }

    pub fn validate(self) -> Result<SinkConfig, ConfigError> {
        let filename = self.filename.ok_or_else(|| ConfigError::missing_field(FILENAME))?;
        let columns = self.columns.ok_or_else(|| ConfigError::missing_field(COLUMNS))?;
        let separator = self.separator.ok_or_else(|| ConfigError::missing_field(SEPARATOR))?;

        if filename.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "filename cannot be empty".to_string(),
            });
        }

        let separator = match separator.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "separator must be exactly one ASCII character, got {separator:?}"
                    ),
                });
            }
        };

        Ok(SinkConfig {
            filename: PathBuf::from(filename),
            columns: Columns::parse(&columns),
            separator,
        })
    }
}

/// Validated configuration of a single sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub filename: PathBuf,
    pub columns: Columns,
    pub separator: u8,
}

impl SinkConfig {
    /// Parses and validates table arguments in one step.
    pub fn from_args<I, S>(args: I) -> Result<Self, SinkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(SinkParams::parse(args).validate()?)
    }
}

/// Returns the text after `key =` when `arg` assigns `key`, with surrounding
/// whitespace removed. Whitespace is allowed before the key and around `=`.
pub fn parameter<'a>(key: &str, arg: &'a str) -> Option<&'a str> {
    let rest = arg.trim_start().strip_prefix(key)?;
    let rest = rest.trim_start().strip_prefix('=')?;
    Some(rest.trim())
}

fn string_parameter(key: &str, arg: &str) -> Option<String> {
    parameter(key, arg).map(|value| dequote(value).into_owned())
}

/// Strips one level of matching `'` or `"` quotes and collapses doubled
/// quote characters inside. Values without a matching pair come back as-is.
pub fn dequote(value: &str) -> Cow<'_, str> {
    let quote = match value.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Cow::Borrowed(value),
    };
    if value.len() < 2 || !value.ends_with(quote) {
        return Cow::Borrowed(value);
    }

    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == quote && chars.peek() == Some(&quote) {
            chars.next();
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Batch export jobs run by the `csv-export` binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub version: u32,
    pub database: PathBuf,
    pub jobs: Vec<ExportJob>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportJob {
    pub table: String,
    pub output: PathBuf,
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_separator() -> char {
    ','
}

impl ExportConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            location: path.display().to_string(),
            error: Box::new(e),
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let config_str = std::env::var("CSV_EXPORT_CONFIG")
            .map_err(|_| anyhow::anyhow!("CSV_EXPORT_CONFIG environment variable not set"))?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: ExportConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Database path cannot be empty"));
        }
        if self.jobs.is_empty() {
            return Err(anyhow::anyhow!("At least one export job must be configured"));
        }

        let mut outputs = HashSet::new();
        for job in &self.jobs {
            if job.table.is_empty() {
                return Err(anyhow::anyhow!("Table name cannot be empty"));
            }
            if job.output.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("Output path for table {} cannot be empty", job.table));
            }
            if !job.separator.is_ascii() {
                return Err(anyhow::anyhow!(
                    "Separator for table {} must be an ASCII character",
                    job.table
                ));
            }
            if !outputs.insert(&job.output) {
                return Err(anyhow::anyhow!(
                    "Output {} is written by more than one job",
                    job.output.display()
                ));
            }
        }
        Ok(())
    }
}
