use std::fmt::Display;
use std::str::FromStr;

use gate_core::Pid;
use thiserror::Error;

use crate::table::DEFAULT_TABLE_CAPACITY;

/// User configuration of which processes the gate should observe.
///
/// Assembled by the control plane (how it is loaded is not this crate's
/// business) and consumed once by [`setup_admission_set`].
///
/// [`setup_admission_set`]: crate::setup_admission_set
#[derive(Clone, Debug)]
pub struct Config {
    /// Processes tracked by pid from the start.
    pub pid_targets: Vec<Pid>,
    /// Processes tracked by executable image path, resolved against procfs
    /// at attach time.
    pub image_targets: Vec<String>,
    /// Slot count of the admission table. Must be a power of two.
    pub table_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_targets: Vec::new(),
            image_targets: Vec::new(),
            table_capacity: DEFAULT_TABLE_CAPACITY,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("{value} is not a valid value for field {field}: {err}")]
    InvalidValue {
        field: String,
        value: String,
        err: String,
    },
}

impl Config {
    /// Build a config from `key=value` pairs handed over by the control
    /// plane. List fields are comma separated; unknown fields are ignored
    /// with a warning.
    pub fn from_key_values<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        for (key, value) in pairs {
            match key {
                "pid_targets" => {
                    config.pid_targets = parse_list::<i32>(key, value)?
                        .into_iter()
                        .map(Pid::from_raw)
                        .collect();
                }
                "image_targets" => config.image_targets = parse_list(key, value)?,
                "table_capacity" => config.table_capacity = parse(key, value)?,
                _ => log::warn!("ignoring unknown configuration field {key}"),
            }
        }
        Ok(config)
    }
}

fn parse<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    T::from_str(value).map_err(|err| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        err: err.to_string(),
    })
}

fn parse_list<T>(field: &str, value: &str) -> Result<Vec<T>, ConfigError>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse(field, item))
        .collect()
}
