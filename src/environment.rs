use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Retrieves an environment variable, treating unset and blank the same.
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Splits a delimited value into trimmed, non-empty parts.
pub fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses the value of `var`, naming the variable in the error.
pub fn parse_value<T>(var: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow!("invalid value '{}' for {}: {}", value, var, e))
}
