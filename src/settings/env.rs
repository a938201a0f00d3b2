// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed readers over an environment lookup function.

use super::ConfigError;
use std::str::FromStr;

/// Key lookup used while resolving settings.
///
/// Production code passes the process environment; tests pass a map.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a required value. Empty strings count as missing.
pub fn required(lookup: Lookup<'_>, key: &'static str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Read a string value with a default.
pub fn string(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Read and parse a value with a default.
pub fn parse<T: FromStr>(lookup: Lookup<'_>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

/// Read a boolean flag. Accepts the usual spellings (`true/false`, `1/0`,
/// `yes/no`, `on/off`), case-insensitive.
pub fn flag(lookup: Lookup<'_>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

/// Read a comma-separated list. Items are trimmed and empty items dropped.
pub fn csv(lookup: Lookup<'_>, key: &str, default: &str) -> Vec<String> {
    split_csv(&lookup(key).unwrap_or_else(|| default.to_string()))
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_flag_spellings() {
        let vars = source(&[("A", "True"), ("B", "off"), ("C", "1"), ("D", "maybe")]);
        let lookup = |k: &str| vars.get(k).cloned();

        assert!(flag(&lookup, "A", false).unwrap());
        assert!(!flag(&lookup, "B", true).unwrap());
        assert!(flag(&lookup, "C", false).unwrap());
        assert!(flag(&lookup, "MISSING", true).unwrap());
        assert!(matches!(
            flag(&lookup, "D", false),
            Err(ConfigError::Invalid { key: "D", .. })
        ));
    }

    #[test]
    fn test_csv_trims_and_drops_empty() {
        let vars = source(&[("HOSTS", " a.com, ,b.com ,")]);
        let lookup = |k: &str| vars.get(k).cloned();

        assert_eq!(csv(&lookup, "HOSTS", ""), vec!["a.com", "b.com"]);
        assert_eq!(csv(&lookup, "OTHER", "x,y"), vec!["x", "y"]);
    }

    #[test]
    fn test_required_rejects_blank() {
        let vars = source(&[("SECRET_KEY", "   ")]);
        let lookup = |k: &str| vars.get(k).cloned();

        assert!(matches!(
            required(&lookup, "SECRET_KEY"),
            Err(ConfigError::Missing("SECRET_KEY"))
        ));
    }

    #[test]
    fn test_parse_reports_bad_value() {
        let vars = source(&[("DB_PORT", "fifty")]);
        let lookup = |k: &str| vars.get(k).cloned();

        let err = parse::<u16>(&lookup, "DB_PORT", 5432).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_PORT", ref value } if value == "fifty"));
        assert_eq!(parse::<u16>(&lookup, "PORT", 8000).unwrap(), 8000);
    }
}
