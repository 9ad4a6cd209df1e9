//! Query-string helpers for list endpoints.
//!
//! Missing keys fall back to a default; present but unusable values are
//! recorded in the [`Validator`] rather than failing the request outright.

use std::collections::HashMap;

use crate::coin::Validator;

pub type QueryParams = HashMap<String, String>;

pub fn read_string<'a>(params: &'a QueryParams, key: &str, default: &'a str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or(default)
}

/// Comma-separated list, blanks dropped. Missing key yields `default`.
pub fn read_csv(params: &QueryParams, key: &str, default: &[&str]) -> Vec<String> {
    match params.get(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn read_int(params: &QueryParams, key: &str, default: i64, v: &mut Validator) -> i64 {
    match params.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                v.add_error(key, "must be an integer value");
                default
            }
        },
    }
}
