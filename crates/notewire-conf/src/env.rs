//! Environment variable helpers
//!
//! Small typed readers over `std::env`, shared by the `NOTEWIRE_*` override
//! pass in [`crate::settings`].

use std::env;

use crate::error::SettingsError;

/// Read a raw variable, treating the empty string as unset.
pub fn var(key: &str) -> Option<String> {
	match env::var(key) {
		Ok(val) if !val.is_empty() => Some(val),
		_ => None,
	}
}

/// Parse a boolean the way Django-style env files spell them.
pub fn parse_bool(value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(SettingsError::Invalid(format!("not a boolean: {other}"))),
	}
}

/// Split a comma-separated list, trimming whitespace and dropping empties.
pub fn parse_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("true", true)]
	#[case("YES", true)]
	#[case("1", true)]
	#[case("off", false)]
	#[case("0", false)]
	fn parses_bool_spellings(#[case] input: &str, #[case] expected: bool) {
		assert_eq!(parse_bool(input).unwrap(), expected);
	}

	#[test]
	fn rejects_non_bool() {
		assert!(parse_bool("maybe").is_err());
	}

	#[test]
	fn splits_lists() {
		assert_eq!(parse_list("postgres, sqlite,,mysql "), vec!["postgres", "sqlite", "mysql"]);
		assert!(parse_list("").is_empty());
	}
}
