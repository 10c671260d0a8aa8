//! Shared placeholder rewriting
//!
//! A single scanner walks the SQL text and replaces `?` and `:name`
//! placeholders with the backend's marker in left-to-right order, emitting
//! the ordered bind-value list. String literals, quoted identifiers, and
//! comments are skipped, and `::type` casts are left alone.
//!
//! Binding rules:
//! - positional: the number of `?` markers must equal the number of values;
//! - named: map keys may carry the `:` sigil or not; entries with no
//!   matching placeholder are ignored; a placeholder with no matching entry
//!   fails with a [`DatabaseError::BindError`].

use crate::error::{DatabaseError, Result};
use crate::types::{Params, QueryValue};

/// Rewrite `sql` for one engine, producing the engine query text and the
/// bind values in marker order. `placeholder` renders the engine's marker
/// for a 1-based index.
pub fn rewrite<F>(sql: &str, params: &Params, placeholder: F) -> Result<(String, Vec<QueryValue>)>
where
	F: Fn(usize) -> String,
{
	let mut out = String::with_capacity(sql.len());
	let mut values: Vec<QueryValue> = Vec::new();
	let mut taken_positional = 0usize;

	let bytes = sql.as_bytes();
	let mut i = 0usize;
	while i < bytes.len() {
		let c = bytes[i] as char;
		match c {
			'\'' | '"' | '`' => {
				let end = skip_quoted(sql, i, c);
				out.push_str(&sql[i..end]);
				i = end;
			}
			'-' if sql[i..].starts_with("--") => {
				let end = sql[i..].find('\n').map(|p| i + p + 1).unwrap_or(sql.len());
				out.push_str(&sql[i..end]);
				i = end;
			}
			'/' if sql[i..].starts_with("/*") => {
				let end = sql[i..].find("*/").map(|p| i + p + 2).unwrap_or(sql.len());
				out.push_str(&sql[i..end]);
				i = end;
			}
			'?' => {
				let value = match params {
					Params::Positional(list) => list.get(taken_positional).cloned().ok_or_else(|| {
						DatabaseError::BindError(format!(
							"query has more than {} positional placeholders",
							list.len()
						))
					})?,
					Params::Named(_) => {
						return Err(DatabaseError::BindError(
							"positional placeholder used with named parameters".to_string(),
						));
					}
				};
				taken_positional += 1;
				values.push(value);
				out.push_str(&placeholder(values.len()));
				i += 1;
			}
			':' => {
				// `::type` casts and `:=` are not placeholders.
				let prev_colon = i > 0 && bytes[i - 1] == b':';
				let next = bytes.get(i + 1).copied();
				if prev_colon || next == Some(b':') || !next.is_some_and(is_ident_start) {
					out.push(':');
					i += 1;
					continue;
				}
				let start = i + 1;
				let mut end = start;
				while end < bytes.len() && is_ident_char(bytes[end]) {
					end += 1;
				}
				let name = &sql[start..end];
				let value = match params {
					Params::Named(map) => map
						.get(name)
						.or_else(|| map.get(&format!(":{name}")))
						.cloned()
						.ok_or_else(|| {
							DatabaseError::BindError(format!("no value bound for placeholder :{name}"))
						})?,
					Params::Positional(_) => {
						return Err(DatabaseError::BindError(format!(
							"named placeholder :{name} used with positional parameters"
						)));
					}
				};
				values.push(value);
				out.push_str(&placeholder(values.len()));
				i = end;
			}
			_ => {
				// `c` is a single byte and misstates the width of multi-byte
				// sequences; step to the next character boundary instead.
				let end = sql[i..]
					.char_indices()
					.nth(1)
					.map(|(offset, _)| i + offset)
					.unwrap_or(sql.len());
				out.push_str(&sql[i..end]);
				i = end;
			}
		}
	}

	if let Params::Positional(list) = params {
		if taken_positional != list.len() {
			return Err(DatabaseError::BindError(format!(
				"query has {} positional placeholders but {} values were supplied",
				taken_positional,
				list.len()
			)));
		}
	}

	Ok((out, values))
}

/// Skip a quoted region starting at `start`, honoring doubled-quote escapes.
fn skip_quoted(sql: &str, start: usize, quote: char) -> usize {
	let bytes = sql.as_bytes();
	let q = quote as u8;
	let mut i = start + 1;
	while i < bytes.len() {
		if bytes[i] == q {
			if bytes.get(i + 1) == Some(&q) {
				i += 2;
				continue;
			}
			return i + 1;
		}
		i += 1;
	}
	sql.len()
}

fn is_ident_start(b: u8) -> bool {
	b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b == b'_'
}
