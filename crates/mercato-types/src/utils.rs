//! Small shared helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Truncates an identifier for log display: first 8 characters plus "..".
///
/// Ids come straight from request paths, so they are not guaranteed to be
/// ASCII; truncation must land on a character boundary.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_ids_pass_through() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
	}

	#[test]
	fn multibyte_ids_truncate_on_character_boundaries() {
		assert_eq!(truncate_id("日本語日本"), "日本語日本");
		assert_eq!(truncate_id("日本語日本語日本語"), "日本語日本語日本..");
		assert_eq!(truncate_id("ordine-é-123"), "ordine-é..");
	}
}
