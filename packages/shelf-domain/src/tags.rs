use std::collections::HashSet;

/// Tag reserved for the quick "save for later" bucket.
pub const SAVE_TAG: &str = "save";

/// Trims every tag, drops empties and repeats, and keeps first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for tag in tags {
		let tag = tag.as_ref().trim();

		if tag.is_empty() || !seen.insert(tag.to_string()) {
			continue;
		}

		out.push(tag.to_string());
	}

	out
}

/// Set union of `existing` and `incoming`; existing tags keep their positions.
pub fn merge_tags(existing: &[String], incoming: &[String]) -> Vec<String> {
	normalize_tags(existing.iter().chain(incoming.iter()))
}

/// Splits a comma separated tag string as typed into a form field.
pub fn split_tag_list(raw: &str) -> Vec<String> {
	normalize_tags(raw.split(','))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_drops_blanks_and_duplicates() {
		let tags = normalize_tags([" rust ", "", "web", "rust", "  "]);

		assert_eq!(tags, vec!["rust".to_string(), "web".to_string()]);
	}

	#[test]
	fn normalize_is_case_sensitive() {
		assert_eq!(normalize_tags(["Rust", "rust"]).len(), 2);
	}

	#[test]
	fn merge_preserves_existing_order() {
		let existing = vec!["b".to_string(), "a".to_string()];
		let incoming = vec!["c".to_string(), "a".to_string()];

		assert_eq!(merge_tags(&existing, &incoming), vec!["b", "a", "c"]);
	}

	#[test]
	fn split_handles_trailing_commas() {
		assert_eq!(split_tag_list("news, tech,,"), vec!["news", "tech"]);
	}
}
