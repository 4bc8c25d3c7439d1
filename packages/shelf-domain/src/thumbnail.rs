use crate::media::{parse_lenient, strip_host_prefix, youtube_video_id};

/// Thumbnail derivable from the URL alone, without any network call.
pub fn known_host_thumbnail(raw: &str) -> Option<String> {
	let url = parse_lenient(raw)?;
	let host = url.host_str()?.to_ascii_lowercase();
	let host = strip_host_prefix(&host);
	let segments: Vec<&str> = url
		.path_segments()
		.map(|parts| parts.filter(|part| !part.is_empty()).collect())
		.unwrap_or_default();

	match host {
		"youtube.com" | "youtu.be" | "music.youtube.com" => youtube_video_id(url.as_str())
			.map(|id| format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg")),
		"vimeo.com" | "player.vimeo.com" =>
			segments.last().map(|id| format!("https://vumbnail.com/{id}.jpg")),
		"github.com" if segments.len() >= 2 => Some(format!(
			"https://opengraph.githubassets.com/1/{}/{}",
			segments[0], segments[1]
		)),
		_ => None,
	}
}

/// Large favicon for hosts without a better preview.
pub fn favicon_url(raw: &str) -> Option<String> {
	let url = parse_lenient(raw)?;
	let host = url.host_str()?;

	Some(format!("https://www.google.com/s2/favicons?domain={host}&sz=512"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn youtube_uses_max_resolution_still() {
		assert_eq!(
			known_host_thumbnail("https://youtu.be/dQw4w9WgXcQ").as_deref(),
			Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
		);
		assert_eq!(known_host_thumbnail("https://www.youtube.com/feed/trending"), None);
	}

	#[test]
	fn vimeo_and_github_hints() {
		assert_eq!(
			known_host_thumbnail("https://vimeo.com/76979871").as_deref(),
			Some("https://vumbnail.com/76979871.jpg")
		);
		assert_eq!(
			known_host_thumbnail("https://github.com/rust-lang/rust/issues").as_deref(),
			Some("https://opengraph.githubassets.com/1/rust-lang/rust")
		);
		assert_eq!(known_host_thumbnail("https://github.com/rust-lang"), None);
	}

	#[test]
	fn favicon_requires_host() {
		assert_eq!(
			favicon_url("https://docs.rs/tokio").as_deref(),
			Some("https://www.google.com/s2/favicons?domain=docs.rs&sz=512")
		);
		assert_eq!(favicon_url("not a url"), None);
	}
}
