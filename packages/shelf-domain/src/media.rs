use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "youtu.be", "music.youtube.com"];
const AUDIO_EXTENSIONS: [&str; 6] = [".mp3", ".wav", ".ogg", ".aac", ".flac", ".m4a"];

static YOUTUBE_ID_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(
		r"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts)/|.*[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})",
	)
	.ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
	Audio,
	Video,
	Other,
}
impl MediaType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Audio => "audio",
			Self::Video => "video",
			Self::Other => "other",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"audio" => Some(Self::Audio),
			"video" => Some(Self::Video),
			"other" => Some(Self::Other),
			_ => None,
		}
	}
}
impl fmt::Display for MediaType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Classifies a bookmark URL. Total: anything that does not parse is [`MediaType::Other`].
pub fn infer_media_type(raw: &str) -> MediaType {
	let Some(url) = parse_lenient(raw) else {
		return MediaType::Other;
	};

	if url.host_str().map(is_youtube_host).unwrap_or(false) {
		return MediaType::Video;
	}

	let path = url.path().to_ascii_lowercase();

	if AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
		return MediaType::Audio;
	}

	MediaType::Other
}

/// Extracts the 11-character video id from the common YouTube URL shapes.
pub fn youtube_video_id(raw: &str) -> Option<String> {
	let re = YOUTUBE_ID_RE.as_ref()?;

	re.captures(raw).and_then(|caps| caps.get(1)).map(|id| id.as_str().to_string())
}

/// True when the text parses as a URL with a host, with or without a scheme.
pub fn is_web_url(raw: &str) -> bool {
	parse_lenient(raw).is_some()
}

/// The parsed form of `raw`, with `https://` supplied when the scheme is missing.
pub fn absolute_url(raw: &str) -> Option<String> {
	parse_lenient(raw).map(|url| url.to_string())
}

pub(crate) fn parse_lenient(raw: &str) -> Option<Url> {
	let trimmed = raw.trim();

	if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
		return None;
	}

	match Url::parse(trimmed) {
		Ok(url) if url.has_host() => Some(url),
		Ok(_) => None,
		Err(url::ParseError::RelativeUrlWithoutBase) =>
			Url::parse(&format!("https://{trimmed}")).ok().filter(Url::has_host),
		Err(_) => None,
	}
}

pub(crate) fn strip_host_prefix(host: &str) -> &str {
	host.strip_prefix("www.").or_else(|| host.strip_prefix("m.")).unwrap_or(host)
}

fn is_youtube_host(host: &str) -> bool {
	let host = host.to_ascii_lowercase();

	YOUTUBE_HOSTS.contains(&strip_host_prefix(&host))
}
