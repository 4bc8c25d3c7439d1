//! Timestamps on the wire: RFC 3339 out, RFC 3339 or Unix milliseconds in.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let text = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&text)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;

	from_value(&value).map_err(D::Error::custom)
}

/// Browser exports carry Unix milliseconds; everything else sends RFC 3339 text.
pub(crate) fn from_value(value: &Value) -> Result<OffsetDateTime, String> {
	match value {
		Value::String(text) => OffsetDateTime::parse(text, &Rfc3339).map_err(|err| err.to_string()),
		Value::Number(number) => {
			let millis =
				number.as_i64().ok_or_else(|| "Timestamp must be whole milliseconds.".to_string())?;

			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
				.map_err(|err| err.to_string())
		},
		_ => Err("Timestamp must be a string or a number.".to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_text_and_milliseconds() {
		let from_text = from_value(&Value::from("2024-01-02T03:04:05Z")).expect("Text must parse.");
		let from_millis =
			from_value(&Value::from(1_704_164_645_000_i64)).expect("Millis must parse.");

		assert_eq!(from_text, from_millis);
		assert!(from_value(&Value::Bool(true)).is_err());
		assert!(from_value(&Value::from(1.5)).is_err());
	}
}
