use std::fs;
use std::path::Path;

use serde_json::Map;
use serde_json::Value;

use crate::QuireError;
use crate::QuireResult;

/// Keys that accept a per-language override, looked up as `<key>_<lang>`.
const TRANSLATED_KEYS: [&str; 3] = ["title", "subtitle", "cover-image"];

/// The book's metadata record: a flat JSON object of key/value pairs.
///
/// The same record feeds three consumers. Rule files pull values into
/// patterns through `%key%` tokens, the placeholder pass rewrites document
/// text from it, and the final conversion receives it as a metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
	entries: Map<String, Value>,
}

impl Metadata {
	pub fn new() -> Self {
		Self::default()
	}

	/// Read a metadata record from a JSON file holding a single top-level
	/// object.
	pub fn load(path: &Path) -> QuireResult<Self> {
		let text = fs::read_to_string(path).map_err(|error| {
			QuireError::MetadataFile {
				path: path.display().to_string(),
				reason: error.to_string(),
			}
		})?;
		let value: Value = serde_json::from_str(&text).map_err(|error| {
			QuireError::MetadataFile {
				path: path.display().to_string(),
				reason: error.to_string(),
			}
		})?;

		match value {
			Value::Object(entries) => Ok(Self { entries }),
			other => {
				Err(QuireError::MetadataFile {
					path: path.display().to_string(),
					reason: format!("expected a JSON object at the top level, found {other}"),
				})
			}
		}
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries.get(key)
	}

	/// A scalar value rendered as text. Arrays and objects have no sensible
	/// single-string form and yield `None`.
	pub fn get_str(&self, key: &str) -> Option<String> {
		match self.entries.get(key)? {
			Value::String(text) => Some(text.clone()),
			Value::Number(number) => Some(number.to_string()),
			Value::Bool(flag) => Some(flag.to_string()),
			_ => None,
		}
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.entries.insert(key.into(), value.into());
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.entries.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Record the requested language and shadow each translatable key with
	/// its `<key>_<lang>` variant when one exists.
	pub fn apply_lang(&mut self, lang: &str) {
		if lang.is_empty() {
			return;
		}

		self.insert("lang", lang);
		for key in TRANSLATED_KEYS {
			if let Some(translated) = self.entries.get(&format!("{key}_{lang}")).cloned() {
				self.entries.insert(key.to_string(), translated);
			}
		}
	}

	/// The record as a JSON object value, for writing back out to disk.
	pub fn to_value(&self) -> Value {
		Value::Object(self.entries.clone())
	}
}

impl From<Map<String, Value>> for Metadata {
	fn from(entries: Map<String, Value>) -> Self {
		Self { entries }
	}
}
