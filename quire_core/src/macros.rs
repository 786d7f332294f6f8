/// A lazily-compiled static [`regex::Regex`] from a literal pattern.
///
/// Only use with patterns that are known-good at compile time; the
/// compilation failure path is unreachable for literals checked by tests.
macro_rules! regex {
	($pat:literal) => {{
		static RE: once_cell::sync::Lazy<regex::Regex> =
			once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
		&*RE
	}};
}

pub(crate) use regex;
