use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::value::Value;

use crate::Metadata;
use crate::Report;
use crate::macros::regex;

/// How `%key%` placeholders (or template expressions) in the assembled
/// document are resolved against the metadata record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReplacementMode {
	/// Straight `%key%` substitution, one replacement per metadata entry.
	#[default]
	Basic,
	/// Treat the whole document as a template and render it with the
	/// metadata record as context.
	Jinja,
	/// Leave the document alone.
	None,
}

/// Resolve placeholders in the assembled document. Neither mode ever fails
/// the build; an unresolvable document is reported and passed through
/// unchanged.
pub fn replace_placeholders(
	text: String,
	mode: ReplacementMode,
	metadata: &Metadata,
	report: &mut Report,
) -> String {
	match mode {
		ReplacementMode::Basic => basic_pass(text, metadata, report),
		ReplacementMode::Jinja => jinja_pass(text, metadata, report),
		ReplacementMode::None => text,
	}
}

fn basic_pass(text: String, metadata: &Metadata, report: &mut Report) -> String {
	let mut replaced = text;
	for (key, _) in metadata.iter() {
		let Some(value) = metadata.get_str(key) else {
			continue;
		};
		replaced = replaced.replace(&format!("%{key}%"), &value);
	}

	// Whatever still looks like a placeholder names a key with no usable
	// value. Warn once per key.
	let mut warned: Vec<&str> = Vec::new();
	for caps in regex!(r"%([A-Za-z0-9_-]+)%").captures_iter(&replaced) {
		let Some(key) = caps.get(1).map(|m| m.as_str()) else {
			continue;
		};
		if metadata.get_str(key).is_some() || warned.contains(&key) {
			continue;
		}
		report.warn(format!(
			"can't replace placeholder '{key}', because it has no value in metadata; ignoring it"
		));
		warned.push(key);
	}

	replaced
}

fn has_template_syntax(text: &str) -> bool {
	text.contains("{{") || text.contains("{%") || text.contains("{#")
}

fn render_template(text: &str, metadata: &Metadata) -> Result<String, minijinja::Error> {
	let mut env = Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_undefined_behavior(UndefinedBehavior::Chainable);
	env.add_template("__document__", text)?;
	let template = env.get_template("__document__")?;
	template.render(Value::from_serialize(metadata.to_value()))
}

fn jinja_pass(text: String, metadata: &Metadata, report: &mut Report) -> String {
	if !has_template_syntax(&text) {
		return text;
	}

	match render_template(&text, metadata) {
		Ok(rendered) => rendered,
		Err(error) => {
			report.warn(format!(
				"placeholder template pass failed: {error}; leaving the document unchanged"
			));
			text
		}
	}
}
