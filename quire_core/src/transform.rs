use crate::Report;
use crate::rules::TransformRule;

/// Apply every transformation to the whole document, in rule-file order.
/// Later rules see the output of earlier ones, so a rule can rewrite text
/// another rule produced.
pub fn apply_transforms(text: String, rules: &[TransformRule], report: &mut Report) -> String {
	let mut current = text;

	for rule in rules {
		match &rule.comment {
			Some(comment) => report.note(comment.clone()),
			None => {
				report.note(format!(
					"replace '{}' with '{}'",
					rule.search.as_str(),
					rule.replacement
				));
			}
		}
		current = rule
			.search
			.replace_all(&current, rule.replacement.as_str())
			.into_owned();
	}

	current
}
