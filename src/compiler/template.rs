use crate::catalog::BlockDefinition;
use crate::project::BlockInstance;
use serde_json::Value;
use std::borrow::Cow;

/// Substitutes `{field}` tokens in a block's code template.
///
/// A token is replaced when the instance carries that field or the definition declares it;
/// any other brace group is copied through untouched. Substituted text is not re-scanned.
pub(super) fn render(definition: &BlockDefinition, block: &BlockInstance) -> String {
    let template = definition.code.as_str();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let field = after
            .find('}')
            .map(|close| (&after[..close], &after[close + 1..]))
            .filter(|(name, _)| is_field_name(name))
            .filter(|(name, _)| block.fields.contains_key(*name) || definition.declares_field(name));

        match field {
            Some((name, tail)) => {
                out.push_str(&field_text(block.fields.get(name)));
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Splits rendered code into indented output lines, dropping blank ones.
pub(super) fn layout_lines<'a>(
    rendered: &'a str,
    indent: &'a str,
    comment_marker: Option<&'a str>,
) -> impl Iterator<Item = String> + 'a {
    rendered
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(move |line| match comment_marker {
            Some(marker) => format!("{indent}{marker}{line}"),
            None => format!("{indent}{line}"),
        })
}

/// Any non-empty text without a nested opening brace; `}` cannot occur by construction.
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('{')
}

fn field_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(true)) => Cow::Borrowed("True"),
        Some(Value::Bool(false)) => Cow::Borrowed("False"),
        Some(Value::Number(n)) => Cow::Owned(n.to_string()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}
