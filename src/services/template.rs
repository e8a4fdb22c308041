//! Context template rendering.
//!
//! Templates use brace placeholders: `{name}`, `{properties}`,
//! `{properties[population]}` and the geometry's members such as `{type}` or
//! `{coordinates[0]}`. `{{` and `}}` produce literal braces. String values
//! render raw; everything else renders as compact JSON.

use serde_json::{Map, Value};

use crate::domain::errors::TemplateError;

/// Render `template` against the named values in `fields`.
pub fn render(template: &str, fields: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut placeholder = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(TemplateError::UnbalancedBrace(offset)),
                        other => placeholder.push(other),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnbalancedBrace(offset));
                }
                let value = resolve(&placeholder, fields)?;
                push_value(&mut out, value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBrace(offset));
                }
            }
            other => out.push(other),
        }
    }

    if out.trim().is_empty() {
        return Err(TemplateError::Empty);
    }
    Ok(out)
}

fn resolve<'a>(placeholder: &str, fields: &'a Map<String, Value>) -> Result<&'a Value, TemplateError> {
    if placeholder.contains(['!', ':']) {
        return Err(TemplateError::UnsupportedSpec(placeholder.to_string()));
    }

    let (head, mut rest) = placeholder
        .find('[')
        .map_or((placeholder, ""), |i| placeholder.split_at(i));

    if head.is_empty() || head.chars().all(|c| c.is_ascii_digit()) {
        return Err(TemplateError::Positional);
    }
    if head.contains('.') {
        return Err(TemplateError::UnsupportedSpec(placeholder.to_string()));
    }

    let mut current = fields
        .get(head)
        .ok_or_else(|| TemplateError::UnknownField(head.to_string()))?;
    let mut path = head.to_string();

    while !rest.is_empty() {
        let Some(stripped) = rest.strip_prefix('[') else {
            return Err(TemplateError::UnsupportedSpec(placeholder.to_string()));
        };
        let Some(end) = stripped.find(']') else {
            return Err(TemplateError::BadIndex {
                field: path,
                index: stripped.to_string(),
            });
        };
        let index = &stripped[..end];
        current = index_into(current, index).ok_or_else(|| TemplateError::BadIndex {
            field: path.clone(),
            index: index.to_string(),
        })?;
        path = format!("{path}[{index}]");
        rest = &stripped[end + 1..];
    }

    Ok(current)
}

fn index_into<'a>(value: &'a Value, index: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(index),
        Value::Array(items) => index.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Map<String, Value> {
        json!({
            "name": "Harbor Light",
            "properties": {"name": "Harbor Light", "height_m": 32, "lit": true},
            "type": "Point",
            "coordinates": [-70.25, 43.65]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_named_and_indexed_fields() {
        let text = render(
            "{name} ({type}) at {coordinates[1]}, {coordinates[0]}: {properties[height_m]}m",
            &fields(),
        )
        .unwrap();
        assert_eq!(text, "Harbor Light (Point) at 43.65, -70.25: 32m");
    }

    #[test]
    fn test_whole_properties_render_as_json() {
        let text = render("{properties}", &fields()).unwrap();
        assert_eq!(text, r#"{"name":"Harbor Light","height_m":32,"lit":true}"#);
    }

    #[test]
    fn test_escaped_braces() {
        let text = render("{{{name}}}", &fields()).unwrap();
        assert_eq!(text, "{Harbor Light}");
    }

    #[test]
    fn test_errors() {
        let f = fields();
        assert_eq!(
            render("{population}", &f),
            Err(TemplateError::UnknownField("population".to_string()))
        );
        assert!(matches!(
            render("{coordinates[5]}", &f),
            Err(TemplateError::BadIndex { .. })
        ));
        assert!(matches!(
            render("{properties[missing]}", &f),
            Err(TemplateError::BadIndex { .. })
        ));
        assert_eq!(render("{}", &f), Err(TemplateError::Positional));
        assert_eq!(render("{0}", &f), Err(TemplateError::Positional));
        assert!(matches!(
            render("{name:>10}", &f),
            Err(TemplateError::UnsupportedSpec(_))
        ));
        assert!(matches!(
            render("{name!r}", &f),
            Err(TemplateError::UnsupportedSpec(_))
        ));
        assert_eq!(render("{name", &f), Err(TemplateError::UnbalancedBrace(0)));
        assert_eq!(render("name}", &f), Err(TemplateError::UnbalancedBrace(4)));
        assert_eq!(render("   ", &f), Err(TemplateError::Empty));
    }
}
