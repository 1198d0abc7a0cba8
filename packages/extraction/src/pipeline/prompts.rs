//! LLM prompts for schema-driven extraction.
//!
//! The system prompt is rendered from the schema alone, so the same schema
//! always produces byte-identical instructions. Page content goes in the
//! user prompt, truncated from the end to fit the character budget.

use serde_json::{Map, Value};

use crate::types::record::{ExtractionKind, ExtractionSchema};

/// System prompt template.
pub const EXTRACT_SYSTEM_PROMPT: &str = r#"You are an expert at extracting structured {subject} data from web page content.

Rules:
- Extract only information that is present in the content. Never invent values.
- Use null for any field that is not stated. Use [] for empty lists.
- Enumerated fields must use exactly one of the listed values, or null.
- Numbers must be plain JSON numbers without currency symbols or separators.
- Respond with a single JSON object and nothing else.

Fields:
{fields}

Respond with JSON in exactly this shape:
{template}

Set {confidence_path} to a number between 0.0 and 1.0 describing how confident you are that the extraction is complete and accurate."#;

/// User prompt template.
pub const EXTRACT_USER_PROMPT: &str = r#"Extract {subject} data from this page.

URL: {url}
{truncation_note}
Content:
{content}"#;

fn subject(kind: ExtractionKind) -> &'static str {
    match kind {
        ExtractionKind::JobPosting => "job posting",
        ExtractionKind::GoogleForm => "form",
    }
}

/// Render the system prompt for a schema.
pub fn format_system_prompt(schema: &ExtractionSchema) -> String {
    let fields = schema
        .fields
        .iter()
        .map(|f| {
            let location = f.pointer().trim_start_matches('/').replace('/', ".");
            format!("- {} ({}): {}", location, type_label(&f.field_type), f.description)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut template = Value::Object(Map::new());
    for field in &schema.fields {
        insert_at_pointer(&mut template, &field.pointer(), field.field_type.placeholder());
    }
    insert_at_pointer(
        &mut template,
        &schema.confidence_pointer,
        Value::String("<number 0.0-1.0>".into()),
    );
    let template = serde_json::to_string_pretty(&template).unwrap_or_else(|_| "{}".into());

    EXTRACT_SYSTEM_PROMPT
        .replace("{subject}", subject(schema.kind))
        .replace("{fields}", &fields)
        .replace("{template}", &template)
        .replace(
            "{confidence_path}",
            &schema.confidence_pointer.trim_start_matches('/').replace('/', "."),
        )
}

/// Render the user prompt. `truncated` adds a note that the page was cut.
pub fn format_user_prompt(kind: ExtractionKind, url: &str, content: &str, truncated: bool) -> String {
    let note = if truncated {
        "Note: the content was truncated to fit; the beginning of the page is preserved.\n"
    } else {
        ""
    };

    EXTRACT_USER_PROMPT
        .replace("{subject}", subject(kind))
        .replace("{url}", url)
        .replace("{truncation_note}", note)
        .replace("{content}", content)
}

/// Keep the first `max_chars` characters. Returns the kept text and whether
/// anything was dropped.
pub fn truncate_content(content: &str, max_chars: usize) -> (&str, bool) {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}

fn type_label(field_type: &crate::types::record::FieldType) -> String {
    use crate::types::record::FieldType;

    match field_type {
        FieldType::Text => "text".into(),
        FieldType::Integer => "integer".into(),
        FieldType::Number => "number".into(),
        FieldType::Boolean => "boolean".into(),
        FieldType::TextList => "list of text".into(),
        FieldType::Enum { values } => format!("one of: {}", values.join(", ")),
        FieldType::Records => "list of objects".into(),
    }
}

/// Insert `value` at a JSON pointer, creating intermediate objects.
fn insert_at_pointer(root: &mut Value, pointer: &str, value: Value) {
    let segments: Vec<String> = pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();

    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_is_deterministic() {
        let schema = ExtractionSchema::job_posting();
        assert_eq!(format_system_prompt(&schema), format_system_prompt(&schema));
    }

    #[test]
    fn system_prompt_lists_enums_and_nested_paths() {
        let jobs = format_system_prompt(&ExtractionSchema::job_posting());
        assert!(jobs.contains("remote_policy (one of: remote, hybrid, on-site)"));
        assert!(jobs.contains("\"confidence_score\""));

        let forms = format_system_prompt(&ExtractionSchema::google_form());
        assert!(forms.contains("form_metadata.title"));
        assert!(forms.contains("\"overall_confidence\""));
    }

    #[test]
    fn truncation_keeps_the_beginning() {
        let (kept, truncated) = truncate_content("Title\nbody body body", 5);
        assert_eq!(kept, "Title");
        assert!(truncated);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let (kept, truncated) = truncate_content("héllo wörld", 7);
        assert_eq!(kept, "héllo w");
        assert!(truncated);
    }

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("short", 100), ("short", false));
        assert_eq!(truncate_content("exact", 5), ("exact", false));
    }

    #[test]
    fn user_prompt_mentions_truncation() {
        let prompt = format_user_prompt(ExtractionKind::JobPosting, "https://a.example", "body", true);
        assert!(prompt.contains("truncated"));
        assert!(prompt.contains("URL: https://a.example"));
    }

    #[test]
    fn pointer_insertion_builds_nested_objects() {
        let mut root = Value::Object(Map::new());
        insert_at_pointer(&mut root, "/a/b", Value::from(1));
        insert_at_pointer(&mut root, "/a/c", Value::from(2));
        assert_eq!(root, serde_json::json!({"a": {"b": 1, "c": 2}}));
    }
}
