//! Extraction schemas and the records parsed against them.
//!
//! A schema is a flat list of [`FieldSpec`]s. Each field knows its type and
//! where it lives in the model's JSON response (a JSON pointer), so nested
//! response shapes such as `form_metadata.title` still map onto one flat
//! record. Parsing never fails per field: anything absent or malformed
//! becomes [`FieldValue::Null`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ScoringError;

/// What kind of document a batch extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    JobPosting,
    GoogleForm,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionKind::JobPosting => "job_posting",
            ExtractionKind::GoogleForm => "google_form",
        }
    }

    /// Built-in schema for this kind.
    pub fn schema(&self) -> ExtractionSchema {
        match self {
            ExtractionKind::JobPosting => ExtractionSchema::job_posting(),
            ExtractionKind::GoogleForm => ExtractionSchema::google_form(),
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtractionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "job_posting" | "job" | "jobs" => Ok(ExtractionKind::JobPosting),
            "google_form" | "form" | "forms" => Ok(ExtractionKind::GoogleForm),
            other => Err(format!("unknown extraction kind: {}", other)),
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Number,
    Boolean,
    TextList,
    Enum { values: Vec<String> },
    /// List of JSON objects (questions, sections, application questions).
    Records,
}

impl FieldType {
    pub fn one_of(values: &[&str]) -> Self {
        FieldType::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Placeholder shown to the model in the response template.
    pub fn placeholder(&self) -> Value {
        match self {
            FieldType::Text => Value::String("<text or null>".into()),
            FieldType::Integer => Value::String("<integer or null>".into()),
            FieldType::Number => Value::String("<number or null>".into()),
            FieldType::Boolean => Value::String("<true|false|null>".into()),
            FieldType::TextList => Value::Array(vec![Value::String("<text>".into())]),
            FieldType::Enum { values } => Value::String(format!("<{}|null>", values.join("|"))),
            FieldType::Records => Value::Array(vec![Value::String("<object>".into())]),
        }
    }

    /// Coerce a raw JSON value to this type. Malformed values become `Null`.
    pub fn coerce(&self, raw: Option<&Value>) -> FieldValue {
        let Some(raw) = raw else {
            return FieldValue::Null;
        };

        match (self, raw) {
            (_, Value::Null) => FieldValue::Null,
            (FieldType::Text, Value::String(s)) => FieldValue::text(s),
            (FieldType::Text, Value::Number(n)) => FieldValue::Text(n.to_string()),
            (FieldType::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            (FieldType::Integer, Value::String(s)) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
                digits
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .unwrap_or(FieldValue::Null)
            }
            (FieldType::Number, Value::Number(n)) => {
                n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null)
            }
            (FieldType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            (FieldType::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
            (FieldType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => FieldValue::Boolean(true),
                "false" | "no" => FieldValue::Boolean(false),
                _ => FieldValue::Null,
            },
            (FieldType::TextList, Value::Array(items)) => FieldValue::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            (FieldType::TextList, Value::String(s)) if !s.trim().is_empty() => {
                FieldValue::List(vec![s.trim().to_string()])
            }
            (FieldType::Enum { values }, Value::String(s)) => values
                .iter()
                .find(|v| v.eq_ignore_ascii_case(s.trim()))
                .map(|v| FieldValue::Text(v.clone()))
                .unwrap_or(FieldValue::Null),
            (FieldType::Records, Value::Array(items)) => FieldValue::Records(
                items.iter().filter(|item| item.is_object()).cloned().collect(),
            ),
            _ => FieldValue::Null,
        }
    }
}

/// One field of an extraction schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    /// Counted in the completeness ratio.
    #[serde(default)]
    pub required_for_scoring: bool,
    /// JSON pointer into the model response; defaults to `/<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: description.into(),
            required_for_scoring: false,
            pointer: None,
        }
    }

    /// Mark the field as counted in the completeness ratio.
    pub fn scoring(mut self) -> Self {
        self.required_for_scoring = true;
        self
    }

    /// Read the field from a nested location in the response.
    pub fn at(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    /// Effective JSON pointer.
    pub fn pointer(&self) -> String {
        self.pointer
            .clone()
            .unwrap_or_else(|| format!("/{}", self.name))
    }
}

/// Field list plus the defaults that go with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub kind: ExtractionKind,
    pub fields: Vec<FieldSpec>,
    /// Where the model reports its own confidence.
    pub confidence_pointer: String,
    /// Field used as the display title of a stored result.
    pub title_field: String,
    /// Default content budget in characters.
    pub max_content_chars: usize,
    /// Default output-token cap.
    pub max_output_tokens: u32,
}

impl ExtractionSchema {
    /// Create a schema, rejecting one with nothing to score.
    pub fn new(
        kind: ExtractionKind,
        fields: Vec<FieldSpec>,
        confidence_pointer: impl Into<String>,
    ) -> std::result::Result<Self, ScoringError> {
        if !fields.iter().any(|f| f.required_for_scoring) {
            return Err(ScoringError::NoScoringFields);
        }
        let title_field = fields
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        Ok(Self {
            kind,
            fields,
            confidence_pointer: confidence_pointer.into(),
            title_field,
            max_content_chars: 25_000,
            max_output_tokens: 2_000,
        })
    }

    pub fn with_title_field(mut self, name: impl Into<String>) -> Self {
        self.title_field = name.into();
        self
    }

    pub fn with_max_content_chars(mut self, chars: usize) -> Self {
        self.max_content_chars = chars;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn scoring_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required_for_scoring)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Job posting fields.
    pub fn job_posting() -> Self {
        let fields = vec![
            FieldSpec::new("job_title", FieldType::Text, "Exact job title as written").scoring(),
            FieldSpec::new("company_name", FieldType::Text, "Hiring company name").scoring(),
            FieldSpec::new("location", FieldType::Text, "City, state/region, country").scoring(),
            FieldSpec::new(
                "employment_type",
                FieldType::one_of(&["full-time", "part-time", "contract", "temporary", "internship"]),
                "Employment type",
            ),
            FieldSpec::new(
                "remote_policy",
                FieldType::one_of(&["remote", "hybrid", "on-site"]),
                "Work arrangement",
            ),
            FieldSpec::new("job_description", FieldType::Text, "Main description of the role").scoring(),
            FieldSpec::new("responsibilities", FieldType::TextList, "Key duties, one per item").scoring(),
            FieldSpec::new("requirements", FieldType::TextList, "Required qualifications").scoring(),
            FieldSpec::new("preferred_qualifications", FieldType::TextList, "Nice-to-have qualifications"),
            FieldSpec::new("benefits", FieldType::TextList, "Benefits and perks"),
            FieldSpec::new("salary_min", FieldType::Integer, "Minimum annual salary as a number"),
            FieldSpec::new("salary_max", FieldType::Integer, "Maximum annual salary as a number"),
            FieldSpec::new("salary_currency", FieldType::Text, "ISO currency code, e.g. USD"),
            FieldSpec::new("salary_text", FieldType::Text, "Salary exactly as written"),
            FieldSpec::new("company_description", FieldType::Text, "About the company"),
            FieldSpec::new("company_size", FieldType::Text, "Company size if stated"),
            FieldSpec::new("industry", FieldType::Text, "Industry or sector"),
            FieldSpec::new("application_deadline", FieldType::Text, "Deadline as YYYY-MM-DD"),
            FieldSpec::new("application_instructions", FieldType::Text, "How to apply"),
            FieldSpec::new("application_url", FieldType::Text, "Direct application link"),
            FieldSpec::new(
                "application_questions",
                FieldType::Records,
                "Application form questions, each {question, type, required, options}",
            ),
            FieldSpec::new("experience_required", FieldType::Text, "Years or level of experience"),
            FieldSpec::new("education_required", FieldType::Text, "Education requirements"),
            FieldSpec::new("required_skills", FieldType::TextList, "Required technical and soft skills").scoring(),
            FieldSpec::new("preferred_skills", FieldType::TextList, "Preferred skills"),
        ];

        Self {
            kind: ExtractionKind::JobPosting,
            fields,
            confidence_pointer: "/confidence_score".into(),
            title_field: "job_title".into(),
            max_content_chars: 25_000,
            max_output_tokens: 2_000,
        }
    }

    /// Google Forms fields.
    pub fn google_form() -> Self {
        let fields = vec![
            FieldSpec::new("title", FieldType::Text, "Form title")
                .at("/form_metadata/title")
                .scoring(),
            FieldSpec::new("description", FieldType::Text, "Form description or instructions")
                .at("/form_metadata/description"),
            FieldSpec::new("form_id", FieldType::Text, "Form identifier from the URL")
                .at("/form_metadata/form_id"),
            FieldSpec::new("owner_email", FieldType::Text, "Owner email if shown")
                .at("/form_metadata/owner_email"),
            FieldSpec::new("is_accepting_responses", FieldType::Boolean, "Whether the form accepts responses")
                .at("/form_metadata/is_accepting_responses"),
            FieldSpec::new("requires_login", FieldType::Boolean, "Whether sign-in is required")
                .at("/form_metadata/requires_login"),
            FieldSpec::new("collect_email", FieldType::Boolean, "Whether respondent email is collected")
                .at("/form_metadata/collect_email"),
            FieldSpec::new(
                "questions",
                FieldType::Records,
                "Every question, each {question_text, question_type \
                 (multiple_choice|short_answer|paragraph|checkboxes|dropdown|linear_scale|date|time|file_upload|email|url|number), \
                 question_index, is_required, options[], section_index}",
            )
            .scoring(),
            FieldSpec::new("sections", FieldType::Records, "Form sections, each {title, description, section_index}"),
        ];

        Self {
            kind: ExtractionKind::GoogleForm,
            fields,
            confidence_pointer: "/extraction_confidence/overall_confidence".into(),
            title_field: "title".into(),
            max_content_chars: 8_000,
            max_output_tokens: 4_000,
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Records(Vec<Value>),
}

impl FieldValue {
    /// Text value, with blank strings collapsed to `Null`.
    pub fn text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::Text(trimmed.to_string())
        }
    }

    /// Non-null and non-empty.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Records(items) => !items.is_empty(),
            FieldValue::Boolean(_) | FieldValue::Integer(_) | FieldValue::Number(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Parsed record, keyed by field name in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord(IndexMap<String, FieldValue>);

impl ExtractedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce every schema field out of a parsed response.
    pub fn from_response(schema: &ExtractionSchema, response: &Value) -> Self {
        let mut record = Self::new();
        for field in &schema.fields {
            let pointer = field.pointer();
            let value = field.field_type.coerce(response.pointer(&pointer));
            record.insert(field.name.clone(), value);
        }
        record
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).map(FieldValue::is_present).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Token counters reported by the model service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Output of one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub kind: ExtractionKind,
    pub title: Option<String>,
    pub record: ExtractedRecord,
    pub raw_response: String,
    pub usage: Option<TokenUsage>,
    /// Model's self-reported confidence, clamped to [0, 1].
    pub ai_confidence: f64,
    pub model: String,
    /// Content was cut to fit the budget.
    pub truncated: bool,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_without_scoring_fields_is_rejected() {
        let fields = vec![FieldSpec::new("title", FieldType::Text, "Title")];
        assert!(matches!(
            ExtractionSchema::new(ExtractionKind::JobPosting, fields, "/confidence"),
            Err(ScoringError::NoScoringFields)
        ));
    }

    #[test]
    fn builtin_schemas_have_scoring_fields() {
        for kind in [ExtractionKind::JobPosting, ExtractionKind::GoogleForm] {
            assert!(kind.schema().scoring_fields().count() > 0);
        }
    }

    #[test]
    fn malformed_values_become_null() {
        let schema = ExtractionSchema::job_posting();
        let response = json!({
            "job_title": "  Engineer ",
            "company_name": 42,
            "salary_min": "$120,000",
            "salary_max": {"nested": true},
            "employment_type": "Full-Time",
            "remote_policy": "sometimes",
            "responsibilities": ["Build things", "", 3, null],
            "requirements": "Rust",
        });

        let record = ExtractedRecord::from_response(&schema, &response);

        assert_eq!(record.get("job_title"), Some(&FieldValue::Text("Engineer".into())));
        assert_eq!(record.get("company_name"), Some(&FieldValue::Text("42".into())));
        assert_eq!(record.get("salary_min"), Some(&FieldValue::Integer(120000)));
        assert_eq!(record.get("salary_max"), Some(&FieldValue::Null));
        assert_eq!(record.get("employment_type"), Some(&FieldValue::Text("full-time".into())));
        assert_eq!(record.get("remote_policy"), Some(&FieldValue::Null));
        assert_eq!(
            record.get("responsibilities"),
            Some(&FieldValue::List(vec!["Build things".into(), "3".into()]))
        );
        assert_eq!(record.get("requirements"), Some(&FieldValue::List(vec!["Rust".into()])));
        assert!(!record.is_present("location"));
        assert_eq!(record.len(), schema.fields.len());
    }

    #[test]
    fn nested_pointers_are_followed() {
        let schema = ExtractionSchema::google_form();
        let response = json!({
            "form_metadata": {"title": "Volunteer signup", "is_accepting_responses": true},
            "questions": [{"question_text": "Name?"}, "not an object"],
        });

        let record = ExtractedRecord::from_response(&schema, &response);

        assert_eq!(record.get("title").and_then(FieldValue::as_text), Some("Volunteer signup"));
        assert_eq!(record.get("is_accepting_responses"), Some(&FieldValue::Boolean(true)));
        match record.get("questions") {
            Some(FieldValue::Records(items)) => assert_eq!(items.len(), 1),
            other => panic!("unexpected questions value: {:?}", other),
        }
    }

    #[test]
    fn empty_collections_are_not_present() {
        assert!(!FieldValue::List(vec![]).is_present());
        assert!(!FieldValue::text("   ").is_present());
        assert!(FieldValue::Boolean(false).is_present());
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("jobs".parse::<ExtractionKind>(), Ok(ExtractionKind::JobPosting));
        assert_eq!("google_form".parse::<ExtractionKind>(), Ok(ExtractionKind::GoogleForm));
        assert!("pdf".parse::<ExtractionKind>().is_err());
    }
}
