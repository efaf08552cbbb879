//! Permissive parsing of model completions.

use crate::rag::types::Sample;
use serde_json::Value;

/// Turn a raw completion into a sample.
///
/// The substring from the first `{` to the last `}` is parsed as a JSON
/// object. It must carry `final_answer`; `reasoning` is optional. Anything
/// else falls back to the trimmed raw text. Never fails.
pub fn parse_sample(raw: &str) -> Sample {
    match parse_structured(raw) {
        Some(sample) => sample,
        None => {
            tracing::debug!("Completion is not structured JSON, using raw text");
            Sample::unstructured(raw.trim())
        }
    }
}

fn parse_structured(raw: &str) -> Option<Sample> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let object = value.as_object()?;

    let final_answer = field_text(object.get("final_answer")?);
    let reasoning = object.get("reasoning").map(field_text).unwrap_or_default();

    Some(Sample::structured(reasoning, final_answer))
}

/// Strings are taken as-is, other values as their JSON text.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::types::SampleKind;

    #[test]
    fn test_parse_structured() {
        let sample = parse_sample(r#"{"reasoning":"r","final_answer":"a"}"#);
        assert_eq!(sample, Sample::structured("r", "a"));
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"reasoning\": \"Step 1\", \"final_answer\": \"Paris\"}\n```";
        let sample = parse_sample(raw);
        assert_eq!(sample.kind, SampleKind::Structured);
        assert_eq!(sample.final_answer, "Paris");
        assert_eq!(sample.reasoning, "Step 1");
    }

    #[test]
    fn test_plain_text_falls_back() {
        let sample = parse_sample("  blah blah \n");
        assert_eq!(sample, Sample::unstructured("blah blah"));
    }

    #[test]
    fn test_missing_final_answer_falls_back() {
        let raw = r#"{"reasoning":"only reasoning"}"#;
        let sample = parse_sample(raw);
        assert_eq!(sample.kind, SampleKind::Unstructured);
        assert_eq!(sample.final_answer, raw);
    }

    #[test]
    fn test_missing_reasoning_is_empty() {
        let sample = parse_sample(r#"{"final_answer":"a"}"#);
        assert_eq!(sample, Sample::structured("", "a"));
    }

    #[test]
    fn test_non_string_fields_are_stringified() {
        let sample = parse_sample(r#"{"reasoning":["a","b"],"final_answer":42}"#);
        assert_eq!(sample.final_answer, "42");
        assert_eq!(sample.reasoning, r#"["a","b"]"#);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let sample = parse_sample("{not json}");
        assert_eq!(sample.kind, SampleKind::Unstructured);
        assert_eq!(sample.final_answer, "{not json}");
    }

    #[test]
    fn test_reversed_braces_fall_back() {
        let sample = parse_sample("} then {");
        assert_eq!(sample.kind, SampleKind::Unstructured);
    }

    #[test]
    fn test_json_array_falls_back() {
        // first '{' to last '}' of an array of objects is not a single object
        let sample = parse_sample(r#"[{"final_answer":"a"},{"final_answer":"b"}]"#);
        assert_eq!(sample.kind, SampleKind::Unstructured);
    }
}
