use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

use crate::error::{ChainError, Result};

/// Turns raw model text into the value a chain hands back to its caller.
pub trait OutputParser: Send + Sync {
    type Output: Send;

    fn parse(&self, text: &str) -> Result<Self::Output>;

    /// Text to inject into the prompt so the model knows the expected shape.
    fn format_instructions(&self) -> Option<String> {
        None
    }
}

/// Passes the model text through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl OutputParser for StrOutputParser {
    type Output = String;

    fn parse(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Validates model output against the JSON schema of `T`.
///
/// The schema shown to the model and the validator both come from `T`'s
/// derives (`JsonSchema` and `Deserialize`), so they describe the same shape.
pub struct SchemaParser<T> {
    schema: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: JsonSchema + DeserializeOwned> SchemaParser<T> {
    pub fn new() -> Self {
        let mut schema = serde_json::to_value(schema_for!(T))
            .expect("derived JSON schemas always serialize");
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
        }
        Self {
            schema: schema.to_string(),
            _marker: PhantomData,
        }
    }

    /// The compact JSON schema embedded in the format instructions.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl<T: JsonSchema + DeserializeOwned> Default for SchemaParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutputParser for SchemaParser<T>
where
    T: JsonSchema + DeserializeOwned + Send,
{
    type Output = T;

    fn parse(&self, text: &str) -> Result<T> {
        let candidate = extract_json_object(text).ok_or_else(|| {
            ChainError::SchemaValidation(format!(
                "no JSON object found in model output: {:?}",
                preview(text)
            ))
        })?;

        serde_json::from_str(candidate).map_err(|e| {
            ChainError::SchemaValidation(format!("{} (output: {:?})", e, preview(text)))
        })
    }

    fn format_instructions(&self) -> Option<String> {
        Some(format!(
            r#"The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {{"properties": {{"foo": {{"description": "a list of strings", "type": "array", "items": {{"type": "string"}}}}}}, "required": ["foo"]}}
the object {{"foo": ["bar", "baz"]}} is a well-formatted instance of the schema. The object {{"properties": {{"foo": ["bar", "baz"]}}}} is not well-formatted.

Here is the output schema:
```
{}
```"#,
            self.schema
        ))
    }
}

/// Locate the JSON object in a model reply.
///
/// Models routinely wrap JSON in a markdown fence or add sentences around it,
/// and those sentences may contain braces of their own. Returns the first `{`
/// that starts a complete JSON object, spanning exactly that object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let candidate = &text[start..];
        let mut values = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(_))) => Some(&candidate[..values.byte_offset()]),
            _ => None,
        }
    })
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 120;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Triage {
        /// Urgency from 1 to 5
        urgency: u8,
        reasons: Vec<String>,
    }

    #[test]
    fn str_parser_is_identity() {
        let text = "  Malaria is transmitted by mosquitoes.\n";
        assert_eq!(StrOutputParser.parse(text).unwrap(), text);
        assert!(StrOutputParser.format_instructions().is_none());
    }

    #[test]
    fn format_instructions_embed_the_derived_schema() {
        let parser = SchemaParser::<Triage>::new();
        let instructions = parser.format_instructions().unwrap();

        assert!(instructions.contains(parser.schema()));
        assert!(instructions.contains("\"urgency\""));
        assert!(instructions.contains("\"reasons\""));
        assert!(instructions.contains("\"required\""));
        assert!(instructions.contains("Urgency from 1 to 5"));
        assert!(!parser.schema().contains("$schema"));
    }

    #[test]
    fn parses_plain_fenced_and_wrapped_json() {
        let parser = SchemaParser::<Triage>::new();
        let expected = Triage {
            urgency: 2,
            reasons: vec!["fever".to_string()],
        };

        for text in [
            r#"{"urgency": 2, "reasons": ["fever"]}"#,
            "```json\n{\"urgency\": 2, \"reasons\": [\"fever\"]}\n```",
            "Here you go: {\"urgency\": 2, \"reasons\": [\"fever\"]} Hope it helps.",
        ] {
            assert_eq!(parser.parse(text).unwrap(), expected, "input: {text:?}");
        }
    }

    #[test]
    fn rejects_output_that_does_not_match_the_schema() {
        let parser = SchemaParser::<Triage>::new();
        for text in [
            "",
            "not json at all",
            r#"{"urgency": 2}"#,
            r#"{"urgency": "high", "reasons": []}"#,
            r#"{"urgency": 2, "reasons": "fever"}"#,
            "{ broken",
        ] {
            let err = parser.parse(text).unwrap_err();
            assert!(
                matches!(err, ChainError::SchemaValidation(_)),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn extract_json_object_needs_an_object() {
        assert_eq!(extract_json_object("[1, 2]"), None);
        assert_eq!(extract_json_object("} {"), None);
        assert_eq!(extract_json_object("```\n{}\n```"), Some("{}"));
    }

    #[test]
    fn braces_in_surrounding_prose_are_skipped() {
        let parser = SchemaParser::<Triage>::new();
        let object = r#"{"urgency": 2, "reasons": ["fever {high}"]}"#;

        for text in [
            format!("{object}\n\nNote: values like {{BP}} were normalised."),
            format!("Using schema {{...}} here is the result:\n{object}"),
            format!("```json\n{object}\n```\nHope this helps {{:}}"),
            format!("{{ draft }} {object} {{ trailing"),
        ] {
            assert_eq!(extract_json_object(&text), Some(object), "input: {text:?}");
            assert_eq!(parser.parse(&text).unwrap().urgency, 2);
        }
    }
}
