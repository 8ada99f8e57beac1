use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{
    context::Context,
    error::{ChainError, Result},
};

/// Prompt after all placeholders have been substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPrompt {
    /// Instructions for the model (sent as the system / preamble part)
    pub system: String,
    /// The user turn
    pub user: String,
}

/// Two-part prompt template with `{name}` placeholders.
///
/// `{{` and `}}` render as literal braces. Substitution is a single pass, so a
/// value that happens to contain braces (JSON format instructions, for one) is
/// copied as-is and never treated as another placeholder.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
    user: String,
    partials: HashMap<String, String>,
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            partials: HashMap::new(),
        }
    }

    /// Pre-fill a placeholder. Partials win over values supplied at render time.
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Placeholders still expected from the caller (partials excluded).
    pub fn input_variables(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for text in [&self.system, &self.user] {
            for segment in parse(text)? {
                if let Segment::Placeholder(name) = segment {
                    if !self.partials.contains_key(name) {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    pub fn render(&self, context: &Context) -> Result<RenderedPrompt> {
        Ok(RenderedPrompt {
            system: self.render_part(&self.system, context)?,
            user: self.render_part(&self.user, context)?,
        })
    }

    fn render_part(&self, text: &str, context: &Context) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        for segment in parse(text)? {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Brace(c) => out.push(c),
                Segment::Placeholder(name) => {
                    let value = match self.partials.get(name) {
                        Some(value) => value.clone(),
                        None => context
                            .get_text(name)
                            .ok_or_else(|| ChainError::MissingVariable(name.to_string()))?,
                    };
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(text: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let bytes = text.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                if literal_start < i {
                    segments.push(Segment::Literal(&text[literal_start..i]));
                }
                segments.push(Segment::Brace(bytes[i] as char));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&text[literal_start..i]));
                }
                let close = text[i + 1..].find('}').map(|offset| i + 1 + offset).ok_or_else(
                    || ChainError::MalformedTemplate(format!("unclosed '{{' at byte {}", i)),
                )?;
                let name = &text[i + 1..close];
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(ChainError::MalformedTemplate(format!(
                        "invalid placeholder name '{}'",
                        name
                    )));
                }
                segments.push(Segment::Placeholder(name));
                i = close + 1;
                literal_start = i;
            }
            b'}' => {
                return Err(ChainError::MalformedTemplate(format!(
                    "single '}}' at byte {}",
                    i
                )));
            }
            _ => i += 1,
        }
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    Ok(segments)
}
