use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Named variables supplied to a single chain invocation.
///
/// Values are stored as JSON so callers can hand over anything serializable;
/// templates render strings verbatim and everything else as compact JSON.
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// Builder-style `set`, handy for one-liners at call sites.
    pub fn with(self, key: impl Into<String>, value: impl serde::Serialize) -> Self {
        self.set(key, value);
        self
    }

    /// Panics if `value` cannot be represented as JSON (e.g. a map with non-string keys).
    pub fn set(&self, key: impl Into<String>, value: impl serde::Serialize) {
        let value = serde_json::to_value(value).expect("Failed to serialize value");
        self.data.insert(key.into(), value);
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Text form of a variable as it should appear inside a prompt.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|v| match v.value() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_render_verbatim_and_other_values_as_json() {
        let context = Context::new()
            .with("text", "BP 140/90")
            .with("items", vec!["a", "b"])
            .with("count", 3);

        assert_eq!(context.get_text("text").as_deref(), Some("BP 140/90"));
        assert_eq!(context.get_text("items").as_deref(), Some(r#"["a","b"]"#));
        assert_eq!(context.get_text("count").as_deref(), Some("3"));
        assert_eq!(context.get::<u32>("count"), Some(3));
        assert!(context.get_text("missing").is_none());
    }

    #[test]
    fn clones_share_the_same_variables() {
        let context = Context::new();
        let clone = context.clone();
        clone.set("user_question", "hello");

        assert!(context.contains("user_question"));
        assert_eq!(context.len(), 1);
        assert!(context.remove("user_question").is_some());
        assert!(clone.is_empty());
    }

    #[test]
    #[should_panic(expected = "Failed to serialize value")]
    fn unserializable_values_are_not_stored_as_null() {
        let mut readings = std::collections::HashMap::new();
        readings.insert((140, 90), "blood pressure");
        Context::new().set("readings", readings);
    }
}
