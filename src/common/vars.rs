//! Loosely typed key/value bag backed by a JSON object.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Ordered JSON object used for node configuration and execution state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars {
    inner: Map<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set<V: Into<Value>>(
        &mut self,
        key: &str,
        value: V,
    ) {
        self.inner.insert(key.to_string(), value.into());
    }

    /// Builder form of [`Vars::set`].
    pub fn with<V: Into<Value>>(
        mut self,
        key: &str,
        value: V,
    ) -> Self {
        self.set(key, value);
        self
    }

    /// Get `key` deserialized into `T`; `None` if absent or of another shape.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.inner.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_value(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.inner.iter()
    }
}

impl From<Value> for Vars {
    /// Non-object values produce an empty bag.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(inner) => Self {
                inner,
            },
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Vars;

    #[test]
    fn test_set_and_get() {
        let mut vars = Vars::new();
        vars.set("model", "gpt-4");
        vars.set("temperature", 0.5);

        assert_eq!(vars.get::<String>("model"), Some("gpt-4".to_string()));
        assert_eq!(vars.get::<f64>("temperature"), Some(0.5));
        assert_eq!(vars.get::<String>("temperature"), None);
        assert_eq!(vars.get::<String>("missing"), None);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let vars = Vars::new().with("a", 1).with("a", 2);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get::<i64>("a"), Some(2));
    }

    #[test]
    fn test_json_conversion() {
        let vars = Vars::from(json!({"x": [1, 2], "y": {"z": true}}));
        assert!(vars.contains("x"));
        assert_eq!(serde_json::Value::from(vars.clone()), json!({"x": [1, 2], "y": {"z": true}}));

        assert!(Vars::from(json!("scalar")).is_empty());
    }
}
