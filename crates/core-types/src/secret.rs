//! The ephemeral secret map (Invariant 7): logical name -> value,
//! never serialized and never shown to the LLM. Substitution into an
//! action's text parameters happens at the browser boundary, inside the
//! Navigation Loop's action executor (C4 §4.4 step 4) — never earlier,
//! in particular never while building the LLM prompt.

use std::collections::HashMap;
use std::fmt;

/// Deliberately does not implement `Serialize`/`Deserialize`: a
/// `SecretMap` must never reach disk. The traversal's persisted `secrets`
/// field only stores logical names (see [`crate::traversal::Traversal`]).
#[derive(Clone, Default)]
pub struct SecretMap(HashMap<String, String>);

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every `{{name}}` occurrence of a known secret's logical
    /// name with its value. Unknown placeholders are left untouched
    /// rather than erroring — the text may legitimately contain
    /// double-braces unrelated to secrets.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (name, value) in &self.0 {
            out = out.replace(&format!("{{{{{name}}}}}"), value);
        }
        out
    }
}

/// Never prints values, even in panics/logs — only the count and names.
impl fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMap")
            .field("names", &self.names())
            .finish()
    }
}
