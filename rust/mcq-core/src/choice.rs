//! Choice records: the authored definition handed over by the question parser,
//! and the immutable `ChoiceSpec` the engine works with.

use serde::{Deserialize, Serialize};

/// Opaque per-choice payload. The engine stores and returns it but never inspects it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceContent(serde_json::Value);

impl ChoiceContent {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Text form for display in tools; strings are returned unquoted.
    pub fn to_display_string(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for ChoiceContent {
    fn from(s: &str) -> Self {
        Self(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for ChoiceContent {
    fn from(s: String) -> Self {
        Self(serde_json::Value::String(s))
    }
}

impl From<serde_json::Value> for ChoiceContent {
    fn from(v: serde_json::Value) -> Self {
        Self(v)
    }
}

/// One authored choice as produced by the question parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoiceDefinition {
    /// Optional authored name; unnamed choices get a positional id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub content: ChoiceContent,
    #[serde(default)]
    pub correct: bool,
    /// Held out of the shuffle.
    #[serde(default)]
    pub fixed: bool,
}

impl ChoiceDefinition {
    pub fn new(content: impl Into<ChoiceContent>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn correct(mut self) -> Self {
        self.correct = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }
}

/// One choice inside a `ChoiceGroup`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    original_id: String,
    original_position: usize,
    is_correct: bool,
    is_fixed: bool,
    content: ChoiceContent,
}

impl ChoiceSpec {
    pub(crate) fn new(
        original_id: String,
        original_position: usize,
        is_correct: bool,
        is_fixed: bool,
        content: ChoiceContent,
    ) -> Self {
        Self {
            original_id,
            original_position,
            is_correct,
            is_fixed,
            content,
        }
    }

    #[inline]
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    /// 0-based index in authored order.
    #[inline]
    pub fn original_position(&self) -> usize {
        self.original_position
    }

    #[inline]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    #[inline]
    pub fn content(&self) -> &ChoiceContent {
        &self.content
    }
}
