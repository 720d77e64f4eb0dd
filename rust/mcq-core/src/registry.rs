//! Choice Registry: builds a `ChoiceGroup` from authored choice definitions.
//!
//! Id assignment: a named choice gets `id_prefix + name`; an unnamed choice gets
//! `id_prefix + k` where `k` counts the unnamed choices before it. With no
//! authored names at all, `k` equals the choice's original position.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::choice::{ChoiceDefinition, ChoiceSpec};
use crate::config::{ConfigError, EngineConfig};
use crate::render::RenderState;
use crate::seed::Seed;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("choice {position}: malformed name {name:?} ({reason})")]
    MalformedName {
        position: usize,
        name: String,
        reason: &'static str,
    },
    #[error("duplicate choice id {id:?} at positions {first} and {second}")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },
    #[error("choice group has no correct choice")]
    NoCorrectChoice,
    #[error("choice at index {index} records original_position {found}")]
    PositionMismatch { index: usize, found: usize },
    #[error("mask token prefix {prefix:?} is unusable ({reason})")]
    InvalidTokenPrefix {
        prefix: String,
        reason: &'static str,
    },
}

/// Question-level input from the parser: the choices plus the shuffle directive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupDefinition {
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub choices: Vec<ChoiceDefinition>,
}

impl GroupDefinition {
    /// Parse a YAML (or JSON) question definition.
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }
}

/// Ordered choices of one question instance plus its shuffle parameters.
///
/// Owns its choices exclusively. The render cache lives here as well, so two
/// instances (two students, two attempts) never share cached layouts.
#[derive(Debug, Clone)]
pub struct ChoiceGroup {
    pub(crate) choices: Vec<ChoiceSpec>,
    pub(crate) shuffle_enabled: bool,
    pub(crate) seed: Seed,
    pub(crate) token_prefix: String,
    pub(crate) render: OnceLock<RenderState>,
}

impl ChoiceGroup {
    /// Build with the default configuration.
    pub fn build(
        defs: &[ChoiceDefinition],
        shuffle_enabled: bool,
        seed: impl Into<Seed>,
    ) -> Result<Self, ValidationError> {
        Self::build_with(defs, shuffle_enabled, seed, &EngineConfig::default())
    }

    pub fn build_with(
        defs: &[ChoiceDefinition],
        shuffle_enabled: bool,
        seed: impl Into<Seed>,
        cfg: &EngineConfig,
    ) -> Result<Self, ValidationError> {
        let prefix = &cfg.registry.id_prefix;
        let mut choices = Vec::with_capacity(defs.len());
        let mut unnamed = 0usize;
        for (position, d) in defs.iter().enumerate() {
            let original_id = match &d.name {
                Some(name) => {
                    check_name(position, name)?;
                    format!("{prefix}{name}")
                }
                None => {
                    let id = format!("{prefix}{unnamed}");
                    unnamed += 1;
                    id
                }
            };
            choices.push(ChoiceSpec::new(
                original_id,
                position,
                d.correct,
                d.fixed,
                d.content.clone(),
            ));
        }

        validate_specs(&choices)?;
        check_token_prefix(&cfg.masking.token_prefix, &choices)?;
        if cfg.registry.require_correct && !choices.iter().any(ChoiceSpec::is_correct) {
            return Err(ValidationError::NoCorrectChoice);
        }

        Ok(Self {
            choices,
            shuffle_enabled,
            seed: seed.into(),
            token_prefix: cfg.masking.token_prefix.clone(),
            render: OnceLock::new(),
        })
    }

    pub fn from_definition(
        def: &GroupDefinition,
        seed: impl Into<Seed>,
        cfg: &EngineConfig,
    ) -> Result<Self, ValidationError> {
        Self::build_with(&def.choices, def.shuffle, seed, cfg)
    }

    /// Choices in authored order.
    #[inline]
    pub fn choices(&self) -> &[ChoiceSpec] {
        &self.choices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    #[inline]
    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    #[inline]
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    #[inline]
    pub fn token_prefix(&self) -> &str {
        &self.token_prefix
    }

    pub fn get(&self, original_id: &str) -> Option<&ChoiceSpec> {
        self.choices.iter().find(|c| c.original_id() == original_id)
    }

    /// Ids of the correct choices, in authored order.
    pub fn correct_ids(&self) -> Vec<&str> {
        self.choices
            .iter()
            .filter(|c| c.is_correct())
            .map(ChoiceSpec::original_id)
            .collect()
    }
}

fn check_name(position: usize, name: &str) -> Result<(), ValidationError> {
    let malformed = |reason| ValidationError::MalformedName {
        position,
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(malformed("empty"));
    }
    if !name.chars().all(is_id_char) {
        return Err(malformed(ID_CHARSET));
    }
    Ok(())
}

const ID_CHARSET: &str = "only ASCII letters, digits and _-.: are allowed";

/// Characters allowed in names, ids and prefixes.
pub(crate) fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// Tokens must be well-formed and must never read as an original id.
pub(crate) fn check_token_prefix(
    token_prefix: &str,
    choices: &[ChoiceSpec],
) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidTokenPrefix {
        prefix: token_prefix.to_string(),
        reason,
    };
    if token_prefix.is_empty() {
        return Err(invalid("empty"));
    }
    if !token_prefix.chars().all(is_id_char) {
        return Err(invalid(ID_CHARSET));
    }
    if choices
        .iter()
        .any(|c| c.original_id().starts_with(token_prefix))
    {
        return Err(invalid("original ids start with it"));
    }
    Ok(())
}

/// Structural checks shared by construction and snapshot restore.
pub(crate) fn validate_specs(choices: &[ChoiceSpec]) -> Result<(), ValidationError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(choices.len());
    for (index, c) in choices.iter().enumerate() {
        if c.original_position() != index {
            return Err(ValidationError::PositionMismatch {
                index,
                found: c.original_position(),
            });
        }
        if c.original_id().is_empty() {
            return Err(ValidationError::MalformedName {
                position: index,
                name: String::new(),
                reason: "empty id",
            });
        }
        if !c.original_id().chars().all(is_id_char) {
            return Err(ValidationError::MalformedName {
                position: index,
                name: c.original_id().to_string(),
                reason: ID_CHARSET,
            });
        }
        if let Some(first) = seen.insert(c.original_id(), index) {
            return Err(ValidationError::DuplicateId {
                id: c.original_id().to_string(),
                first,
                second: index,
            });
        }
    }
    Ok(())
}
