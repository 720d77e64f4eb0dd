//! mcq-core: seeded choice shuffling and identity masking for multiple-choice questions.
//!
//! Pipeline: registry -> partition -> permute -> layout -> mask, cached per
//! `ChoiceGroup` by the render gate.

pub mod choice;
pub mod config;
pub mod layout;
pub mod mask;
pub mod mt;
pub mod partition;
pub mod permute;
pub mod registry;
pub mod render;
pub mod seed;
pub mod snapshot;

pub use choice::{ChoiceContent, ChoiceDefinition, ChoiceSpec};
pub use config::{ConfigError, EngineConfig, LoggingConfig, MaskingConfig, RegistryConfig};
pub use layout::{assemble, ShuffledLayout};
pub use mask::{build_mask, mask_token, LookupError, MaskEntry, MaskTable};
pub use partition::{partition, partition_by, Partition};
pub use permute::{permutation, permute, shuffle_in_place};
pub use registry::{ChoiceGroup, GroupDefinition, ValidationError};
pub use render::{ConsistencyError, DisplayedChoice, RenderState};
pub use seed::{Seed, SeedError};
pub use snapshot::{GroupSnapshot, SnapshotError, SNAPSHOT_VERSION};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_nonempty() {
        assert!(!VERSION.is_empty());
    }
}

#[cfg(test)]
mod mask_tests;
