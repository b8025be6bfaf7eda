//! Deployment profiles
//!
//! A profile bundles everything one beamline deployment needs: index name,
//! identifier field, document map, inclusion filter and schema. Profiles are
//! immutable once built; the registry is the only place they are looked up.

use std::collections::BTreeMap;

use super::error::{ConfigError, ConfigResult};
use super::preset::BuiltinProfile;
use super::validation::Validatable;
use crate::features::filter::InclusionFilter;
use crate::features::index::schema::IndexSchema;
use crate::features::mapping::DocumentMap;

/// Default identifier field of run records
pub const DEFAULT_ID_FIELD: &str = "uid";

/// Characters the index service refuses in index names
const FORBIDDEN_INDEX_CHARS: &[char] = &[' ', ',', '/', '\\', '*', '?', '"', '<', '>', '|', '#'];

// ═══════════════════════════════════════════════════════════════════════════
// DeploymentProfile
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentProfile {
    beamline: String,
    index: String,
    id_field: String,
    document_map: DocumentMap,
    filter: InclusionFilter,
    schema: IndexSchema,
}

impl DeploymentProfile {
    /// Start a profile for `beamline`; the index name defaults to the beamline
    pub fn builder(beamline: impl Into<String>) -> DeploymentProfileBuilder {
        let beamline = beamline.into();
        DeploymentProfileBuilder {
            index: beamline.clone(),
            document_map: DocumentMap::new(beamline.clone(), Vec::new()),
            beamline,
            id_field: DEFAULT_ID_FIELD.to_string(),
            filter: InclusionFilter::accept_all(),
            schema: IndexSchema::run_defaults(),
        }
    }

    /// Deployment identifier, also used as the document classification
    pub fn beamline(&self) -> &str {
        &self.beamline
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Run-record field carrying the identifier
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Document field the identifier lands in
    pub fn id_target(&self) -> &str {
        self.document_map
            .target_for(&self.id_field)
            .unwrap_or(self.id_field.as_str())
    }

    pub fn document_map(&self) -> &DocumentMap {
        &self.document_map
    }

    pub fn filter(&self) -> &InclusionFilter {
        &self.filter
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }
}

impl Validatable for DeploymentProfile {
    fn validate(&self) -> ConfigResult<()> {
        let invalid = |reason: String| Err(ConfigError::invalid_profile(self.config_name(), reason));

        if self.beamline.trim().is_empty() {
            return invalid("beamline must not be empty".to_string());
        }
        if self.index.is_empty() {
            return invalid("index name must not be empty".to_string());
        }
        if self.index.chars().any(|c| c.is_uppercase()) {
            return invalid(format!("index name '{}' must be lowercase", self.index));
        }
        if let Some(c) = self.index.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
            return invalid(format!("index name '{}' contains '{c}'", self.index));
        }
        if self.document_map.is_empty() {
            return invalid("document map must not be empty".to_string());
        }
        if self.document_map.target_for(&self.id_field).is_none() {
            return invalid(format!(
                "identifier field '{}' is not mapped to any target",
                self.id_field
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &str {
        &self.beamline
    }
}

/// Builder for [`DeploymentProfile`]; `build` validates
#[derive(Debug, Clone)]
pub struct DeploymentProfileBuilder {
    beamline: String,
    index: String,
    id_field: String,
    document_map: DocumentMap,
    filter: InclusionFilter,
    schema: IndexSchema,
}

impl DeploymentProfileBuilder {
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn document_map(mut self, map: DocumentMap) -> Self {
        self.document_map = map;
        self
    }

    pub fn filter(mut self, filter: InclusionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn schema(mut self, schema: IndexSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn build(self) -> ConfigResult<DeploymentProfile> {
        let profile = DeploymentProfile {
            beamline: self.beamline,
            index: self.index,
            id_field: self.id_field,
            document_map: self.document_map,
            filter: self.filter,
            schema: self.schema,
        };
        profile.validate()?;
        Ok(profile)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ProfileRegistry
// ═══════════════════════════════════════════════════════════════════════════

/// Profiles keyed by beamline, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, DeploymentProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in deployment profile
    pub fn builtin() -> ConfigResult<Self> {
        let mut registry = Self::new();
        for preset in BuiltinProfile::ALL {
            registry.insert(preset.profile()?)?;
        }
        Ok(registry)
    }

    /// Register a profile (already validated by its builder); duplicates are refused
    pub fn insert(&mut self, profile: DeploymentProfile) -> ConfigResult<()> {
        if self.profiles.contains_key(profile.beamline()) {
            return Err(ConfigError::DuplicateProfile(profile.beamline().to_string()));
        }
        self.profiles.insert(profile.beamline().to_string(), profile);
        Ok(())
    }

    pub fn get(&self, beamline: &str) -> ConfigResult<&DeploymentProfile> {
        self.profiles
            .get(beamline)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: beamline.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn contains(&self, beamline: &str) -> bool {
        self.profiles.contains_key(beamline)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeploymentProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
