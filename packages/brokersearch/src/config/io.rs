//! Configuration I/O (YAML loading)
//!
//! ```yaml
//! version: 1
//! profiles:
//!   xpd:
//!     index: xpd                 # defaults to the profile name
//!     id_field: uid              # defaults to uid
//!     document_map:
//!       - {source: uid, target: uid}
//!       - {source: time, target: date, converter: iso_date}
//!     filter:                    # query-document dialect, optional
//!       $or:
//!         - {bt_piLast: {$exists: false}}
//!         - {bt_piLast: {$in: [Billinge, Bozin]}}
//!     schema:                    # added to the time/date defaults
//!       - {field: pi, type: keyword}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::registry::{DeploymentProfile, ProfileRegistry, DEFAULT_ID_FIELD};
use crate::features::filter::InclusionFilter;
use crate::features::index::schema::{FieldDeclaration, IndexSchema};
use crate::features::mapping::{Converter, DocumentMap, FieldMapping};

const SUPPORTED_VERSIONS: &[u64] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u64,

    pub profiles: BTreeMap<String, ProfileSpecV1>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpecV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,

    pub document_map: Vec<FieldMappingV1>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<FieldDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMappingV1 {
    pub source: String,

    /// Defaults to `source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default = "default_converter")]
    pub converter: String,
}

fn default_converter() -> String {
    Converter::Identity.as_str().to_string()
}

impl ProfileSpecV1 {
    fn into_profile(self, beamline: &str) -> ConfigResult<DeploymentProfile> {
        let entries = self
            .document_map
            .into_iter()
            .map(|row| -> ConfigResult<FieldMapping> {
                let converter = Converter::from_name(&row.converter).ok_or_else(|| {
                    ConfigError::UnknownConverter {
                        profile: beamline.to_string(),
                        name: row.converter.clone(),
                        valid: Converter::ALL
                            .iter()
                            .map(Converter::as_str)
                            .collect::<Vec<_>>()
                            .join(", "),
                    }
                })?;
                let target = row.target.unwrap_or_else(|| row.source.clone());
                Ok(FieldMapping::new(row.source, target, converter))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        let filter = match &self.filter {
            Some(query) => {
                InclusionFilter::parse(query).map_err(|source| ConfigError::InvalidFilter {
                    profile: beamline.to_string(),
                    source,
                })?
            }
            None => InclusionFilter::accept_all(),
        };

        let schema = self
            .schema
            .into_iter()
            .fold(IndexSchema::run_defaults(), IndexSchema::with_field);

        DeploymentProfile::builder(beamline)
            .index(self.index.unwrap_or_else(|| beamline.to_string()))
            .id_field(self.id_field.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()))
            .document_map(DocumentMap::new(beamline, entries))
            .filter(filter)
            .schema(schema)
            .build()
    }

    fn from_profile(profile: &DeploymentProfile) -> Self {
        let defaults = IndexSchema::run_defaults();
        let schema = profile
            .schema()
            .fields()
            .iter()
            .filter(|d| defaults.get(&d.field) != Some(&d.kind))
            .cloned()
            .collect();

        Self {
            index: Some(profile.index().to_string()),
            id_field: (profile.id_field() != DEFAULT_ID_FIELD).then(|| profile.id_field().to_string()),
            document_map: profile
                .document_map()
                .iter()
                .map(|e| FieldMappingV1 {
                    source: e.source.clone(),
                    target: (e.target != e.source).then(|| e.target.clone()),
                    converter: e.converter.as_str().to_string(),
                })
                .collect(),
            filter: (!profile.filter().is_accept_all()).then(|| profile.filter().to_query_value()),
            schema,
        }
    }
}

impl ProfileRegistry {
    /// Load profiles from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            profiles = registry.len(),
            "loaded deployment profiles"
        );
        Ok(registry)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;

        // Version check before the strict parse, so a missing or newer version
        // is reported as such rather than as a field error
        match raw.get("version") {
            None => return Err(ConfigError::MissingVersion),
            Some(v) => match v.as_u64() {
                Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                    return Err(ConfigError::UnsupportedVersion {
                        found,
                        supported: SUPPORTED_VERSIONS.to_vec(),
                    })
                }
                _ => {}
            },
        }

        let export: ProfilesExportV1 = serde_yaml::from_value(raw)?;

        let profiles = export
            .profiles
            .into_iter()
            .map(|(beamline, spec)| spec.into_profile(&beamline))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut registry = Self::new();
        for profile in profiles {
            debug!(
                beamline = profile.beamline(),
                index = profile.index(),
                entries = profile.document_map().len(),
                "registered profile"
            );
            registry.insert(profile)?;
        }
        Ok(registry)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ProfilesExportV1 {
            version: 1,
            profiles: self
                .iter()
                .map(|p| (p.beamline().to_string(), ProfileSpecV1::from_profile(p)))
                .collect(),
        };
        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}
