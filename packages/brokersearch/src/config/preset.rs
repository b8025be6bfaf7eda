//! Built-in deployment profiles
//!
//! The two beamline deployments the system was first run at. Their tables are
//! kept exactly as deployed, including the duplicated `pi` target in `xpd`
//! (`lead_experimenter` overrides `bt_piLast`) and the `time` fan-out.

use std::fmt;
use std::str::FromStr;

use super::error::{ConfigError, ConfigResult};
use super::registry::DeploymentProfile;
use crate::features::filter::{FilterExpr, InclusionFilter};
use crate::features::mapping::{Converter, DocumentMap};

/// Principal-investigator names admitted by the `xpd` filter
pub const XPD_ALLOWED_PI: &[&str] = &[
    "0713_test",
    "Abeykoon",
    "Antonaropoulos",
    "Assefa",
    "Banerjee",
    "Benjiamin",
    "Billinge",
    "Bordet",
    "Bozin",
    "Demo",
    "Dooryhee",
    "Frandsen",
    "Ghose",
    "Hanson",
    "Milinda and Runze",
    "Milinda",
    "Pinero",
    "Robinson",
    "Sanjit",
    "Shi",
    "Test",
    "Yang",
    "billinge",
    "simulation",
    "test",
    "testPI",
    "testPI_2",
    "testTake2",
    "xpdAcq_realase",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProfile {
    /// Inner-shell spectroscopy beamline; accepts every run
    Iss,
    /// Powder diffraction beamline; filtered by principal investigator
    Xpd,
}

impl BuiltinProfile {
    pub const ALL: [BuiltinProfile; 2] = [BuiltinProfile::Iss, BuiltinProfile::Xpd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iss => "iss",
            Self::Xpd => "xpd",
        }
    }

    pub fn document_map(&self) -> DocumentMap {
        match self {
            Self::Iss => iss_map(),
            Self::Xpd => xpd_map(),
        }
    }

    pub fn filter(&self) -> InclusionFilter {
        match self {
            Self::Iss => InclusionFilter::accept_all(),
            Self::Xpd => InclusionFilter::new(FilterExpr::Any(vec![
                FilterExpr::missing("bt_piLast"),
                FilterExpr::one_of("bt_piLast", XPD_ALLOWED_PI.iter().copied()),
            ])),
        }
    }

    pub fn profile(&self) -> ConfigResult<DeploymentProfile> {
        DeploymentProfile::builder(self.as_str())
            .document_map(self.document_map())
            .filter(self.filter())
            .build()
    }
}

impl FromStr for BuiltinProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iss" => Ok(Self::Iss),
            "xpd" => Ok(Self::Xpd),
            _ => Err(ConfigError::UnknownProfile {
                name: s.to_string(),
                known: "iss, xpd".to_string(),
            }),
        }
    }
}

impl fmt::Display for BuiltinProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn iss_map() -> DocumentMap {
    DocumentMap::builder("iss")
        .map("_id", "issid", Converter::Str)
        .keep("comment")
        .map("cycle", "cycle", Converter::Int)
        .keep("detectors")
        .keep("e0")
        .keep("edge")
        .keep("element")
        .keep("experiment")
        .keep("group")
        .keep("name")
        .keep("num_points")
        .keep("plan_name")
        .map("PI", "pi", Converter::Identity)
        .map("PROPOSAL", "proposal", Converter::Identity)
        .map("SAF", "saf", Converter::Identity)
        .keep("scan_id")
        .keep("time")
        .keep("trajectory_name")
        .keep("uid")
        .map("year", "year", Converter::Int)
        .map("time", "date", Converter::IsoDate)
        .build()
}

fn xpd_map() -> DocumentMap {
    DocumentMap::builder("xpd")
        .map("_id", "xpdid", Converter::Str)
        .map("bt_experimenters", "experimenters", Converter::ListOfStrings)
        .map("bt_piLast", "pi", Converter::Identity)
        .map("bt_safN", "saf", Converter::Str)
        .map("bt_wavelength", "wavelength", Converter::Float)
        .map("composition_string", "formula", Converter::Identity)
        .map("dark_frame", "dark_frame", Converter::Bool)
        .keep("group")
        .map("lead_experimenter", "pi", Converter::Identity)
        .map("notes", "comment", Converter::Identity)
        .keep("num_points")
        .keep("plan_name")
        .map("sample_composition", "composition", Converter::NormalizeCounts)
        .keep("scan_id")
        .map("sp_computed_exposure", "sp_computed_exposure", Converter::Float)
        .map("sp_num_frames", "sp_num_frames", Converter::Int)
        .keep("sp_plan_name")
        .map("sp_time_per_frame", "sp_time_per_frame", Converter::Float)
        .keep("sp_type")
        .keep("time")
        .map("time", "date", Converter::IsoDate)
        .keep("uid")
        .map("time", "year", Converter::Year)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::RunRecord;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RunRecord {
        RunRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_from_str() {
        assert_eq!("iss".parse::<BuiltinProfile>().unwrap(), BuiltinProfile::Iss);
        assert_eq!("XPD".parse::<BuiltinProfile>().unwrap(), BuiltinProfile::Xpd);
        assert!("cms".parse::<BuiltinProfile>().is_err());
        assert_eq!(BuiltinProfile::Xpd.to_string(), "xpd");
    }

    #[test]
    fn test_iss_table() {
        let map = BuiltinProfile::Iss.document_map();
        assert_eq!(map.len(), 21);
        assert_eq!(map.target_for("_id"), Some("issid"));
        assert_eq!(map.target_for("PROPOSAL"), Some("proposal"));
        assert_eq!(map.target_for("time"), Some("date"));
        assert!(BuiltinProfile::Iss.filter().is_accept_all());
    }

    #[test]
    fn test_xpd_table() {
        let map = BuiltinProfile::Xpd.document_map();
        assert_eq!(map.len(), 23);
        assert_eq!(map.target_for("time"), Some("year"));
        assert_eq!(map.target_for("notes"), Some("comment"));
        assert_eq!(
            map.iter().filter(|e| e.target == "pi").count(),
            2,
            "bt_piLast and lead_experimenter both feed pi"
        );
    }

    #[test]
    fn test_xpd_filter() {
        let filter = BuiltinProfile::Xpd.filter();
        assert!(filter.accepts(&record(json!({"uid": "u"}))));
        assert!(filter.accepts(&record(json!({"bt_piLast": "Milinda and Runze"}))));
        assert!(filter.accepts(&record(json!({"bt_piLast": "xpdAcq_realase"}))));
        assert!(!filter.accepts(&record(json!({"bt_piLast": "Smith"}))));
        assert!(!filter.accepts(&record(json!({"bt_piLast": null}))));
    }

    #[test]
    fn test_profiles_validate() {
        for preset in BuiltinProfile::ALL {
            let profile = preset.profile().unwrap();
            assert_eq!(profile.index(), preset.as_str());
            assert_eq!(profile.id_target(), "uid");
        }
    }
}
