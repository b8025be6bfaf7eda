//! Deployment configuration
//!
//! ```text
//! YAML (io.rs) ──┐
//!                ├──> DeploymentProfile ──> ProfileRegistry
//! presets ───────┘         (validated at build time)
//! ```

pub mod error;
pub mod io;
pub mod preset;
pub mod registry;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use io::{FieldMappingV1, ProfileSpecV1, ProfilesExportV1};
pub use preset::{BuiltinProfile, XPD_ALLOWED_PI};
pub use registry::{DeploymentProfile, DeploymentProfileBuilder, ProfileRegistry, DEFAULT_ID_FIELD};
pub use validation::Validatable;
