//! Pure domain types: service identity, installation state, credentials,
//! unit rendering, and the error taxonomy.
//!
//! Nothing in this module performs I/O or spawns processes.

pub mod error;
pub mod service;

pub use error::LifecycleError;
pub use service::{
    Credentials, InstallationState, ServiceDescriptor, render_unit, validate_operator_id,
    validate_token,
};
