//! `stagehand-core`: gate pipeline steps on service readiness and promote
//! trained runs into a model registry.
//!
//! - [`readiness`] polls an HTTP endpoint until it answers 200.
//! - [`promotion`] registers a run's model artifact and moves the new
//!   version to `Staging`.
//! - [`status`] lists the latest versions of a model per stage.
//!
//! Registry access goes through [`registry::RegistryClient`];
//! [`registry::MlflowClient`] is the MLflow REST binding.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod io;
pub mod paths;
pub mod promotion;
pub mod readiness;
pub mod registry;
pub mod status;
pub mod types;

pub use error::{Result, StagehandError};
