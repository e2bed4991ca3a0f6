//! Kilnflow Docker Build Driver
//!
//! This crate provides the Docker-backed build engine for Kilnflow,
//! including build context creation, the bollard build call, and
//! progress display for the build log stream.

pub mod builder;
pub mod context;
pub mod error;
pub mod progress;

pub use builder::DockerEngine;
pub use context::ContextBuilder;
pub use error::{BuildError, BuildResult};
pub use progress::BuildProgress;
