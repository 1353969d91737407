//! Setup Module
//!
//! The individual provisioning steps: binding, engine download and install,
//! machine environment, and trained language data.

pub mod binding;
pub mod downloader;
pub mod environment;
pub mod installer;
pub mod language_data;
pub mod paths;
pub mod registry;
