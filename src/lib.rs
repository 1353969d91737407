//! OCR Provision
//!
//! Installs the Tesseract OCR engine and its Python binding on a Windows
//! workstation, registers the engine on the machine PATH and fetches extra
//! trained language data.

pub mod config;
pub mod error;
pub mod provisioner;
pub mod setup;

pub use config::ProvisionConfig;
pub use error::{ErrorKind, ProvisionError, ProvisionResult};
pub use provisioner::{Components, Outcome, Provisioner};
