//! Persona system: named identity configurations for conversation sessions.
//!
//! Each session runs as one persona (Ash'ira, Threshold Witness, or Lumen).
//! The persona's imprint supplies the system prompt, tone, and operational
//! flags attached to every chat request.

pub mod imprint;
pub mod registry;
pub mod types;

pub use imprint::{bundled_imprint, load_imprint, load_imprint_from_file, save_imprint};
pub use registry::PersonaRegistry;
