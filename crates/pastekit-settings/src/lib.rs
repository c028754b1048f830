//! PasteKit Settings Crate
//!
//! Loads, validates and saves the planner configuration.

pub mod config;
pub mod error;

pub use config::{
    CombineSettings, Config, ExtractionSettings, FiducialSettings, GcodeSettings, MachineSettings,
    SequencerSettings,
};
pub use error::{SettingsError, SettingsResult};
