//! Configuration loaded from `.commvault.toml` and the environment.

pub mod settings;

pub use settings::Settings;
