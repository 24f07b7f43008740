//! Configuration loading for `.heirvault.toml`.

pub mod settings;

pub use settings::Settings;
