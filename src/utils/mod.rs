/// TOML configuration (`researcher.toml`).
pub mod toml_config;
