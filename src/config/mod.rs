//! Configuration module for the Jimeng MCP server.
//!
//! Handles loading settings from TOML and overlaying credentials from the environment.

mod credentials;
mod settings;

pub use credentials::{Credentials, ACCESS_KEY_VAR, SECRET_KEY_VAR};
pub use settings::{
    ApiSettings, CredentialSettings, GeneralSettings, ImageSettings, Settings, VideoSettings,
};
