//! Runtime configuration, built once at startup and passed by reference.
//!
//! The binary fills this from clap/env; tests construct it literally. No
//! component reads the environment on its own.

use std::path::PathBuf;
use std::time::Duration;

/// Process-wide bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Backend address, `host:port` (no scheme).
    pub comfy_address: String,
    /// Folder generated images and composites are written to.
    pub output_folder: PathBuf,
    /// Public prefix substituted for `output_folder` in user-facing URLs.
    pub domain_prefix: Option<String>,
    /// Model configuration store (JSON object keyed by model name).
    pub model_config_path: PathBuf,
    /// Workflow template document.
    pub workflow_path: PathBuf,
    /// Substring marking a chat message as a bot command.
    pub trigger: String,
    /// Model used when the prompt names none.
    pub default_model: String,
    /// Per-frame receive timeout on the streaming connection.
    pub receive_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            comfy_address: "127.0.0.1:8188".to_string(),
            output_folder: PathBuf::from("output"),
            domain_prefix: None,
            model_config_path: PathBuf::from("modelConfiguration.json"),
            workflow_path: PathBuf::from("workflows/sdxl.json"),
            trigger: "!generate".to_string(),
            default_model: "paSanctuary".to_string(),
            receive_timeout: Duration::from_secs(120),
        }
    }
}
