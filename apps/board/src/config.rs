use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use board_core::ClientSettings;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "board.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub postal_code_url: String,
    pub locality_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            api_url: client.api_url,
            postal_code_url: client.postal_code_url,
            locality_url: client.locality_url,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_url: normalize_url(&self.api_url),
            postal_code_url: normalize_url(&self.postal_code_url),
            locality_url: normalize_url(&self.locality_url),
            request_timeout: self
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: HashMap<String, String> =
            toml::from_str(raw).context("board settings must be a table of strings")?;
        if let Some(v) = file_cfg.get("api_url") {
            self.api_url = v.clone();
        }
        if let Some(v) = file_cfg.get("postal_code_url") {
            self.postal_code_url = v.clone();
        }
        if let Some(v) = file_cfg.get("locality_url") {
            self.locality_url = v.clone();
        }
        if let Some(v) = file_cfg.get("request_timeout_secs") {
            self.request_timeout_secs = Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("invalid request_timeout_secs '{v}'"))?,
            );
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("BOARD_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = var("APP__API_URL") {
            self.api_url = v;
        }
        if let Some(v) = var("APP__POSTAL_CODE_URL") {
            self.postal_code_url = v;
        }
        if let Some(v) = var("APP__LOCALITY_URL") {
            self.locality_url = v;
        }
        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                self.request_timeout_secs = Some(parsed);
            }
        }
    }
}

/// Defaults, then `board.toml` if present, then environment overrides.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

fn load_settings_from(
    path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings
            .apply_file(&raw)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
    }
    settings.apply_env(var);

    Ok(settings)
}

fn normalize_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
