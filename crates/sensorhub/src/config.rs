use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub seed_demo_data: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            seed_demo_data: true,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("sensorhub.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("bind_addr").and_then(|v| v.as_str()) {
        settings.bind_addr = v.to_string();
    }
    if let Some(v) = file_cfg.get("seed_demo_data").and_then(|v| v.as_bool()) {
        settings.seed_demo_data = v;
    }
    if let Some(v) = file_cfg.get("log").and_then(|v| v.as_str()) {
        settings.log_filter = v.to_string();
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SENSORHUB_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = lookup("APP__SEED_DEMO_DATA") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.seed_demo_data = parsed;
        }
    }

    if let Some(v) = lookup("APP__LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
