use std::{fs, time::Duration};

use client_core::{RelationNames, RenderOptions};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub entry_url: String,
    pub request_timeout_secs: u64,
    pub log_filter: String,
    pub relations: RelationNames,
    pub derived_field: Option<String>,
    pub columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entry_url: "http://localhost:5000/api/sensors/".into(),
            request_timeout_secs: 10,
            log_filter: "info".into(),
            relations: RelationNames::default(),
            derived_field: Some("location".into()),
            columns: Vec::new(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            relations: self.relations.clone(),
            derived_field: self.derived_field.clone().filter(|name| !name.is_empty()),
            columns: self.columns.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    entry_url: Option<String>,
    request_timeout_secs: Option<u64>,
    log: Option<String>,
    derived_field: Option<String>,
    columns: Option<Vec<String>>,
    #[serde(default)]
    relations: FileRelations,
}

#[derive(Debug, Default, Deserialize)]
struct FileRelations {
    #[serde(rename = "self")]
    self_rel: Option<String>,
    collection: Option<String>,
    add_item: Option<String>,
    edit: Option<String>,
    delete: Option<String>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("admin.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            tracing::warn!(%err, "ignoring malformed admin.toml");
            return;
        }
    };

    if let Some(v) = file_cfg.entry_url {
        settings.entry_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.log {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.derived_field {
        settings.derived_field = Some(v);
    }
    if let Some(v) = file_cfg.columns {
        settings.columns = v;
    }

    let relations = file_cfg.relations;
    if let Some(v) = relations.self_rel {
        settings.relations.self_rel = v;
    }
    if let Some(v) = relations.collection {
        settings.relations.collection = v;
    }
    if let Some(v) = relations.add_item {
        settings.relations.add_item = v;
    }
    if let Some(v) = relations.edit {
        settings.relations.edit = v;
    }
    if let Some(v) = relations.delete {
        settings.relations.delete = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ADMIN_ENTRY_URL") {
        settings.entry_url = v;
    }
    if let Some(v) = lookup("APP__ENTRY_URL") {
        settings.entry_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("APP__LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
