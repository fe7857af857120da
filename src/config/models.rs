// Per-model configuration: allowed actions, default sort and field visibility.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{get_model_by_name, Schema};
use crate::types::{CrudAction, SortOrder};

#[derive(Debug, Error)]
pub enum ModelConfigError {
    #[error("Failed to read model config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model config: {0}")]
    Parse(String),

    #[error("Model config refers to unknown model '{0}'")]
    UnknownModel(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Excluded from read responses
    #[serde(default)]
    pub hidden: bool,
    /// Excluded from create/update payloads
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSort {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Allowed actions; all four when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<CrudAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<DefaultSort>,
    #[serde(default)]
    pub fields: HashMap<String, FieldConfig>,
}

impl ModelConfig {
    pub fn allows(&self, action: CrudAction) -> bool {
        match &self.actions {
            Some(actions) => actions.contains(&action),
            None => true,
        }
    }

    pub fn readonly_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, cfg)| cfg.readonly)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Model configs keyed by canonical model name
#[derive(Debug, Clone, Default)]
pub struct ModelConfigs {
    configs: HashMap<String, ModelConfig>,
}

impl ModelConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-key raw configs by canonical model name. Unknown names are an error.
    pub fn resolve(schema: &Schema, raw: HashMap<String, ModelConfig>) -> Result<Self, ModelConfigError> {
        let mut configs = HashMap::new();
        for (name, config) in raw {
            let model = get_model_by_name(schema, &name)
                .ok_or_else(|| ModelConfigError::UnknownModel(name.clone()))?;
            configs.insert(model.name.clone(), config);
        }
        Ok(Self { configs })
    }

    /// Load a YAML or JSON file of `{ModelName: ModelConfig}`
    pub fn load(schema: &Schema, path: &Path) -> Result<Self, ModelConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let raw: HashMap<String, ModelConfig> = if is_json {
            serde_json::from_str(&content).map_err(|e| ModelConfigError::Parse(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ModelConfigError::Parse(e.to_string()))?
        };

        let configs = Self::resolve(schema, raw)?;
        tracing::info!("Loaded model config for {} models from {}", configs.len(), path.display());
        Ok(configs)
    }

    pub fn insert(&mut self, model: impl Into<String>, config: ModelConfig) {
        self.configs.insert(model.into(), config);
    }

    pub fn get(&self, canonical_name: &str) -> Option<&ModelConfig> {
        self.configs.get(canonical_name)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
