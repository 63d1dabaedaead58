//! Configuration types for expediente sessions
//!
//! Flat JSON with three sections: `storage` (which backend holds the file
//! tree), `remote` (operator connection details for the record server),
//! and `layout` (where each dataset file lives inside the tree). Leaf
//! secrets can be indirected through environment variables so the
//! password never has to live in the file. Unknown keys are rejected
//! rather than ignored.

use crate::error::{Result, SessionError};
use expediente_core::Status;
use serde_json::Value as JsonValue;

/// A leaf value that can be indirected through an environment variable.
///
/// Accepts either a plain JSON string or an object
/// `{"env_var": "NAME", "default": "value"}`; resolution prefers a
/// non-empty environment variable over the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigValue {
    pub env_var: Option<String>,
    pub default_val: Option<String>,
}

impl ConfigValue {
    /// A literal value with no indirection.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            env_var: None,
            default_val: Some(value.into()),
        }
    }

    /// Resolve to a concrete string, environment first.
    pub fn resolve(&self) -> Option<String> {
        if let Some(var) = &self.env_var {
            if let Ok(val) = std::env::var(var) {
                if !val.is_empty() {
                    return Some(val);
                }
            }
        }
        self.default_val.clone()
    }

    fn from_json(value: &JsonValue, field: &str) -> Result<Self> {
        if let Some(s) = value.as_str() {
            return Ok(Self::literal(s));
        }
        let obj = value.as_object().ok_or_else(|| {
            SessionError::invalid_config(format!(
                "Field '{}' must be a string or an env-var object",
                field
            ))
        })?;
        let mut resolved = Self::default();
        for (key, value) in obj {
            match key.as_str() {
                "env_var" | "envVar" => {
                    resolved.env_var = value.as_str().map(String::from);
                }
                "default" | "default_val" | "defaultVal" => {
                    resolved.default_val = value.as_str().map(String::from);
                }
                _ => {
                    return Err(SessionError::invalid_config(format!(
                        "Unknown key '{}' in env-var object for '{}'",
                        key, field
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageType {
    /// In-memory storage (dry runs, tests)
    #[default]
    Memory,
    /// A directory on the local filesystem
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,
    /// Root directory for file storage
    pub path: Option<String>,
}

impl StorageConfig {
    fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| SessionError::invalid_config("'storage' must be an object"))?;

        let mut config = StorageConfig::default();
        for (key, value) in obj {
            match key.as_str() {
                "type" => {
                    let s = value.as_str().ok_or_else(|| {
                        SessionError::invalid_config("storage 'type' must be a string")
                    })?;
                    config.storage_type = match s {
                        "memory" | "Memory" => StorageType::Memory,
                        "file" | "File" => StorageType::File,
                        other => {
                            return Err(SessionError::invalid_config(format!(
                                "Unknown storage type: '{}'",
                                other
                            )));
                        }
                    };
                }
                "path" | "basePath" | "base_path" => {
                    config.path = value.as_str().map(String::from);
                }
                _ => {
                    return Err(SessionError::invalid_config(format!(
                        "Unknown storage configuration field: '{}'",
                        key
                    )));
                }
            }
        }

        if config.storage_type == StorageType::File && config.path.is_none() {
            return Err(SessionError::invalid_config(
                "File storage requires a 'path'",
            ));
        }
        Ok(config)
    }
}

/// Connection details for the remote record server.
///
/// Carried for operators; the in-tree backends are memory and file, so
/// this block configures nothing locally but is validated so a config
/// written today works when pointed at the real server.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: ConfigValue,
    pub base_dir: String,
}

impl RemoteConfig {
    fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| SessionError::invalid_config("'remote' must be an object"))?;

        let mut host = None;
        let mut port = 22u16;
        let mut username = None;
        let mut password = ConfigValue::default();
        let mut base_dir = String::new();

        for (key, value) in obj {
            match key.as_str() {
                "host" => host = value.as_str().map(String::from),
                "port" => {
                    let n = value.as_u64().ok_or_else(|| {
                        SessionError::invalid_config("remote 'port' must be a number")
                    })?;
                    port = u16::try_from(n).map_err(|_| {
                        SessionError::invalid_config(format!("remote port out of range: {}", n))
                    })?;
                }
                "username" | "user" => username = value.as_str().map(String::from),
                "password" => password = ConfigValue::from_json(value, "remote.password")?,
                "base_dir" | "baseDir" => {
                    base_dir = value.as_str().map(String::from).unwrap_or_default();
                }
                _ => {
                    return Err(SessionError::invalid_config(format!(
                        "Unknown remote configuration field: '{}'",
                        key
                    )));
                }
            }
        }

        Ok(RemoteConfig {
            host: host
                .ok_or_else(|| SessionError::invalid_config("remote config requires 'host'"))?,
            port,
            username: username
                .ok_or_else(|| SessionError::invalid_config("remote config requires 'username'"))?,
            password,
            base_dir,
        })
    }
}

/// Where each dataset file lives inside the storage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub inscritos: String,
    pub estudiantes: String,
    pub egresados: String,
    pub contratados: String,
    pub usuarios: String,
    pub bitacora: String,
    pub uploads_dir: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            inscritos: "datos/inscritos.csv".to_string(),
            estudiantes: "datos/estudiantes.csv".to_string(),
            egresados: "datos/egresados.csv".to_string(),
            contratados: "datos/contratados.csv".to_string(),
            usuarios: "config/usuarios.csv".to_string(),
            bitacora: "datos/bitacora.csv".to_string(),
            uploads_dir: "uploads".to_string(),
        }
    }
}

impl DatasetLayout {
    /// Path of the dataset file for a status.
    pub fn dataset_path(&self, status: Status) -> &str {
        match status {
            Status::Applicant => &self.inscritos,
            Status::Student => &self.estudiantes,
            Status::Graduate => &self.egresados,
            Status::Staff => &self.contratados,
        }
    }

    fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| SessionError::invalid_config("'layout' must be an object"))?;

        let mut layout = DatasetLayout::default();
        for (key, value) in obj {
            let target = match key.as_str() {
                "inscritos" => &mut layout.inscritos,
                "estudiantes" => &mut layout.estudiantes,
                "egresados" => &mut layout.egresados,
                "contratados" => &mut layout.contratados,
                "usuarios" => &mut layout.usuarios,
                "bitacora" => &mut layout.bitacora,
                "uploads_dir" | "uploadsDir" | "uploads" => &mut layout.uploads_dir,
                _ => {
                    return Err(SessionError::invalid_config(format!(
                        "Unknown layout configuration field: '{}'",
                        key
                    )));
                }
            };
            *target = value
                .as_str()
                .ok_or_else(|| {
                    SessionError::invalid_config(format!("layout '{}' must be a string", key))
                })?
                .to_string();
        }
        Ok(layout)
    }
}

/// Main session configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Which backend holds the record file tree
    pub storage: StorageConfig,
    /// Remote server details (carried, not dialed in-tree)
    pub remote: Option<RemoteConfig>,
    /// Dataset file layout
    pub layout: DatasetLayout,
}

impl SessionConfig {
    /// Create a memory-backed session config
    pub fn memory() -> Self {
        SessionConfig::default()
    }

    /// Create a file-backed session config
    pub fn file(path: impl Into<String>) -> Self {
        SessionConfig {
            storage: StorageConfig {
                storage_type: StorageType::File,
                path: Some(path.into()),
            },
            ..Default::default()
        }
    }

    /// Parse configuration from JSON
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| SessionError::invalid_config("Configuration must be an object"))?;

        let mut config = SessionConfig::default();
        for (key, value) in obj {
            match key.as_str() {
                "storage" => config.storage = StorageConfig::from_json(value)?,
                "remote" => config.remote = Some(RemoteConfig::from_json(value)?),
                "layout" => config.layout = DatasetLayout::from_json(value)?,
                _ => {
                    return Err(SessionError::invalid_config(format!(
                        "Unknown configuration field: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(config)
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// A starter config document for `init`-style commands.
    pub fn example_json() -> JsonValue {
        serde_json::json!({
            "storage": { "type": "file", "path": "./expediente-data" },
            "remote": {
                "host": "registros.example.edu",
                "port": 22,
                "username": "expediente",
                "password": { "env_var": "EXPEDIENTE_REMOTE_PASSWORD" },
                "base_dir": "/srv/expediente"
            },
            "layout": {
                "inscritos": "datos/inscritos.csv",
                "estudiantes": "datos/estudiantes.csv",
                "egresados": "datos/egresados.csv",
                "contratados": "datos/contratados.csv",
                "usuarios": "config/usuarios.csv",
                "bitacora": "datos/bitacora.csv",
                "uploads_dir": "uploads"
            }
        })
    }
}
