// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! XML configuration loading.
//!
//! The on-disk schema is an XML document; element names are the
//! `UpperCamelCase` names a deployed configuration actually uses
//! (`ClientListenHost`, `ImplAssembly`, ...). They're mapped onto the
//! workspace's own `snake_case` types at load time so the rest of the
//! process never has to think about the wire casing.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use mediator_core::{ModuleConfig, ModuleId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: quick_xml::de::DeError,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigParam {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModuleXml {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    #[serde(default)]
    impl_assembly: String,
    impl_class: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    concurrent_init: bool,
    #[serde(default, rename = "Config")]
    config: Vec<ConfigParam>,
    variables_file_name: PathBuf,
}

fn default_true() -> bool {
    true
}

impl From<ModuleXml> for ModuleConfig {
    fn from(m: ModuleXml) -> Self {
        ModuleConfig {
            id: ModuleId::new(m.id),
            name: m.name,
            impl_assembly: m.impl_assembly,
            impl_class: m.impl_class,
            enabled: m.enabled,
            concurrent_init: m.concurrent_init,
            config: m.config.into_iter().map(|p| (p.name, p.value)).collect(),
            variables_file_name: m.variables_file_name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserXml {
    name: String,
    password: String,
    #[serde(default, rename = "Role")]
    roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModulePasswordXml {
    #[serde(rename = "ModuleID")]
    module_id: String,
    password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserManagementXml {
    #[serde(default, rename = "User")]
    users: Vec<UserXml>,
    #[serde(default, rename = "ModulePassword")]
    module_passwords: Vec<ModulePasswordXml>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocationXml {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    #[serde(default)]
    parent_id: Option<String>,
}

/// Location hierarchy metadata. Mediator-level modules consult this to
/// resolve a location tree; the workspace doesn't otherwise interpret it.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediatorConfigXml {
    client_listen_host: String,
    client_listen_port: u16,
    #[serde(default, rename = "Modules")]
    modules: ModulesXml,
    #[serde(default)]
    user_management: UserManagementXml,
    #[serde(default, rename = "Locations")]
    locations: LocationsXml,
    #[serde(default)]
    timestamp_check_warning_ms: Option<i64>,
    #[serde(default)]
    start_complete_file: Option<PathBuf>,
    #[serde(default)]
    session_idle_timeout_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModulesXml {
    #[serde(default, rename = "Module")]
    module: Vec<ModuleXml>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LocationsXml {
    #[serde(default, rename = "Location")]
    location: Vec<LocationXml>,
}

/// Credentials as loaded from `UserManagement`, ready to hand to
/// `RequestHandler::new`.
#[derive(Debug, Clone, Default)]
pub struct CredentialsConfig {
    pub users: HashMap<String, mediator_engine::UserCredential>,
    pub module_passwords: HashMap<ModuleId, String>,
}

/// The fully parsed, process-ready configuration.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    pub client_listen_host: String,
    pub client_listen_port: u16,
    pub modules: Vec<ModuleConfig>,
    pub credentials: CredentialsConfig,
    pub locations: Vec<Location>,
    /// Defaults to 60s per the suggested abandonment threshold.
    pub timestamp_check_warning_ms: i64,
    pub start_complete_file: Option<PathBuf>,
    pub session_idle_timeout_ms: i64,
}

/// Default historian stale-value warning window: 60 seconds.
const DEFAULT_TIMESTAMP_CHECK_WARNING_MS: i64 = 60_000;
/// Default session abandonment window, per the spec's suggested default.
const DEFAULT_SESSION_IDLE_TIMEOUT_MS: i64 = 60_000;

impl MediatorConfig {
    /// Load and parse a configuration file from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(raw: &str) -> Result<Self, quick_xml::de::DeError> {
        let xml: MediatorConfigXml = quick_xml::de::from_str(raw)?;

        let users = xml
            .user_management
            .users
            .into_iter()
            .map(|u| {
                (
                    u.name,
                    mediator_engine::UserCredential {
                        password: u.password,
                        roles: u.roles,
                    },
                )
            })
            .collect();
        let module_passwords = xml
            .user_management
            .module_passwords
            .into_iter()
            .map(|p| (ModuleId::new(p.module_id), p.password))
            .collect();

        Ok(MediatorConfig {
            client_listen_host: xml.client_listen_host,
            client_listen_port: xml.client_listen_port,
            modules: xml.modules.module.into_iter().map(Into::into).collect(),
            credentials: CredentialsConfig {
                users,
                module_passwords,
            },
            locations: xml
                .locations
                .location
                .into_iter()
                .map(|l| Location {
                    id: l.id,
                    name: l.name,
                    parent_id: l.parent_id,
                })
                .collect(),
            timestamp_check_warning_ms: xml
                .timestamp_check_warning_ms
                .unwrap_or(DEFAULT_TIMESTAMP_CHECK_WARNING_MS),
            start_complete_file: xml.start_complete_file,
            session_idle_timeout_ms: xml
                .session_idle_timeout_ms
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_MS),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
