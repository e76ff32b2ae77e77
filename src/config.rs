// prvd - CLI for the Provide platform API
// Copyright (C) 2024 The prvd contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_IDENT_URL: &str = "https://ident.provide.services";
pub const DEFAULT_GOLDMINE_URL: &str = "https://goldmine.provide.services";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ident_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goldmine_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
}

/// Per-invocation overrides taken from global CLI flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_token: Option<String>,
    pub ident_url: Option<String>,
    pub goldmine_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub api_token: Option<String>,
    pub ident_url: String,
    pub goldmine_url: String,
    pub network_id: Option<String>,
    pub organization_id: Option<String>,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".prvd.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("PROVIDE_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("prvd").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

pub fn resolve(cwd: &Path, overrides: Overrides) -> Result<EffectiveConfig> {
    let mut merged = load(cwd)?;

    if let Some(token) = overrides.api_token {
        merged.api_token = Some(token);
    }
    if let Some(url) = overrides.ident_url {
        merged.ident_url = Some(url);
    }
    if let Some(url) = overrides.goldmine_url {
        merged.goldmine_url = Some(url);
    }

    let api_token = merged
        .api_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(EffectiveConfig {
        api_token,
        ident_url: merged
            .ident_url
            .unwrap_or_else(|| DEFAULT_IDENT_URL.to_string()),
        goldmine_url: merged
            .goldmine_url
            .unwrap_or_else(|| DEFAULT_GOLDMINE_URL.to_string()),
        network_id: merged.network_id.filter(|id| !id.is_empty()),
        organization_id: merged.organization_id.filter(|id| !id.is_empty()),
    })
}

/// Stores a freshly issued token in the user scope, keeping other fields.
pub fn store_token(cwd: &Path, token: &str) -> Result<PathBuf> {
    let mut existing = load_scope(Scope::User, cwd)?;
    existing.api_token = Some(token.to_string());
    save(Scope::User, &existing, cwd)
}

/// Copy of `config` safe to print.
pub fn masked(config: &Config) -> Config {
    let mut masked = config.clone();
    if masked.api_token.is_some() {
        masked.api_token = Some("*****".into());
    }
    masked
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    Config {
        api_token: local.api_token.or(user.api_token),
        ident_url: local.ident_url.or(user.ident_url),
        goldmine_url: local.goldmine_url.or(user.goldmine_url),
        network_id: local.network_id.or(user.network_id),
        organization_id: local.organization_id.or(user.organization_id),
    }
}
