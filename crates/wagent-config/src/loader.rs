// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/wagent/wagent.toml`,
//! `$XDG_CONFIG_HOME/wagent/wagent.toml`, `./wagent.toml`, `WAGENT_*` env.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WagentConfig;

const SECTIONS: &[&str] = &[
    "service", "storage", "sessions", "openai", "polling", "ocr", "vault", "status",
];

/// Candidate config files, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/wagent/wagent.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wagent/wagent.toml"));
    }
    paths.push(PathBuf::from("wagent.toml"));
    paths
}

pub fn load_config() -> Result<WagentConfig, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(WagentConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider()).extract()
}

/// Loads from a TOML string only; no files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<WagentConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WagentConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads from one explicit file with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<WagentConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WagentConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `WAGENT_<SECTION>_<KEY>` onto `section.key`.
///
/// Only the first underscore after a known section name is turned into a
/// dot, so `WAGENT_VAULT_MASTER_KEY` becomes `vault.master_key`.
fn env_provider() -> Env {
    Env::prefixed("WAGENT_").map(|key| map_env_key(key.as_str()).into())
}

/// Figment hands over the variable name in its original case.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
