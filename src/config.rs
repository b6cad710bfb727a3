/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Plugin settings and configuration file discovery.

use config::FileFormat;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::Result;

/// Namespace the host stores this plugin's settings under.
pub const PLUGIN_NAMESPACE: &str = "pylsp_mypy";

/// Namespaces used by older releases, consulted when the primary one is empty.
pub const LEGACY_NAMESPACES: [&str; 2] = ["mypy-ls", "mypy_ls"];

/// Plugin settings file names, in priority order.
pub const SETTINGS_FILE_NAMES: [&str; 3] = ["pylsp-mypy.cfg", "mypy-ls.cfg", "mypy_ls.cfg"];

/// mypy's own configuration file names, in priority order.
pub const MYPY_CONFIG_NAMES: [&str; 2] = ["mypy.ini", ".mypy.ini"];

const DEPRECATED_FILE_NAMES: [&str; 2] = ["mypy-ls.cfg", "mypy_ls.cfg"];

/// Prefix for environment variable overrides (`MYPY_BRIDGE_STRICT=true`).
const ENV_PREFIX: &str = "MYPY_BRIDGE";

/// Keys of [`PluginSettings`], the only ones the settings hook reports.
const SETTINGS_KEYS: [&str; 6] = [
    "live_mode",
    "dmypy",
    "strict",
    "args",
    "mypy_command",
    "dmypy_command",
];

/// Effective settings for one lint request.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PluginSettings {
    /// Check unsaved buffers through a shadow file (default: true).
    pub live_mode: bool,

    /// Run through the mypy daemon instead of one-shot mypy (default: false).
    pub dmypy: bool,

    /// Pass `--strict` (default: false).
    pub strict: bool,

    /// Extra flags forwarded to mypy unmodified.
    pub args: Vec<String>,

    /// Executable for one-shot checks (default: "mypy").
    pub mypy_command: String,

    /// Executable for daemon checks (default: "dmypy").
    pub dmypy_command: String,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            live_mode: true,
            dmypy: false,
            strict: false,
            args: Vec::new(),
            mypy_command: "mypy".to_string(),
            dmypy_command: "dmypy".to_string(),
        }
    }
}

impl PluginSettings {
    /// Resolves settings from the host configuration.
    ///
    /// `host` is the mapping returned by the settings hook, i.e.
    /// `{"plugins": {"pylsp_mypy": {...}}}`. The primary namespace wins; the
    /// legacy namespaces are used, in order, only while it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen namespace holds a value of the wrong
    /// type for a known key.
    pub fn resolve(host: &Value, notices: &DeprecationNotices) -> Result<Self> {
        let plugins = host.get("plugins");
        let namespace = |name: &str| {
            plugins
                .and_then(|p| p.get(name))
                .and_then(Value::as_object)
                .filter(|m| !m.is_empty())
        };

        let legacy: Vec<&Map<String, Value>> = LEGACY_NAMESPACES
            .iter()
            .filter_map(|&name| {
                let found = namespace(name)?;
                notices.namespace(name);
                Some(found)
            })
            .collect();

        let chosen = namespace(PLUGIN_NAMESPACE).or_else(|| legacy.first().copied());

        match chosen {
            Some(map) => Ok(serde_json::from_value(Value::Object(map.clone()))?),
            None => Ok(Self::default()),
        }
    }
}

/// Tracks which deprecation warnings have already been logged.
///
/// Each legacy namespace is reported once per instance rather than once per
/// lint.
#[derive(Debug, Default)]
pub struct DeprecationNotices {
    warned: [AtomicBool; 2],
}

impl DeprecationNotices {
    /// Logs the deprecation of a legacy namespace the first time it is seen.
    fn namespace(&self, name: &str) {
        let Some(idx) = LEGACY_NAMESPACES.iter().position(|n| *n == name) else {
            return;
        };
        if !self.warned[idx].swap(true, Ordering::SeqCst) {
            warn!(
                "Your configuration uses the namespace {}, this should be changed to {}",
                name, PLUGIN_NAMESPACE
            );
        }
    }
}

/// Searches `start` and each of its ancestors for a file named in `names`.
///
/// Within one directory, names are tried in order. The nearest directory
/// with a match wins. Deprecated plugin settings names are returned with a
/// warning.
pub fn find_config_file(start: &Path, names: &[&str]) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for name in names {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                continue;
            }
            if DEPRECATED_FILE_NAMES.contains(name) {
                warn!(
                    "{}: {} is no longer supported, you should rename your config file to {}",
                    candidate.display(),
                    name,
                    SETTINGS_FILE_NAMES[0]
                );
            }
            return Some(candidate);
        }
    }
    None
}

/// Loads the plugin settings mapping for a workspace.
///
/// Sources, later ones overriding earlier ones:
/// 1. `<config dir>/mypy-bridge/pylsp-mypy.cfg`
/// 2. The nearest plugin settings file above `workspace`
/// 3. `MYPY_BRIDGE_*` environment variables
///
/// Files are literal mappings, e.g. `{'live_mode': False, 'strict': True}`,
/// read as JSON5 after [`python_literals`]. Only known keys set by a source
/// appear in the result.
///
/// # Errors
///
/// Returns an error if a settings file cannot be read or parsed.
pub fn load_plugin_settings(workspace: &Path) -> Result<Value> {
    let mut builder = config::Config::builder();

    if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join("mypy-bridge").join(SETTINGS_FILE_NAMES[0]);
        if user_path.is_file() {
            debug!("user settings file = {}", user_path.display());
            builder = builder.add_source(settings_file(&user_path)?);
        }
    }

    if let Some(path) = find_config_file(workspace, &SETTINGS_FILE_NAMES) {
        debug!("workspace settings file = {}", path.display());
        builder = builder.add_source(settings_file(&path)?);
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(" ")
            .with_list_parse_key("args"),
    );

    let loaded = builder.build()?.try_deserialize::<Value>()?;
    Ok(retain_known_keys(loaded))
}

fn settings_file(path: &Path) -> Result<config::File<config::FileSourceString, FileFormat>> {
    let raw = std::fs::read_to_string(path).map_err(|source| crate::Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config::File::from_str(&python_literals(&raw), FileFormat::Json5))
}

/// Drops keys that are not plugin settings, such as unrelated
/// `MYPY_BRIDGE_*` variables.
fn retain_known_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| {
                    let known = SETTINGS_KEYS.contains(&key.as_str());
                    if !known {
                        debug!("ignoring unknown setting {}", key);
                    }
                    known
                })
                .collect(),
        ),
        other => other,
    }
}

/// Rewrites Python literal spellings into JSON5.
///
/// `True`, `False` and `None` outside strings become `true`, `false` and
/// `null`, and `#` comments become `//` comments. Nothing else changes, so
/// anything that is not a literal mapping still fails to parse.
fn python_literals(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                while let Some(s) = chars.next() {
                    out.push(s);
                    if s == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if s == c || s == '\n' {
                        break;
                    }
                }
            }
            '#' | '/' if c == '#' || chars.peek() == Some(&'/') => {
                out.push_str("//");
                if c == '/' {
                    chars.next();
                }
                while let Some(&s) = chars.peek() {
                    if s == '\n' {
                        break;
                    }
                    out.push(s);
                    chars.next();
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&s) = chars.peek() {
                    if !(s.is_alphanumeric() || s == '_') {
                        break;
                    }
                    word.push(s);
                    chars.next();
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            c => out.push(c),
        }
    }

    out
}
