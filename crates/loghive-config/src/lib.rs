#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Profile file loading and saving for the Loghive CLI.
//!
//! Connection details live in a TOML file of named profiles, by default at
//! `<config dir>/loghive/config.toml`:
//!
//! ```toml
//! default_profile = "prod"
//!
//! [profiles.prod]
//! address = "https://logs.example.com"
//! token = "..."
//! ```
//!
//! The CLI layers flag and environment overrides on top; this crate only
//! owns the file format and the load/save chain.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

pub mod error;

pub use error::{ConfigError, ConfigResult};

/// The whole profile file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Profile used when the caller does not name one.
    pub default_profile: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    /// Profiles keyed by name.
    pub profiles: BTreeMap<String, Profile>,
}

/// Connection details for one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the server.
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// API token, when one has been stored.
    pub token: Option<String>,
}

impl Profile {
    /// Parse the stored address into a URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] when the stored value does not
    /// parse.
    pub fn parsed_address(&self) -> ConfigResult<Url> {
        self.address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                value: self.address.clone(),
                source,
            })
    }
}

impl ConfigFile {
    /// Location of the profile file in the user configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] when the platform provides no
    /// configuration directory.
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("loghive").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the profile file, treating a missing file as an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file exists but cannot be read,
    /// or [`ConfigError::Parse`] when it is not valid TOML.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::io(path, err)),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the profile file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] when serialisation fails, or
    /// [`ConfigError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let text = toml::to_string_pretty(self).map_err(|source| ConfigError::Encode { source })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| ConfigError::io(parent, err))?;
        }
        fs::write(path, text).map_err(|err| ConfigError::io(path, err))
    }

    /// Resolve a profile by name, falling back to the default profile.
    ///
    /// Returns `Ok(None)` when no name was given and the file names no
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] when a requested or default
    /// profile name has no entry.
    pub fn profile(&self, name: Option<&str>) -> ConfigResult<Option<&Profile>> {
        let Some(name) = name.or(self.default_profile.as_deref()) else {
            return Ok(None);
        };
        self.profiles
            .get(name)
            .map(Some)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
            })
    }

    /// Insert or replace a profile, making it the default when none is set.
    pub fn set_profile(&mut self, name: &str, profile: Profile) {
        self.profiles.insert(name.to_string(), profile);
        if self.default_profile.is_none() {
            self.default_profile = Some(name.to_string());
        }
    }
}
