//! Signing configuration
//!
//! Re-signing is optional and driven by a `mergeapks.sign.properties` file:
//!
//! ```text
//! sign.enabled=true
//! sign.keystore.file=/home/me/release.jks
//! sign.keystore.password=secret
//! sign.key.alias=release
//! sign.key.password=secret
//! ```
//!
//! A missing file, `sign.enabled` other than `true`, or any missing or empty
//! field disables signing. None of these are errors.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Properties file looked up in the working directory, then in the home directory
pub const SIGN_PROPERTIES_FILE: &str = "mergeapks.sign.properties";

const KEY_ENABLED: &str = "sign.enabled";
const KEY_KEYSTORE_FILE: &str = "sign.keystore.file";
const KEY_KEYSTORE_PASSWORD: &str = "sign.keystore.password";
const KEY_ALIAS: &str = "sign.key.alias";
const KEY_PASSWORD: &str = "sign.key.password";

/// Validated credentials for the signer
#[derive(Clone, PartialEq, Eq)]
pub struct SigningConfig {
    /// Keystore file (exists and is a regular file)
    pub keystore: PathBuf,
    /// Keystore password
    pub keystore_password: String,
    /// Key alias inside the keystore
    pub key_alias: String,
    /// Key password
    pub key_password: String,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("keystore", &self.keystore)
            .field("key_alias", &self.key_alias)
            .finish_non_exhaustive()
    }
}

impl SigningConfig {
    /// Look for the properties file in `work_dir`, then in the user's home
    /// directory. The first file found is the only one considered.
    pub fn discover(work_dir: &Path) -> Option<Self> {
        let home = dirs::home_dir();
        Self::discover_in(work_dir, home.as_deref())
    }

    /// Same as [`SigningConfig::discover`] with an explicit home directory
    pub fn discover_in(work_dir: &Path, home: Option<&Path>) -> Option<Self> {
        let candidates = std::iter::once(work_dir).chain(home);
        let path = candidates
            .map(|dir| dir.join(SIGN_PROPERTIES_FILE))
            .find(|path| path.exists())?;

        tracing::debug!("Using signing properties from {}", path.display());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        Self::from_properties(&parse_properties(&text), work_dir)
    }

    /// Validate parsed properties.
    ///
    /// A relative keystore path is resolved against `base_dir`.
    pub fn from_properties(properties: &HashMap<String, String>, base_dir: &Path) -> Option<Self> {
        let enabled = properties.get(KEY_ENABLED)?;
        if !enabled.eq_ignore_ascii_case("true") {
            tracing::debug!("Signing disabled by {}", KEY_ENABLED);
            return None;
        }

        let keystore = non_empty(properties, KEY_KEYSTORE_FILE)?;
        let keystore_password = non_empty(properties, KEY_KEYSTORE_PASSWORD)?;
        let key_alias = non_empty(properties, KEY_ALIAS)?;
        let key_password = non_empty(properties, KEY_PASSWORD)?;

        let keystore = base_dir.join(keystore);
        if !keystore.is_file() {
            tracing::warn!(
                "Keystore {} is not a file, signing disabled",
                keystore.display()
            );
            return None;
        }

        Some(Self {
            keystore,
            keystore_password: keystore_password.to_string(),
            key_alias: key_alias.to_string(),
            key_password: key_password.to_string(),
        })
    }
}

/// Parse `key=value` lines.
///
/// Blank lines and `#` comments are skipped, as is any line that does not
/// split into exactly two parts on `=`. Keys and values are trimmed.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('=').collect();
            match parts.as_slice() {
                [key, value] => Some((key.trim().to_string(), value.trim().to_string())),
                _ => None,
            }
        })
        .collect()
}

fn non_empty<'a>(properties: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    match properties.get(key).map(String::as_str) {
        Some("") | None => {
            tracing::debug!("Signing property {} missing or empty", key);
            None
        }
        value => value,
    }
}
