//! Runtime settings read from the process environment.
//!
//! Everything goes through [`mockable::Env`] so tests can supply a
//! `MockEnv` instead of mutating the real environment. Debug builds tolerate
//! missing or malformed session toggles and log a warning; release builds
//! reject them.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use reqwest::Url;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use crate::outbound::identity::DEFAULT_INTROSPECTION_URL;
use crate::outbound::persistence::DEFAULT_POOL_MAX;

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const DB_POOL_MAX_ENV: &str = "DB_POOL_MAX";
const CLERK_SECRET_ENV: &str = "CLERK_SECRET_KEY";
const INTROSPECTION_URL_ENV: &str = "CLERK_INTROSPECTION_URL";
const DEV_MOCK_AUTH_ENV: &str = "DEV_MOCK_AUTH";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Whether settings are validated leniently.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults with warnings for missing toggles.
    Debug,
    /// Every toggle explicit and valid.
    Release,
}

impl BuildMode {
    /// Mode matching `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cks_backend::settings::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while reading settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("{name} must be disabled in release builds")]
    DevOnly { name: &'static str },
}

/// Database connection settings. Absent when `DATABASE_URL` is unset.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: Zeroizing<String>,
    pub pool_max: u32,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"<redacted>")
            .field("pool_max", &self.pool_max)
            .finish()
    }
}

/// How bearer tokens are verified.
pub enum IdentitySettings {
    /// Tokens are trusted as provider user ids and dev headers are honoured.
    DevMock,
    /// Tokens are checked against the provider's introspection endpoint.
    Provider {
        endpoint: Url,
        secret: Zeroizing<String>,
    },
}

impl IdentitySettings {
    /// Whether development identity overrides are enabled.
    #[must_use]
    pub fn is_dev_mock(&self) -> bool {
        matches!(self, Self::DevMock)
    }
}

/// Signed cookie session settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// All environment-driven settings.
pub struct RuntimeSettings {
    pub database: Option<DatabaseSettings>,
    pub identity: IdentitySettings,
    pub session: SessionSettings,
}

impl RuntimeSettings {
    /// Read every setting from `env`.
    ///
    /// # Errors
    ///
    /// Any [`SettingsError`] raised by the individual readers.
    ///
    /// # Examples
    ///
    /// ```
    /// use cks_backend::settings::{BuildMode, RuntimeSettings};
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "DEV_MOCK_AUTH" => Some("1".to_owned()),
    ///     _ => None,
    /// });
    /// let settings = RuntimeSettings::from_env(&env, BuildMode::Debug).expect("settings");
    /// assert!(settings.database.is_none());
    /// assert!(settings.identity.is_dev_mock());
    /// ```
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, SettingsError> {
        Ok(Self {
            database: database_from_env(env)?,
            identity: identity_from_env(env, mode)?,
            session: session_from_env(env, mode)?,
        })
    }
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Read `DATABASE_URL` and `DB_POOL_MAX`.
///
/// # Errors
///
/// `InvalidEnv` when `DB_POOL_MAX` is not a positive integer.
pub fn database_from_env<E: Env>(env: &E) -> Result<Option<DatabaseSettings>, SettingsError> {
    let Some(url) = non_blank(env, DATABASE_URL_ENV) else {
        return Ok(None);
    };
    let pool_max = match non_blank(env, DB_POOL_MAX_ENV) {
        None => DEFAULT_POOL_MAX,
        Some(raw) => match raw.parse::<u32>() {
            Ok(max) if max > 0 => max,
            _ => {
                return Err(SettingsError::InvalidEnv {
                    name: DB_POOL_MAX_ENV,
                    value: raw,
                    expected: "a positive integer",
                });
            }
        },
    };
    Ok(Some(DatabaseSettings {
        url: Zeroizing::new(url),
        pool_max,
    }))
}

/// Read `DEV_MOCK_AUTH`, `CLERK_SECRET_KEY` and `CLERK_INTROSPECTION_URL`.
///
/// # Errors
///
/// `DevOnly` when mock auth is requested in a release build, `MissingEnv`
/// when no provider secret is configured, and `InvalidEnv` for a malformed
/// flag or URL.
pub fn identity_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<IdentitySettings, SettingsError> {
    let dev_mock = match non_blank(env, DEV_MOCK_AUTH_ENV) {
        None => false,
        Some(raw) => parse_bool(&raw).ok_or(SettingsError::InvalidEnv {
            name: DEV_MOCK_AUTH_ENV,
            value: raw,
            expected: BOOL_EXPECTED,
        })?,
    };
    if dev_mock {
        if !mode.is_debug() {
            return Err(SettingsError::DevOnly {
                name: DEV_MOCK_AUTH_ENV,
            });
        }
        warn!("DEV_MOCK_AUTH enabled; bearer tokens are not verified");
        return Ok(IdentitySettings::DevMock);
    }

    let secret = non_blank(env, CLERK_SECRET_ENV).ok_or(SettingsError::MissingEnv {
        name: CLERK_SECRET_ENV,
    })?;
    let raw_url = non_blank(env, INTROSPECTION_URL_ENV)
        .unwrap_or_else(|| DEFAULT_INTROSPECTION_URL.to_owned());
    let endpoint = Url::parse(&raw_url).map_err(|_| SettingsError::InvalidEnv {
        name: INTROSPECTION_URL_ENV,
        value: raw_url.clone(),
        expected: "an absolute URL",
    })?;
    Ok(IdentitySettings::Provider {
        endpoint,
        secret: Zeroizing::new(secret),
    })
}

/// Read a boolean toggle, defaulting to `fallback` in debug builds.
fn toggle<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    fallback: bool,
) -> Result<bool, SettingsError> {
    let error = match env.string(name) {
        Some(value) => match parse_bool(&value) {
            Some(flag) => return Ok(flag),
            None => SettingsError::InvalidEnv {
                name,
                value,
                expected: BOOL_EXPECTED,
            },
        },
        None => SettingsError::MissingEnv { name },
    };
    if mode.is_debug() {
        warn!(variable = name, error = %error, default = fallback, "using default");
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn same_site_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SettingsError> {
    let fallback = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let error = match env.string(SAMESITE_ENV) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "lax" => return Ok(SameSite::Lax),
            "strict" => return Ok(SameSite::Strict),
            "none" if cookie_secure => return Ok(SameSite::None),
            "none" => SettingsError::InsecureSameSiteNone,
            _ => SettingsError::InvalidEnv {
                name: SAMESITE_ENV,
                value,
                expected: SAMESITE_EXPECTED,
            },
        },
        None => SettingsError::MissingEnv { name: SAMESITE_ENV },
    };
    if mode.is_debug() {
        warn!(error = %error, "using default SameSite policy");
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SettingsError> {
    let path = PathBuf::from(
        non_blank(env, KEY_FILE_ENV).unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if !mode.is_debug() && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SettingsError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "using temporary session key");
            Ok(Key::generate())
        }
        Err(source) => Err(SettingsError::KeyRead { path, source }),
    }
}

/// Read the `SESSION_*` variables.
///
/// # Errors
///
/// Release builds reject missing or malformed toggles, `SameSite=None`
/// without secure cookies, ephemeral keys, and short or unreadable key files.
pub fn session_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SessionSettings, SettingsError> {
    let cookie_secure = toggle(env, mode, COOKIE_SECURE_ENV, true)?;
    let same_site = same_site_from_env(env, mode, cookie_secure)?;
    let allow_ephemeral = toggle(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SettingsError::DevOnly {
            name: ALLOW_EPHEMERAL_ENV,
        });
    }
    let key = session_key_from_env(env, mode, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
