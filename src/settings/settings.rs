use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: Api,
    pub hasher: Hasher,
    pub http: Http,
    pub jwt: Jwt,
    pub log: Log,
    pub store: Store,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api {
    #[serde(default)]
    pub require_uuid_identity: bool,
    #[serde(default)]
    pub bind_access_token: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hasher {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub leeway_secs: u64,
}

// Secrets stay out of the startup log.
impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwt")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub backend: String, // "memory", "redis" or "mysql"
    pub redis_dsn: Option<String>,
    pub mysql_dsn: Option<String>,
    #[serde(default = "default_store_prefix")]
    pub prefix: String,
}

fn default_access_ttl_secs() -> i64 {
    300
}

fn default_refresh_ttl_secs() -> i64 {
    30 * 24 * 60 * 60
}

fn default_algorithm() -> String {
    "HS512".to_string()
}

fn default_store_prefix() -> String {
    "refresh".to_string()
}

impl Jwt {
    /// Only the HMAC family is accepted; both secrets are shared keys.
    pub fn algorithm(&self) -> Result<Algorithm> {
        let algorithm: Algorithm = self
            .algorithm
            .parse()
            .map_err(|e| anyhow!("unknown jwt algorithm {:?}: {}", self.algorithm, e))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => bail!("jwt algorithm {:?} is not an HMAC algorithm", other),
        }
    }
}

/// Upper bound for token lifetimes, 100 years.
pub const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            bail!("jwt.access_secret and jwt.refresh_secret are required");
        }
        if self.jwt.access_secret == self.jwt.refresh_secret {
            bail!("jwt.access_secret and jwt.refresh_secret must differ");
        }
        if self.jwt.access_ttl_secs <= 0 || self.jwt.refresh_ttl_secs <= 0 {
            bail!("jwt ttl values must be positive");
        }
        if self.jwt.access_ttl_secs > MAX_TTL_SECS || self.jwt.refresh_ttl_secs > MAX_TTL_SECS {
            bail!("jwt ttl values must not exceed {} seconds", MAX_TTL_SECS);
        }
        self.jwt.algorithm()?;
        match self.store.backend.as_str() {
            "memory" => {}
            "redis" if self.store.redis_dsn.is_some() => {}
            "mysql" if self.store.mysql_dsn.is_some() => {}
            "redis" | "mysql" => bail!("store.{}_dsn is required", self.store.backend),
            other => bail!("unknown store backend: {}", other),
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides use this prefix with `__` between path segments,
/// e.g. `JWT_PAIR__JWT__ACCESS_SECRET`.
pub const ENV_PREFIX: &str = "JWT_PAIR";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const BASE: &str = r#"
[api]

[hasher]
memory_kib = 19456
iterations = 2
parallelism = 1

[http]
address = "127.0.0.1:8888"

[jwt]
access_secret = "access"
refresh_secret = "refresh"

[log]
filter = "info"

[store]
backend = "memory"
"#;

    fn from_str(toml: &str) -> Result<Settings> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    #[test]
    fn defaults_are_applied() {
        let settings = from_str(BASE).unwrap();
        assert_eq!(settings.jwt.access_ttl_secs, 300);
        assert_eq!(settings.jwt.refresh_ttl_secs, 2_592_000);
        assert_eq!(settings.jwt.algorithm().unwrap(), Algorithm::HS512);
        assert_eq!(settings.jwt.leeway_secs, 0);
        assert_eq!(settings.store.prefix, "refresh");
        assert!(!settings.api.require_uuid_identity);
        assert!(!settings.api.bind_access_token);
    }

    #[test]
    fn identical_secrets_are_rejected() {
        let toml = BASE.replace("refresh_secret = \"refresh\"", "refresh_secret = \"access\"");
        assert!(from_str(&toml).is_err());
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        let toml = BASE.replace("[jwt]", "[jwt]\nalgorithm = \"RS256\"");
        assert!(from_str(&toml).is_err());
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let toml = BASE.replace("[jwt]", "[jwt]\naccess_ttl_secs = 0");
        assert!(from_str(&toml).is_err());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let toml = BASE.replace("[jwt]", "[jwt]\nrefresh_ttl_secs = 10000000000000");
        assert!(from_str(&toml).is_err());

        let toml = BASE.replace(
            "[jwt]",
            &format!("[jwt]\nrefresh_ttl_secs = {}", MAX_TTL_SECS),
        );
        assert!(from_str(&toml).is_ok());
    }

    #[test]
    fn redis_backend_requires_dsn() {
        let toml = BASE.replace("backend = \"memory\"", "backend = \"redis\"");
        assert!(from_str(&toml).is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let toml = BASE.replace("backend = \"memory\"", "backend = \"mongo\"");
        assert!(from_str(&toml).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = from_str(BASE).unwrap();
        let printed = format!("{:?}", settings);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("access_secret: \"access\""));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
