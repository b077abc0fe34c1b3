//! Configuration for skatewayd.
//!
//! The site registry is built once at startup from the process environment
//! and never mutated afterwards. Each site has a dedicated variable holding
//! its connection string; in dry-run mode credentials are not read at all.

use skateway_common::ConfigError;
use tracing::info;

/// The fixed set of monitored sites and their credential variables.
pub const SITES: &[(&str, &str)] = &[
    ("Dow's Lake", "SKATEWAY_CONN_DOWS_LAKE"),
    ("NAC", "SKATEWAY_CONN_NAC"),
    ("Fifth Avenue", "SKATEWAY_CONN_FIFTH_AVENUE"),
];

/// Parsed per-site connection credential.
///
/// Grammar: `Endpoint=<https-url>;Key=<shared-key>`. The key is opaque to
/// this program and is never logged.
#[derive(Debug, Clone)]
pub struct ConnectionString {
    pub endpoint: String,
    pub key: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut endpoint = None;
        let mut key = None;

        for part in raw.split(';').filter(|p| !p.trim().is_empty()) {
            match part.split_once('=') {
                Some(("Endpoint", value)) => endpoint = Some(value.trim().to_string()),
                Some(("Key", value)) => key = Some(value.trim().to_string()),
                Some((other, _)) => return Err(format!("unknown field '{}'", other)),
                None => return Err(format!("expected 'Name=value', got '{}'", part)),
            }
        }

        let endpoint = endpoint.ok_or_else(|| "missing 'Endpoint' field".to_string())?;
        let key = key.ok_or_else(|| "missing 'Key' field".to_string())?;
        if endpoint.is_empty() {
            return Err("empty 'Endpoint' field".to_string());
        }
        if key.is_empty() {
            return Err("empty 'Key' field".to_string());
        }

        Ok(Self { endpoint, key })
    }
}

/// One configured site. `credential` is `None` only in dry-run mode.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    pub credential: Option<ConnectionString>,
}

/// Read-only mapping from site name to credential, in stable declaration
/// order. Built once at startup and passed by reference into the loop.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    /// Build the registry from the process environment.
    pub fn from_env(dry_run: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(dry_run, |var| std::env::var(var).ok())
    }

    /// Build the registry through an injected lookup, so tests never touch
    /// the real environment.
    pub fn from_lookup<F>(dry_run: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sites = Vec::with_capacity(SITES.len());

        for &(name, var) in SITES {
            let credential = if dry_run {
                None
            } else {
                let raw = lookup(var).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                    ConfigError::MissingCredential {
                        site: name.to_string(),
                        var: var.to_string(),
                    }
                })?;
                let parsed =
                    ConnectionString::parse(&raw).map_err(|reason| {
                        ConfigError::MalformedCredential {
                            site: name.to_string(),
                            reason,
                        }
                    })?;
                Some(parsed)
            };

            sites.push(Site {
                name: name.to_string(),
                credential,
            });
        }

        info!(
            "Site registry loaded: {} sites ({})",
            sites.len(),
            if dry_run { "dry-run" } else { "live" }
        );
        Ok(Self { sites })
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
