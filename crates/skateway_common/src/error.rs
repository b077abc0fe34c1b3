//! Error types for the skateway simulator.

use thiserror::Error;

/// Fatal startup problems. The dispatch loop never starts when one of these
/// is raised; the process reports it and exits non-zero.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing credential for site '{site}': set {var}")]
    MissingCredential { site: String, var: String },

    #[error("malformed connection string for site '{site}': {reason}")]
    MalformedCredential { site: String, reason: String },
}

/// A publish attempt for one site was rejected. Recovered locally: the loop
/// logs it and moves on to the next site; the failing site is retried on the
/// next scheduled cycle.
#[derive(Error, Debug)]
#[error("publish failed for site '{site}': {reason}")]
pub struct PublishError {
    pub site: String,
    pub reason: String,
}

impl PublishError {
    pub fn new(site: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            reason: reason.into(),
        }
    }
}
