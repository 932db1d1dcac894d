//! Lookup options for [`SecretsCache::get_secret_value`].
//!
//! [`SecretsCache::get_secret_value`]: super::SecretsCache::get_secret_value

use serde::{Deserialize, Serialize};

/// Selects which version of a secret to return.
///
/// `version_id` takes precedence over `version_stage`. With neither set, the
/// configured default stage is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSecretValueOptions {
    /// Exact version to return
    pub version_id: Option<String>,

    /// Stage label to resolve through the secret's stage map
    pub version_stage: Option<String>,

    /// Skip freshness checks and go to the backend for every layer touched by
    /// this lookup. Cached entries are refreshed in place, not replaced.
    #[serde(default)]
    pub force: bool,
}

/// Resolved form of [`GetSecretValueOptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VersionSelector<'a> {
    Id(&'a str),
    Stage(&'a str),
}

impl GetSecretValueOptions {
    /// Select an exact version.
    pub fn version_id(version_id: impl Into<String>) -> Self {
        Self { version_id: Some(version_id.into()), ..Default::default() }
    }

    /// Select the version carrying `stage`.
    pub fn version_stage(stage: impl Into<String>) -> Self {
        Self { version_stage: Some(stage.into()), ..Default::default() }
    }

    /// Bypass cached state for this lookup.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Empty strings count as unset.
    pub(crate) fn selector<'a>(&'a self, default_stage: &'a str) -> VersionSelector<'a> {
        let version_id = self.version_id.as_deref().filter(|id| !id.is_empty());
        let version_stage = self.version_stage.as_deref().filter(|stage| !stage.is_empty());
        match (version_id, version_stage) {
            (Some(version_id), _) => VersionSelector::Id(version_id),
            (None, Some(stage)) => VersionSelector::Stage(stage),
            (None, None) => VersionSelector::Stage(default_stage),
        }
    }
}
