use directories::BaseDirs;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::repos::EnabledRepo;

/// Directory name used beneath `~/.cache` for git clones.
pub const CACHE_NAMESPACE: &str = "mirror2swift";

/// Mirror document: group name -> group. Keys are kept sorted so a rewritten
/// document comes out in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MirrorConfig {
    pub groups: BTreeMap<String, MirrorGroup>,
}

/// A destination container plus the mirrors that feed it.
///
/// Fields are declared in key order; serde emits them in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorGroup {
    pub mirrors: Vec<MirrorSource>,
    pub swift: Destination,
}

/// Swift container reached through temp URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Shared secret used to sign temp URLs.
    pub key: String,
    /// Seconds before uploaded objects expire (`X-Delete-After`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Container URL, e.g. `https://swift/v1/AUTH_acct/container/`.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
    pub url: String,
}

impl MirrorSource {
    /// Destination namespace for this mirror. Non-empty prefixes always end
    /// with `/`.
    pub fn prefix(&self) -> String {
        match self.prefix.as_deref() {
            None | Some("") => String::new(),
            Some(p) if p.ends_with('/') => p.to_string(),
            Some(p) => format!("{p}/"),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind.unwrap_or_default()
    }
}

/// How a mirror's file list is discovered. Unknown names fall back to a
/// web listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    #[default]
    WebListing,
    Repodata,
    Local,
    Git,
    Direct,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::WebListing => "weblisting",
            SourceKind::Repodata => "repodata",
            SourceKind::Local => "local",
            SourceKind::Git => "git",
            SourceKind::Direct => "direct",
        }
    }
}

impl From<String> for SourceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "repodata" => SourceKind::Repodata,
            "local" => SourceKind::Local,
            "git" => SourceKind::Git,
            "direct" => SourceKind::Direct,
            _ => SourceKind::WebListing,
        }
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MirrorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read mirror config {}", path.display()))?;
        Self::from_yaml(&content)
            .wrap_err_with(|| format!("failed to parse mirror config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).wrap_err("failed to serialize mirror config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml()?;
        fs::write(path, content)
            .wrap_err_with(|| format!("failed to write mirror config {}", path.display()))
    }

    /// Append a repodata mirror for every repository whose id is not yet a
    /// mirror name in `section`. Returns how many mirrors were added, or
    /// `None` when the section does not exist.
    pub fn add_enabled_repos<F>(
        &mut self,
        section: &str,
        repos: &[EnabledRepo],
        mut choose_url: F,
    ) -> Option<usize>
    where
        F: FnMut(&EnabledRepo) -> Option<String>,
    {
        let group = self.groups.get_mut(section)?;
        let mut added = 0;

        for repo in repos {
            if group.mirrors.iter().any(|m| m.name == repo.id) {
                continue;
            }
            let Some(url) = choose_url(repo) else {
                log::warn!("{}: enabled repository has no usable url, skipping", repo.id);
                continue;
            };
            group.mirrors.push(MirrorSource {
                name: repo.id.clone(),
                prefix: Some(format!("{}/", repo.id)),
                kind: Some(SourceKind::Repodata),
                url,
            });
            added += 1;
        }

        Some(added)
    }
}

/// Resolve the git clone cache directory.
/// Priority: explicit override -> ~/.cache/mirror2swift
pub fn cache_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_dir {
        return Ok(path.to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".cache").join(CACHE_NAMESPACE));
    }

    Err(eyre!(
        "unable to determine cache directory for mirror2swift (no override and no home directory)"
    ))
}
