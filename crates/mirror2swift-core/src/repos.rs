//! Host package-repository discovery.
//!
//! The sync core never talks to a package manager. Discovery is a feed of
//! `(id, url, urls)` records consumed only by the config augmentation step.

use eyre::{Result, WrapErr};
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MirrorConfig;

/// An enabled repository as reported by the host package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledRepo {
    pub id: String,
    pub url: Option<String>,
    pub urls: Vec<String>,
}

pub trait RepoFeed {
    fn enabled_repos(&self) -> Result<Vec<EnabledRepo>>;
}

/// Reads yum/dnf `.repo` definitions from a directory.
#[derive(Debug, Clone)]
pub struct YumRepoDir {
    repo_dir: PathBuf,
    var_dirs: Vec<PathBuf>,
    os_release: Option<PathBuf>,
}

impl YumRepoDir {
    pub const DEFAULT_REPO_DIR: &'static str = "/etc/yum.repos.d";

    /// Host configuration: `/etc/yum.repos.d` with dnf/yum variable files.
    pub fn system() -> Self {
        Self {
            repo_dir: PathBuf::from(Self::DEFAULT_REPO_DIR),
            var_dirs: vec![PathBuf::from("/etc/dnf/vars"), PathBuf::from("/etc/yum/vars")],
            os_release: Some(PathBuf::from("/etc/os-release")),
        }
    }

    pub fn new<P: AsRef<Path>>(repo_dir: P) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
            var_dirs: Vec::new(),
            os_release: None,
        }
    }

    pub fn with_var_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.var_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    pub fn is_available(&self) -> bool {
        self.repo_dir.is_dir()
    }

    fn variables(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("basearch".to_string(), std::env::consts::ARCH.to_string());
        vars.insert("arch".to_string(), std::env::consts::ARCH.to_string());

        if let Some(version) = self
            .os_release
            .as_deref()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| os_release_version(&content))
        {
            let major = version.split('.').next().unwrap_or(&version).to_string();
            vars.insert("releasever".to_string(), version);
            vars.insert("releasever_major".to_string(), major);
        }

        for dir in &self.var_dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if let (Some(name), Ok(value)) = (
                    path.file_name().and_then(|n| n.to_str()),
                    fs::read_to_string(&path),
                ) {
                    vars.insert(name.to_string(), value.trim().to_string());
                }
            }
        }
        vars
    }
}

impl RepoFeed for YumRepoDir {
    fn enabled_repos(&self) -> Result<Vec<EnabledRepo>> {
        let vars = self.variables();
        let mut files = fs::read_dir(&self.repo_dir)
            .wrap_err_with(|| format!("reading repository dir {}", self.repo_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "repo"))
            .collect::<Vec<_>>();
        files.sort();

        let mut repos = Vec::new();
        for file in files {
            let content = fs::read_to_string(&file)
                .wrap_err_with(|| format!("reading repository file {}", file.display()))?;
            repos.extend(parse_repo_file(&content, &vars));
        }
        Ok(repos)
    }
}

fn os_release_version(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("VERSION_ID=")?;
        Some(value.trim_matches('"').to_string())
    })
}

fn substitute(value: &str, vars: &HashMap<String, String>) -> String {
    let mut names: Vec<_> = vars.keys().collect();
    // $releasever_major must win over $releasever
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let mut out = value.to_string();
    for name in names {
        let replacement = &vars[name];
        out = out.replace(&format!("${{{name}}}"), replacement);
        out = out.replace(&format!("${name}"), replacement);
    }
    out
}

fn is_enabled(value: Option<&String>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => true,
        Some(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
    }
}

/// Parse one `.repo` file and return its enabled repositories that carry a
/// `baseurl`. Mirrorlist-only repositories cannot be mirrored by repodata and
/// are skipped.
fn parse_repo_file(content: &str, vars: &HashMap<String, String>) -> Vec<EnabledRepo> {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();
    let mut last_key: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(id) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            sections.push((id.trim().to_string(), HashMap::new()));
            last_key = None;
            continue;
        }

        let Some((_, keys)) = sections.last_mut() else {
            continue;
        };

        // continuation of a multi-line value
        if line.starts_with(char::is_whitespace) {
            if let Some(value) = last_key.as_ref().and_then(|key| keys.get_mut(key)) {
                value.push(' ');
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim().to_ascii_lowercase();
            keys.insert(key.clone(), value.trim().to_string());
            last_key = Some(key);
        }
    }

    sections
        .into_iter()
        .filter_map(|(id, keys)| {
            if !is_enabled(keys.get("enabled")) {
                return None;
            }
            let urls = keys
                .get("baseurl")?
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|u| !u.is_empty())
                .map(|u| substitute(u, vars))
                .collect::<Vec<_>>();
            if urls.is_empty() {
                log::debug!("{id}: no baseurl, skipping");
                return None;
            }
            Some(EnabledRepo {
                id,
                url: urls.first().cloned(),
                urls,
            })
        })
        .collect()
}

fn choose_url(repo: &EnabledRepo) -> Option<String> {
    repo.urls
        .choose(&mut rand::rng())
        .cloned()
        .or_else(|| repo.url.clone())
}

/// Add every enabled repository reported by `feed` to the `section` group of
/// the config file at `path`, then rewrite the file. Returns the number of
/// mirrors added. The file is left untouched when nothing was added.
pub fn add_enabled_repos(path: &Path, section: &str, feed: &dyn RepoFeed) -> Result<usize> {
    let mut config = MirrorConfig::load(path)?;
    let repos = feed.enabled_repos()?;

    match config.add_enabled_repos(section, &repos, choose_url) {
        None => {
            log::warn!("{}: no mirror group named {section}", path.display());
            Ok(0)
        }
        Some(0) => {
            log::info!("{section}: all enabled repositories are already mirrored");
            Ok(0)
        }
        Some(added) => {
            config.save(path)?;
            log::info!("{section}: added {added} enabled repositories");
            Ok(added)
        }
    }
}
