use eyre::{bail, Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Bare clones of git mirrors, one directory per mirror name. The cache
/// survives between runs so later runs only fetch.
#[derive(Debug, Clone)]
pub struct GitCache {
    root: PathBuf,
}

impl GitCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Clone or refresh `url` into the cache and regenerate the dumb-HTTP
    /// server info. Returns the bare repository directory.
    pub fn sync(&self, name: &str, url: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .wrap_err_with(|| format!("creating cache dir {}", self.root.display()))?;

        let repo_dir = self.repo_dir(name);
        if !repo_dir.is_dir() {
            log::info!("Cloning {url} to {}", repo_dir.display());
            let mut clone = Command::new("git");
            clone.arg("clone").arg("--bare").arg(url).arg(&repo_dir);
            run(clone, None)?;
        } else {
            log::info!("Updating {url}");
            let mut fetch = Command::new("git");
            fetch.args([
                "fetch",
                "origin",
                "+refs/heads/*:refs/heads/*",
                "+refs/tags/*:refs/tags/*",
            ]);
            run(fetch, Some(&repo_dir))?;
        }

        let mut server_info = Command::new("git");
        server_info.arg("update-server-info");
        run(server_info, Some(&repo_dir))?;

        Ok(repo_dir)
    }
}

fn run(mut command: Command, cwd: Option<&Path>) -> Result<()> {
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let description = format!("{command:?}");
    let output = command
        .output()
        .wrap_err_with(|| format!("failed to spawn {description}"))?;

    if !output.status.success() {
        bail!(
            "{description}: failed (cwd={}): {}",
            cwd.map(|d| d.display().to_string()).unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_dir_is_keyed_by_name() {
        let cache = GitCache::new("/var/cache/m2s");
        assert_eq!(
            cache.repo_dir("infra"),
            PathBuf::from("/var/cache/m2s/infra")
        );
    }
}
