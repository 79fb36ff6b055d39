use eyre::{bail, Result, WrapErr};
use std::path::{Component, Path};

use walkdir::WalkDir;

/// Every file beneath `root`, relative to it and joined with `/`.
///
/// Symlinks are not followed into directories, but a symlink pointing at a
/// regular file is listed. Entries are sorted by name within each directory.
pub fn local_file_list(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("{}: not a directory", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for next in walker {
        let entry = match next {
            Ok(e) => e,
            Err(err) => {
                if err.depth() == 0 {
                    return Err(err).wrap_err_with(|| format!("walking {}", root.display()));
                }
                log::warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };

        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        if let Some(rel) = relative_uri(root, entry.path()) {
            files.push(rel);
        }
    }

    if files.is_empty() {
        bail!("{}: empty directory", root.display());
    }
    Ok(files)
}

fn relative_uri(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_uri_uses_forward_slashes() {
        let root = Path::new("/srv/mirror");
        assert_eq!(
            relative_uri(root, Path::new("/srv/mirror/a/b/c.rpm")).as_deref(),
            Some("a/b/c.rpm")
        );
        assert_eq!(relative_uri(root, root), None);
    }

    #[test]
    fn lists_nested_files_only() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("Packages/x")).unwrap();
        fs::create_dir_all(base.join("empty")).unwrap();
        fs::write(base.join("README"), b"r").unwrap();
        fs::write(base.join("Packages/x/b.rpm"), b"b").unwrap();
        fs::write(base.join("Packages/a.rpm"), b"a").unwrap();

        let files = local_file_list(base).unwrap();
        assert_eq!(
            files,
            vec![
                "Packages/a.rpm".to_string(),
                "Packages/x/b.rpm".to_string(),
                "README".to_string()
            ]
        );
    }

    #[test]
    fn rejects_missing_or_empty_roots() {
        let temp = tempfile::tempdir().unwrap();
        assert!(local_file_list(&temp.path().join("missing")).is_err());

        fs::create_dir_all(temp.path().join("only-dirs/sub")).unwrap();
        let err = local_file_list(&temp.path().join("only-dirs")).unwrap_err();
        assert!(err.to_string().contains("empty directory"));
    }
}
