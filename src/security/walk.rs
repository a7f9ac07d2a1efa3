use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Every regular file under `root`, sorted, skipping directories whose
/// name is in `ignore_dirs`. Symlinks are not followed. Unreadable
/// entries are skipped with a warning.
pub(crate) fn walk_files(root: &Path, ignore_dirs: &[&str]) -> Vec<PathBuf> {
    let ignored = |e: &DirEntry| {
        e.depth() > 0
            && e.file_type().is_dir()
            && ignore_dirs.iter().any(|d| e.file_name() == *d)
    };

    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignored(e))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_nested_and_skips_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("top.md"), "x").unwrap();
        fs::write(tmp.path().join("a/b/deep.py"), "x").unwrap();
        fs::write(tmp.path().join("node_modules/pkg/index.js"), "x").unwrap();

        let files = walk_files(tmp.path(), &["node_modules"]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a/b/deep.py", "top.md"]);
    }

    #[test]
    fn ignore_list_does_not_apply_to_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("build");
        fs::create_dir_all(root.join("out")).unwrap();
        fs::write(root.join("a.md"), "x").unwrap();
        fs::write(root.join("out/b.md"), "x").unwrap();

        let files = walk_files(&root, &["build", "out"]);
        assert_eq!(files, vec![root.join("a.md")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        let root = tmp.path().join("root");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(&root).unwrap();
        fs::write(outside.join("secret.md"), "x").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(walk_files(&root, &[]).is_empty());
    }
}
