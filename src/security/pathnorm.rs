use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without touching the filesystem.
///
/// Returns `None` when a relative path climbs above its first component
/// (`../x`, `a/../../x`). On an absolute path `..` stops at the root.
pub(crate) fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            }
            Component::ParentDir if path.has_root() => {}
            Component::ParentDir => return None,
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }
    Some(out)
}

/// Absolute, normalized form of `path`. Relative paths resolve against
/// the current directory.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize(&abs).unwrap_or(abs)
}

/// `path` as a glob candidate. Backslashes are separators on Windows only.
pub(crate) fn slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(p: &str) -> Option<String> {
        normalize(Path::new(p)).map(|p| p.to_string_lossy().into_owned())
    }

    #[test]
    fn folds_dot_and_dotdot() {
        assert_eq!(norm("docs/../USER.md").as_deref(), Some("USER.md"));
        assert_eq!(norm("./docs/./guide.md").as_deref(), Some("docs/guide.md"));
        assert_eq!(norm("a/b/../../c").as_deref(), Some("c"));
        assert_eq!(norm("/ws/docs/../secrets/k").as_deref(), Some("/ws/secrets/k"));
    }

    #[test]
    fn relative_escape_is_none() {
        assert_eq!(norm("../USER.md"), None);
        assert_eq!(norm("docs/../../USER.md"), None);
    }

    #[test]
    fn root_absorbs_dotdot() {
        assert_eq!(norm("/../etc/passwd").as_deref(), Some("/etc/passwd"));
    }

    #[test]
    fn absolute_is_normalized() {
        let abs = absolute(Path::new("notes/../notes/plan.md"));
        assert!(abs.is_absolute());
        assert!(abs.ends_with("notes/plan.md"));
        assert!(!abs.to_string_lossy().contains(".."));
    }
}
