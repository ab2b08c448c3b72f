//! Canonical paths: the stable identity key for save-file entities.
//!
//! Canonicalization is purely lexical (resolve `.`/`..`, collapse duplicate
//! slashes, absolutize against the working directory). It deliberately does
//! not hit the filesystem: a save file's identity must be computable before
//! the file exists, and must not flip when the file is virtually removed.

/// Canonicalize `path` into an absolute, normalized form.
///
/// Returns `None` for the empty string or when the working directory is
/// unavailable for a relative path.
pub fn canonicalize(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let absolute;
    let path = if path.starts_with('/') {
        path
    } else {
        let cwd = std::env::current_dir().ok()?;
        absolute = format!("{}/{}", cwd.display(), path);
        &absolute
    };

    Some(normalize(path))
}

/// Lexically normalize an absolute path: handles `..`, `.`, `//`.
fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                // ".." at the root stays at the root.
                out.pop();
            }
            _ => out.push(component),
        }
    }

    let mut result = String::with_capacity(path.len());
    for component in &out {
        result.push('/');
        result.push_str(component);
    }
    if result.is_empty() {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_normalized() {
        assert_eq!(normalize("/a/b/c"), "/a/b/c");
        assert_eq!(normalize("/a//b/./c"), "/a/b/c");
        assert_eq!(normalize("/a/b/../c"), "/a/c");
        assert_eq!(normalize("/../a"), "/a");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let direct = canonicalize("save.dat").unwrap();
        assert_eq!(direct, format!("{}/save.dat", cwd.display()));

        // Different spellings of the same path share one canonical form.
        let dotted = canonicalize("./sub/../save.dat").unwrap();
        assert_eq!(dotted, direct);
    }

    #[test]
    fn nonexistent_paths_canonicalize() {
        assert_eq!(
            canonicalize("/no/such/dir/../file").unwrap(),
            "/no/such/file"
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(canonicalize("").is_none());
    }
}
