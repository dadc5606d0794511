//! Path normalisation for cluster-absolute targets.
//!
//! The cluster addresses objects by `/`-separated absolute paths regardless
//! of the daemon's host platform, so these helpers work on strings rather
//! than `std::path`.

/// Collapse duplicate separators in a cluster path.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_separator = false;
    for ch in path.chars() {
        if ch == '/' {
            if !previous_separator {
                out.push('/');
            }
            previous_separator = true;
        } else {
            out.push(ch);
            previous_separator = false;
        }
    }
    out
}

/// Join a relative notification path under an absolute root, normalising
/// separators.
#[must_use]
pub fn join_under_root(root: &str, relative: &str) -> String {
    normalize(&format!("{root}/{relative}"))
}

/// Whether the path is absolute in cluster terms.
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_duplicate_separators() {
        assert_eq!(normalize("/vault//docs///new.txt"), "/vault/docs/new.txt");
        assert_eq!(normalize("/vault/docs/new.txt"), "/vault/docs/new.txt");
        assert_eq!(normalize("//"), "/");
    }

    #[test]
    fn join_under_root_builds_absolute_paths() {
        assert_eq!(join_under_root("/vault/docs", "new.txt"), "/vault/docs/new.txt");
        assert_eq!(join_under_root("/vault/docs/", "sub//new.txt"), "/vault/docs/sub/new.txt");
        assert_eq!(join_under_root("/", "new.txt"), "/new.txt");
    }

    #[test]
    fn is_absolute_requires_leading_separator() {
        assert!(is_absolute("/vault"));
        assert!(!is_absolute("vault/docs"));
        assert!(!is_absolute(""));
    }
}
