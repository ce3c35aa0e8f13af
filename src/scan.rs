use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on the scan depth no matter what the configuration says.
/// Keeps a typo'd depth from turning the startup scan into a filesystem
/// crawl.
pub const MAX_SCAN_DEPTH: usize = 16;

fn is_repo_root(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Find repository roots under `root`, descending at most `max_depth`
/// directory levels. If `root` is itself a repository, it is the only
/// result; a repository root is never scanned for nested repositories.
/// Hidden directories are skipped, unreadable directories are skipped
/// silently, and the result is sorted by path for a deterministic order.
pub fn find_repos(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let max_depth = max_depth.min(MAX_SCAN_DEPTH);

    if is_repo_root(root) {
        return vec![root.to_path_buf()];
    }

    let mut repos = Vec::new();
    // Children of root live at depth 1; max_depth 0 means "root only".
    walk(root, 1, max_depth, &mut repos);
    repos.sort();
    info!(root = %root.display(), count = repos.len(), "repository scan complete");
    repos
}

fn walk(dir: &Path, depth: usize, max_depth: usize, repos: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            // Permission errors are expected in home-directory scans.
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if is_repo_root(&path) {
            repos.push(path);
        } else {
            walk(&path, depth + 1, max_depth, repos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mk_repo(base: &Path, rel: &str) -> PathBuf {
        let path = base.join(rel);
        fs::create_dir_all(path.join(".git")).unwrap();
        path
    }

    #[test]
    fn test_empty_directory_finds_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(find_repos(dir.path(), 3).is_empty());
    }

    #[test]
    fn test_root_is_repo_returns_only_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        // Nested repo exists but the scan must not look inside a repository.
        mk_repo(dir.path(), "vendor/nested");

        let repos = find_repos(dir.path(), 5);
        assert_eq!(repos, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn test_never_descends_into_a_repository() {
        let dir = TempDir::new().unwrap();
        let repo_a = mk_repo(dir.path(), "repoA");
        mk_repo(dir.path(), "repoA/sub");

        let repos = find_repos(dir.path(), 4);
        assert_eq!(repos, vec![repo_a]);
    }

    #[test]
    fn test_respects_max_depth() {
        let dir = TempDir::new().unwrap();
        let shallow = mk_repo(dir.path(), "shallow");
        mk_repo(dir.path(), "a/b/c/deep");

        // Depth 0 means root only, and root is not a repository.
        assert!(find_repos(dir.path(), 0).is_empty());

        // Depth 1 sees direct children only.
        let repos = find_repos(dir.path(), 1);
        assert_eq!(repos, vec![shallow.clone()]);

        // a/b/c/deep sits at depth 4.
        assert_eq!(find_repos(dir.path(), 3).len(), 1);
        let repos = find_repos(dir.path(), 4);
        assert_eq!(repos.len(), 2);
        assert!(repos.contains(&shallow));
    }

    #[test]
    fn test_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        mk_repo(dir.path(), ".cache/hidden-repo");
        let visible = mk_repo(dir.path(), "visible");

        let repos = find_repos(dir.path(), 3);
        assert_eq!(repos, vec![visible]);
    }

    #[test]
    fn test_results_are_sorted() {
        let dir = TempDir::new().unwrap();
        mk_repo(dir.path(), "zebra");
        mk_repo(dir.path(), "apple");
        mk_repo(dir.path(), "mango");

        let repos = find_repos(dir.path(), 2);
        let names: Vec<String> = repos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_depth_is_capped_defensively() {
        let dir = TempDir::new().unwrap();
        let repo = mk_repo(dir.path(), "repo");
        // Absurd configured depth must still work.
        let repos = find_repos(dir.path(), usize::MAX);
        assert_eq!(repos, vec![repo]);
    }
}
