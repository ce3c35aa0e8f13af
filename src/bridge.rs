use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Open a repository in GitHub Desktop via its `github` CLI helper.
///
/// Only a missing executable triggers the fallback chain: a helper that is
/// present but exits non-zero is reported as a failure, not retried another
/// way. The `open -a` fallback exists only on macOS.
pub fn open_in_github_desktop(repo: &Path) -> (bool, String) {
    match Command::new("github").arg(".").current_dir(repo).status() {
        Ok(status) if status.success() => {
            info!(repo = %repo.display(), "opened in GitHub Desktop");
            (true, "Opened in GitHub Desktop via `github .`".to_string())
        }
        Ok(_) => (
            false,
            "Tried `github .` but it returned a non-zero exit code.".to_string(),
        ),
        Err(e) if e.kind() == ErrorKind::NotFound => open_via_platform(repo),
        Err(e) => (false, format!("Failed to run `github .`: {e}")),
    }
}

#[cfg(target_os = "macos")]
fn open_via_platform(repo: &Path) -> (bool, String) {
    match Command::new("open")
        .args(["-a", "GitHub Desktop"])
        .arg(repo)
        .status()
    {
        Ok(status) if status.success() => (
            true,
            "Opened in GitHub Desktop via macOS `open -a`".to_string(),
        ),
        _ => (false, install_hint()),
    }
}

#[cfg(not(target_os = "macos"))]
fn open_via_platform(_repo: &Path) -> (bool, String) {
    (false, install_hint())
}

fn install_hint() -> String {
    "GitHub Desktop CLI not found. Install via: GitHub Desktop > Menu > Install Command Line Tool"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint_names_the_tool() {
        let hint = install_hint();
        assert!(hint.contains("GitHub Desktop"));
        assert!(hint.contains("Install"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_platform_fallback_reports_hint_off_macos() {
        let (ok, msg) = open_via_platform(Path::new("/tmp"));
        assert!(!ok);
        assert!(msg.contains("not found"));
    }
}
