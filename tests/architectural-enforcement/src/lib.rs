//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! across the router crates:
//! - No blocking `sleep()` calls in production code
//! - No OS threads spawned outside the tokio runtime
//! - No `unwrap()` in production code paths
//!
//! Test code (`#[cfg(test)]` modules and `test_utils.rs`) is exempt.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Source roots checked by the enforcement tests
pub const SOURCE_ROOTS: [&str; 2] = ["router/core/src", "router/cli/src"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, resolved from this package's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Rust source files under the checked roots, excluding test helpers
#[must_use]
pub fn production_sources() -> Vec<PathBuf> {
    let root = workspace_root();
    SOURCE_ROOTS
        .iter()
        .flat_map(|dir| WalkDir::new(root.join(dir)).into_iter().filter_map(Result::ok))
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == "rs"))
        .filter(|p| p.file_name().is_some_and(|name| name != "test_utils.rs"))
        .collect()
}

/// Production portion of a source file: everything before `#[cfg(test)]`
#[must_use]
pub fn production_lines(source: &str) -> Vec<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("//")
        })
        .collect()
}

/// Find every production line containing any of `patterns`
#[must_use]
pub fn find_violations(patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in production_sources() {
        let Ok(source) = fs::read_to_string(&path) else {
            continue;
        };
        for (line, text) in production_lines(&source) {
            if patterns.iter().any(|p| text.contains(p)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: text.trim().to_string(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\n#[cfg(test)]\nmod tests { fn b() {} }\n";
        let lines = production_lines(source);
        assert_eq!(lines, vec![(1, "fn a() {}")]);
    }

    #[test]
    fn test_sources_are_found() {
        let sources = production_sources();
        assert!(sources.iter().any(|p| p.ends_with("lib.rs")));
        assert!(!sources.iter().any(|p| p.ends_with("test_utils.rs")));
    }
}
