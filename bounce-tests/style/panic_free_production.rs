//! Panic-Free Production Code
//!
//! Production code propagates errors instead of calling `unwrap()` or
//! `expect()`, and carries no `#[allow(dead_code)]`. Everything from the first
//! `#[cfg(test)]` in a file onwards is test code and exempt.

use std::fs;
use std::path::{Path, PathBuf};

const CRATE_SOURCES: [&str; 3] = ["../bounce-core/src", "../bounce-web/src", "../bounce-cli/src"];

const BANNED: [(&str, &str); 3] = [
    (".unwrap()", "unwrap"),
    (".expect(", "expect"),
    ("dead_code", "dead-code allowance"),
];

/// A banned pattern found in production code
#[derive(Debug)]
struct Violation {
    file_path: String,
    line_number: usize,
    kind: &'static str,
    context: String,
}

/// Checker for panicking calls in production code
struct PanicChecker {
    violations: Vec<Violation>,
    files_checked: usize,
}

impl PanicChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    fn find_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::find_rust_files(&path, files)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Records violations in `content`, stopping at the test module.
    fn check_source(&mut self, file_path: &str, content: &str) {
        self.files_checked += 1;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("#[cfg(test)]") {
                break;
            }
            if trimmed.starts_with("//") {
                continue;
            }

            for (pattern, kind) in BANNED {
                if trimmed.contains(pattern) {
                    self.violations.push(Violation {
                        file_path: file_path.to_string(),
                        line_number: index + 1,
                        kind,
                        context: trimmed.to_string(),
                    });
                }
            }
        }
    }

    fn check_workspace(&mut self) -> std::io::Result<()> {
        let mut files = Vec::new();
        for dir in CRATE_SOURCES {
            Self::find_rust_files(Path::new(dir), &mut files)?;
        }

        for file in files {
            let content = fs::read_to_string(&file)?;
            self.check_source(&file.to_string_lossy(), &content);
        }
        Ok(())
    }

    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Panic-free production: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        for violation in &self.violations {
            println!(
                "{}:{} [{}]\n  {}",
                violation.file_path, violation.line_number, violation.kind, violation.context
            );
        }
        println!(
            "Found {} violation(s) in {} file(s) checked",
            self.violations.len(),
            self.files_checked
        );
        false
    }
}

#[test]
fn test_detects_panicking_calls_outside_tests() {
    let mut checker = PanicChecker::new();
    let source = r#"
fn parse(s: &str) -> u32 {
    // s.parse().unwrap() in a comment is fine
    s.parse().unwrap()
}

fn load() -> String {
    std::fs::read_to_string("x").expect("present")
}

#[cfg(test)]
mod tests {
    fn helper() { Some(1).unwrap(); }
}
"#;

    checker.check_source("sample.rs", source);

    let lines: Vec<usize> = checker.violations.iter().map(|v| v.line_number).collect();
    assert_eq!(lines, vec![4, 8]);
    assert_eq!(checker.violations[0].kind, "unwrap");
    assert_eq!(checker.violations[1].kind, "expect");
}

#[test]
fn panic_free_production() {
    let mut checker = PanicChecker::new();
    checker
        .check_workspace()
        .expect("Failed to scan workspace sources");

    assert!(
        checker.report_violations(),
        "Panicking calls found in production code - see output above"
    );
}
