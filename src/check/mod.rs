//! Validity predicates that need side effects before a value is accepted.
//!
//! Checkers run between schema validation and transformation so that a
//! transformer can assume its input already passed the gate — for file
//! fields the checker observes the file synchronously in the same builder
//! call that would read it, keeping partial state out of the message.

use std::fs;
use std::str::FromStr;

use serde_json::Value;

/// Named checker registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checker {
    /// The value is a path naming an existing regular file.
    IsFile,
}

impl Checker {
    /// Runs the predicate on a normalized value.
    pub fn check(&self, value: &Value) -> bool {
        match self {
            Checker::IsFile => is_file(value),
        }
    }
}

impl FromStr for Checker {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "isFile" => Ok(Checker::IsFile),
            other => Err(format!("unknown checker [{other}]")),
        }
    }
}

fn is_file(value: &Value) -> bool {
    let Some(path) = value.as_str() else {
        return false;
    };

    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(error) => {
            tracing::error!(path, %error, "given path does not exist");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_is_file_accepts_regular_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content").unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert!(Checker::IsFile.check(&json!(path)));
    }

    #[test]
    fn test_is_file_rejects_missing_path() {
        assert!(!Checker::IsFile.check(&json!("/nonexistent/path")));
    }

    #[test]
    fn test_is_file_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        assert!(!Checker::IsFile.check(&json!(path)));
    }

    #[test]
    fn test_is_file_rejects_non_string() {
        assert!(!Checker::IsFile.check(&json!(42)));
    }

    #[test]
    fn test_checker_names_parse() {
        assert_eq!("isFile".parse::<Checker>(), Ok(Checker::IsFile));
        assert!("isDirectory".parse::<Checker>().is_err());
    }
}
