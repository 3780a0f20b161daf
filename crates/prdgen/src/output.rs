//! Writing recovered projects to disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use prdgen_core::prd;
use prdgen_core::project::ProjectDescriptor;
use serde::Serialize;

use crate::prelude::*;

/// Metadata written alongside generated files as `_generation_info.json`.
#[derive(Debug, Serialize)]
pub struct GenerationInfo {
    pub project_name: String,
    pub model: String,
    pub provider: String,
    pub generation_date: String,
    pub input_tokens: u64,
    pub actual_input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub files_created: Vec<String>,
    pub prd_summary: String,
}

/// Result of writing a descriptor to disk. The project name may differ from
/// the descriptor's when a collision forced a timestamp suffix.
#[derive(Debug)]
pub struct WrittenProject {
    pub project_name: String,
    pub project_path: PathBuf,
    pub files_created: Vec<String>,
}

/// Normalize a caller-supplied output directory.
///
/// Strips surrounding quotes and whitespace, rejects parent-directory
/// traversal, and falls back to `output` when nothing is left.
pub fn sanitize_output_dir(raw: &str) -> Result<String, Error> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string();

    if cleaned.split(['/', '\\']).any(|part| part == "..") {
        return Err(Error::BadRequest(
            "Invalid output directory path - directory traversal not allowed".to_string(),
        ));
    }

    if cleaned.is_empty() {
        Ok("output".to_string())
    } else {
        Ok(cleaned)
    }
}

/// Resolve the output directory to an absolute path, creating it if needed.
pub fn ensure_output_dir(dir: &str) -> Result<PathBuf, Error> {
    let path = Path::new(dir);
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    fs::create_dir_all(&abs)
        .map_err(|e| Error::BadRequest(format!("Invalid output directory: {e}")))?;

    Ok(abs)
}

/// Write every file of a recovered descriptor under `output_dir`.
///
/// The project lands in a directory named after the descriptor; if that
/// directory already exists a timestamp suffix is appended instead of
/// overwriting a previous run.
pub fn write_project(output_dir: &Path, descriptor: &ProjectDescriptor) -> Result<WrittenProject> {
    let mut project_name = descriptor.project_name.clone();
    let mut project_path = output_dir.join(&project_name);

    if project_path.exists() {
        project_name = format!("{project_name}_{}", prd::timestamp_suffix(Utc::now()));
        project_path = output_dir.join(&project_name);
    }

    fs::create_dir_all(&project_path)
        .wrap_err_with(|| format!("Failed to create {}", project_path.display()))?;

    let mut files_created = Vec::new();
    for entry in &descriptor.files {
        let relative = entry_relative_path(&entry.path);
        if relative.as_os_str().is_empty() {
            continue;
        }

        let full_path = project_path.join(&relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&full_path, &entry.content)
            .wrap_err_with(|| format!("Failed to write {}", full_path.display()))?;

        files_created.push(entry.path.clone());
    }

    Ok(WrittenProject {
        project_name,
        project_path,
        files_created,
    })
}

/// Write the `_generation_info.json` metadata file into the project.
pub fn write_generation_info(project_path: &Path, info: &GenerationInfo) -> Result<()> {
    let path = project_path.join("_generation_info.json");
    let text = serde_json::to_string_pretty(info)?;
    fs::write(&path, text).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

/// Turn a descriptor path into a safe relative path: slashes normalized,
/// empty, `.` and `..` components dropped.
fn entry_relative_path(path: &str) -> PathBuf {
    path.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prdgen_core::project::FileEntry;

    fn descriptor(name: &str, files: Vec<(&str, &str)>) -> ProjectDescriptor {
        ProjectDescriptor {
            project_name: name.to_string(),
            files: files
                .into_iter()
                .map(|(path, content)| FileEntry {
                    path: path.to_string(),
                    content: content.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_output_dir("  \"/tmp/out\"  ").unwrap(), "/tmp/out");
        assert_eq!(sanitize_output_dir("'projects'").unwrap(), "projects");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_output_dir("../secrets").is_err());
        assert!(sanitize_output_dir("a/../b").is_err());
        assert!(sanitize_output_dir(r"a\..\b").is_err());
    }

    #[test]
    fn test_sanitize_allows_dotted_names() {
        assert_eq!(sanitize_output_dir("my..dir").unwrap(), "my..dir");
    }

    #[test]
    fn test_sanitize_empty_defaults_to_output() {
        assert_eq!(sanitize_output_dir("  ").unwrap(), "output");
        assert_eq!(sanitize_output_dir("\"\"").unwrap(), "output");
    }

    #[test]
    fn test_write_project_creates_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let d = descriptor(
            "demo",
            vec![
                ("README.md", "# Demo"),
                ("src/main.rs", "fn main() {}"),
                ("docs/guide/intro.md", "intro"),
            ],
        );

        let written = write_project(dir.path(), &d).unwrap();

        assert_eq!(written.project_name, "demo");
        assert_eq!(written.files_created.len(), 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("demo/src/main.rs")).unwrap(),
            "fn main() {}"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("demo/docs/guide/intro.md")).unwrap(),
            "intro"
        );
    }

    #[test]
    fn test_write_project_normalizes_backslash_paths() {
        let dir = tempfile::tempdir().unwrap();
        let d = descriptor("demo", vec![(r"src\lib.rs", "pub fn x() {}")]);

        write_project(dir.path(), &d).unwrap();

        assert!(dir.path().join("demo/src/lib.rs").exists());
    }

    #[test]
    fn test_write_project_drops_traversal_components() {
        let dir = tempfile::tempdir().unwrap();
        let d = descriptor("demo", vec![("../escape.txt", "nope")]);

        let written = write_project(dir.path(), &d).unwrap();

        assert!(!dir.path().join("escape.txt").exists());
        assert!(written.project_path.join("escape.txt").exists());
    }

    #[test]
    fn test_write_project_suffixes_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let d = descriptor("demo", vec![("a.txt", "one")]);

        let first = write_project(dir.path(), &d).unwrap();
        let second = write_project(dir.path(), &d).unwrap();

        assert_eq!(first.project_name, "demo");
        assert!(second.project_name.starts_with("demo_"));
        assert_ne!(first.project_path, second.project_path);
        assert!(second.project_path.join("a.txt").exists());
    }

    #[test]
    fn test_write_generation_info() {
        let dir = tempfile::tempdir().unwrap();
        let info = GenerationInfo {
            project_name: "demo".to_string(),
            model: "kimi".to_string(),
            provider: "moonshot".to_string(),
            generation_date: "2025-07-23T14:30:05+00:00".to_string(),
            input_tokens: 10,
            actual_input_tokens: 12,
            output_tokens: 200,
            total_tokens: 212,
            files_created: vec!["a.txt".to_string()],
            prd_summary: "summary".to_string(),
        };

        write_generation_info(dir.path(), &info).unwrap();

        let text = fs::read_to_string(dir.path().join("_generation_info.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["model"], "kimi");
        assert_eq!(value["files_created"][0], "a.txt");
    }
}
