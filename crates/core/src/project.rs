use serde::{Deserialize, Serialize};

/// A single generated file: a relative path plus its verbatim content.
///
/// Paths may use forward or backward slashes; the writer in the shell
/// normalizes them before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// Structured result of a generation run: a project name plus an ordered
/// list of files.
///
/// Created fresh per generation and owned solely by its caller. Entry order
/// matches the order in which entries appeared in the model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub project_name: String,
    pub files: Vec<FileEntry>,
}

/// Validation failures for a descriptor about to be written to disk.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor contains no files")]
    NoFiles,

    #[error("file entry {index} has an empty path")]
    EmptyPath { index: usize },
}

impl ProjectDescriptor {
    /// Check that the descriptor is writable: at least one file, and every
    /// entry carries a non-empty path.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.files.is_empty() {
            return Err(DescriptorError::NoFiles);
        }

        for (index, entry) in self.files.iter().enumerate() {
            if entry.path.trim().is_empty() {
                return Err(DescriptorError::EmptyPath { index });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(files: Vec<FileEntry>) -> ProjectDescriptor {
        ProjectDescriptor {
            project_name: "demo".to_string(),
            files,
        }
    }

    #[test]
    fn test_validate_ok() {
        let d = descriptor(vec![FileEntry {
            path: "src/main.rs".to_string(),
            content: "fn main() {}".to_string(),
        }]);
        assert_eq!(d.validate(), Ok(()));
    }

    #[test]
    fn test_validate_empty_files() {
        let d = descriptor(vec![]);
        assert_eq!(d.validate(), Err(DescriptorError::NoFiles));
    }

    #[test]
    fn test_validate_empty_path() {
        let d = descriptor(vec![
            FileEntry {
                path: "README.md".to_string(),
                content: "hello".to_string(),
            },
            FileEntry {
                path: "   ".to_string(),
                content: "orphan".to_string(),
            },
        ]);
        assert_eq!(d.validate(), Err(DescriptorError::EmptyPath { index: 1 }));
    }

    #[test]
    fn test_descriptor_round_trips_through_json() {
        let d = descriptor(vec![FileEntry {
            path: "a.py".to_string(),
            content: "print(1)".to_string(),
        }]);

        let json = serde_json::to_string(&d).unwrap();
        let back: ProjectDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
