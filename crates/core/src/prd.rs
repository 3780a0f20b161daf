use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A PRD source document supplied by the caller: a display name (usually the
/// uploaded file name) plus its text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrdDocument {
    pub name: String,
    pub content: String,
}

/// Combine uploaded documents and pasted text into a single PRD body.
///
/// Documents take precedence; pasted text is used only when no document
/// carries content. Returns `None` when there is nothing to send.
pub fn combine_content(documents: &[PrdDocument], pasted: &str) -> Option<String> {
    let mut sections: Vec<String> = documents
        .iter()
        .filter(|doc| !doc.content.trim().is_empty())
        .map(|doc| format!("=== File: {} ===\n{}", doc.name, doc.content))
        .collect();

    if sections.is_empty() && !pasted.trim().is_empty() {
        sections.push(pasted.to_string());
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

/// Derive a project name from the first uploaded document's file stem, or
/// from a `# Project:`-style heading in the content. `None` when neither
/// yields anything; the caller then falls back to [`timestamp_name`].
pub fn derive_project_name(documents: &[PrdDocument], content: &str) -> Option<String> {
    if let Some(doc) = documents.iter().find(|doc| !doc.name.trim().is_empty()) {
        let stem = match doc.name.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => doc.name.as_str(),
        };
        return Some(sanitize_project_name(stem));
    }

    let heading = Regex::new(r"(?i)#\s*(?:Project|App|Application|System)(?:\s*Name)?:\s*(.+)")
        .unwrap()
        .captures(content)
        .and_then(|caps| caps.get(1))?;

    Some(sanitize_project_name(heading.as_str().trim()))
}

/// Replace spaces and hyphens with underscores so the name is usable as a
/// directory name.
pub fn sanitize_project_name(name: &str) -> String {
    name.trim().replace([' ', '-'], "_")
}

/// Default project name for a generation run with no other name source.
pub fn timestamp_name(now: DateTime<Utc>) -> String {
    format!("generated_project_{}", timestamp_suffix(now))
}

/// `%Y%m%d_%H%M%S` suffix used for default names and collision renames.
pub fn timestamp_suffix(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Truncate content for the generation metadata summary.
pub fn summarize(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
