//! Best-effort recovery of a [`ProjectDescriptor`] from raw model output.
//!
//! Completion APIs return whatever the model wrote. The two dominant failure
//! modes in practice are truncation (hitting the token limit mid-string) and
//! prose wrapped around a fenced code block. The cascade here tries four
//! strategies in order, from "assume well-formed, repair small defects" down
//! to "give up on structure, preserve the content as a readable artifact":
//!
//! 1. Repair and parse the whole text as a JSON document.
//! 2. Repair and parse each fenced code block, first success wins.
//! 3. Reassemble a descriptor from a `project_name` match and a bare
//!    `files` array body.
//! 4. Wrap the raw text as a single `README.md` entry.
//!
//! Stage 4 cannot fail, so [`recover`] always returns a descriptor. Callers
//! branch on the returned [`RecoveryStage`] to detect degraded output.

use regex::Regex;
use serde::Deserialize;

use crate::project::{FileEntry, ProjectDescriptor};

/// Which strategy produced the recovered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    /// The text itself parsed as a descriptor, possibly after repair.
    Direct,
    /// A fenced code block inside the text parsed as a descriptor.
    FencedBlock,
    /// The descriptor was reassembled from a `project_name` match and a
    /// bare `files` array body.
    Partial,
    /// Nothing parsed; the raw text was wrapped as a single README.md.
    Fallback,
}

/// A recovered descriptor together with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub descriptor: ProjectDescriptor,
    pub stage: RecoveryStage,
}

impl Recovery {
    /// True when recovery gave up on structure and wrapped the raw text.
    pub fn is_degraded(&self) -> bool {
        self.stage == RecoveryStage::Fallback
    }
}

/// Descriptor as it appears on the wire: the name is optional and filled
/// from the caller's fallback, the files list is required.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    project_name: Option<String>,
    files: Vec<FileEntry>,
}

/// Recover a project descriptor from raw model output.
///
/// Never fails: when no structure can be found, the entire text is wrapped
/// as a single `README.md` entry under the fallback project name. Pure
/// function over its input, no I/O.
pub fn recover(raw: &str, fallback_project_name: &str) -> Recovery {
    if let Some(descriptor) = parse_direct(raw, fallback_project_name) {
        return Recovery {
            descriptor,
            stage: RecoveryStage::Direct,
        };
    }

    if let Some(descriptor) = parse_fenced_blocks(raw, fallback_project_name) {
        return Recovery {
            descriptor,
            stage: RecoveryStage::FencedBlock,
        };
    }

    if let Some(descriptor) = reconstruct_partial(raw, fallback_project_name) {
        return Recovery {
            descriptor,
            stage: RecoveryStage::Partial,
        };
    }

    Recovery {
        descriptor: ProjectDescriptor {
            project_name: fallback_project_name.to_string(),
            files: vec![FileEntry {
                path: "README.md".to_string(),
                content: raw.to_string(),
            }],
        },
        stage: RecoveryStage::Fallback,
    }
}

fn parse_descriptor(text: &str, fallback: &str) -> Option<ProjectDescriptor> {
    let raw: RawDescriptor = serde_json::from_str(text).ok()?;
    Some(ProjectDescriptor {
        project_name: raw.project_name.unwrap_or_else(|| fallback.to_string()),
        files: raw.files,
    })
}

/// Stage 1: if the trimmed text looks like a JSON document, repair and parse it.
fn parse_direct(raw: &str, fallback: &str) -> Option<ProjectDescriptor> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return None;
    }

    parse_descriptor(&repair_json(trimmed), fallback)
}

/// Stage 2: repair and parse each fenced code block in encounter order.
fn parse_fenced_blocks(raw: &str, fallback: &str) -> Option<ProjectDescriptor> {
    let fence = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();

    for caps in fence.captures_iter(raw) {
        if let Some(block) = caps.get(1) {
            if let Some(descriptor) = parse_descriptor(&repair_json(block.as_str()), fallback) {
                return Some(descriptor);
            }
        }
    }

    None
}

/// Stage 3: reassemble a descriptor from a `project_name` match and a bare
/// `files` array body. The array is parsed in isolation with no repair.
fn reconstruct_partial(raw: &str, fallback: &str) -> Option<ProjectDescriptor> {
    let name = Regex::new(r#""project_name"\s*:\s*"([^"]+)""#)
        .unwrap()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    // The greedy match assumes the final `]` in the text closes the array.
    // File content that itself contains a literal `]` near end-of-input
    // defeats that assumption; intended behavior there is unspecified
    // upstream, so the ambiguity is accepted as-is.
    let body = Regex::new(r#""files"\s*:\s*\[([\s\S]+)\]"#)
        .unwrap()
        .captures(raw)
        .and_then(|caps| caps.get(1))?;

    let files: Vec<FileEntry> = serde_json::from_str(&format!("[{}]", body.as_str())).ok()?;

    Some(ProjectDescriptor {
        project_name: name.unwrap_or_else(|| fallback.to_string()),
        files,
    })
}

/// Apply the stage-1 structural repairs: close an unterminated trailing
/// string, strip trailing commas, and balance `{}`/`[]` delimiters.
fn repair_json(text: &str) -> String {
    let closed = close_unterminated_strings(text);
    let stripped = strip_trailing_commas(&closed);
    balance_delimiters(&stripped)
}

/// Drop a comma whose next non-whitespace character is `}` or `]`.
///
/// Commas inside string literals do not count; file content is free to
/// contain `, }` and must come through untouched.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            ',' if !in_string => {
                let mut next = i + 1;
                while next < chars.len() && chars[next].is_whitespace() {
                    next += 1;
                }
                if !matches!(chars.get(next), Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Append a closing quote to any line that ends inside an open string.
///
/// JSON strings cannot contain raw newlines, so quote state is tracked per
/// line. A line ending on a lone backslash inside a string is left alone:
/// appending a quote there would only produce an escaped quote.
fn close_unterminated_strings(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let mut in_string = false;
        let mut escaped = false;

        for ch in line.chars() {
            if escaped {
                escaped = false;
            } else if in_string && ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = !in_string;
            }
        }

        if in_string && !escaped {
            lines.push(format!("{line}\""));
        } else {
            lines.push(line.to_string());
        }
    }

    lines.join("\n")
}

/// Append the closing delimiters still owed at end-of-text, innermost first.
///
/// Delimiters inside string literals do not count. Mismatched closers are
/// ignored rather than repaired; the subsequent parse will reject them.
fn balance_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => stack.push(ch),
            '}' if !in_string => {
                if stack.last() == Some(&'{') {
                    stack.pop();
                }
            }
            ']' if !in_string => {
                if stack.last() == Some(&'[') {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut out = text.to_string();
    while let Some(open) = stack.pop() {
        out.push(if open == '{' { '}' } else { ']' });
    }
    out
}
