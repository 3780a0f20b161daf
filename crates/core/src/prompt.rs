//! Prompt construction for the upstream completion APIs.
//!
//! All providers are asked for the same JSON output contract so that model
//! responses funnel through a single recovery path.

/// Build the user prompt asking a model to turn a PRD into a complete
/// project, formatted as the JSON descriptor the recovery parser expects.
pub fn build_generation_prompt(prd_content: &str) -> String {
    format!(
        r#"Based on the following PRD (Product Requirements Document),
create a complete, production-ready project with all necessary code files.

PRD Content:
{prd_content}

Please provide a COMPLETE implementation including:
1. Full file structure with all directories
2. ALL necessary code files with complete implementations (no placeholders)
3. Configuration files (package.json, requirements.txt, etc.)
4. Environment files (.env.example)
5. Comprehensive README.md with project overview, installation instructions,
   usage examples, API documentation, and a deployment guide
6. Unit tests for core functionality
7. Docker configuration if applicable
8. CI/CD configuration files (GitHub Actions, etc.) if applicable
9. Database schemas/migrations if applicable
10. Any additional files needed for a production-ready application

IMPORTANT: Provide COMPLETE, DETAILED implementations.
Do not use comments like "// Add more code here" or placeholders.
Every function should be fully implemented.

If the PRD doesn't specify a project name, use an appropriate name based on the content.

Format your response as JSON with this structure:
{{
    "project_name": "appropriate_project_name_based_on_content",
    "files": [
        {{
            "path": "relative/path/to/file.ext",
            "content": "complete file content here"
        }}
    ]
}}
"#
    )
}

/// Build the user message for the Alibaba direct path, which carries the
/// project name explicitly and keeps the format contract in the system
/// prompt.
pub fn build_direct_prompt(project_name: &str, prd_content: &str) -> String {
    format!(
        "Project Name: {project_name}\n\nPRD Content:\n{prd_content}\n\nGenerate the complete codebase."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_embeds_prd() {
        let prompt = build_generation_prompt("Build a todo app");
        assert!(prompt.contains("PRD Content:\nBuild a todo app"));
    }

    #[test]
    fn test_generation_prompt_states_json_contract() {
        let prompt = build_generation_prompt("x");
        assert!(prompt.contains("\"project_name\""));
        assert!(prompt.contains("\"files\""));
        assert!(prompt.contains("\"path\""));
        assert!(prompt.contains("\"content\""));
    }

    #[test]
    fn test_direct_prompt_carries_name_and_content() {
        let prompt = build_direct_prompt("demo_app", "Build a todo app");
        assert!(prompt.starts_with("Project Name: demo_app"));
        assert!(prompt.contains("PRD Content:\nBuild a todo app"));
    }
}
