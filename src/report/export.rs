use std::fmt;
use std::fs;
use tracing::info;

use crate::error::ExportError;
use crate::types::Finding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn default_file(&self) -> &'static str {
        match self {
            OutputFormat::Json => "audit_report.json",
            OutputFormat::Yaml => "audit_report.yaml",
        }
    }

    pub fn render(&self, findings: &[Finding]) -> Result<String, ExportError> {
        match self {
            OutputFormat::Json => render_json(findings),
            OutputFormat::Yaml => render_yaml(findings),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Pretty-printed JSON array
pub fn render_json(findings: &[Finding]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(findings)?)
}

/// YAML sequence, one mapping per finding
pub fn render_yaml(findings: &[Finding]) -> Result<String, ExportError> {
    Ok(serde_yaml::to_string(findings)?)
}

/// Write the findings in `format` to `path`, or to the format's default file.
/// Returns the path written.
pub fn write_report(
    findings: &[Finding],
    format: OutputFormat,
    path: Option<&str>,
) -> Result<String, ExportError> {
    let path = path.unwrap_or(format.default_file()).to_string();
    let body = format.render(findings)?;
    fs::write(&path, body).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!("Wrote {} findings as {} to {}", findings.len(), format, path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings() -> Vec<Finding> {
        vec![
            Finding {
                namespace: "default".to_string(),
                resource: "web".to_string(),
                kind: "Deployment".to_string(),
                container: "nginx".to_string(),
                issue: "Image 'nginx' resolves to tag 'latest'".to_string(),
                suggestion: "Pin the image to an explicit version tag or digest.".to_string(),
                subjects: Vec::new(),
            },
            Finding {
                namespace: "default".to_string(),
                resource: "admin".to_string(),
                kind: "Role".to_string(),
                container: String::new(),
                issue: "Role has risky verbs: *".to_string(),
                suggestion: "Restrict the verbs to only those necessary for this Role.".to_string(),
                subjects: vec!["User:alice".to_string()],
            },
        ]
    }

    #[test]
    fn test_json_field_order_and_subjects() {
        let json = render_json(&findings()).unwrap();
        let ns = json.find("\"namespace\"").unwrap();
        let resource = json.find("\"resource\"").unwrap();
        let suggestion = json.find("\"suggestion\"").unwrap();
        assert!(ns < resource && resource < suggestion);
        // only the RBAC finding carries subjects
        assert_eq!(json.matches("\"subjects\"").count(), 1);

        let parsed: Vec<Finding> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, findings());
    }

    #[test]
    fn test_yaml_is_a_sequence() {
        let yaml = render_yaml(&findings()).unwrap();
        assert!(yaml.starts_with("- namespace: default"), "{}", yaml);
        assert!(yaml.contains("User:alice"));
        let parsed: Vec<Finding> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_write_report_to_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yaml");
        let path_str = path.to_str().unwrap();

        let written = write_report(&findings(), OutputFormat::Yaml, Some(path_str)).unwrap();
        assert_eq!(written, path_str);
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("kind: Role"));
    }

    #[test]
    fn test_write_report_unwritable_path() {
        let err = write_report(&findings(), OutputFormat::Json, Some("/nonexistent-dir/x/report.json"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent-dir/x/report.json"));
    }

    #[test]
    fn test_default_files() {
        assert_eq!(OutputFormat::Json.default_file(), "audit_report.json");
        assert_eq!(OutputFormat::Yaml.default_file(), "audit_report.yaml");
    }
}
