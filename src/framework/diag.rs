use std::fmt;

use serde::Serialize;

use super::path::AttributePath;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A user facing message produced by a provider operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<AttributePath>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}", level, self.summary)?;
        if let Some(path) = &self.path {
            write!(f, "\n\n  with {}", path)?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, summary.into(), detail.into(), None);
    }

    pub fn add_attribute_error(
        &mut self,
        path: AttributePath,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Severity::Error, summary.into(), detail.into(), Some(path));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, summary.into(), detail.into(), None);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    fn push(&mut self, severity: Severity, summary: String, detail: String, path: Option<AttributePath>) {
        self.0.push(Diagnostic {
            severity,
            summary,
            detail,
            path,
        });
    }
}

/// One diagnostic per paragraph, the way Terraform prints them.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Deprecated", "field is going away");
        assert!(!diags.has_error());
        assert_eq!(diags.len(), 1);

        diags.add_error("Unable to GET resource", "connection refused");
        assert!(diags.has_error());
    }

    #[test]
    fn display_includes_path_and_detail() {
        let mut diags = Diagnostics::new();
        diags.add_attribute_error(
            AttributePath::root("metadata").attribute("name"),
            "Invalid Attribute Value Length",
            "Attribute metadata.name string length must be at least 1, got: 0",
        );
        let rendered = diags.iter().next().map(ToString::to_string).unwrap();
        assert!(rendered.starts_with("Error: Invalid Attribute Value Length"));
        assert!(rendered.contains("with metadata.name"));
        assert!(rendered.ends_with("got: 0"));
    }

    #[test]
    fn diagnostics_render_as_paragraphs() {
        let mut diags = Diagnostics::new();
        assert_eq!(diags.to_string(), "");

        diags.add_warning("Deprecated", "");
        diags.add_error("Unable to GET resource", "connection refused");
        assert_eq!(
            diags.to_string(),
            "Warning: Deprecated\n\nError: Unable to GET resource\n\nconnection refused"
        );
    }
}
