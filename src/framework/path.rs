use std::fmt;

use serde::Serialize;

/// Location of a value inside a configuration or state object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttributePath(Vec<PathStep>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Attribute(String),
    ElementKey(String),
    ElementIndex(usize),
}

impl AttributePath {
    pub fn root(name: &str) -> Self {
        AttributePath(vec![PathStep::Attribute(name.to_string())])
    }

    pub fn attribute(&self, name: &str) -> Self {
        self.with(PathStep::Attribute(name.to_string()))
    }

    pub fn key(&self, key: &str) -> Self {
        self.with(PathStep::ElementKey(key.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathStep::ElementIndex(index))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn with(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        AttributePath(steps)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::ElementKey(key) => write!(f, "[{key:?}]")?,
                PathStep::ElementIndex(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_terraform_style() {
        let path = AttributePath::root("spec")
            .attribute("blocks")
            .index(0)
            .attribute("io_cfg");
        assert_eq!(path.to_string(), "spec.blocks[0].io_cfg");

        let labels = AttributePath::root("metadata").attribute("labels").key("app");
        assert_eq!(labels.to_string(), r#"metadata.labels["app"]"#);
    }

    #[test]
    fn default_path_is_empty() {
        assert!(AttributePath::default().is_empty());
        assert_eq!(AttributePath::default().to_string(), "");
    }
}
