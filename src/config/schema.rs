use crate::model::is_valid_identifier;
use crate::passes::PASS_NAMES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every knob of the rewriting pipeline. All fields have defaults, so an
/// empty file is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub reorder: ReorderConfig,
    #[serde(default)]
    pub usings: UsingsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Widest collapsed rendering a parameter or argument list may keep
    pub max_width: usize,
    /// One indentation unit
    pub indent: String,
    /// Put every element of a non-empty initializer on its own line
    pub break_initializers: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_width: 100,
            indent: "    ".to_string(),
            break_initializers: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub field_prefix: String,
    pub async_suffix: String,
    /// Substring identifying the first parameter of an event callback
    pub callback_sender: String,
    /// Suffix identifying the second parameter of an event callback
    pub callback_args_suffix: String,
    /// Placeholders for unused callback parameters, by position
    pub discard_names: Vec<String>,
    pub rename_locals: bool,
    pub rename_parameters: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            field_prefix: "_".to_string(),
            async_suffix: "Async".to_string(),
            callback_sender: "sender".to_string(),
            callback_args_suffix: "Args".to_string(),
            discard_names: vec!["_".to_string(), "__".to_string()],
            rename_locals: true,
            rename_parameters: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReorderConfig {
    /// Name of the region wrapped around private methods; empty disables it
    pub private_region_name: String,
    pub colocate_backing_fields: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            private_region_name: "Private methods".to_string(),
            colocate_backing_fields: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UsingsConfig {
    /// Sort `System` and `System.*` before other namespaces
    pub system_first: bool,
}

impl Default for UsingsConfig {
    fn default() -> Self {
        Self { system_first: true }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub disabled_passes: Vec<String>,
    /// Turn fixed-point exhaustion into a hard error
    pub strict_convergence: bool,
}

impl RewriteConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.layout.max_width == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "layout.max_width",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.layout.indent.is_empty()
            || !self.layout.indent.chars().all(|c| c == ' ' || c == '\t')
        {
            issues.push(ValidationIssue::InvalidValue {
                field: "layout.indent",
                value: self.layout.indent.clone(),
                message: "must be non-empty and contain only spaces or tabs".to_string(),
            });
        }

        let naming = &self.naming;
        for (field, value) in [
            ("naming.field_prefix", &naming.field_prefix),
            ("naming.async_suffix", &naming.async_suffix),
        ] {
            if !is_identifier_fragment(value) {
                issues.push(ValidationIssue::InvalidValue {
                    field,
                    value: value.clone(),
                    message: "must be a valid identifier fragment".to_string(),
                });
            }
        }
        for (field, value) in [
            ("naming.callback_sender", &naming.callback_sender),
            ("naming.callback_args_suffix", &naming.callback_args_suffix),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { field });
            }
        }
        match naming.discard_names.as_slice() {
            [first, second] if first != second => {
                for name in [first, second] {
                    if !is_valid_identifier(name) {
                        issues.push(ValidationIssue::InvalidValue {
                            field: "naming.discard_names",
                            value: name.clone(),
                            message: "must be a valid identifier".to_string(),
                        });
                    }
                }
            }
            _ => issues.push(ValidationIssue::InvalidValue {
                field: "naming.discard_names",
                value: naming.discard_names.join(", "),
                message: "must list exactly two distinct names".to_string(),
            }),
        }

        for pass in &self.pipeline.disabled_passes {
            if !PASS_NAMES.contains(&pass.as_str()) {
                issues.push(ValidationIssue::UnknownPass(pass.clone()));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn is_pass_enabled(&self, name: &str) -> bool {
        !self.pipeline.disabled_passes.iter().any(|p| p == name)
    }
}

/// Empty, or something that can be glued onto an identifier.
fn is_identifier_fragment(value: &str) -> bool {
    value.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Error, Debug, Clone)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("missing required value for '{field}'")]
    MissingField { field: &'static str },
    #[error("'{field}' {message}")]
    OutOfRange {
        field: &'static str,
        message: String,
    },
    #[error("'{field}' = {value:?} {message}")]
    InvalidValue {
        field: &'static str,
        value: String,
        message: String,
    },
    #[error("unknown pass '{0}' in pipeline.disabled_passes (known: {known})", known = PASS_NAMES.join(", "))]
    UnknownPass(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RewriteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.max_width, 100);
        assert_eq!(config.naming.discard_names, vec!["_", "__"]);
        assert!(config.is_pass_enabled("rename"));
    }

    #[test]
    fn collects_every_issue() {
        let mut config = RewriteConfig::default();
        config.layout.max_width = 0;
        config.layout.indent = "x".to_string();
        config.naming.discard_names = vec!["_".to_string(), "_".to_string()];
        config.pipeline.disabled_passes = vec!["shuffle".to_string()];
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.to_string().contains("shuffle"));
    }

    #[test]
    fn rejects_keyword_discards() {
        let mut config = RewriteConfig::default();
        config.naming.discard_names = vec!["_".to_string(), "class".to_string()];
        assert!(config.validate().is_err());
    }
}
