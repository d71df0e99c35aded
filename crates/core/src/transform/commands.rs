//! Command resolution table.
//!
//! Maps transform names to argument templates, with `"*"` as the fallback
//! for names that have no entry of their own. Template tokens may embed
//! placeholders which are substituted per request:
//!
//! | Placeholder               | Value                                   |
//! |---------------------------|-----------------------------------------|
//! | `{source}`                | source file path                        |
//! | `{target}`                | target file path                        |
//! | `{source_mimetype}`       | source media type                       |
//! | `{target_mimetype}`       | target media type                       |
//! | `{transform}`             | transform name                          |
//! | `{option.KEY}`            | value of option `KEY` (required)        |
//! | `{option.KEY:DEFAULT}`    | value of option `KEY`, else `DEFAULT`   |
//!
//! `{{` and `}}` produce literal braces.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::runner::CommandSpec;

use super::types::TransformRequest;

/// Key of the fallback template.
pub const WILDCARD: &str = "*";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").unwrap());

/// Errors raised while resolving a command for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("No command configured for transform '{transform}'")]
    NoCommand { transform: String },

    #[error("Command template for '{transform}' is empty")]
    EmptyTemplate { transform: String },

    #[error("Unknown placeholder '{{{placeholder}}}' in command template")]
    UnknownPlaceholder { placeholder: String },

    #[error("Transform option '{key}' is required but was not supplied")]
    MissingOption { key: String },

    #[error("Unbalanced brace in command token: {token}")]
    UnbalancedBrace { token: String },
}

/// Transform name to argument template mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable {
    templates: BTreeMap<String, Vec<String>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the template for a transform name.
    pub fn with_command<I, S>(mut self, transform: impl Into<String>, template: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(transform, template);
        self
    }

    /// Adds (or replaces) the template for a transform name.
    pub fn insert<I, S>(&mut self, transform: impl Into<String>, template: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates.insert(
            transform.into(),
            template.into_iter().map(Into::into).collect(),
        );
    }

    /// Template for a transform name: exact entry first, then the wildcard.
    pub fn template_for(&self, transform: &str) -> Option<&[String]> {
        self.templates
            .get(transform)
            .or_else(|| self.templates.get(WILDCARD))
            .map(Vec::as_slice)
    }

    /// Table key that serves a transform name: the name itself, or the
    /// wildcard when it falls through.
    pub fn matched_key<'a>(&'a self, transform: &'a str) -> Option<&'a str> {
        if self.templates.contains_key(transform) {
            Some(transform)
        } else if self.has_wildcard() {
            Some(WILDCARD)
        } else {
            None
        }
    }

    /// Whether a template is configured for the name (directly or via the wildcard).
    pub fn supports(&self, transform: &str) -> bool {
        self.template_for(transform).is_some()
    }

    pub fn has_wildcard(&self) -> bool {
        self.templates.contains_key(WILDCARD)
    }

    /// Configured transform names, including the wildcard.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Configured templates, keyed by transform name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.templates
            .iter()
            .map(|(name, template)| (name.as_str(), template.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolves the command for a request, substituting placeholders.
    pub fn resolve(&self, request: &TransformRequest) -> Result<CommandSpec, CommandError> {
        let template =
            self.template_for(&request.transform_name)
                .ok_or_else(|| CommandError::NoCommand {
                    transform: request.transform_name.clone(),
                })?;

        if template.is_empty() {
            return Err(CommandError::EmptyTemplate {
                transform: request.transform_name.clone(),
            });
        }

        let tokens = template
            .iter()
            .map(|token| substitute(token, request))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CommandSpec::new(tokens))
    }
}

/// Substitutes every placeholder in one token.
fn substitute(token: &str, request: &TransformRequest) -> Result<String, CommandError> {
    let mut out = String::with_capacity(token.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(token) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&token[last..whole.start()]);
        match whole.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            "{" | "}" => {
                return Err(CommandError::UnbalancedBrace {
                    token: token.to_string(),
                })
            }
            _ => {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                out.push_str(&placeholder_value(name, request)?);
            }
        }
        last = whole.end();
    }
    out.push_str(&token[last..]);

    Ok(out)
}

fn placeholder_value(name: &str, request: &TransformRequest) -> Result<String, CommandError> {
    match name {
        "source" => Ok(request.source_path.to_string_lossy().into_owned()),
        "target" => Ok(request.target_path.to_string_lossy().into_owned()),
        "source_mimetype" => Ok(request.source_mimetype.clone()),
        "target_mimetype" => Ok(request.target_mimetype.clone()),
        "transform" => Ok(request.transform_name.clone()),
        _ => {
            let Some(option) = name.strip_prefix("option.") else {
                return Err(CommandError::UnknownPlaceholder {
                    placeholder: name.to_string(),
                });
            };
            let (key, default) = match option.split_once(':') {
                Some((key, default)) => (key, Some(default)),
                None => (option, None),
            };
            request
                .options
                .get(key)
                .cloned()
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| CommandError::MissingOption {
                    key: key.to_string(),
                })
        }
    }
}
