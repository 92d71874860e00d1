use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A command line executed on the remote workers. Placeholders such as
/// `$MANTA_INPUT_FILE` are substituted by the worker, never here; building a
/// template only checks that every placeholder occurring in it was declared
/// by the stage, so a typo fails while planning instead of mid-job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTemplate {
    raw: String,
    placeholders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub placeholder: String,
    pub template: String,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "undeclared placeholder ${} in command template: {}",
            self.placeholder, self.template
        )
    }
}

impl std::error::Error for TemplateError {}

impl CommandTemplate {
    pub fn new(raw: impl Into<String>, placeholders: &[&str]) -> Result<Self, TemplateError> {
        let raw = raw.into();
        // Worker environment variables are all-caps; `$` in regex patterns
        // or shell constructs never is.
        let pattern = Regex::new(r"\$([A-Z][A-Z0-9_]*)").expect("placeholder pattern");
        for capture in pattern.captures_iter(&raw) {
            let name = &capture[1];
            if !placeholders.iter().any(|p| *p == name) {
                return Err(TemplateError {
                    placeholder: name.to_string(),
                    template: raw,
                });
            }
        }
        Ok(Self {
            raw,
            placeholders: placeholders.iter().map(|p| p.to_string()).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }
}
