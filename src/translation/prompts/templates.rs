/*!
 * Prompt templates for character field translation.
 *
 * The user prompt is an external text resource with `{{field}}`
 * placeholders named after the record fields, plus `{{text}}` for the
 * field currently being translated.
 */

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

use crate::dataset::CharacterRecord;
use crate::file_utils::FileManager;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// Template with `{{name}}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Load a template from a text file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            template: FileManager::read_to_string(path)?,
        })
    }

    /// Render the template with the given variables.
    ///
    /// Every occurrence of `{{name}}` is replaced in a single pass, so
    /// substituted values are never scanned for placeholders again.
    /// Placeholders with no matching variable are left as they are. When a
    /// name is given twice the later value wins.
    pub fn render<K, V, I>(&self, variables: I) -> String
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let variables: HashMap<String, String> = variables
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| match variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// System prompt plus user-prompt template, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub system: String,
    pub input: PromptTemplate,
}

impl PromptSet {
    pub fn new(system: impl Into<String>, input: PromptTemplate) -> Self {
        Self {
            system: system.into(),
            input,
        }
    }

    /// Load both prompt resources; a missing file is fatal.
    pub fn load<P1: AsRef<Path>, P2: AsRef<Path>>(system_path: P1, input_path: P2) -> Result<Self> {
        Ok(Self {
            system: FileManager::read_to_string(system_path)?,
            input: PromptTemplate::from_file(input_path)?,
        })
    }
}

/// Builds the user prompt for one field of one record.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    template: &'a PromptTemplate,
    record: &'a CharacterRecord,
    text: &'a str,
}

impl<'a> TranslationPromptBuilder<'a> {
    /// Create a new prompt builder.
    pub fn new(template: &'a PromptTemplate, record: &'a CharacterRecord, text: &'a str) -> Self {
        Self { template, record, text }
    }

    /// Build the user prompt.
    ///
    /// `text` comes last so it wins over a record key of the same name.
    pub fn build_user_prompt(&self) -> String {
        let mut variables = self.record.prompt_fields();
        variables.push(("text".to_string(), self.text.to_string()));
        self.template.render(variables)
    }
}
