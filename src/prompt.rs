//! # Prompt
//! A prompt is simply a string
//! ## PromptTemplate
//! A prompt template is a string with placeholders. Templates used by the pipeline are named after the file they come
//! from, see [PromptName].
//!
//! ## Placeholder
//! A placeholder is a string that is in the format of `{name}`, where `name` is an identifier (letters, digits and
//! underscores, not starting with a digit). It can be filled with a value.
//!
//! ## PartialPrompt
//! A partial prompt is a prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
//!
//! The placeholders in a partial prompt can be filled with values via [PartialPrompt::try_fill]. You can also use this method to update the filling values of the placeholders.
//! When all placeholders are filled, the partial prompt can be completed via [PartialPrompt::complete], in which the placeholders in a template are **actually** replaced with the filling values.
//!
//! ### Counting tokens
//! [PartialPrompt::current_token_num] counts the tokens of the prompt as it would be sent right now. Unfilled
//! placeholders are counted with their literal `{name}` text.
//!
//! ## PromptStore
//! The templates the pipeline needs ship with the crate under `prompts/` and are embedded at compile time.


use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use crate::prompt::errors::{PlaceholderNotExist, UnfilledPlaceholders};
use crate::utils::prompt_processing::{get_placeholders, replace_all_placeholders};
use crate::utils::token::CountToken;
use log::warn;


/// A prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PartialPrompt {
    /// The template of the partial prompt, readonly
    #[readonly]
    pub template: PromptTemplate,

    /// Mapping from placeholder name to its filling value
    pub(crate) placeholder_to_vals: HashMap<String, Option<String>>,

    /// Record the placeholders that are not filled yet
    pub(crate) unfilled_placeholders: HashSet<String>,
}

impl PartialPrompt {
    /// Fill the placeholders in the partial prompt with the given values.
    /// Returns an error if the placeholder does not exist.
    pub fn try_fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, PlaceholderNotExist> {
        let placeholder = placeholder.into();
        if self.placeholder_to_vals.contains_key(&placeholder) {
            self.unfilled_placeholders.remove(&placeholder);
            self.placeholder_to_vals.insert(placeholder, Some(value.into()));
            Ok(self)
        } else {
            Err(PlaceholderNotExist::new(placeholder, value, &self.template.placeholders))
        }
    }

    /// Whether the template declares the placeholder.
    #[inline]
    pub fn has_placeholder(&self, placeholder: &str) -> bool {
        self.placeholder_to_vals.contains_key(placeholder)
    }

    /// Count the number of tokens in the prompt. Note that the unfilled placeholders are also counted with the placeholder names.
    pub fn current_token_num(&self, counter: &impl CountToken) -> usize {
        let prompt = replace_all_placeholders(self.template.str(), &self.placeholder_to_vals);
        counter.count_token(prompt.as_str())
    }

    /// Complete the partial prompt and return the completed prompt.
    /// Returns an error if there are still unfilled placeholders.
    pub fn complete(&self) -> Result<String, UnfilledPlaceholders> {
        if self.unfilled_placeholders.is_empty() {
            let prompt = replace_all_placeholders(self.template.str(), &self.placeholder_to_vals);
            Ok(prompt)
        } else {
            let mut unfilled_placeholders: Vec<String> = self.unfilled_placeholders.iter().cloned().collect();
            unfilled_placeholders.sort();
            let mut all_placeholders: Vec<String> = self.template.placeholders.iter().cloned().collect();
            all_placeholders.sort();
            Err(UnfilledPlaceholders {
                template: self.template.name.clone(),
                all_placeholders,
                unfilled_placeholders,
            })
        }
    }
}

/// A prompt template with placeholders.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    /// The template of the partial prompt, immutable
    template: Arc<String>,

    /// Where the template comes from, used in error messages. readonly
    #[readonly]
    pub name: String,

    /// The placeholders in the template, readonly
    #[readonly]
    pub placeholders: HashSet<String>,
}

impl PromptTemplate {
    /// Create an anonymous prompt template from a string.
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_name("<inline>", template)
    }

    /// Create a named prompt template. Warns if the template does not have any placeholder.
    pub fn with_name(name: impl Into<String>, template: impl Into<String>) -> Self {
        let name = name.into();
        let template = template.into();
        let placeholders = get_placeholders(&template);
        if placeholders.is_empty() {
            warn!("Prompt template {} does not have a placeholder. If this is intended, ignore this message. \
            Otherwise, check whether you have written placeholders correctly.", name);
        }
        Self {
            template: Arc::new(template),
            name,
            placeholders,
        }
    }

    /// Get the prompt template as a string.
    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Construct a partial prompt from the prompt template.
    pub fn construct_prompt(&self) -> PartialPrompt {
        PartialPrompt {
            template: self.clone(),
            placeholder_to_vals: self.placeholders.iter().map(|p| (p.clone(), None)).collect(),
            unfilled_placeholders: self.placeholders.clone(),
        }
    }
}

/// The templates the pipeline reads, one per file under `prompts/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptName {
    SystemPrompt,
    Characters,
    InitialStory,
    EnhanceStory1,
    EnhanceStory2,
    TitleSynopsis,
    Frontmatter,
}

impl PromptName {
    pub const ALL: [PromptName; 7] = [
        PromptName::SystemPrompt,
        PromptName::Characters,
        PromptName::InitialStory,
        PromptName::EnhanceStory1,
        PromptName::EnhanceStory2,
        PromptName::TitleSynopsis,
        PromptName::Frontmatter,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            PromptName::SystemPrompt => "system_prompt.md",
            PromptName::Characters => "characters.md",
            PromptName::InitialStory => "initial_story.md",
            PromptName::EnhanceStory1 => "enhance_story1.md",
            PromptName::EnhanceStory2 => "enhance_story2.md",
            PromptName::TitleSynopsis => "title_synopsis.md",
            PromptName::Frontmatter => "frontmatter.md",
        }
    }

    fn embedded_text(&self) -> &'static str {
        match self {
            PromptName::SystemPrompt => include_str!("../prompts/system_prompt.md"),
            PromptName::Characters => include_str!("../prompts/characters.md"),
            PromptName::InitialStory => include_str!("../prompts/initial_story.md"),
            PromptName::EnhanceStory1 => include_str!("../prompts/enhance_story1.md"),
            PromptName::EnhanceStory2 => include_str!("../prompts/enhance_story2.md"),
            PromptName::TitleSynopsis => include_str!("../prompts/title_synopsis.md"),
            PromptName::Frontmatter => include_str!("../prompts/frontmatter.md"),
        }
    }
}

impl fmt::Display for PromptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Read-only collection of the pipeline's prompt templates.
#[derive(Debug, Clone)]
pub struct PromptStore {
    templates: HashMap<PromptName, PromptTemplate>,
}

impl PromptStore {
    /// The templates bundled with the crate.
    pub fn embedded() -> Self {
        let templates = PromptName::ALL
            .iter()
            .map(|name| (*name, PromptTemplate::with_name(name.file_name(), name.embedded_text())))
            .collect();
        Self { templates }
    }

    pub fn template(&self, name: PromptName) -> &PromptTemplate {
        // every PromptName is inserted by the constructor
        &self.templates[&name]
    }

    /// The system prompt, which has no placeholders.
    pub fn system_prompt(&self) -> &str {
        self.template(PromptName::SystemPrompt).str()
    }

    /// A fresh partial prompt of the named template.
    pub fn prompt(&self, name: PromptName) -> PartialPrompt {
        self.template(name).construct_prompt()
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::embedded()
    }
}

pub mod errors {
    use std::collections::HashSet;
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when trying to complete a partial prompt but there are still unfilled placeholders.
    #[derive(Debug)]
    pub struct UnfilledPlaceholders {
        pub template: String,
        pub unfilled_placeholders: Vec<String>,
        pub all_placeholders: Vec<String>,
    }

    impl fmt::Display for UnfilledPlaceholders {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "UnfilledPlaceholders: to complete the prompt template {},\n  Requires Placeholders:{:?}\n  Unfilled Placeholders:{:?}",
                   self.template, self.all_placeholders, self.unfilled_placeholders)
        }
    }

    impl Error for UnfilledPlaceholders {}

    /// Error when trying to fill a placeholder that does not exist in the prompt template of the partial prompt.
    #[derive(Debug)]
    pub struct PlaceholderNotExist {
        pub try_fill_placeholder: String,
        pub value: String,
        pub available_placeholders: Vec<String>,
    }

    impl PlaceholderNotExist {
        pub(crate) fn new(try_fill_placeholder: impl Into<String>,
                          value: impl Into<String>,
                          available_placeholders: &HashSet<String>) -> Self {
            let mut available_placeholders: Vec<String> = available_placeholders.iter().cloned().collect();
            available_placeholders.sort();
            PlaceholderNotExist {
                try_fill_placeholder: try_fill_placeholder.into(),
                value: value.into(),
                available_placeholders,
            }
        }
    }

    impl fmt::Display for PlaceholderNotExist {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "PlaceholderNotExist: try to fill placeholder = {}, but available placeholders are {:?}",
                   self.try_fill_placeholder,
                   self.available_placeholders)
        }
    }

    impl Error for PlaceholderNotExist {}
}
