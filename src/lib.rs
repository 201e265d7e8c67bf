//! # storymaker
//!
//! Turns a news excerpt into a short story post with an LLM
//!
//! ## Usage
//! The `storymaker` binary in `storymaker-cli` drives this crate. A run has two halves, usually run one after the other
//! with a human glance in between:
//!
//! ```text
//! storymaker character -i news.txt -o characters.md
//! storymaker story -i characters.md -o posts/2026-10-18
//! ```
//!
//! The first writes character settings derived from the news. The second drafts a story for those characters, rewrites
//! it twice and writes `story.md` (the story alone) and `final.md` (the story under a frontmatter block a static site
//! generator understands).
//!
//! ## Concepts and Design
//! Every step is explicit. A step builds a prompt, sends it, post-processes the reply and hands the result to the next
//! step. Nothing is retried and nothing is cached: a failure stops the run.
//!
//! ### Manuscript
//!
//! The run configuration, a relaxed JSON (JSON5) file naming the API base URL and, for each of the six stages
//! (`characters`, `story`, `enhance_story1`, `enhance_story2`, `title_and_synopsis`, `frontmatter`), the model and
//! sampling parameters to call it with. See [`Manuscript`](crate::manuscript::Manuscript).
//!
//! ### Prompt Template and Placeholder
//!
//! Prompts are Markdown templates shipped inside the crate (`prompts/`). A placeholder is `{name}` where `name` is an
//! identifier, for example
//!
//! ```text
//! {genre}の短編小説を書いてください。登場人物は以下の通りです。
//! {characters}
//! ```
//!
//! A [`PromptTemplate`](crate::prompt::PromptTemplate) is constructed into a
//! [`PartialPrompt`](crate::prompt::PartialPrompt), which records which placeholders are filled with what. Filling is
//! literal and happens once, so a news excerpt that itself contains `{genre}` stays as it is.
//! [`PartialPrompt::complete`](crate::prompt::PartialPrompt::complete) refuses to produce a prompt with empty slots.
//!
//! ### Filler
//!
//! Anything that fills one or more placeholders in a partial prompt, see [`Fill`](crate::filler::Fill). The genre and
//! language of a run are a filler, [`StorySetting`](crate::genre::StorySetting).
//!
//! ### Endpoint
//!
//! Stages talk to the model only through [`ChatCompletion`](crate::utils::llm::ChatCompletion).
//! [`OpenAICompletionClient`](crate::utils::llm::openai::OpenAICompletionClient) implements it over any
//! OpenAI-compatible chat completions API, OpenRouter by default.
//!
//! ### Budget
//!
//! Enhancement passes rewrite the whole story, and reasoning models think before they write, so their completion
//! ceiling is computed per pass: five times the story's tokens plus the prompt's tokens, kept within 40,000 and 200,000.
//! See [`EnhancementBudget`](crate::utils::token::EnhancementBudget).
//!
//! ## License
//!
//! `storymaker` is free under Apache license.
//!
//! ## Attribution
//! * `tiktoken-rs`: token counting in [crate::utils::token::tiktoken].

pub mod prompt;
pub mod filler;
pub mod utils;
pub mod errors;
pub mod manuscript;
pub mod credentials;
pub mod genre;
pub mod character;
pub mod story;
pub mod frontmatter;
