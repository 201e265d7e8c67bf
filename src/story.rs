//! # Story pipeline
//!
//! Characters in, blog post out. The stages run strictly in order, each consuming what the previous one left in the
//! [StoryContext]:
//!
//! 1. draft the story from the character settings
//! 2. rewrite it with up to two enhancement passes, each with a completion budget computed from the size of what it
//!    rewrites (see [EnhancementBudget])
//! 3. strip heading lines
//! 4. write `story.md`
//! 5. ask for a working title and synopsis
//! 6. turn those into a [NovelFrontmatter] via a structured completion
//! 7. write `final.md`: the frontmatter block followed by the story
//!
//! Any failure stops the run. `story.md` is written before step 5, so it may exist when a later step failed.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::{error, info};

use crate::errors::ConfigError;
use crate::filler::Fill;
use crate::frontmatter::{render_post, today_in_tokyo, NovelFrontmatter};
use crate::genre::StorySetting;
use crate::manuscript::{Manuscript, ReasoningEffort, Stage};
use crate::prompt::{PromptName, PromptStore};
use crate::utils::llm::{complete_structured, ChatCompletion};
use crate::utils::postprocess::markdown::strip_headings;
use crate::utils::token::tiktoken::Tiktoken;
use crate::utils::token::{CountToken, EnhancementBudget};
use crate::utils::write_text;

/// File name of the plain story inside the output directory.
pub const STORY_FILE_NAME: &str = "story.md";
/// File name of the post with frontmatter inside the output directory.
pub const FINAL_FILE_NAME: &str = "final.md";

/// Enhancement passes in the order they run.
const ENHANCEMENT_PASSES: [(Stage, PromptName); 2] = [
    (Stage::EnhanceStory1, PromptName::EnhanceStory1),
    (Stage::EnhanceStory2, PromptName::EnhanceStory2),
];

/// Number of enhancement passes a run makes unless told otherwise.
pub const DEFAULT_ENHANCEMENT_COUNT: usize = ENHANCEMENT_PASSES.len();

/// What the stages of one run produced so far. Fields fill in pipeline order and are never overwritten.
#[derive(Debug, Clone, Default)]
#[readonly::make]
pub struct StoryContext {
    /// The first draft
    #[readonly]
    pub initial_story: Option<String>,
    /// Budgets of the enhancement passes that ran
    #[readonly]
    pub budgets: Vec<EnhancementBudget>,
    /// The text after the last enhancement pass
    #[readonly]
    pub final_story: Option<String>,
    #[readonly]
    pub no_heading_final_story: Option<String>,
    /// Working title and synopsis, only fed to the frontmatter stage
    #[readonly]
    pub title_and_synopsis_output: Option<String>,
    #[readonly]
    pub frontmatter: Option<NovelFrontmatter>,
}

fn produced<'c, T>(field: &'c Option<T>, what: &str) -> Result<&'c T> {
    field.as_ref().ok_or_else(|| anyhow!("{} has not been created yet", what))
}

/// Drafts, rewrites and packages a story.
pub struct StoryMaker<'a, C: ChatCompletion + ?Sized> {
    client: &'a C,
    manuscript: &'a Manuscript,
    prompts: &'a PromptStore,
    enhancement_count: usize,
}

impl<'a, C: ChatCompletion + ?Sized> StoryMaker<'a, C> {
    pub fn new(client: &'a C, manuscript: &'a Manuscript, prompts: &'a PromptStore) -> Self {
        Self {
            client,
            manuscript,
            prompts,
            enhancement_count: DEFAULT_ENHANCEMENT_COUNT,
        }
    }

    /// Run `count` enhancement passes instead of the default. More passes than there are enhancement templates is a
    /// [ConfigError] once the story is created.
    pub fn with_enhancement_count(mut self, count: usize) -> Self {
        self.enhancement_count = count;
        self
    }

    fn check_enhancement_count(&self) -> Result<(), ConfigError> {
        if self.enhancement_count > ENHANCEMENT_PASSES.len() {
            Err(ConfigError::new(format!("requested {} enhancement passes but only {} are available",
                                         self.enhancement_count,
                                         ENHANCEMENT_PASSES.len())))
        } else {
            Ok(())
        }
    }

    /// Draft the story, then run the enhancement passes.
    pub async fn create_story(&self, context: &mut StoryContext, characters: &str, setting: &StorySetting) -> Result<()> {
        info!("Creating story ({})...", setting.genre);
        self.create_story_inner(context, characters, setting).await.inspect_err(|e| {
            error!("Error creating story: {}", e);
        })
    }

    async fn create_story_inner(&self, context: &mut StoryContext, characters: &str, setting: &StorySetting) -> Result<()> {
        self.check_enhancement_count()?;
        let passes = &ENHANCEMENT_PASSES[..self.enhancement_count];
        // resolve every tokenizer before the first request
        let story_config = &self.manuscript.story;
        let draft_counter = match passes.is_empty() {
            true => None,
            false => Some(Tiktoken::new(story_config.model.as_str())?),
        };
        let pass_counters = passes
            .iter()
            .map(|(stage, _)| Tiktoken::new(self.manuscript.stage(*stage).model.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut prompt = self.prompts.prompt(PromptName::InitialStory);
        prompt.try_fill("characters", characters)?;
        setting.fill(&mut prompt)?;
        let prompt = prompt.complete()?;

        let draft = self.client.complete(self.prompts.system_prompt(), &prompt, &story_config.options()).await?;
        info!("Story draft generated.");
        let mut story_tokens = draft_counter.map_or(0, |counter| counter.count_token(&draft));
        context.initial_story = Some(draft.clone());

        let mut enhanced_story = draft;
        for (i, ((stage, prompt_name), counter)) in passes.iter().zip(pass_counters.iter()).enumerate() {
            info!("Enhancing story {}...", i + 1);
            let config = self.manuscript.stage(*stage);
            let mut prompt = self.prompts.prompt(*prompt_name);
            prompt.try_fill("story", enhanced_story.as_str())?;
            setting.fill(&mut prompt)?;

            let budget = EnhancementBudget::new(story_tokens, prompt.current_token_num(counter));
            info!("Token calculation: story_tokens={}, prompt_tokens={}", budget.story_tokens, budget.prompt_tokens);
            info!("Calculated max_tokens={}, using safe_limit={}", budget.calculated, budget.budget);

            let options = config.options().with_max_completion_tokens(budget.max_completion_tokens());
            enhanced_story = self.client.complete(self.prompts.system_prompt(), &prompt.complete()?, &options).await?;
            story_tokens = counter.count_token(&enhanced_story);
            context.budgets.push(budget);
            info!("Story enhancement {} completed.", i + 1);
        }

        context.no_heading_final_story = Some(strip_headings(&enhanced_story));
        context.final_story = Some(enhanced_story);
        Ok(())
    }

    /// Ask for a working title and synopsis of the final story.
    pub async fn create_title_and_synopsis(&self, context: &mut StoryContext) -> Result<()> {
        info!("Creating title and synopsis...");
        let result: Result<String> = async {
            let mut prompt = self.prompts.prompt(PromptName::TitleSynopsis);
            prompt.try_fill("story", produced(&context.final_story, "final story")?.as_str())?;
            let options = self.manuscript.title_and_synopsis
                .options()
                .with_default_reasoning_effort(ReasoningEffort::Medium);
            self.client.complete(self.prompts.system_prompt(), &prompt.complete()?, &options).await
        }.await;
        let output = result.inspect_err(|e| error!("Error creating title and synopsis: {}", e))?;
        context.title_and_synopsis_output = Some(output);
        Ok(())
    }

    /// Turn the title and synopsis into validated frontmatter.
    pub async fn create_frontmatter(&self, context: &mut StoryContext) -> Result<()> {
        info!("Creating frontmatter...");
        let result: Result<NovelFrontmatter> = async {
            let mut prompt = self.prompts.prompt(PromptName::Frontmatter);
            prompt.try_fill("title_and_synopsis", produced(&context.title_and_synopsis_output, "title and synopsis")?.as_str())?;
            let frontmatter: NovelFrontmatter = complete_structured(self.client,
                                                                    self.prompts.system_prompt(),
                                                                    &prompt.complete()?,
                                                                    &self.manuscript.frontmatter.options(),
                                                                    &NovelFrontmatter::response_schema()).await?;
            frontmatter.validate()?;
            Ok(frontmatter)
        }.await;
        let frontmatter = result.inspect_err(|e| error!("Error creating frontmatter: {}", e))?;
        info!("Frontmatter: {:?}", frontmatter);
        context.frontmatter = Some(frontmatter);
        Ok(())
    }

    /// Write the story without headings to `path`.
    pub fn save_story_as_plain_text(&self, context: &StoryContext, path: &Path) -> Result<()> {
        info!("Saving story as plain text to {}...", path.display());
        produced(&context.no_heading_final_story, "final story")
            .and_then(|story| write_text(path, story))
            .inspect_err(|e| error!("Error saving story as plain text: {:#}", e))
    }

    /// Write the post, frontmatter block then story, to `path`.
    pub fn create_novel_post(&self, context: &StoryContext, path: &Path, publish_date: NaiveDate) -> Result<()> {
        info!("Creating novel post to {}...", path.display());
        let result = produced(&context.frontmatter, "frontmatter").and_then(|frontmatter| {
            let story = produced(&context.no_heading_final_story, "final story")?;
            write_text(path, &render_post(frontmatter, publish_date, story))
        });
        result.inspect_err(|e| error!("Error creating novel post: {:#}", e))
    }

    /// The whole run: story, `story.md`, title and synopsis, frontmatter, `final.md`.
    pub async fn process_steps(&self, characters: &str, output_dir: &Path, setting: &StorySetting) -> Result<StoryContext> {
        info!("Processing steps...");
        let mut context = StoryContext::default();
        self.create_story(&mut context, characters, setting).await?;
        self.save_story_as_plain_text(&context, &output_dir.join(STORY_FILE_NAME))?;
        self.create_title_and_synopsis(&mut context).await?;
        self.create_frontmatter(&mut context).await?;
        self.create_novel_post(&context, &output_dir.join(FINAL_FILE_NAME), today_in_tokyo())?;
        Ok(context)
    }
}
