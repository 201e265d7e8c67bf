//! Character generation: news excerpt in, character settings out.

use std::path::Path;

use anyhow::Result;
use log::{error, info};

use crate::filler::Fill;
use crate::genre::StorySetting;
use crate::manuscript::Manuscript;
use crate::prompt::{PromptName, PromptStore};
use crate::utils::llm::ChatCompletion;
use crate::utils::write_text;

/// Creates characters for a story from a news excerpt.
pub struct CharacterMaker<'a, C: ChatCompletion + ?Sized> {
    client: &'a C,
    manuscript: &'a Manuscript,
    prompts: &'a PromptStore,
}

impl<'a, C: ChatCompletion + ?Sized> CharacterMaker<'a, C> {
    pub fn new(client: &'a C, manuscript: &'a Manuscript, prompts: &'a PromptStore) -> Self {
        Self {
            client,
            manuscript,
            prompts,
        }
    }

    /// The character prompt for `news`.
    pub fn make_prompt(&self, news: &str, setting: &StorySetting) -> Result<String> {
        let mut prompt = self.prompts.prompt(PromptName::Characters);
        prompt.try_fill("news", news)?;
        setting.fill(&mut prompt)?;
        Ok(prompt.complete()?)
    }

    /// Character settings as the model wrote them.
    pub async fn generate(&self, news: &str, setting: &StorySetting) -> Result<String> {
        info!("Creating character settings ({}, {})...", setting.genre, setting.language);
        let prompt = self.make_prompt(news, setting)?;
        let options = self.manuscript.characters.options();
        self.client.complete(self.prompts.system_prompt(), &prompt, &options).await
    }

    /// Generate character settings and write them to `output_path`, creating parent directories.
    pub async fn process_steps(&self, news: &str, setting: &StorySetting, output_path: &Path) -> Result<String> {
        let characters = self.generate(news, setting).await.inspect_err(|e| {
            error!("Error creating character settings: {}", e);
        })?;
        write_text(output_path, &characters).inspect_err(|e| {
            error!("Error saving character settings: {:#}", e);
        })?;
        info!("Character settings saved to {}", output_path.display());
        Ok(characters)
    }
}

#[cfg(test)]
mod test_character {
    use super::CharacterMaker;
    use crate::errors::EmptyResponseError;
    use crate::genre::StorySetting;
    use crate::manuscript::test_manuscript::MANUSCRIPT;
    use crate::manuscript::Manuscript;
    use crate::prompt::PromptStore;
    use crate::utils::llm::scripted::ScriptedModel;

    #[tokio::test]
    async fn test_generate_and_save() {
        let manuscript = Manuscript::parse(MANUSCRIPT).unwrap();
        let prompts = PromptStore::embedded();
        let client = ScriptedModel::with_texts(["- 佐藤 花子: 32歳、駅員"]);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/dir/characters.md");

        let maker = CharacterMaker::new(&client, &manuscript, &prompts);
        let setting = StorySetting::new("ミステリー", "日本語");
        maker.process_steps("猫が駅長に就任", &setting, &output).await.unwrap();

        assert_eq!("- 佐藤 花子: 32歳、駅員", std::fs::read_to_string(&output).unwrap());
        let calls = client.calls();
        assert_eq!(1, calls.len());
        let call = &calls[0];
        assert!(call.prompt.contains("猫が駅長に就任"));
        assert!(call.prompt.contains("ミステリー"));
        assert!(call.prompt.contains("日本語"));
        assert_eq!(prompts.system_prompt(), call.system_prompt);
        assert_eq!(manuscript.characters.model, call.options.model);
        assert_eq!(Some(manuscript.characters.top_p), call.options.top_p);
        assert_eq!(None, call.options.max_completion_tokens);
    }

    #[tokio::test]
    async fn test_overwrites_existing_file() {
        let manuscript = Manuscript::parse(MANUSCRIPT).unwrap();
        let prompts = PromptStore::embedded();
        let client = ScriptedModel::with_texts(["new"]);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("characters.md");
        std::fs::write(&output, "old old old").unwrap();

        CharacterMaker::new(&client, &manuscript, &prompts)
            .process_steps("news", &StorySetting::new("SF", "English"), &output)
            .await
            .unwrap();
        assert_eq!("new", std::fs::read_to_string(&output).unwrap());
    }

    #[tokio::test]
    async fn test_failure_writes_nothing() {
        let manuscript = Manuscript::parse(MANUSCRIPT).unwrap();
        let prompts = PromptStore::embedded();
        let client = ScriptedModel::with_texts([""]);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out/characters.md");

        let err = CharacterMaker::new(&client, &manuscript, &prompts)
            .process_steps("news", &StorySetting::new("SF", "English"), &output)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<EmptyResponseError>().is_some());
        assert!(!output.exists());
        assert!(!dir.path().join("out").exists());
    }
}
