mod cli;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::info;
use storymaker::character::CharacterMaker;
use storymaker::credentials::load_api_key;
use storymaker::genre::StorySetting;
use storymaker::manuscript::Manuscript;
use storymaker::prompt::PromptStore;
use storymaker::story::StoryMaker;
use storymaker::utils::llm::openai::OpenAICompletionClient;
use storymaker::utils::token::tiktoken::count_tokens_from_file;

use crate::cli::{Cli, Commands};

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Manuscript, then credentials, then the client they configure.
fn connect(manuscript: &Path, env: &Path, service: &str) -> Result<(Manuscript, OpenAICompletionClient)> {
    let manuscript = Manuscript::load(manuscript)?;
    let api_key = load_api_key(Some(env), service)?;
    let client = OpenAICompletionClient::from_manuscript(&manuscript, api_key);
    Ok((manuscript, client))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Character { input, output, manuscript, env, genre, language, service } => {
            let (manuscript, client) = connect(&manuscript, &env, &service)?;
            let prompts = PromptStore::embedded();
            let news = read_input(&input)?;
            let setting = StorySetting::resolve(genre, language, &mut rand::thread_rng());
            CharacterMaker::new(&client, &manuscript, &prompts)
                .process_steps(&news, &setting, &output)
                .await?;
        }
        Commands::Story { input, output_dir, manuscript, env, genre, enhancements, service } => {
            let (manuscript, client) = connect(&manuscript, &env, &service)?;
            let prompts = PromptStore::embedded();
            let characters = read_input(&input)?;
            let setting = StorySetting::resolve(genre, None, &mut rand::thread_rng());
            StoryMaker::new(&client, &manuscript, &prompts)
                .with_enhancement_count(enhancements)
                .process_steps(&characters, &output_dir, &setting)
                .await?;
            info!("Story written to {}", output_dir.display());
        }
        Commands::Tokens { input, model } => {
            let tokens = count_tokens_from_file(&input, &model)?;
            println!("{}", tokens);
        }
    }
    Ok(())
}
