//! Command-line surface of `storymaker`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storymaker::credentials::DEFAULT_API_KEY_VAR;

pub const DEFAULT_MANUSCRIPT: &str = "manuscript.json5";
pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser)]
#[command(name = "storymaker")]
#[command(about = "Turn a news excerpt into characters, a short story and a blog post", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create character settings from a news excerpt
    Character {
        /// Input news file
        #[arg(short, long)]
        input: PathBuf,

        /// Output character settings file
        #[arg(short, long)]
        output: PathBuf,

        /// Manuscript file naming the model of each step
        #[arg(short, long, default_value = DEFAULT_MANUSCRIPT)]
        manuscript: PathBuf,

        /// Environment file holding the API key
        #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
        env: PathBuf,

        /// Genre of the story, random when omitted
        #[arg(short, long)]
        genre: Option<String>,

        /// Language the characters are written in
        #[arg(long)]
        language: Option<String>,

        /// Variable holding the API key
        #[arg(long, default_value = DEFAULT_API_KEY_VAR)]
        service: String,
    },

    /// Write a story for the given characters
    Story {
        /// Input character settings file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for story.md and final.md
        #[arg(short, long = "output_dir")]
        output_dir: PathBuf,

        /// Manuscript file naming the model of each step
        #[arg(short, long, default_value = DEFAULT_MANUSCRIPT)]
        manuscript: PathBuf,

        /// Environment file holding the API key
        #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
        env: PathBuf,

        /// Genre of the story, random when omitted
        #[arg(short, long)]
        genre: Option<String>,

        /// Number of enhancement passes, at most 2
        #[arg(long, default_value_t = storymaker::story::DEFAULT_ENHANCEMENT_COUNT)]
        enhancements: usize,

        /// Variable holding the API key
        #[arg(long, default_value = DEFAULT_API_KEY_VAR)]
        service: String,
    },

    /// Count the tokens of a file under a model's tokenizer
    Tokens {
        /// File to count
        #[arg(short, long)]
        input: PathBuf,

        /// Model whose tokenizer to use, e.g. openai/gpt-4o
        #[arg(long)]
        model: String,
    },
}

#[cfg(test)]
mod test_cli {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn test_command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_story_defaults() {
        let cli = Cli::try_parse_from(["storymaker", "story", "-i", "characters.md", "--output_dir", "out"]).unwrap();
        match cli.command {
            Some(Commands::Story { output_dir, manuscript, enhancements, genre, service, .. }) => {
                assert_eq!("out", output_dir.to_str().unwrap());
                assert_eq!("manuscript.json5", manuscript.to_str().unwrap());
                assert_eq!(2, enhancements);
                assert_eq!(None, genre);
                assert_eq!("OPENROUTER_API_KEY", service);
            }
            _ => panic!("expect story subcommand"),
        }
    }

    #[test]
    fn test_missing_required_flag_is_usage_error() {
        assert!(Cli::try_parse_from(["storymaker", "character", "-i", "news.md"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["storymaker"]).unwrap();
        assert!(cli.command.is_none());
    }
}
