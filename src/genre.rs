//! Genre and language a story is written in.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::filler::{Fill, FillPlaceholders};
use crate::prompt::PartialPrompt;

/// Language prompts ask the model to write in when the caller names none.
pub const DEFAULT_LANGUAGE: &str = "日本語";

/// Genres picked from when the caller names none.
pub const GENRE_LIST: [&str; 12] = [
    "SF",
    "ファンタジー",
    "ミステリー",
    "ホラー",
    "恋愛",
    "サスペンス",
    "歴史",
    "青春",
    "コメディ",
    "ヒューマンドラマ",
    "冒険",
    "ディストピア",
];

/// A genre from [GENRE_LIST], uniformly at random.
pub fn random_genre<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GENRE_LIST.choose(rng).copied().unwrap_or(GENRE_LIST[0])
}

/// Genre and language of one run. Fills `{genre}` and `{language}` wherever a template declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySetting {
    pub genre: String,
    pub language: String,
    placeholders: Vec<String>,
}

impl StorySetting {
    const GENRE_PLACEHOLDER: &'static str = "genre";
    const LANGUAGE_PLACEHOLDER: &'static str = "language";

    pub fn new(genre: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            language: language.into(),
            placeholders: vec![Self::GENRE_PLACEHOLDER.to_string(), Self::LANGUAGE_PLACEHOLDER.to_string()],
        }
    }

    /// Uses the given genre and language, picking a random genre and the default language for what is missing.
    pub fn resolve<R: Rng + ?Sized>(genre: Option<String>, language: Option<String>, rng: &mut R) -> Self {
        let genre = genre.unwrap_or_else(|| random_genre(rng).to_string());
        let language = language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Self::new(genre, language)
    }
}

impl FillPlaceholders for StorySetting {
    fn placeholders_to_fill(&self) -> &Vec<String> {
        &self.placeholders
    }
}

impl Fill for StorySetting {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> anyhow::Result<()> {
        for placeholder in self.placeholders_to_fill() {
            if !partial_prompt.has_placeholder(placeholder) {
                continue;
            }
            let value = if placeholder == Self::GENRE_PLACEHOLDER { &self.genre } else { &self.language };
            partial_prompt.try_fill(placeholder.as_str(), value.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_genre {
    use std::collections::HashMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{random_genre, StorySetting, DEFAULT_LANGUAGE, GENRE_LIST};
    use crate::filler::Fill;
    use crate::prompt::PromptTemplate;

    #[test]
    fn test_random_genre_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 12_000;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(random_genre(&mut rng)).or_default() += 1;
        }
        assert_eq!(GENRE_LIST.len(), counts.len());
        let expected = draws / GENRE_LIST.len();
        for genre in GENRE_LIST {
            let count = counts[genre];
            assert!(count > expected * 3 / 4 && count < expected * 5 / 4, "{} drawn {} times", genre, count);
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let mut rng = StdRng::seed_from_u64(1);
        let setting = StorySetting::resolve(None, None, &mut rng);
        assert!(GENRE_LIST.contains(&setting.genre.as_str()));
        assert_eq!(DEFAULT_LANGUAGE, setting.language);

        let setting = StorySetting::resolve(Some("ホラー".to_string()), Some("English".to_string()), &mut rng);
        assert_eq!("ホラー", setting.genre);
        assert_eq!("English", setting.language);
    }

    #[test]
    fn test_fills_only_declared_placeholders() {
        let setting = StorySetting::new("SF", "English");
        let template = PromptTemplate::new("{story} as {genre}");
        let mut prompt = template.construct_prompt();
        setting.fill(&mut prompt).unwrap();
        prompt.try_fill("story", "draft").unwrap();
        assert_eq!("draft as SF", prompt.complete().unwrap());
    }
}
