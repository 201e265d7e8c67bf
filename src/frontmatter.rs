//! Blog post metadata and the final post layout.

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Tokyo;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ValidationError;
use crate::utils::llm::ResponseSchema;

pub const MIN_TAGS: usize = 2;
pub const MAX_TAGS: usize = 4;

/// Metadata of a generated story. Fields the model adds beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelFrontmatter {
    pub title: String,
    /// An invented pen name
    pub author: String,
    pub synopsis: String,
    pub tags: Vec<String>,
}

impl NovelFrontmatter {
    /// The schema structured completions are asked to follow.
    pub fn response_schema() -> ResponseSchema {
        ResponseSchema {
            name: "NovelFrontmatter".to_string(),
            description: Some("Metadata of a short novel for a blog post".to_string()),
            schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "title of this novel in Japanese."
                    },
                    "author": {
                        "type": "string",
                        "description": "author of this novel. Think of this novel's author pen name in Japanese randomly. \
                                        Pen name must not be a real name or a name of a famous author."
                    },
                    "synopsis": {
                        "type": "string",
                        "description": "attractive synopsis of this novel in Japanese. synopsis is used to describe the story \
                                        of this novel. synopsis length must be 100 to 200 words."
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "tags of this novel in Japanese. tag is used to describe the genre or key motif or both \
                                        of this novel. tags length must be 2 to 4."
                    }
                },
                "required": ["title", "author", "synopsis", "tags"],
                "additionalProperties": false
            }),
            strict: true,
        }
    }

    /// Checks what the type cannot: 2 to 4 tags.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if (MIN_TAGS..=MAX_TAGS).contains(&self.tags.len()) {
            Ok(())
        } else {
            Err(ValidationError {
                schema: "NovelFrontmatter".to_string(),
                reason: format!("expected {} to {} tags, got {}", MIN_TAGS, MAX_TAGS, self.tags.len()),
                content: format!("{:?}", self.tags),
            })
        }
    }

    /// The delimited metadata block that opens the post, followed by one blank line.
    pub fn render_block(&self, publish_date: NaiveDate) -> String {
        let mut block = String::from("---\n");
        block.push_str(&format!("title: {}\n", self.title));
        block.push_str(&format!("description: {}\n", self.synopsis));
        block.push_str(&format!("publishDate: {}\n", publish_date.format("%Y-%m-%d")));
        block.push_str(&format!("author: {}\n", self.author));
        block.push_str("tags:\n");
        for tag in &self.tags {
            block.push_str(&format!("  - {}\n", tag));
        }
        block.push_str("draft: false\n");
        block.push_str("---\n\n");
        block
    }
}

/// Today's date in Asia/Tokyo.
pub fn today_in_tokyo() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

/// The final post: metadata block, then the story body.
pub fn render_post(frontmatter: &NovelFrontmatter, publish_date: NaiveDate, story: &str) -> String {
    let mut post = frontmatter.render_block(publish_date);
    post.push_str(story);
    post
}

#[cfg(test)]
pub(crate) mod test_frontmatter {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{render_post, NovelFrontmatter};

    pub(crate) fn frontmatter_json() -> serde_json::Value {
        json!({
            "title": "雨の駅長",
            "author": "霧島 透",
            "synopsis": "廃線寸前の駅で、一匹の猫が駅長に任命された。",
            "tags": ["ヒューマンドラマ", "猫", "鉄道"],
            "mood": "ignored"
        })
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let frontmatter: NovelFrontmatter = serde_json::from_value(frontmatter_json()).unwrap();
        assert_eq!("霧島 透", frontmatter.author);
        assert!(frontmatter.validate().is_ok());
    }

    #[test]
    fn test_tag_count_is_validated() {
        let mut frontmatter: NovelFrontmatter = serde_json::from_value(frontmatter_json()).unwrap();
        frontmatter.tags = vec!["猫".to_string()];
        assert!(frontmatter.validate().is_err());
        frontmatter.tags = (0..5).map(|i| i.to_string()).collect();
        assert!(frontmatter.validate().is_err());
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = NovelFrontmatter::response_schema();
        assert_eq!(json!(["title", "author", "synopsis", "tags"]), schema.schema["required"]);
    }

    #[test]
    fn test_render_post() {
        let frontmatter: NovelFrontmatter = serde_json::from_value(frontmatter_json()).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let post = render_post(&frontmatter, date, "本文\n");
        let expected = "---\n\
                        title: 雨の駅長\n\
                        description: 廃線寸前の駅で、一匹の猫が駅長に任命された。\n\
                        publishDate: 2026-01-05\n\
                        author: 霧島 透\n\
                        tags:\n  - ヒューマンドラマ\n  - 猫\n  - 鉄道\n\
                        draft: false\n\
                        ---\n\
                        \n\
                        本文\n";
        assert_eq!(expected, post);
    }
}
