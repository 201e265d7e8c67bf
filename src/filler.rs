use crate::prompt::PartialPrompt;
use anyhow::Result;

/// Anything that fills one or more placeholders of a [PartialPrompt].
pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &Vec<String>;
}

pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}
