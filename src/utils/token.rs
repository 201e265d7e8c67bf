//! Token counting traits and the completion token budget of enhancement passes

pub mod tiktoken;

/// Trait for counting tokens in a string.
pub trait CountToken {
    fn count_token(&self, string: &str) -> usize;
}

/// Blanket impl of CountToken for Fn(&str) -> usize.
impl<F> CountToken for F where F: Fn(&str) -> usize {
    fn count_token(&self, string: &str) -> usize {
        self(string)
    }
}

/// Lower bound of an enhancement pass's completion budget. Reasoning models spend part of it deliberating.
pub const MIN_ENHANCEMENT_COMPLETION_TOKENS: usize = 40_000;
/// Upper bound of an enhancement pass's completion budget.
pub const MAX_ENHANCEMENT_COMPLETION_TOKENS: usize = 200_000;
/// How many completion tokens to allow per token of the story being rewritten.
pub const STORY_TOKEN_MULTIPLIER: usize = 5;

/// The `max_completion_tokens` of one enhancement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhancementBudget {
    pub story_tokens: usize,
    pub prompt_tokens: usize,
    /// `story_tokens * 5 + prompt_tokens`, before clamping
    pub calculated: usize,
    /// `calculated` clamped into `[40_000, 200_000]`
    pub budget: usize,
}

impl EnhancementBudget {
    pub fn new(story_tokens: usize, prompt_tokens: usize) -> Self {
        let calculated = story_tokens
            .saturating_mul(STORY_TOKEN_MULTIPLIER)
            .saturating_add(prompt_tokens);
        let budget = calculated.clamp(MIN_ENHANCEMENT_COMPLETION_TOKENS, MAX_ENHANCEMENT_COMPLETION_TOKENS);
        Self {
            story_tokens,
            prompt_tokens,
            calculated,
            budget,
        }
    }

    /// The budget in the width the completion request takes.
    #[inline]
    pub fn max_completion_tokens(&self) -> u32 {
        // budget never exceeds MAX_ENHANCEMENT_COMPLETION_TOKENS
        self.budget as u32
    }
}

#[cfg(test)]
mod test_token {
    use super::{CountToken, EnhancementBudget};

    #[test]
    fn test_str_len_impl() {
        let counter = str::len;
        let size = counter.count_token("");
        assert_eq!(0, size);
    }

    #[test]
    fn test_budget_floor() {
        let budget = EnhancementBudget::new(0, 0);
        assert_eq!(0, budget.calculated);
        assert_eq!(40_000, budget.budget);

        let budget = EnhancementBudget::new(5_000, 2_000);
        assert_eq!(27_000, budget.calculated);
        assert_eq!(40_000, budget.budget);
    }

    #[test]
    fn test_budget_ceiling() {
        let budget = EnhancementBudget::new(50_000, 1_000);
        assert_eq!(251_000, budget.calculated);
        assert_eq!(200_000, budget.budget);
        assert_eq!(200_000u32, budget.max_completion_tokens());
    }

    #[test]
    fn test_budget_in_range() {
        let budget = EnhancementBudget::new(10_000, 3_000);
        assert_eq!(53_000, budget.calculated);
        assert_eq!(53_000, budget.budget);
    }

    #[test]
    fn test_budget_saturates() {
        let budget = EnhancementBudget::new(usize::MAX, usize::MAX);
        assert_eq!(200_000, budget.budget);
    }
}
