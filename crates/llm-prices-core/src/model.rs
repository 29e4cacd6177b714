use serde::{Deserialize, Serialize};

/// A model as listed by the upstream source: display name plus the
/// provider it is priced under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub display_name: String,
    pub provider: String,
}

impl ModelInfo {
    pub fn new(display_name: &str, provider: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            provider: provider.to_string(),
        }
    }

    /// Normalized identifier used for lookups across sources.
    pub fn normalized_id(&self) -> String {
        normalize_model_name(&self.display_name)
    }
}

/// Normalize a model name for consistent lookups: lowercase, trimmed,
/// spaces and `+` folded to underscores. "GPT-4 Turbo+" -> "gpt-4_turbo_".
pub fn normalize_model_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '+'], "_")
}

/// Case-insensitive provider match, with `"all"` matching everything.
pub fn provider_matches(selector: &str, provider: &str) -> bool {
    selector.eq_ignore_ascii_case("all") || selector.eq_ignore_ascii_case(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_spaces_and_plus() {
        assert_eq!(normalize_model_name("GPT-4 Turbo+"), "gpt-4_turbo_");
        assert_eq!(normalize_model_name("Claude 2.1"), "claude_2.1");
        assert_eq!(normalize_model_name("  Titan Text G1 "), "titan_text_g1");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_model_name("Claude-3 Opus");
        assert_eq!(normalize_model_name(&once), once);
    }

    #[test]
    fn provider_selector_all_matches_everything() {
        assert!(provider_matches("all", "OpenAI"));
        assert!(provider_matches("ALL", "Anthropic"));
        assert!(provider_matches("openai", "OpenAI"));
        assert!(!provider_matches("openai", "Anthropic"));
    }
}
