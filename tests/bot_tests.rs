mod common;

use common::{FakeProvider, Harness};
use wikichat::bot::route::MAX_TOKEN_BYTES;
use wikichat::bot::ui_builder::to_keyboard;
use wikichat::bot::{ArticleAction, Outcome, Route};
use wikichat::circuit_breaker::CircuitBreaker;
use wikichat::config::{ProviderConfig, RecoveryConfig, RenderConfig};
use teloxide::types::InlineKeyboardButtonKind;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_buttons_round_trip(outcome: &Outcome) {
        let keyboard = to_keyboard(&outcome.screen);
        for button in keyboard.inline_keyboard.iter().flatten() {
            let InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
                panic!("expected callback button, got {:?}", button.kind);
            };
            assert!(data.len() <= MAX_TOKEN_BYTES, "token too long: {data}");
            assert!(data.parse::<Route>().is_ok(), "token does not decode: {data}");
        }
    }

    /// Every button drawn along a full session decodes back into a route
    #[tokio::test]
    async fn test_every_screen_has_valid_tokens() {
        let harness = Harness::new(FakeProvider::with_turing());

        let mut outcomes = vec![harness.text("/start").await];
        outcomes.push(harness.press(Route::PickLanguage("en".to_string())).await);
        outcomes.push(harness.text("Turing").await);
        outcomes.push(harness.press(Route::PickResult(0)).await);
        outcomes.push(harness.press(Route::Article(ArticleAction::Languages)).await);
        outcomes.push(harness.press(Route::BackToArticle).await);
        outcomes.push(harness.press(Route::Article(ArticleAction::Read)).await);
        outcomes.push(harness.press(Route::TranslateSectionMenu(0)).await);
        outcomes.push(harness.press(Route::TranslateSection(0, "ko".to_string())).await);
        outcomes.push(harness.press(Route::BackToArticle).await);
        outcomes.push(harness.press(Route::TranslateTo("ja".to_string())).await);
        outcomes.push(harness.press(Route::ReadTranslation).await);

        for outcome in &outcomes {
            assert!(!outcome.screen.text.is_empty());
            assert!(outcome.screen.text.chars().count() <= RenderConfig::default().max_message_chars);
            assert_buttons_round_trip(outcome);
        }
    }

    /// Test configuration defaults
    #[test]
    fn test_config_defaults() {
        let provider = ProviderConfig::default();
        assert_eq!(provider.search_limit, 10);
        assert!(provider.translate_chunk_chars <= 5000);
        assert!(provider.recovery.max_retries <= 10); // Reasonable upper bound

        let render = RenderConfig::default();
        assert!(render.max_message_chars <= 4096); // Telegram message limit
        assert!(render.button_label_chars < render.max_message_chars);
    }

    /// The breaker opens after the configured number of failures
    #[test]
    fn test_circuit_breaker_threshold() {
        let breaker = CircuitBreaker::new(RecoveryConfig {
            circuit_breaker_threshold: 2,
            ..RecoveryConfig::default()
        });

        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
    }
}
