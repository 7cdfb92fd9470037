//! Content generation: prompts, passage generation, translation.
//!
//! [`ContentGenerator`] drives the text provider twice per lesson: once for
//! the English passage and once per target language for its translation.
//! Both calls run under the retry policy; all structure in the provider's
//! free-text answers is recovered by [`parse::parse_passage`].

pub mod parse;

use crate::config::TextProviderConfig;
use crate::error::{Error, GenerationError, Result};
use crate::providers::TextGenerator;
use crate::retry::{RetryPolicy, with_retry};
use crate::types::{Passage, Series, TranslatedPassage};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::sync::Arc;

/// Produces titled, line-segmented passages and their translations
pub struct ContentGenerator {
    provider: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
}

impl ContentGenerator {
    /// Wrap a text provider with the retry settings from its configuration
    pub fn new(provider: Arc<dyn TextGenerator>, config: &TextProviderConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(config.max_retries, config.base_delay),
        }
    }

    /// Generate the English passage for a series on the given date
    ///
    /// The passage targets the series line count with short lines of 10-20
    /// words; the count is a prompt target, not a guarantee, so callers take
    /// the parsed line count as authoritative.
    pub async fn generate_passage(&self, date: NaiveDate, series: &Series) -> Result<Passage> {
        let prompt = generation_prompt(date, series);

        tracing::info!(
            series_id = %series.id,
            series_name = %series.name,
            line_count = series.line_count,
            difficulty = %series.difficulty,
            "Generating passage"
        );

        let raw = with_retry(&self.retry, "text.generate", || {
            self.provider.generate(&prompt)
        })
        .await
        .map_err(Error::Provider)?;

        let passage = parse::parse_passage(&raw, "passage generation")?;

        tracing::info!(
            series_id = %series.id,
            title = %passage.title,
            lines = passage.lines.len(),
            "Passage generated"
        );

        Ok(passage)
    }

    /// Translate a passage into one target language
    ///
    /// `language_name` is the display name used in the prompt (e.g.
    /// "Japanese" for code "ja"). A translation whose line count differs
    /// from the source is accepted; consumers match lines positionally up
    /// to the shorter length.
    pub async fn translate_passage(
        &self,
        passage: &Passage,
        language_code: &str,
        language_name: &str,
    ) -> Result<TranslatedPassage> {
        let prompt = translation_prompt(passage, language_name);
        let operation = format!("{language_code} translation");

        let raw = with_retry(&self.retry, "text.translate", || {
            self.provider.generate(&prompt)
        })
        .await
        .map_err(Error::Provider)?;

        let parsed = parse::parse_passage(&raw, &operation)?;

        if parsed.lines.len() != passage.lines.len() {
            tracing::warn!(
                language = language_code,
                source_lines = passage.lines.len(),
                translated_lines = parsed.lines.len(),
                "Translation line count differs from source; matching positionally"
            );
        }

        Ok(TranslatedPassage {
            language: language_code.to_string(),
            title: parsed.title,
            lines: parsed.lines,
        })
    }
}

/// Build the passage-generation prompt for a series
fn generation_prompt(date: NaiveDate, series: &Series) -> String {
    let mut prompt = format!(
        "Write a short English passage for a language-learning lesson dated {date}.\n\
         Theme: {concept}\n\
         Learner level: {difficulty}\n\n\
         Rules:\n\
         - The first line is a short, engaging title.\n\
         - Then write exactly {count} content lines.\n\
         - Each content line is one complete sentence of 10 to 20 words.\n\
         - One sentence per line, no numbering, no blank lines, no markdown.\n",
        date = date,
        concept = series.concept,
        difficulty = series.difficulty,
        count = series.line_count,
    );

    if let Some(extra) = series
        .extra_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        let _ = write!(prompt, "\nAdditional instructions:\n{}\n", extra.trim());
    }

    prompt
}

/// Build the translation prompt for a parsed passage
fn translation_prompt(passage: &Passage, language_name: &str) -> String {
    let mut prompt = format!(
        "Translate this English lesson into fluent, natural {language_name}.\n\
         Keep exactly the same number of lines in the same order.\n\
         The first line is the title. Output only the translation, one line\n\
         per source line, no numbering and no commentary.\n\n\
         {title}\n",
        language_name = language_name,
        title = passage.title,
    );

    for (index, line) in passage.lines.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", index + 1, line);
    }

    prompt
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider double that records prompts and replays canned responses
    struct ScriptedProvider {
        prompts: Mutex<Vec<String>>,
        responses: Mutex<Vec<std::result::Result<String, ProviderError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<std::result::Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(String::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn test_series() -> Series {
        Series {
            id: crate::types::SeriesId::new(),
            name: "Morning Commute".into(),
            concept: "scenes from a daily train commute".into(),
            line_count: 5,
            difficulty: crate::types::Difficulty::Beginner,
            voice_prompt: None,
            alt_voice_prompt: None,
            alternate_voices: false,
            default_voice: None,
            alternate_voice: None,
            extra_instructions: None,
            batch: None,
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn generator(provider: Arc<ScriptedProvider>) -> ContentGenerator {
        ContentGenerator::new(
            provider,
            &TextProviderConfig {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
                ..TextProviderConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn generation_prompt_embeds_series_configuration() {
        let provider = ScriptedProvider::new(vec![Ok(
            "The Platform\nThe train slides in at exactly nine.\nWe shuffle forward with our bags."
                .to_string(),
        )]);
        let r#gen = generator(provider.clone());

        let passage = r#gen.generate_passage(date(), &test_series()).await.unwrap();
        assert_eq!(passage.title, "The Platform");
        assert_eq!(passage.lines.len(), 2);

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("scenes from a daily train commute"));
        assert!(prompts[0].contains("beginner"));
        assert!(prompts[0].contains("exactly 5 content lines"));
        assert!(prompts[0].contains("2025-06-01"));
    }

    #[tokio::test]
    async fn extra_instructions_are_appended_when_present() {
        let provider = ScriptedProvider::new(vec![Ok("T\nA line.".to_string())]);
        let r#gen = generator(provider.clone());

        let mut series = test_series();
        series.extra_instructions = Some("Mention the weather in every lesson.".to_string());
        r#gen.generate_passage(date(), &series).await.unwrap();

        assert!(provider.prompts()[0].contains("Mention the weather in every lesson."));
    }

    #[tokio::test]
    async fn empty_provider_response_surfaces_as_generation_error() {
        let provider = ScriptedProvider::new(vec![Ok(String::new())]);
        let r#gen = generator(provider);

        let err = r#gen
            .generate_passage(date(), &test_series())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Generation(GenerationError::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    async fn transient_provider_failure_is_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::new(
                ProviderErrorKind::Unavailable,
                "HTTP 503",
            )),
            Ok("T\nRecovered on the second try.".to_string()),
        ]);
        let r#gen = generator(provider.clone());

        let passage = r#gen.generate_passage(date(), &test_series()).await.unwrap();
        assert_eq!(passage.lines, vec!["Recovered on the second try."]);
        assert_eq!(provider.prompts().len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_provider_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::new(
            ProviderErrorKind::Unauthorized,
            "bad key",
        ))]);
        let r#gen = generator(provider.clone());

        let err = r#gen
            .generate_passage(date(), &test_series())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(provider.prompts().len(), 1, "fatal errors call once");
    }

    #[tokio::test]
    async fn translation_prompt_numbers_the_source_lines() {
        let provider = ScriptedProvider::new(vec![Ok(
            "朝のホーム\n電車が9時ちょうどに入ってくる。\n私たちは鞄を持って前へ進む。".to_string(),
        )]);
        let r#gen = generator(provider.clone());

        let passage = Passage {
            title: "The Platform".into(),
            lines: vec![
                "The train slides in at exactly nine.".into(),
                "We shuffle forward with our bags.".into(),
            ],
        };
        let translated = r#gen
            .translate_passage(&passage, "ja", "Japanese")
            .await
            .unwrap();

        assert_eq!(translated.language, "ja");
        assert_eq!(translated.title, "朝のホーム");
        assert_eq!(translated.lines.len(), 2);

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Japanese"));
        assert!(prompt.contains("The Platform"));
        assert!(prompt.contains("1. The train slides in at exactly nine."));
        assert!(prompt.contains("2. We shuffle forward with our bags."));
    }

    #[tokio::test]
    async fn translation_with_fewer_lines_is_accepted() {
        let provider = ScriptedProvider::new(vec![Ok("Titre\nUne seule ligne.".to_string())]);
        let r#gen = generator(provider);

        let passage = Passage {
            title: "Title".into(),
            lines: vec!["First.".into(), "Second.".into(), "Third.".into()],
        };
        let translated = r#gen
            .translate_passage(&passage, "fr", "French")
            .await
            .unwrap();
        assert_eq!(
            translated.lines.len(),
            1,
            "mismatched counts are accepted, matched positionally downstream"
        );
    }

    #[tokio::test]
    async fn unparseable_translation_names_the_language_in_the_error() {
        let provider = ScriptedProvider::new(vec![Ok("Only a title".to_string())]);
        let r#gen = generator(provider);

        let passage = Passage {
            title: "Title".into(),
            lines: vec!["A line.".into()],
        };
        let err = r#gen
            .translate_passage(&passage, "ja", "Japanese")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ja translation"));
    }
}
