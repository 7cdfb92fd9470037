//! Per-line audio synthesis with voice alternation.
//!
//! [`AudioSynthesizer`] turns the ordered English lines of a passage into one
//! clip per line, strictly in order and never in parallel. Every call goes
//! through the shared [`RateLimiter`] and the retry policy; one line failing
//! after retries aborts the whole passage, because sentence order integrity
//! is an invariant and a silently skipped line would break it.

use crate::config::SpeechProviderConfig;
use crate::error::{Error, Result};
use crate::providers::SpeechSynthesizer;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryPolicy, with_retry};
use crate::types::{LineAudio, Series};
use std::sync::Arc;

/// Voice used when alternation is on but the series names no alternate
pub const DEFAULT_ALTERNATE_VOICE: &str = "Puck";

/// Voice used when the series names no default
pub const DEFAULT_VOICE: &str = "Kore";

/// Speaking-rate heuristic for duration estimates, in words per second
const WORDS_PER_SECOND: f64 = 2.5;

/// Voice and style prompt selected for one line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceChoice<'a> {
    /// Voice identifier passed to the provider
    pub voice: &'a str,
    /// Optional style prompt steering delivery
    pub style_prompt: Option<&'a str>,
}

/// Pick the voice for a line by index parity
///
/// Alternation off: every line gets the default voice and default prompt.
/// Alternation on: even indices get the default pair, odd indices the
/// alternate pair, giving a two-speaker conversational cadence.
pub fn voice_for_line(series: &Series, index: usize) -> VoiceChoice<'_> {
    let default = VoiceChoice {
        voice: series.default_voice.as_deref().unwrap_or(DEFAULT_VOICE),
        style_prompt: series.voice_prompt.as_deref(),
    };

    if !series.alternate_voices || index % 2 == 0 {
        default
    } else {
        VoiceChoice {
            voice: series
                .alternate_voice
                .as_deref()
                .unwrap_or(DEFAULT_ALTERNATE_VOICE),
            style_prompt: series.alt_voice_prompt.as_deref(),
        }
    }
}

/// Estimate clip duration from word count, with a one-second floor
pub fn estimate_duration_secs(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    (words as f64 / WORDS_PER_SECOND).max(1.0)
}

/// Synthesizes one clip per passage line through the rate limiter
pub struct AudioSynthesizer {
    provider: Arc<dyn SpeechSynthesizer>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl AudioSynthesizer {
    /// Wrap a speech provider with the configured pacing and retry settings
    pub fn new(
        provider: Arc<dyn SpeechSynthesizer>,
        limiter: RateLimiter,
        config: &SpeechProviderConfig,
    ) -> Self {
        Self {
            provider,
            limiter,
            retry: RetryPolicy::new(config.max_retries, config.base_delay),
        }
    }

    /// Synthesize every line of a passage, in order
    ///
    /// Returns one [`LineAudio`] per input line. The rate limiter's wait runs
    /// before each call; its first-call exemption keeps the opening line
    /// prompt. Any line failing after retries aborts the whole batch.
    pub async fn synthesize_lines(
        &self,
        series: &Series,
        lines: &[String],
    ) -> Result<Vec<LineAudio>> {
        let mut clips = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let choice = voice_for_line(series, index);

            self.limiter.wait_if_needed().await;

            tracing::debug!(
                series_id = %series.id,
                line = index,
                voice = choice.voice,
                "Synthesizing line"
            );

            let audio = with_retry(&self.retry, "speech.synthesize", || {
                self.provider
                    .synthesize(line, choice.voice, choice.style_prompt)
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    series_id = %series.id,
                    line = index,
                    error = %e,
                    "Line synthesis failed; aborting passage audio"
                );
                Error::Provider(e)
            })?;

            clips.push(LineAudio {
                audio,
                duration_secs: estimate_duration_secs(line),
                voice: choice.voice.to_string(),
            });
        }

        tracing::info!(
            series_id = %series.id,
            clips = clips.len(),
            "Passage audio synthesized"
        );

        Ok(clips)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct RecordingSynth {
        calls: Mutex<Vec<(String, String, Option<String>)>>,
        fail_at_call: Option<u32>,
        call_count: AtomicU32,
    }

    impl RecordingSynth {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_at_call: None,
                call_count: AtomicU32::new(0),
            })
        }

        fn failing_from(call: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_at_call: Some(call),
                call_count: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> Vec<(String, String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(
            &self,
            text: &str,
            voice: &str,
            style_prompt: Option<&str>,
        ) -> std::result::Result<Vec<u8>, ProviderError> {
            let n = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push((
                text.to_string(),
                voice.to_string(),
                style_prompt.map(str::to_string),
            ));
            if let Some(fail_at) = self.fail_at_call
                && n >= fail_at
            {
                return Err(ProviderError::new(
                    ProviderErrorKind::Unavailable,
                    "model overloaded",
                ));
            }
            Ok(format!("audio:{text}").into_bytes())
        }
    }

    fn series(alternate: bool) -> Series {
        Series {
            id: crate::types::SeriesId::new(),
            name: "Cafe Stories".into(),
            concept: "conversations in a cafe".into(),
            line_count: 4,
            difficulty: crate::types::Difficulty::Beginner,
            voice_prompt: Some("speak warmly".into()),
            alt_voice_prompt: Some("speak briskly".into()),
            alternate_voices: alternate,
            default_voice: Some("Kore".into()),
            alternate_voice: Some("Charon".into()),
            extra_instructions: None,
            batch: None,
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    fn synthesizer(provider: Arc<RecordingSynth>) -> AudioSynthesizer {
        AudioSynthesizer::new(
            provider,
            RateLimiter::new(6000, Duration::ZERO),
            &SpeechProviderConfig {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
                ..SpeechProviderConfig::default()
            },
        )
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Line number {i}.")).collect()
    }

    #[test]
    fn alternation_off_uses_the_default_voice_everywhere() {
        let s = series(false);
        for index in 0..6 {
            let choice = voice_for_line(&s, index);
            assert_eq!(choice.voice, "Kore");
            assert_eq!(choice.style_prompt, Some("speak warmly"));
        }
    }

    #[test]
    fn alternation_on_splits_by_index_parity() {
        let s = series(true);
        for index in 0..6 {
            let choice = voice_for_line(&s, index);
            if index % 2 == 0 {
                assert_eq!(choice.voice, "Kore");
                assert_eq!(choice.style_prompt, Some("speak warmly"));
            } else {
                assert_eq!(choice.voice, "Charon");
                assert_eq!(choice.style_prompt, Some("speak briskly"));
            }
        }
    }

    #[test]
    fn unset_voices_fall_back_to_fixed_defaults() {
        let mut s = series(true);
        s.default_voice = None;
        s.alternate_voice = None;
        assert_eq!(voice_for_line(&s, 0).voice, DEFAULT_VOICE);
        assert_eq!(voice_for_line(&s, 1).voice, DEFAULT_ALTERNATE_VOICE);
    }

    #[test]
    fn alternation_counts_split_ceil_floor() {
        let s = series(true);
        let n = 7;
        let default_count = (0..n).filter(|i| voice_for_line(&s, *i).voice == "Kore").count();
        let alternate_count = (0..n)
            .filter(|i| voice_for_line(&s, *i).voice == "Charon")
            .count();
        assert_eq!(default_count, n.div_ceil(2));
        assert_eq!(alternate_count, n / 2);
    }

    #[test]
    fn duration_estimate_is_words_over_rate_with_floor() {
        // 10 words / 2.5 wps = 4 seconds
        let text = "one two three four five six seven eight nine ten";
        assert!((estimate_duration_secs(text) - 4.0).abs() < f64::EPSILON);

        // A single word clamps to the one-second floor
        assert!((estimate_duration_secs("hi") - 1.0).abs() < f64::EPSILON);
        assert!((estimate_duration_secs("") - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn lines_are_synthesized_in_order_with_their_voices() {
        let provider = RecordingSynth::new();
        let synth = synthesizer(provider.clone());

        let clips = synth
            .synthesize_lines(&series(true), &lines(4))
            .await
            .unwrap();

        assert_eq!(clips.len(), 4);
        let calls = provider.calls();
        assert_eq!(calls[0].0, "Line number 0.");
        assert_eq!(calls[3].0, "Line number 3.");
        assert_eq!(calls[0].1, "Kore");
        assert_eq!(calls[1].1, "Charon");
        assert_eq!(calls[2].1, "Kore");
        assert_eq!(calls[3].1, "Charon");

        assert_eq!(clips[0].voice, "Kore");
        assert_eq!(clips[1].voice, "Charon");
        assert_eq!(clips[0].audio, b"audio:Line number 0.");
        assert!(clips.iter().all(|c| c.duration_secs >= 1.0));
    }

    #[tokio::test]
    async fn one_failing_line_aborts_the_whole_passage() {
        // Call index 2 (third line) starts failing and exhausts its 1 retry
        let provider = RecordingSynth::failing_from(2);
        let synth = synthesizer(provider.clone());

        let err = synth
            .synthesize_lines(&series(false), &lines(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));

        // 2 successes + initial attempt + 1 retry on the failing line
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_are_paced_by_the_shared_limiter() {
        let provider = RecordingSynth::new();
        let limiter = RateLimiter::new(60, Duration::from_secs(1)); // 2s gap
        let synth = AudioSynthesizer::new(
            provider.clone(),
            limiter,
            &SpeechProviderConfig {
                max_retries: 0,
                ..SpeechProviderConfig::default()
            },
        );

        let start = tokio::time::Instant::now();
        synth
            .synthesize_lines(&series(false), &lines(3))
            .await
            .unwrap();

        // First call free, then two enforced 2s gaps
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn empty_line_list_yields_no_clips() {
        let provider = RecordingSynth::new();
        let synth = synthesizer(provider.clone());

        let clips = synth.synthesize_lines(&series(false), &[]).await.unwrap();
        assert!(clips.is_empty());
        assert!(provider.calls().is_empty());
    }
}
