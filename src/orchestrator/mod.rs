//! Run coordination: resolve series, generate, synthesize, persist, log.
//!
//! One [`LessonOrchestrator::run`] call processes its series strictly
//! sequentially, catching per-series failures so one bad series never takes
//! down the rest of the run. Every run ends with an append-only
//! generation-log record, even when it failed before reaching any series.

pub mod budget;

pub use budget::TimeBudget;

use crate::config::{Config, RunConfig};
use crate::db::Database;
use crate::error::Result;
use crate::generator::ContentGenerator;
use crate::providers::{
    HttpSpeechSynthesizer, HttpTextGenerator, HttpTokenSource, SpeechSynthesizer, TextGenerator,
    TokenCache,
};
use crate::rate_limit::RateLimiter;
use crate::storage::{AudioStore, HttpAudioStore, LessonTransaction, PersistOutcome};
use crate::synthesis::AudioSynthesizer;
use crate::types::{
    RunReport, RunStatus, Series, SeriesDisposition, SeriesId, SeriesReport, SeriesSelection,
    TriggerKind,
};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// Parameters for one orchestrator run
#[derive(Clone, Debug)]
pub struct RunRequest {
    /// How the run was triggered
    pub trigger: TriggerKind,
    /// Which series to process
    pub selection: SeriesSelection,
    /// Override of the configured default translation languages
    pub translation_languages: Option<Vec<String>>,
    /// Lesson date override; the current UTC date when absent
    pub date: Option<NaiveDate>,
}

impl RunRequest {
    /// A run over all active series with the configured defaults
    pub fn all_active(trigger: TriggerKind) -> Self {
        Self {
            trigger,
            selection: SeriesSelection::All,
            translation_languages: None,
            date: None,
        }
    }
}

/// Drives the full generation pipeline for a set of series
pub struct LessonOrchestrator {
    db: Database,
    generator: ContentGenerator,
    synthesizer: AudioSynthesizer,
    transaction: LessonTransaction,
    run_config: RunConfig,
    languages: HashMap<String, String>,
    source_label: String,
}

impl LessonOrchestrator {
    /// Wire the HTTP-backed providers and store from configuration
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let text: Arc<dyn TextGenerator> = Arc::new(HttpTextGenerator::new(&config.text)?);
        let tokens = TokenCache::new(
            Arc::new(HttpTokenSource::new(&config.token)?),
            config.token.expiry_margin,
        );
        let speech: Arc<dyn SpeechSynthesizer> =
            Arc::new(HttpSpeechSynthesizer::new(&config.speech, tokens)?);
        let store: Arc<dyn AudioStore> = Arc::new(HttpAudioStore::new(&config.storage)?);

        Ok(Self::with_components(config, db, text, speech, store))
    }

    /// Assemble from injected provider and store implementations
    ///
    /// Embedders and tests substitute doubles here; `new` routes through
    /// this with the HTTP defaults.
    pub fn with_components(
        config: &Config,
        db: Database,
        text: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn AudioStore>,
    ) -> Self {
        let limiter = RateLimiter::new(
            config.speech.requests_per_minute,
            config.speech.rate_buffer,
        );

        Self {
            db: db.clone(),
            generator: ContentGenerator::new(text, &config.text),
            synthesizer: AudioSynthesizer::new(speech, limiter, &config.speech),
            transaction: LessonTransaction::new(db, store),
            run_config: config.run.clone(),
            languages: config.languages.clone(),
            source_label: config.text.model.clone(),
        }
    }

    /// Execute one run and record its generation-log entry
    ///
    /// Per-series failures are caught and reported; only failures before any
    /// series could be resolved surface as `Err`, and even those leave a
    /// failed log record behind.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let started = Instant::now();
        let budget = TimeBudget::start(
            self.run_config.execution_ceiling,
            self.run_config.budget_buffer,
        );
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let languages = request
            .translation_languages
            .clone()
            .unwrap_or_else(|| self.run_config.default_translation_languages.clone());

        tracing::info!(
            trigger = %request.trigger,
            date = %date,
            languages = ?languages,
            "Starting generation run"
        );

        let (series_list, mut reports, mut errors) =
            match self.resolve_series(&request.selection).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    let report = RunReport {
                        trigger: request.trigger,
                        date,
                        status: RunStatus::Failed,
                        duration_ms: started.elapsed().as_millis() as u64,
                        reports: Vec::new(),
                        errors: vec![e.to_string()],
                        series_attempted: 0,
                        lessons_created: 0,
                        audio_files_generated: 0,
                    };
                    self.record_log(&report).await;
                    return Err(e);
                }
            };

        for (index, series) in series_list.iter().enumerate() {
            if index > 0 && !self.run_config.series_pause.is_zero() {
                tokio::time::sleep(self.run_config.series_pause).await;
            }

            let disposition = match self
                .process_series(series, date, &languages, &budget)
                .await
            {
                Ok(disposition) => disposition,
                Err(e) => {
                    let message = e.to_string();
                    tracing::error!(
                        series_id = %series.id,
                        series_name = %series.name,
                        error = %message,
                        "Series failed; continuing with the rest of the run"
                    );
                    errors.push(format!("{}: {}", series.name, message));
                    SeriesDisposition::Failed { error: message }
                }
            };

            reports.push(SeriesReport {
                series_id: series.id,
                series_name: series.name.clone(),
                disposition,
            });
        }

        let lessons_created = reports
            .iter()
            .filter(|r| matches!(r.disposition, SeriesDisposition::Created { .. }))
            .count() as u32;
        let audio_files_generated = reports
            .iter()
            .filter_map(|r| match &r.disposition {
                SeriesDisposition::Created { sentence_count, .. } => Some(*sentence_count),
                _ => None,
            })
            .sum();

        let status = if errors.is_empty() {
            RunStatus::Success
        } else if lessons_created > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        };

        let report = RunReport {
            trigger: request.trigger,
            date,
            status,
            duration_ms: started.elapsed().as_millis() as u64,
            series_attempted: reports.len() as u32,
            reports,
            errors,
            lessons_created,
            audio_files_generated,
        };

        self.record_log(&report).await;

        tracing::info!(
            status = %report.status,
            duration_ms = report.duration_ms,
            "{}",
            report.summary()
        );

        Ok(report)
    }

    /// Resolve the selection into concrete series
    ///
    /// Unknown explicit ids become per-series error reports; the rest of
    /// the run proceeds.
    async fn resolve_series(
        &self,
        selection: &SeriesSelection,
    ) -> Result<(Vec<Series>, Vec<SeriesReport>, Vec<String>)> {
        match selection {
            SeriesSelection::Ids(ids) => {
                let mut found = Vec::with_capacity(ids.len());
                let mut reports = Vec::new();
                let mut errors = Vec::new();

                for id in ids {
                    match self.db.get_series(*id).await? {
                        Some(series) => found.push(series),
                        None => {
                            let message = format!("series {id} not found");
                            tracing::warn!(series_id = %id, "Requested series does not exist");
                            errors.push(message.clone());
                            reports.push(SeriesReport {
                                series_id: *id,
                                series_name: id.to_string(),
                                disposition: SeriesDisposition::Failed { error: message },
                            });
                        }
                    }
                }

                Ok((found, reports, errors))
            }
            SeriesSelection::Batch(batch) => Ok((
                self.db.list_series_by_batch(*batch).await?,
                Vec::new(),
                Vec::new(),
            )),
            SeriesSelection::All => {
                Ok((self.db.list_active_series().await?, Vec::new(), Vec::new()))
            }
        }
    }

    /// Generate, synthesize, and persist one series
    async fn process_series(
        &self,
        series: &Series,
        date: NaiveDate,
        languages: &[String],
        budget: &TimeBudget,
    ) -> Result<SeriesDisposition> {
        let channel = self.db.get_or_create_channel(series).await?;

        if self.db.lesson_exists(channel.id, date).await? {
            tracing::info!(
                series_id = %series.id,
                date = %date,
                "Lesson already exists; skipping"
            );
            return Ok(SeriesDisposition::SkippedExisting);
        }

        let projected = self.run_config.synthesis_call_estimate * series.line_count;
        if let Err(detail) = budget.admit(projected) {
            tracing::warn!(
                series_id = %series.id,
                detail = %detail,
                "Time budget exhausted; skipping series"
            );
            return Ok(SeriesDisposition::SkippedTimeBudget { detail });
        }

        let passage = self.generator.generate_passage(date, series).await?;

        let mut translations = Vec::with_capacity(languages.len());
        for (index, code) in languages.iter().enumerate() {
            if index > 0 && !self.run_config.language_pause.is_zero() {
                tokio::time::sleep(self.run_config.language_pause).await;
            }
            let name = self.language_name(code);
            translations.push(
                self.generator
                    .translate_passage(&passage, code, &name)
                    .await?,
            );
        }

        let clips = self.synthesizer.synthesize_lines(series, &passage.lines).await?;

        match self
            .transaction
            .persist(&channel, date, &self.source_label, &passage, &clips, &translations)
            .await?
        {
            PersistOutcome::Created(persisted) => Ok(SeriesDisposition::Created {
                lesson_id: persisted.lesson_id,
                sentence_count: persisted.sentence_count,
                translation_languages: persisted.translation_languages,
            }),
            // A concurrent run won the uniqueness race after our existence check
            PersistOutcome::AlreadyExists => Ok(SeriesDisposition::SkippedExisting),
        }
    }

    /// Write the generation-log record; never masks the run's own outcome
    async fn record_log(&self, report: &RunReport) {
        let series_ids: Vec<SeriesId> = report.reports.iter().map(|r| r.series_id).collect();
        if let Err(e) = self.db.insert_generation_log(report, &series_ids).await {
            tracing::error!(error = %e, "Failed to record generation log");
        }
    }

    fn language_name(&self, code: &str) -> String {
        self.languages
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}
