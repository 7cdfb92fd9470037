//! Core types for lessoncast

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a series
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SeriesId(pub Uuid);

impl SeriesId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner Uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SeriesId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SeriesId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a channel
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner Uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ChannelId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ChannelId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a lesson
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct LessonId(pub Uuid);

impl LessonId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner Uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for LessonId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LessonId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LessonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LessonId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a sentence
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SentenceId(pub Uuid);

impl SentenceId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner Uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for SentenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SentenceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SentenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SentenceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Difficulty tier a series generates content for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Short sentences, high-frequency vocabulary
    #[default]
    Beginner,
    /// Everyday vocabulary with compound sentences
    Intermediate,
    /// Idiomatic language and longer clauses
    Advanced,
}

impl Difficulty {
    /// Stable string form used in storage and prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Parse the stored string form, defaulting to Beginner for unknown values
    pub fn from_db(value: &str) -> Self {
        match value {
            "intermediate" => Difficulty::Intermediate,
            "advanced" => Difficulty::Advanced,
            _ => Difficulty::Beginner,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generation configuration for one recurring lesson template.
///
/// Immutable during a run; edited out-of-band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Unique series id
    pub id: SeriesId,
    /// Display name
    pub name: String,
    /// Thematic concept the passages revolve around
    pub concept: String,
    /// Target number of content lines per lesson
    pub line_count: u32,
    /// Difficulty tier
    pub difficulty: Difficulty,
    /// Style prompt for the default voice
    pub voice_prompt: Option<String>,
    /// Style prompt for the alternate voice
    pub alt_voice_prompt: Option<String>,
    /// Alternate voices line-by-line for a two-speaker cadence
    pub alternate_voices: bool,
    /// Default voice identifier
    pub default_voice: Option<String>,
    /// Alternate voice identifier
    pub alternate_voice: Option<String>,
    /// Extra instructions appended to the generation prompt
    pub extra_instructions: Option<String>,
    /// Batch tag (1-100) for grouping series into trigger batches
    pub batch: Option<u8>,
    /// Whether the series participates in "all active" runs
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new series
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSeries {
    /// Display name
    pub name: String,
    /// Thematic concept
    pub concept: String,
    /// Target content-line count
    pub line_count: u32,
    /// Difficulty tier
    pub difficulty: Difficulty,
    /// Style prompt for the default voice
    pub voice_prompt: Option<String>,
    /// Style prompt for the alternate voice
    pub alt_voice_prompt: Option<String>,
    /// Alternate voices line-by-line
    pub alternate_voices: bool,
    /// Default voice identifier
    pub default_voice: Option<String>,
    /// Alternate voice identifier
    pub alternate_voice: Option<String>,
    /// Extra generation instructions
    pub extra_instructions: Option<String>,
    /// Batch tag (1-100)
    pub batch: Option<u8>,
    /// Active flag
    pub active: bool,
}

impl Default for NewSeries {
    fn default() -> Self {
        Self {
            name: String::new(),
            concept: String::new(),
            line_count: 5,
            difficulty: Difficulty::Beginner,
            voice_prompt: None,
            alt_voice_prompt: None,
            alternate_voices: false,
            default_voice: None,
            alternate_voice: None,
            extra_instructions: None,
            batch: None,
            active: true,
        }
    }
}

/// Publication point bound 1:1 to a series, created lazily on first generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique channel id
    pub id: ChannelId,
    /// Owning series
    pub series_id: SeriesId,
    /// Display name, taken from the series at creation time
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One generated, dated unit of content belonging to a channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique lesson id
    pub id: LessonId,
    /// Owning channel
    pub channel_id: ChannelId,
    /// Lesson title, the first parsed line of the passage
    pub title: String,
    /// Source descriptor recording where the content came from
    pub source: String,
    /// Publication date
    pub lesson_date: NaiveDate,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One ordered line of a lesson with its audio artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Unique sentence id
    pub id: SentenceId,
    /// Owning lesson
    pub lesson_id: LessonId,
    /// 0-based position within the lesson
    pub order_index: u32,
    /// English text of the line
    pub text: String,
    /// Public URL of the synthesized audio
    pub audio_url: String,
    /// Estimated duration in seconds
    pub duration_secs: f64,
    /// Voice identifier the audio was synthesized with
    pub voice: String,
}

/// A parsed passage from the text-generation provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Lesson title, the first parsed line
    pub title: String,
    /// Ordered content lines
    pub lines: Vec<String>,
}

/// A passage translated into one target language
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslatedPassage {
    /// Language code (e.g., "ja")
    pub language: String,
    /// Translated title
    pub title: String,
    /// Translated lines, positionally matched to the source passage
    pub lines: Vec<String>,
}

/// One synthesized audio clip for a single line
#[derive(Clone, Debug, PartialEq)]
pub struct LineAudio {
    /// Decoded audio bytes
    pub audio: Vec<u8>,
    /// Estimated duration in seconds
    pub duration_secs: f64,
    /// Voice identifier actually used
    pub voice: String,
}

/// How a run was triggered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Cron-driven trigger authenticated with the cron secret
    Scheduled,
    /// Operator-driven trigger authenticated with the API secret
    Manual,
}

impl TriggerKind {
    /// Stable string form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Scheduled => "scheduled",
            TriggerKind::Manual => "manual",
        }
    }

    /// Parse the stored string form, defaulting to Manual for unknown values
    pub fn from_db(value: &str) -> Self {
        match value {
            "scheduled" => TriggerKind::Scheduled,
            _ => TriggerKind::Manual,
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate outcome of one orchestrator run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every attempted series either succeeded or was legitimately skipped
    Success,
    /// At least one series succeeded and at least one errored
    Partial,
    /// At least one series errored and none succeeded
    Failed,
}

impl RunStatus {
    /// Stable string form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    /// Parse the stored string form, defaulting to Failed for unknown values
    pub fn from_db(value: &str) -> Self {
        match value {
            "success" => RunStatus::Success,
            "partial" => RunStatus::Partial,
            _ => RunStatus::Failed,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which series a run should process
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeriesSelection {
    /// Explicit series ids (takes precedence over everything else)
    Ids(Vec<SeriesId>),
    /// All series carrying this batch tag
    Batch(u8),
    /// All active series
    All,
}

/// What happened to one series during a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeriesDisposition {
    /// A lesson was generated and persisted
    Created {
        /// Id of the created lesson
        lesson_id: LessonId,
        /// Number of sentences persisted
        sentence_count: u32,
        /// Translation languages actually stored
        translation_languages: Vec<String>,
    },
    /// A lesson already existed for this date and channel
    SkippedExisting,
    /// Not enough execution time remained to start the series
    SkippedTimeBudget {
        /// Human-readable budget summary
        detail: String,
    },
    /// The series errored; the run continued with the rest
    Failed {
        /// The error message, verbatim
        error: String,
    },
}

/// Per-series result recorded in the run report and the generation log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeriesReport {
    /// The series this report is about
    pub series_id: SeriesId,
    /// Series display name
    pub series_name: String,
    /// What happened
    #[serde(flatten)]
    pub disposition: SeriesDisposition,
}

/// Structured outcome of one orchestrator run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// How the run was triggered
    pub trigger: TriggerKind,
    /// The date lessons were generated for
    pub date: NaiveDate,
    /// Aggregate status
    pub status: RunStatus,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
    /// Per-series results in processing order
    pub reports: Vec<SeriesReport>,
    /// Every per-series error message, verbatim
    pub errors: Vec<String>,
    /// Number of series the run attempted to process
    pub series_attempted: u32,
    /// Number of lessons created
    pub lessons_created: u32,
    /// Number of audio artifacts uploaded
    pub audio_files_generated: u32,
}

impl RunReport {
    /// One-line summary of the run, used in the HTTP response and logs
    pub fn summary(&self) -> String {
        let created = self.lessons_created;
        let skipped_existing = self
            .reports
            .iter()
            .filter(|r| matches!(r.disposition, SeriesDisposition::SkippedExisting))
            .count();
        let skipped_budget = self
            .reports
            .iter()
            .filter(|r| matches!(r.disposition, SeriesDisposition::SkippedTimeBudget { .. }))
            .count();
        let failed = self.errors.len();

        let mut parts = vec![format!("{created} created")];
        if skipped_existing > 0 {
            parts.push(format!("{skipped_existing} skipped (existing)"));
        }
        if skipped_budget > 0 {
            parts.push(format!("{skipped_budget} skipped (time budget)"));
        }
        if failed > 0 {
            parts.push(format!("{failed} failed"));
        }
        format!(
            "Processed {} series for {}: {}",
            self.series_attempted,
            self.date,
            parts.join(", ")
        )
    }
}

/// One append-only record of an orchestrator run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationLogEntry {
    /// Unique log entry id
    #[schema(value_type = String)]
    pub id: Uuid,
    /// How the run was triggered
    pub trigger: TriggerKind,
    /// Series ids the run attempted
    pub series_ids: Vec<SeriesId>,
    /// Aggregate status
    pub status: RunStatus,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Per-series results
    pub results: Vec<SeriesReport>,
    /// Every error message, verbatim
    pub errors: Vec<String>,
    /// Number of series attempted
    pub series_attempted: u32,
    /// Number of lessons created
    pub lessons_created: u32,
    /// Number of audio artifacts uploaded
    pub audio_files_generated: u32,
    /// When the run finished
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}
