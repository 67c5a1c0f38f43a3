//! Project domain entities

use crate::approval::RejectionNote;
use crate::core::error::DomainError;
use crate::core::ids::{ConversationHandle, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content category of a book.
///
/// Only affects which foundation questions the synthesizer asks; everything
/// downstream of the foundation is category-agnostic. Unrecognized types are
/// preserved as `Other` and fall back to the educational question template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookType {
    #[default]
    Fiction,
    NonFiction,
    Educational,
    Other(String),
}

impl BookType {
    /// Parse a type label. Never fails: unknown labels become `Other`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fiction" => BookType::Fiction,
            "non-fiction" | "nonfiction" | "non_fiction" => BookType::NonFiction,
            "educational" => BookType::Educational,
            other => BookType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BookType::Fiction => "fiction",
            BookType::NonFiction => "non-fiction",
            BookType::Educational => "educational",
            BookType::Other(label) => label,
        }
    }
}

impl std::fmt::Display for BookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// How chapter generation proceeds once writing is confirmed.
///
/// - **Auto**: chapters chain inside a single turn with a large step budget,
///   no user round-trip between chapters.
/// - **Manual**: exactly one chapter per turn, then a mandatory pause for the
///   user to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Auto,
    Manual,
}

impl GenerationMode {
    pub fn as_str(&self) -> &str {
        match self {
            GenerationMode::Auto => "auto",
            GenerationMode::Manual => "manual",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GenerationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(GenerationMode::Auto),
            "manual" => Ok(GenerationMode::Manual),
            other => Err(DomainError::InvalidMode(other.to_string())),
        }
    }
}

/// Lifecycle status of a project.
///
/// This is *not* the phase — phase is always re-derived from data. Status
/// tracks the single-writer discipline (`Generating`) and failure/resume
/// conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// No turn in flight; ready to start one.
    #[default]
    Idle,
    /// A turn is in flight. A new turn must not start.
    Generating,
    /// Suspended by the caller; resumable.
    Paused,
    /// Last turn failed (runtime error or timeout); resumable while the
    /// retry ceiling has not been reached.
    Failed,
    /// Credit gate rejected the last turn; resumable after top-up.
    NeedsCredits,
    /// All required items are written.
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::Idle => "idle",
            ProjectStatus::Generating => "generating",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Failed => "failed",
            ProjectStatus::NeedsCredits => "needs_credits",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Statuses from which a resume attempt makes sense.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Failed | ProjectStatus::Paused | ProjectStatus::NeedsCredits
        )
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conceptual inputs gathered before structural planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Foundation {
    pub synopsis: String,
    pub themes: Vec<String>,
    pub audience: Option<String>,
    /// Target length in words for the whole book.
    pub target_length: Option<u32>,
    pub genre: Option<String>,
    /// Type-specific fields (e.g. "setting" for fiction, "curriculum_level"
    /// for educational). Kept opaque; only the synthesizer reads them.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub type_fields: HashMap<String, serde_json::Value>,
}

impl Foundation {
    pub fn new(synopsis: impl Into<String>) -> Self {
        Self {
            synopsis: synopsis.into(),
            ..Default::default()
        }
    }

    pub fn with_themes(mut self, themes: Vec<String>) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_target_length(mut self, words: u32) -> Self {
        self.target_length = Some(words);
        self
    }
}

/// The planned chapter outline: count, ordered titles, prologue/epilogue
/// flags, optional part grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookStructure {
    pub chapter_count: u32,
    /// Titles for regular chapters 1..=chapter_count, in order.
    pub chapter_titles: Vec<String>,
    pub has_prologue: bool,
    pub has_epilogue: bool,
    pub words_per_chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<String>,
}

impl BookStructure {
    pub fn new(chapter_count: u32, chapter_titles: Vec<String>) -> Self {
        Self {
            chapter_count,
            chapter_titles,
            ..Default::default()
        }
    }

    pub fn with_prologue(mut self) -> Self {
        self.has_prologue = true;
        self
    }

    pub fn with_epilogue(mut self) -> Self {
        self.has_epilogue = true;
        self
    }

    pub fn with_words_per_chapter(mut self, words: u32) -> Self {
        self.words_per_chapter = Some(words);
        self
    }

    /// Chapter number reserved for the epilogue (valid only if
    /// `has_epilogue`).
    pub fn epilogue_number(&self) -> u32 {
        self.chapter_count + 1
    }

    /// Total items that must be written for the book to be complete:
    /// regular chapters plus prologue and epilogue when present.
    pub fn required_items(&self) -> u32 {
        self.chapter_count + u32::from(self.has_prologue) + u32::from(self.has_epilogue)
    }

    /// Whether `number` addresses a valid slot in this structure.
    /// 0 = prologue, 1..=N regular, N+1 = epilogue.
    pub fn is_valid_number(&self, number: u32) -> bool {
        if number == 0 {
            self.has_prologue
        } else if number <= self.chapter_count {
            true
        } else {
            self.has_epilogue && number == self.epilogue_number()
        }
    }

    /// Planned title for a slot: outline title for regular chapters,
    /// "Prologue"/"Epilogue" for the bookends.
    pub fn title_for(&self, number: u32) -> Option<String> {
        if number == 0 && self.has_prologue {
            Some("Prologue".to_string())
        } else if number >= 1 && number <= self.chapter_count {
            self.chapter_titles
                .get((number - 1) as usize)
                .cloned()
                .or_else(|| Some(format!("Chapter {}", number)))
        } else if self.has_epilogue && number == self.epilogue_number() {
            Some("Epilogue".to_string())
        } else {
            None
        }
    }
}

/// One book generation effort (Entity, aggregate root).
///
/// The phase of a project is always computable from
/// `{foundation, structure, mode, chapters}` alone; `current_step` is a
/// coarse advisory label kept for display and diagnostics, never trusted for
/// control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub book_type: BookType,
    pub mode: GenerationMode,
    /// Advisory label describing what was last completed. Display only.
    pub current_step: Option<String>,
    pub foundation: Option<Foundation>,
    pub structure: Option<BookStructure>,
    /// Set once the user confirms the start of chapter writing
    /// (the ApprovalToStart gate).
    pub writing_confirmed: bool,
    pub status: ProjectStatus,
    pub credits_used: u64,
    /// Opaque handle to the external agent's conversation thread.
    pub conversation: Option<ConversationHandle>,
    /// Most recent rejected approval, surfaced into the next turn's
    /// instructions so the agent can revise.
    pub last_rejection: Option<RejectionNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, book_type: BookType, mode: GenerationMode) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            book_type,
            mode,
            current_step: None,
            foundation: None,
            structure: None,
            writing_confirmed: false,
            status: ProjectStatus::Idle,
            credits_used: 0,
            conversation: None,
            last_rejection: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores the foundation (concept data).
    pub fn set_foundation(&mut self, foundation: Foundation) {
        self.foundation = Some(foundation);
        self.touch();
    }

    /// Stores the structure. Fails if no foundation exists yet — structure
    /// without foundation is a data-integrity violation, not a valid state.
    pub fn set_structure(&mut self, structure: BookStructure) -> Result<(), DomainError> {
        if self.foundation.is_none() {
            return Err(DomainError::MalformedProject(
                "structure cannot be saved before foundation".to_string(),
            ));
        }
        self.structure = Some(structure);
        self.touch();
        Ok(())
    }

    /// Records the user's confirmation to start chapter writing.
    pub fn confirm_writing(&mut self) {
        self.writing_confirmed = true;
        self.touch();
    }

    /// Acquires the single-writer generating flag. Returns `false` if a turn
    /// is already in flight.
    pub fn try_begin_generating(&mut self) -> bool {
        if self.status == ProjectStatus::Generating {
            return false;
        }
        self.status = ProjectStatus::Generating;
        self.touch();
        true
    }

    /// Releases the generating flag back to idle.
    pub fn finish_generating(&mut self) {
        if self.status == ProjectStatus::Generating {
            self.status = ProjectStatus::Idle;
            self.touch();
        }
    }

    /// Marks the project failed (runtime error or timeout mid-turn).
    pub fn fail(&mut self) {
        self.status = ProjectStatus::Failed;
        self.touch();
    }

    /// Marks the project as blocked on credits.
    pub fn needs_credits(&mut self) {
        self.status = ProjectStatus::NeedsCredits;
        self.touch();
    }

    /// Marks the project completed.
    pub fn complete(&mut self) {
        self.status = ProjectStatus::Completed;
        self.current_step = Some("complete".to_string());
        self.touch();
    }

    pub fn record_credits(&mut self, amount: u64) {
        self.credits_used += amount;
        self.touch();
    }

    pub fn set_conversation(&mut self, handle: ConversationHandle) {
        self.conversation = Some(handle);
        self.touch();
    }

    pub fn set_current_step(&mut self, step: impl Into<String>) {
        self.current_step = Some(step.into());
        self.touch();
    }

    pub fn record_rejection(&mut self, note: RejectionNote) {
        self.last_rejection = Some(note);
        self.touch();
    }

    pub fn clear_rejection(&mut self) {
        self.last_rejection = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
