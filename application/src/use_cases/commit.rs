//! Tool-call commit semantics
//!
//! Maps each tool call the agent makes onto its store mutation. This is the
//! single place where a call's arguments are validated and turned into an
//! effect; the turn executor and the approval gate both commit through here,
//! so an approved call lands exactly as a non-gated one would have.

use bookwright_domain::{
    BookStructure, Chapter, DomainError, Foundation, Project, ToolCall, tool_names,
};
use thiserror::Error;

/// Errors while committing a tool call.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

impl CommitError {
    fn bad_args(tool: &str, message: impl Into<String>) -> Self {
        CommitError::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Fatal commit errors mean the stored data needs repair; everything
    /// else is a discardable bad call.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CommitError::Domain(e) if e.is_fatal())
    }
}

/// What a committed call did. Returned so callers can checkpoint and notify
/// without re-inspecting arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CommittedEffect {
    FoundationSaved,
    StructureSaved { chapter_count: u32 },
    WritingConfirmed,
    ChapterSaved { number: u32, word_count: u32 },
    QuestionAsked { question: String },
}

impl CommittedEffect {
    /// Checkpoint step label for this effect, or `None` for effects that do
    /// not represent durable progress.
    pub fn checkpoint_step(&self) -> Option<String> {
        match self {
            CommittedEffect::FoundationSaved => Some("foundation".to_string()),
            CommittedEffect::StructureSaved { .. } => Some("structure".to_string()),
            CommittedEffect::WritingConfirmed => Some("writing_confirmed".to_string()),
            CommittedEffect::ChapterSaved { number, .. } => Some(format!("chapter_{}", number)),
            CommittedEffect::QuestionAsked { .. } => None,
        }
    }
}

/// Applies one tool call to in-memory project state.
///
/// Pure with respect to the store: the caller persists `project` and
/// `chapters` afterwards. Unknown tools fail with
/// [`DomainError::UnknownTool`]; the executor discards those calls.
pub fn apply_tool_call(
    project: &mut Project,
    chapters: &mut Vec<Chapter>,
    call: &ToolCall,
) -> Result<CommittedEffect, CommitError> {
    match call.tool_name.as_str() {
        tool_names::SAVE_FOUNDATION => apply_save_foundation(project, call),
        tool_names::SAVE_STRUCTURE => apply_save_structure(project, call),
        tool_names::SAVE_CHAPTER => apply_save_chapter(project, chapters, call),
        tool_names::CONFIRM_START => {
            project.confirm_writing();
            Ok(CommittedEffect::WritingConfirmed)
        }
        tool_names::ASK_USER => {
            let question = call
                .get_string("question")
                .unwrap_or("The agent needs your input.")
                .to_string();
            Ok(CommittedEffect::QuestionAsked { question })
        }
        other => Err(DomainError::UnknownTool(other.to_string()).into()),
    }
}

fn apply_save_foundation(
    project: &mut Project,
    call: &ToolCall,
) -> Result<CommittedEffect, CommitError> {
    let synopsis = call
        .require_string("synopsis")
        .map_err(|m| CommitError::bad_args(tool_names::SAVE_FOUNDATION, m))?;

    let mut foundation = Foundation::new(synopsis);
    if let Some(themes) = call.get_string_array("themes") {
        foundation.themes = themes;
    }
    if let Some(audience) = call.get_string("audience") {
        foundation.audience = Some(audience.to_string());
    }
    if let Some(genre) = call.get_string("genre") {
        foundation.genre = Some(genre.to_string());
    }
    if let Some(target) = call.get_u32("target_length") {
        foundation.target_length = Some(target);
    }

    // Anything beyond the known keys is type-specific and kept opaque.
    const KNOWN: [&str; 5] = ["synopsis", "themes", "audience", "genre", "target_length"];
    for (key, value) in &call.arguments {
        if !KNOWN.contains(&key.as_str()) {
            foundation.type_fields.insert(key.clone(), value.clone());
        }
    }

    project.set_foundation(foundation);
    Ok(CommittedEffect::FoundationSaved)
}

fn apply_save_structure(
    project: &mut Project,
    call: &ToolCall,
) -> Result<CommittedEffect, CommitError> {
    let chapter_count = call
        .require_u32("chapter_count")
        .map_err(|m| CommitError::bad_args(tool_names::SAVE_STRUCTURE, m))?;

    // A zero-chapter structure would make the project unresolvable; refuse
    // at the door instead of persisting malformed data.
    if chapter_count == 0 {
        return Err(CommitError::bad_args(
            tool_names::SAVE_STRUCTURE,
            "chapter_count must be at least 1",
        ));
    }

    let titles = call.get_string_array("chapter_titles").unwrap_or_default();
    if titles.len() as u32 > chapter_count {
        return Err(CommitError::bad_args(
            tool_names::SAVE_STRUCTURE,
            format!(
                "{} titles given for {} chapters",
                titles.len(),
                chapter_count
            ),
        ));
    }

    let mut structure = BookStructure::new(chapter_count, titles);
    if call.get_bool("has_prologue").unwrap_or(false) {
        structure = structure.with_prologue();
    }
    if call.get_bool("has_epilogue").unwrap_or(false) {
        structure = structure.with_epilogue();
    }
    if let Some(words) = call.get_u32("words_per_chapter") {
        structure = structure.with_words_per_chapter(words);
    }

    project.set_structure(structure)?;
    Ok(CommittedEffect::StructureSaved { chapter_count })
}

fn apply_save_chapter(
    project: &mut Project,
    chapters: &mut Vec<Chapter>,
    call: &ToolCall,
) -> Result<CommittedEffect, CommitError> {
    let number = call
        .require_u32("number")
        .map_err(|m| CommitError::bad_args(tool_names::SAVE_CHAPTER, m))?;
    let content = call
        .require_string("content")
        .map_err(|m| CommitError::bad_args(tool_names::SAVE_CHAPTER, m))?;

    let Some(structure) = &project.structure else {
        return Err(DomainError::MalformedProject(
            "chapter saved before structure".to_string(),
        )
        .into());
    };

    if !structure.is_valid_number(number) {
        return Err(DomainError::InvalidChapterNumber {
            number,
            reason: "not a slot in this book's structure".to_string(),
        }
        .into());
    }

    let title = call
        .get_string("title")
        .map(str::to_string)
        .or_else(|| structure.title_for(number))
        .unwrap_or_else(|| format!("Chapter {}", number));

    // Same number revises in place; it never duplicates.
    let word_count = match chapters.iter_mut().find(|c| c.number == number) {
        Some(existing) => {
            existing.title = title;
            existing.revise(content);
            existing.word_count
        }
        None => {
            let chapter = Chapter::new(number, title, content);
            let words = chapter.word_count;
            chapters.push(chapter);
            words
        }
    };

    Ok(CommittedEffect::ChapterSaved { number, word_count })
}
