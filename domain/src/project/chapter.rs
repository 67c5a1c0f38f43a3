//! Chapter entity: one generated unit of content.

use serde::{Deserialize, Serialize};

/// Review status of a chapter under the post-hoc review model: chapters are
/// saved as drafts immediately and approved (or revised) afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    #[default]
    Draft,
    Approved,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChapterStatus::Draft => "draft",
            ChapterStatus::Approved => "approved",
        }
    }
}

impl std::fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One generated unit of content.
///
/// `number` addresses a slot in the book's structure: 0 is the prologue,
/// 1..=N are regular chapters, N+1 is the epilogue. Numbers are unique per
/// project; a later save with the same number revises (bumps `version`), it
/// never duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub content: String,
    pub word_count: u32,
    pub status: ChapterStatus,
    pub version: u32,
}

impl Chapter {
    pub fn new(number: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = count_words(&content);
        Self {
            number,
            title: title.into(),
            content,
            word_count,
            status: ChapterStatus::Draft,
            version: 1,
        }
    }

    /// A chapter counts as written only when it has non-empty content and a
    /// positive word count. A bare title placeholder does not count.
    pub fn is_written(&self) -> bool {
        !self.content.is_empty() && self.word_count > 0
    }

    /// Replaces the content, recounts words, bumps the version, and drops
    /// back to draft for re-review.
    pub fn revise(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.word_count = count_words(&self.content);
        self.version += 1;
        self.status = ChapterStatus::Draft;
    }

    /// Marks the draft as accepted.
    pub fn approve(&mut self) {
        self.status = ChapterStatus::Approved;
    }
}

/// Whitespace word count. Good enough for progress accounting; the exact
/// number is advisory.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
