//! Per-phase instruction templates.
//!
//! Each phase has one fixed template, parameterized by project data. Keeping
//! them in one place makes the agent-facing wording easy to audit.

use crate::approval::RejectionNote;
use crate::phase::resolver::PhaseResolver;
use crate::project::chapter::Chapter;
use crate::project::entities::{BookType, GenerationMode, Project};

/// Builds the natural-language instructions for each phase.
pub struct DirectiveTemplate;

impl DirectiveTemplate {
    /// Foundation phase: gather the book's concept through targeted
    /// questions, then persist it with `save_foundation`.
    pub fn foundation(project: &Project) -> String {
        let questions = Self::foundation_questions(&project.book_type)
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are helping plan a {book_type} book. Nothing has been decided yet.

Work with the user to settle the book's foundation. Cover these points, one or two at a time rather than all at once:
{questions}

When the foundation is settled, call save_foundation with the synopsis, themes, intended audience, genre, and target length in words. If anything essential is still unclear, use ask_user instead of guessing."#,
            book_type = project.book_type,
            questions = questions,
        )
    }

    /// Structure phase: turn the foundation into a chapter outline and
    /// persist it with `save_structure`.
    pub fn structure(project: &Project) -> String {
        let synopsis = project
            .foundation
            .as_ref()
            .map(|f| f.synopsis.clone())
            .unwrap_or_default();
        let target = project
            .foundation
            .as_ref()
            .and_then(|f| f.target_length)
            .map(|w| format!("The user wants roughly {} words in total.", w))
            .unwrap_or_else(|| "No target length was set.".to_string());

        format!(
            r#"The book's foundation is settled. Synopsis:

{synopsis}

{target}

Propose a chapter structure: how many chapters, their titles in order, and whether the book should open with a prologue or close with an epilogue. Discuss it with the user via ask_user until they are satisfied, then call save_structure with the chapter count, the ordered list of titles, and the prologue/epilogue flags."#,
            synopsis = synopsis,
            target = target,
        )
    }

    /// ApprovalToStart phase: summarize the plan and obtain an explicit
    /// go-ahead via `confirm_start`.
    pub fn approval_to_start(project: &Project, mode: GenerationMode) -> String {
        let outline = Self::outline_summary(project);
        let mode_line = match mode {
            GenerationMode::Auto => {
                "Writing will run in auto mode: chapters are drafted back to back without pausing."
            }
            GenerationMode::Manual => {
                "Writing will run in manual mode: one chapter at a time, pausing for the user after each."
            }
        };

        format!(
            r#"Planning is done and writing has not started. The agreed structure:

{outline}

{mode_line}

Present this summary to the user. If they want changes, relay them with ask_user. If they are ready, call confirm_start — do not begin writing any chapter content yourself in this turn."#,
            outline = outline,
            mode_line = mode_line,
        )
    }

    /// AutoGeneration phase: chain through the remaining slots in order.
    pub fn auto_generation(project: &Project, chapters: &[Chapter]) -> String {
        let progress = Self::progress_summary(project, chapters);
        format!(
            r#"{progress}

Write the remaining parts of the book in order, calling save_chapter after finishing each one with its number, title, and full content. Keep each part consistent with the synopsis and everything already written. Continue to the next part immediately after saving; only stop early if you genuinely need the user's input, in which case use ask_user."#,
            progress = progress,
        )
    }

    /// ManualGeneration phase: write exactly one slot, then stop.
    pub fn manual_generation(project: &Project, chapters: &[Chapter]) -> String {
        let progress = Self::progress_summary(project, chapters);
        format!(
            r#"{progress}

Write only the next unwritten part listed above, then call save_chapter with its number, title, and full content. Save exactly one part this turn and stop — the user reviews between chapters. Use ask_user if you need direction before writing."#,
            progress = progress,
        )
    }

    /// Complete phase: nothing left to write.
    pub fn complete(project: &Project, chapters: &[Chapter]) -> String {
        let total_words: u32 = chapters.iter().map(|c| c.word_count).sum();
        let title_hint = project
            .foundation
            .as_ref()
            .map(|f| f.synopsis.clone())
            .unwrap_or_default();
        format!(
            r#"The book is complete: every planned part has been written, {total_words} words in total.

Synopsis for reference:
{title_hint}

Do not write or modify any chapters. Answer the user's questions about the finished book, and use ask_user if they raise something that needs their clarification."#,
            total_words = total_words,
            title_hint = title_hint,
        )
    }

    /// Appended when the previous turn's gated call was rejected, so the
    /// agent revises instead of repeating itself.
    pub fn rejection_addendum(note: &RejectionNote) -> String {
        match &note.reason {
            Some(reason) => format!(
                "\n\nNote: your previous {} call was rejected by the user for this reason: {}. Address it before trying again.",
                note.tool_name, reason
            ),
            None => format!(
                "\n\nNote: your previous {} call was rejected by the user. Take a different approach before trying again.",
                note.tool_name
            ),
        }
    }

    /// Question checklist per book type. Unknown types get the educational
    /// set, which is the most generic.
    fn foundation_questions(book_type: &BookType) -> &'static [&'static str] {
        match book_type {
            BookType::Fiction => &[
                "What is the central premise or conflict?",
                "Who are the main characters and what do they want?",
                "Where and when is the story set?",
                "What genre and tone should it have?",
                "Who is the intended reader, and roughly how long should the book be?",
            ],
            BookType::NonFiction => &[
                "What is the book's core argument or subject?",
                "What does the reader know before, and what should they know after?",
                "What evidence, stories, or case studies will carry the argument?",
                "Who is the intended reader, and roughly how long should the book be?",
            ],
            BookType::Educational | BookType::Other(_) => &[
                "What subject does the book teach, and to what level?",
                "What should the learner be able to do after finishing?",
                "What prior knowledge can be assumed?",
                "Should chapters include exercises or worked examples?",
                "Who is the intended reader, and roughly how long should the book be?",
            ],
        }
    }

    /// One line per planned slot, used by the start-approval summary.
    fn outline_summary(project: &Project) -> String {
        let Some(structure) = &project.structure else {
            return "(no structure recorded)".to_string();
        };
        let mut lines = Vec::new();
        if structure.has_prologue {
            lines.push("Prologue".to_string());
        }
        for (index, title) in structure.chapter_titles.iter().enumerate() {
            lines.push(format!("Chapter {}: {}", index + 1, title));
        }
        for number in (structure.chapter_titles.len() as u32 + 1)..=structure.chapter_count {
            lines.push(format!("Chapter {}", number));
        }
        if structure.has_epilogue {
            lines.push("Epilogue".to_string());
        }
        lines.join("\n")
    }

    /// Where the book stands: what is written, what comes next.
    fn progress_summary(project: &Project, chapters: &[Chapter]) -> String {
        let Some(structure) = &project.structure else {
            return "(no structure recorded)".to_string();
        };
        let synopsis = project
            .foundation
            .as_ref()
            .map(|f| f.synopsis.clone())
            .unwrap_or_default();

        let written = crate::phase::resolver::written_items(structure, chapters);
        let required = structure.required_items();

        let last_line = match PhaseResolver::last_written_regular(structure, chapters) {
            Some(n) => {
                let title = structure.title_for(n).unwrap_or_else(|| format!("Chapter {}", n));
                format!("Last completed regular chapter: {} ({}).", n, title)
            }
            None => "No regular chapters are written yet.".to_string(),
        };

        let next_line = match PhaseResolver::next_slot(structure, chapters) {
            Some(number) => {
                let title = structure
                    .title_for(number)
                    .unwrap_or_else(|| format!("Chapter {}", number));
                let label = if number == 0 {
                    "the Prologue".to_string()
                } else if structure.has_epilogue && number == structure.epilogue_number() {
                    "the Epilogue".to_string()
                } else {
                    format!("Chapter {} ({})", number, title)
                };
                format!("Next to write: {}.", label)
            }
            None => "Every planned part is written.".to_string(),
        };

        let words_line = structure
            .words_per_chapter
            .map(|w| format!("Aim for roughly {} words per chapter.", w))
            .unwrap_or_default();

        format!(
            r#"You are writing a book. Synopsis:

{synopsis}

Outline:
{outline}

Progress: {written} of {required} parts written. {last_line} {next_line}
{words_line}"#,
            synopsis = synopsis,
            outline = Self::outline_summary(project),
            written = written,
            required = required,
            last_line = last_line,
            next_line = next_line,
            words_line = words_line,
        )
    }
}
