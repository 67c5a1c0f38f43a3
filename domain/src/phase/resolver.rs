//! Pure phase derivation from persisted project state.

use super::Phase;
use crate::core::error::DomainError;
use crate::project::chapter::Chapter;
use crate::project::entities::{BookStructure, Project};

/// Derives the current phase from stored data.
///
/// Total and deterministic: for a fixed `(project, chapters)` input the same
/// phase comes back every time, with no side effects, so it can be called
/// freely for diagnostics and status display.
pub struct PhaseResolver;

impl PhaseResolver {
    /// Resolve the phase. Checked in order, first match wins:
    ///
    /// 1. No foundation → Foundation
    /// 2. No structure → Structure
    /// 3. Structure present, nothing written, start not confirmed →
    ///    ApprovalToStart (carrying the mode)
    /// 4. Auto mode, items remain → AutoGeneration
    /// 5. Manual mode, items remain → ManualGeneration
    /// 6. All required items written → Complete
    ///
    /// A structure with `chapter_count == 0` while a foundation exists is a
    /// data-integrity fault and fails with
    /// [`DomainError::MalformedProject`] rather than guessing.
    pub fn resolve(project: &Project, chapters: &[Chapter]) -> Result<Phase, DomainError> {
        if project.foundation.is_none() {
            return Ok(Phase::Foundation);
        }

        let Some(structure) = &project.structure else {
            return Ok(Phase::Structure);
        };

        if structure.chapter_count == 0 {
            return Err(DomainError::MalformedProject(
                "structure has chapter_count 0".to_string(),
            ));
        }

        let written = written_items(structure, chapters);

        if written == 0 && !project.writing_confirmed {
            return Ok(Phase::ApprovalToStart(project.mode));
        }

        if written < structure.required_items() {
            return Ok(match project.mode {
                crate::project::entities::GenerationMode::Auto => Phase::AutoGeneration,
                crate::project::entities::GenerationMode::Manual => Phase::ManualGeneration,
            });
        }

        Ok(Phase::Complete)
    }

    /// The next unwritten slot in writing order: prologue first when present,
    /// then regular chapters in order, then the epilogue. `None` when the
    /// book is complete.
    pub fn next_slot(structure: &BookStructure, chapters: &[Chapter]) -> Option<u32> {
        if structure.has_prologue && !slot_written(chapters, 0) {
            return Some(0);
        }
        for number in 1..=structure.chapter_count {
            if !slot_written(chapters, number) {
                return Some(number);
            }
        }
        if structure.has_epilogue && !slot_written(chapters, structure.epilogue_number()) {
            return Some(structure.epilogue_number());
        }
        None
    }

    /// Highest-numbered written regular chapter, for "last completed"
    /// reporting in instructions.
    pub fn last_written_regular(structure: &BookStructure, chapters: &[Chapter]) -> Option<u32> {
        (1..=structure.chapter_count)
            .filter(|n| slot_written(chapters, *n))
            .max()
    }
}

/// Count of written items toward completion.
///
/// Regular chapters and the prologue always count; the epilogue counts only
/// once every regular chapter is written, so a stray early epilogue cannot
/// make a half-finished book look complete.
pub fn written_items(structure: &BookStructure, chapters: &[Chapter]) -> u32 {
    let regular_written = (1..=structure.chapter_count)
        .filter(|n| slot_written(chapters, *n))
        .count() as u32;

    let prologue_written =
        u32::from(structure.has_prologue && slot_written(chapters, 0));

    let all_regular_written = regular_written == structure.chapter_count;
    let epilogue_written = u32::from(
        structure.has_epilogue
            && all_regular_written
            && slot_written(chapters, structure.epilogue_number()),
    );

    regular_written + prologue_written + epilogue_written
}

fn slot_written(chapters: &[Chapter], number: u32) -> bool {
    chapters
        .iter()
        .any(|c| c.number == number && c.is_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::entities::{BookType, Foundation, GenerationMode};

    fn project(mode: GenerationMode) -> Project {
        Project::new("p1", BookType::Fiction, mode)
    }

    fn written(number: u32) -> Chapter {
        Chapter::new(number, format!("Chapter {}", number), "Some actual words here.")
    }

    #[test]
    fn test_new_project_resolves_to_foundation() {
        let project = project(GenerationMode::Auto);
        let phase = PhaseResolver::resolve(&project, &[]).unwrap();
        assert_eq!(phase, Phase::Foundation);
    }

    #[test]
    fn test_foundation_without_structure_resolves_to_structure() {
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        let phase = PhaseResolver::resolve(&project, &[]).unwrap();
        assert_eq!(phase, Phase::Structure);
    }

    #[test]
    fn test_structure_without_chapters_needs_start_approval() {
        let mut project = project(GenerationMode::Manual);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(5, vec![])).unwrap();
        let phase = PhaseResolver::resolve(&project, &[]).unwrap();
        assert_eq!(phase, Phase::ApprovalToStart(GenerationMode::Manual));
    }

    #[test]
    fn test_confirmed_project_generates() {
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(5, vec![])).unwrap();
        project.confirm_writing();
        let phase = PhaseResolver::resolve(&project, &[]).unwrap();
        assert_eq!(phase, Phase::AutoGeneration);
    }

    #[test]
    fn test_manual_mode_generates_manually() {
        let mut project = project(GenerationMode::Manual);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(5, vec![])).unwrap();
        let chapters = vec![written(1)];
        let phase = PhaseResolver::resolve(&project, &chapters).unwrap();
        assert_eq!(phase, Phase::ManualGeneration);
    }

    #[test]
    fn test_written_chapters_skip_start_approval_even_unconfirmed() {
        // A project with written chapters but no confirmation flag is in a
        // generation phase, not back at the approval gate.
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(5, vec![])).unwrap();
        let chapters = vec![written(1)];
        let phase = PhaseResolver::resolve(&project, &chapters).unwrap();
        assert_eq!(phase, Phase::AutoGeneration);
    }

    #[test]
    fn test_unwritten_prologue_blocks_completion() {
        // 5 of 5 regular chapters written but prologue missing: not complete.
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project
            .set_structure(BookStructure::new(5, vec![]).with_prologue())
            .unwrap();
        let chapters: Vec<Chapter> = (1..=5).map(written).collect();
        let phase = PhaseResolver::resolve(&project, &chapters).unwrap();
        assert_eq!(phase, Phase::AutoGeneration);
    }

    #[test]
    fn test_all_items_written_is_complete() {
        let mut project = project(GenerationMode::Manual);
        project.set_foundation(Foundation::new("A story"));
        project
            .set_structure(BookStructure::new(3, vec![]).with_prologue().with_epilogue())
            .unwrap();
        let chapters: Vec<Chapter> = [0, 1, 2, 3, 4].iter().map(|n| written(*n)).collect();
        let phase = PhaseResolver::resolve(&project, &chapters).unwrap();
        assert_eq!(phase, Phase::Complete);
    }

    #[test]
    fn test_early_epilogue_does_not_count() {
        // Epilogue written before the regular chapters: counts for nothing
        // until chapters 1..=3 exist.
        let structure = BookStructure::new(3, vec![]).with_epilogue();
        let chapters = vec![written(4), written(1)];
        assert_eq!(written_items(&structure, &chapters), 1);

        let all = vec![written(1), written(2), written(3), written(4)];
        assert_eq!(written_items(&structure, &all), 4);
    }

    #[test]
    fn test_empty_content_chapter_does_not_count() {
        let structure = BookStructure::new(2, vec![]);
        let chapters = vec![Chapter::new(1, "Stub", ""), written(2)];
        assert_eq!(written_items(&structure, &chapters), 1);
    }

    #[test]
    fn test_zero_chapter_count_is_malformed() {
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(0, vec![])).unwrap();
        let result = PhaseResolver::resolve(&project, &[]);
        assert!(matches!(result, Err(DomainError::MalformedProject(_))));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut project = project(GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(2, vec![])).unwrap();
        let chapters = vec![written(1)];
        let first = PhaseResolver::resolve(&project, &chapters).unwrap();
        for _ in 0..10 {
            assert_eq!(PhaseResolver::resolve(&project, &chapters).unwrap(), first);
        }
    }

    #[test]
    fn test_next_slot_order_prologue_first() {
        let structure = BookStructure::new(3, vec![]).with_prologue().with_epilogue();
        assert_eq!(PhaseResolver::next_slot(&structure, &[]), Some(0));

        let with_prologue = vec![written(0)];
        assert_eq!(PhaseResolver::next_slot(&structure, &with_prologue), Some(1));

        let mid = vec![written(0), written(1), written(2)];
        assert_eq!(PhaseResolver::next_slot(&structure, &mid), Some(3));

        let regulars_done = vec![written(0), written(1), written(2), written(3)];
        assert_eq!(PhaseResolver::next_slot(&structure, &regulars_done), Some(4));

        let all = vec![written(0), written(1), written(2), written(3), written(4)];
        assert_eq!(PhaseResolver::next_slot(&structure, &all), None);
    }

    #[test]
    fn test_next_slot_honors_gaps() {
        let structure = BookStructure::new(4, vec![]);
        let chapters = vec![written(1), written(3)];
        assert_eq!(PhaseResolver::next_slot(&structure, &chapters), Some(2));
    }

    #[test]
    fn test_last_written_regular() {
        let structure = BookStructure::new(5, vec![]);
        assert_eq!(PhaseResolver::last_written_regular(&structure, &[]), None);
        let chapters = vec![written(1), written(2)];
        assert_eq!(
            PhaseResolver::last_written_regular(&structure, &chapters),
            Some(2)
        );
    }
}
