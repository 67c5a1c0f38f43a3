//! Project status use case
//!
//! Read-only snapshot of where a project stands: derived phase, progress
//! counts, open approval, resumability. Safe to call at any time because
//! phase resolution has no side effects.

use crate::ports::project_store::{ProjectStore, StoreError};
use bookwright_domain::{
    Chapter, DomainError, PendingApproval, Phase, PhaseResolver, Project,
    phase::resolver::written_items,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything a caller needs to display a project.
#[derive(Debug)]
pub struct ProjectStatusReport {
    pub project: Project,
    pub chapters: Vec<Chapter>,
    /// Derived phase, or the integrity error when the data is malformed.
    pub phase: Result<Phase, DomainError>,
    pub written_items: u32,
    pub required_items: u32,
    pub pending_approval: Option<PendingApproval>,
}

impl ProjectStatusReport {
    pub fn progress_fraction(&self) -> f64 {
        if self.required_items == 0 {
            0.0
        } else {
            f64::from(self.written_items) / f64::from(self.required_items)
        }
    }
}

/// Use case for inspecting a project.
pub struct StatusUseCase<S: ProjectStore> {
    store: Arc<S>,
}

impl<S: ProjectStore> StatusUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn report(
        &self,
        project_id: &bookwright_domain::ProjectId,
    ) -> Result<ProjectStatusReport, StatusError> {
        let project = self.store.load_project(project_id).await?;
        let chapters = self.store.load_chapters(project_id).await?;
        let pending_approval = self.store.pending_approval(project_id).await?;

        let phase = PhaseResolver::resolve(&project, &chapters);
        let (written, required) = match &project.structure {
            Some(structure) => (
                written_items(structure, &chapters),
                structure.required_items(),
            ),
            None => (0, 0),
        };

        Ok(ProjectStatusReport {
            project,
            chapters,
            phase,
            written_items: written,
            required_items: required,
            pending_approval,
        })
    }

    pub async fn list(&self) -> Result<Vec<Project>, StatusError> {
        Ok(self.store.list_projects().await?)
    }
}
