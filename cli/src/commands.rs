//! Command definitions and handlers.

use anyhow::{Result, bail};
use bookwright_application::ports::project_store::ProjectStore;
use bookwright_application::{
    ApprovalGateUseCase, ResumeUseCase, RunTurnUseCase, StatusUseCase, TurnFailureKind,
};
use bookwright_domain::{BookType, GenerationMode, Project, ProjectId};
use bookwright_infrastructure::{HttpAgentRuntime, JsonFileStore};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookwright", version, about = "Agent-driven book generation")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long, global = true)]
    pub no_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new book project
    New(NewArgs),
    /// List all projects
    List,
    /// Show a project's status
    Status(ProjectArgs),
    /// Run one turn of generation
    Run(RunArgs),
    /// Approve the pending tool call
    Approve(ProjectArgs),
    /// Reject the pending tool call
    Reject(RejectArgs),
    /// Accept a draft chapter
    AcceptChapter(ChapterArgs),
    /// Send a chapter back for revision
    ReviseChapter(ReviseArgs),
    /// Pause a project
    Pause(ProjectArgs),
    /// Resume a paused or failed project and run the next turn
    #[command(visible_alias = "retry")]
    Resume(ProjectArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Project identifier (becomes its directory name)
    pub id: String,

    /// Book type: fiction, non-fiction, educational, or anything else
    #[arg(long, default_value = "fiction")]
    pub book_type: String,

    /// Generation mode: auto or manual
    #[arg(long, default_value = "auto")]
    pub mode: String,
}

#[derive(Args)]
pub struct ProjectArgs {
    /// Project identifier
    pub id: String,
}

#[derive(Args)]
pub struct RunArgs {
    /// Project identifier
    pub id: String,

    /// The user's message for this turn
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct RejectArgs {
    /// Project identifier
    pub id: String,

    /// Why the call is rejected (surfaced to the agent next turn)
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct ChapterArgs {
    /// Project identifier
    pub id: String,

    /// Chapter number (0 = prologue, N+1 = epilogue)
    pub number: u32,
}

#[derive(Args)]
pub struct ReviseArgs {
    /// Project identifier
    pub id: String,

    /// Chapter number
    pub number: u32,

    /// What to change
    #[arg(long)]
    pub notes: String,
}

pub async fn new_project(store: &JsonFileStore, args: NewArgs) -> Result<()> {
    let mode: GenerationMode = args
        .mode
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let book_type = BookType::parse(&args.book_type);
    let project = Project::new(args.id.as_str(), book_type.clone(), mode);
    store.create_project(&project).await?;
    println!(
        "Created project '{}' ({}, {} mode). Run `bookwright run {}` to start.",
        args.id, book_type, mode, args.id
    );
    Ok(())
}

pub async fn list_projects(status: &StatusUseCase<JsonFileStore>) -> Result<()> {
    let projects = status.list().await?;
    if projects.is_empty() {
        println!("No projects yet. Create one with `bookwright new <id>`.");
        return Ok(());
    }
    for project in projects {
        println!(
            "{:<24} {:<12} {:<8} credits used: {}",
            project.id, project.status, project.mode, project.credits_used
        );
    }
    Ok(())
}

pub async fn status(status: &StatusUseCase<JsonFileStore>, args: ProjectArgs) -> Result<()> {
    let report = status.report(&ProjectId::new(args.id)).await?;

    println!("Project:  {}", report.project.id);
    println!("Type:     {}", report.project.book_type);
    println!("Mode:     {}", report.project.mode);
    println!("Status:   {}", report.project.status);
    match &report.phase {
        Ok(phase) => println!("Phase:    {}", phase),
        Err(e) => println!("Phase:    unresolvable ({})", e),
    }
    if report.required_items > 0 {
        println!(
            "Progress: {}/{} parts written",
            report.written_items, report.required_items
        );
    }
    for chapter in &report.chapters {
        println!(
            "  [{}] {:<30} {} words, v{}, {}",
            chapter.number, chapter.title, chapter.word_count, chapter.version, chapter.status
        );
    }
    if let Some(pending) = &report.pending_approval {
        println!(
            "Awaiting approval: {} (use `bookwright approve` or `bookwright reject`)",
            pending.tool_name()
        );
    }
    if let Some(note) = &report.project.last_rejection {
        println!(
            "Last rejection: {} ({})",
            note.tool_name,
            note.reason.as_deref().unwrap_or("no reason given")
        );
    }
    Ok(())
}

pub async fn run<C>(
    use_case: &RunTurnUseCase<JsonFileStore, HttpAgentRuntime, C>,
    args: RunArgs,
) -> Result<()>
where
    C: bookwright_application::ports::credit_gate::CreditGate,
{
    let id = ProjectId::new(args.id);
    let result = use_case.run(&id, args.input.as_deref()).await?;

    for effect in &result.committed {
        println!("committed: {:?}", effect);
    }
    for question in &result.questions {
        println!("\nThe agent asks: {}", question);
        println!("Answer with `bookwright run {} --input \"...\"`", id);
    }
    if let Some(pending) = &result.pending_approval {
        println!(
            "\nApproval needed for {}. Use `bookwright approve {}` or `bookwright reject {}`.",
            pending.tool_name(),
            id,
            id
        );
    }

    match result.failure {
        None => {
            println!("\nPhase: {}", result.phase);
            Ok(())
        }
        Some(failure) => {
            let hint = match failure.kind {
                TurnFailureKind::ApprovalPending => "resolve the pending approval first",
                TurnFailureKind::Busy => "wait for the running turn to finish",
                TurnFailureKind::InsufficientCredits => "top up credits, then `bookwright resume`",
                TurnFailureKind::Runtime | TurnFailureKind::Timeout => {
                    "`bookwright resume` will retry from the last checkpoint"
                }
                TurnFailureKind::MalformedProject => "the stored project data needs manual repair",
            };
            bail!("turn failed ({}): {} — {}", failure.kind.as_str(), failure.message, hint)
        }
    }
}

pub async fn approve(gate: &ApprovalGateUseCase<JsonFileStore>, args: ProjectArgs) -> Result<()> {
    let effect = gate.approve(&ProjectId::new(args.id)).await?;
    println!("Approved and committed: {:?}", effect);
    Ok(())
}

pub async fn reject(gate: &ApprovalGateUseCase<JsonFileStore>, args: RejectArgs) -> Result<()> {
    let note = gate
        .reject(&ProjectId::new(args.id), args.reason)
        .await?;
    println!(
        "Rejected {}. The agent will be told next turn.",
        note.tool_name
    );
    Ok(())
}

pub async fn accept_chapter(
    gate: &ApprovalGateUseCase<JsonFileStore>,
    args: ChapterArgs,
) -> Result<()> {
    let chapter = gate
        .accept_chapter(&ProjectId::new(args.id), args.number)
        .await?;
    println!("Accepted chapter {} ({}).", chapter.number, chapter.title);
    Ok(())
}

pub async fn revise_chapter(
    gate: &ApprovalGateUseCase<JsonFileStore>,
    args: ReviseArgs,
) -> Result<()> {
    gate.request_chapter_revision(&ProjectId::new(args.id.clone()), args.number, args.notes)
        .await?;
    println!(
        "Revision requested for chapter {}. Run `bookwright run {}` to have it rewritten.",
        args.number, args.id
    );
    Ok(())
}

pub async fn pause(resume: &ResumeUseCase<JsonFileStore>, args: ProjectArgs) -> Result<()> {
    resume.pause(&ProjectId::new(args.id.clone())).await?;
    println!("Paused {}.", args.id);
    Ok(())
}

pub async fn resume<C>(
    resume_uc: &ResumeUseCase<JsonFileStore>,
    run_turn: &RunTurnUseCase<JsonFileStore, HttpAgentRuntime, C>,
    args: ProjectArgs,
) -> Result<()>
where
    C: bookwright_application::ports::credit_gate::CreditGate,
{
    let id = args.id.clone();
    let state = resume_uc.resume(&ProjectId::new(id.clone())).await?;
    println!(
        "Resumed {} (attempt {} of {}); continuing from {}.",
        id,
        state.retry_count,
        bookwright_domain::MAX_RESUME_ATTEMPTS,
        state
            .last_checkpoint
            .as_ref()
            .map(|c| c.step.as_str())
            .unwrap_or("the beginning")
    );

    // Resume immediately re-runs the turn the failure interrupted.
    run(run_turn, RunArgs { id, input: None }).await
}
