//! FocusBlox CLI - Command-line front end for the FocusBlox task core
//! Composition root: configuration, logging, DI wiring, commands.

mod config;
mod output;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Table;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use focusblox_core::application::{transfer, LocalTaskSource, PlanningService};
use focusblox_core::domain::{Importance, RecurrencePattern, TaskType, Urgency};
use focusblox_core::port::id_provider::UuidProvider;
use focusblox_core::port::time_provider::SystemTimeProvider;
use focusblox_core::port::{
    TaskDraft, TaskPatch, TaskRepository, TaskSource, TaskSourceWritable, TimeProvider,
};
use focusblox_infra_sqlite::{create_pool, database_url, run_migrations, SqliteTaskRepository};
use focusblox_infra_system::DebugLog;

use crate::config::AppConfig;
use crate::output::{CompletedView, PlanView, TaskView, WatchView};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "focusblox")]
#[command(about = "FocusBlox task backlog and focus planning", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: <config dir>/focusblox/focusblox.toml)
    #[arg(long, global = true, env = "FOCUSBLOX_CONFIG")]
    config: Option<PathBuf>,
}

/// Task attributes shared by `add` and `update`
#[derive(Args, Debug, Default)]
struct TaskFields {
    /// Importance: 1 = low, 2 = medium, 3 = high
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
    importance: Option<u8>,

    /// urgent | not_urgent
    #[arg(short, long)]
    urgency: Option<Urgency>,

    /// Estimated duration in minutes
    #[arg(short, long)]
    duration: Option<u32>,

    /// income | maintenance | recharge | learning | giving_back
    #[arg(long = "type")]
    task_type: Option<TaskType>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due: Option<NaiveDate>,

    /// Tag (repeatable)
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,

    /// none | daily | weekdays | weekends | weekly | biweekly | monthly | quarterly | semiannually | yearly
    #[arg(long)]
    recurrence: Option<RecurrencePattern>,

    /// Weekday for weekly patterns, 1 = Monday .. 7 = Sunday (repeatable)
    #[arg(long = "weekday")]
    weekdays: Vec<u8>,

    /// Day of month for monthly patterns (32 = last day)
    #[arg(long)]
    month_day: Option<u8>,

    /// Long-form notes
    #[arg(long)]
    description: Option<String>,
}

impl TaskFields {
    fn importance(&self) -> Result<Option<Importance>> {
        Ok(self.importance.map(Importance::try_from).transpose()?)
    }

    fn into_draft(self, title: String) -> Result<TaskDraft> {
        Ok(TaskDraft {
            title,
            importance: self.importance()?,
            tags: self.tags,
            due_date: self.due,
            estimated_duration: self.duration,
            urgency: self.urgency,
            task_type: self.task_type,
            recurrence_pattern: self.recurrence.unwrap_or_default(),
            recurrence_weekdays: non_empty(self.weekdays),
            recurrence_month_day: self.month_day,
            description: self.description,
        })
    }

    fn into_patch(self, title: Option<String>) -> Result<TaskPatch> {
        Ok(TaskPatch {
            title,
            importance: self.importance()?,
            tags: non_empty(self.tags),
            due_date: self.due,
            estimated_duration: self.duration,
            urgency: self.urgency,
            task_type: self.task_type,
            recurrence_pattern: self.recurrence,
            recurrence_weekdays: non_empty(self.weekdays),
            recurrence_month_day: self.month_day,
            description: self.description,
        })
    }
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task (title only creates a TBD task)
    Add {
        /// Task title (`#30min` sets a duration hint)
        title: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Show the backlog
    List {
        /// Compact watch layout
        #[arg(long)]
        watch: bool,
    },

    /// Mark a task as complete
    Done {
        /// Task ID
        task_id: String,
    },

    /// Mark a completed task as incomplete
    Reopen {
        /// Task ID
        task_id: String,
    },

    /// Change fields of a task (unspecified fields stay unchanged)
    Update {
        /// Task ID
        task_id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Delete a task
    Delete {
        /// Task ID
        task_id: String,
    },

    /// Show recently completed tasks
    Completed {
        /// Look-back window in days
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show all used tags, most used first
    Tags,

    /// Planning: priorities, Next Up and focus blocks
    Plan {
        #[command(subcommand)]
        action: Option<PlanCommand>,
    },

    /// Export all tasks as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import tasks from a JSON export
    Import {
        /// JSON file
        file: PathBuf,
    },

    /// Debug log file
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Backlog ordered by rank with priority scores (default)
    Show {
        /// Print plan items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Tasks staged for the next focus blocks
    NextUp,

    /// Stage a task for Next Up
    Stage { task_id: String },

    /// Remove a task from Next Up
    Unstage { task_id: String },

    /// Reorder the backlog, highest rank first
    Reorder {
        #[arg(required = true)]
        task_ids: Vec<String>,
    },

    /// Reorder Next Up, first task first
    ReorderNextUp {
        #[arg(required = true)]
        task_ids: Vec<String>,
    },

    /// Set the manual duration (omit minutes to clear it)
    Duration { task_id: String, minutes: Option<u32> },

    /// Assign a task to a focus block (omit block to release it)
    Assign {
        task_id: String,
        focus_block_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Print the debug log
    Show,
    /// Delete the debug log
    Clear,
    /// Print the debug log location
    Path,
}

fn init_tracing(log_format: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focusblox=warn"));

    match log_format {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run_log_command(action: LogCommand, debug_log: &DebugLog) {
    match action {
        LogCommand::Show => println!("{}", debug_log.read_log()),
        LogCommand::Clear => {
            debug_log.clear_log();
            println!("{}", "✓ Debug log cleared".green().bold());
        }
        LogCommand::Path => println!("{}", debug_log.log_path().display()),
    }
}

/// Wired services for task commands
struct App {
    repo: Arc<dyn TaskRepository>,
    local: LocalTaskSource,
    planning: PlanningService,
    time_provider: Arc<dyn TimeProvider>,
    debug_log: DebugLog,
    completed_days: u32,
}

impl App {
    async fn open(
        config: &AppConfig,
        time_provider: Arc<dyn TimeProvider>,
        debug_log: DebugLog,
    ) -> Result<Self> {
        let db_path = config.database_file();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        info!(db_path = %db_path.display(), "Opening task store");
        let pool = create_pool(&database_url(&db_path))
            .await
            .context("DB pool creation failed")?;
        run_migrations(&pool).await.context("Migration failed")?;

        // DI wiring
        let repo: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool));
        let local = LocalTaskSource::new(
            repo.clone(),
            Arc::new(UuidProvider),
            time_provider.clone(),
        );
        let planning = PlanningService::new(repo.clone(), time_provider.clone());

        Ok(Self {
            repo,
            local,
            planning,
            time_provider,
            debug_log,
            completed_days: config.completed_days,
        })
    }

    fn today(&self) -> NaiveDate {
        self.time_provider.today()
    }

    async fn require_task(&self, task_id: &str) -> Result<String> {
        match self.local.find_task(task_id).await? {
            Some(task) => Ok(task.title),
            None => bail!("Task {} not found", task_id),
        }
    }

    async fn run(self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { title, fields } => {
                let task = self.local.create_task(fields.into_draft(title)?).await?;
                self.debug_log
                    .log(&format!("Task created: {} ({})", task.id, task.title));

                println!("{}", "✓ Task created".green().bold());
                println!();
                println!("{}", Table::new(vec![TaskView::new(&task, self.today())]));
            }

            Commands::List { watch } => {
                let tasks = self.local.fetch_incomplete_tasks().await?;
                if tasks.is_empty() {
                    println!("{}", "No open tasks".yellow());
                    return Ok(());
                }

                let today = self.today();
                let table = if watch {
                    Table::new(tasks.iter().map(|t| WatchView::new(t, today))).to_string()
                } else {
                    Table::new(tasks.iter().map(|t| TaskView::new(t, today))).to_string()
                };
                println!("{}", format!("{} ({})", self.local.display_name(), tasks.len()).cyan().bold());
                println!("{}", table);
            }

            Commands::Done { task_id } => {
                let title = self.require_task(&task_id).await?;
                self.local.mark_complete(&task_id).await?;
                self.debug_log.log(&format!("Task completed: {task_id}"));
                println!("{}", format!("✓ Completed: {title}").green().bold());
            }

            Commands::Reopen { task_id } => {
                let title = self.require_task(&task_id).await?;
                self.local.mark_incomplete(&task_id).await?;
                self.debug_log.log(&format!("Task reopened: {task_id}"));
                println!("{}", format!("✓ Reopened: {title}").green().bold());
            }

            Commands::Update {
                task_id,
                title,
                fields,
            } => {
                let patch = fields.into_patch(title)?;
                if patch.is_empty() {
                    println!("{}", "Nothing to update".yellow());
                    return Ok(());
                }
                self.require_task(&task_id).await?;
                self.local.update_task(&task_id, patch).await?;
                self.debug_log.log(&format!("Task updated: {task_id}"));
                println!("{}", format!("✓ Task {task_id} updated").green().bold());
            }

            Commands::Delete { task_id } => {
                let title = self.require_task(&task_id).await?;
                self.local.delete_task(&task_id).await?;
                self.debug_log.log(&format!("Task deleted: {task_id}"));
                println!("{}", format!("✓ Deleted: {title}").green().bold());
            }

            Commands::Completed { days } => {
                let days = days.unwrap_or(self.completed_days);
                let items = self.planning.sync_completed(days).await?;
                if items.is_empty() {
                    println!("{}", format!("Nothing completed in the last {days} days").yellow());
                    return Ok(());
                }
                println!("{}", Table::new(items.iter().map(CompletedView::new)));
            }

            Commands::Tags => {
                let tags = self.local.fetch_all_used_tags().await?;
                if tags.is_empty() {
                    println!("{}", "No tags yet".yellow());
                }
                for tag in tags {
                    println!("  {} {}", "#".bold(), tag);
                }
            }

            Commands::Plan { action } => {
                let action = action.unwrap_or(PlanCommand::Show { json: false });
                self.run_plan(action).await?
            }

            Commands::Export { output } => {
                let json = transfer::export(self.repo.as_ref()).await?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, json)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("{}", format!("✓ Exported to {}", path.display()).green().bold());
                    }
                    None => println!("{}", json),
                }
            }

            Commands::Import { file } => {
                let json = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let report = transfer::import(self.repo.as_ref(), &json).await?;
                self.debug_log.log(&format!(
                    "Tasks imported: {} inserted, {} skipped",
                    report.inserted, report.skipped
                ));
                println!(
                    "{}",
                    format!(
                        "✓ Imported {} tasks ({} already present)",
                        report.inserted, report.skipped
                    )
                    .green()
                    .bold()
                );
            }

            // Handled before the task store is opened
            Commands::Log { action } => run_log_command(action, &self.debug_log),
        }

        Ok(())
    }

    async fn run_plan(&self, action: PlanCommand) -> Result<()> {
        let today = self.today();

        match action {
            PlanCommand::Show { json } => {
                let items = self.planning.sync().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&items)?);
                    return Ok(());
                }
                if items.is_empty() {
                    println!("{}", "Backlog is empty".yellow());
                    return Ok(());
                }
                let total: u32 = items.iter().map(|i| i.effective_duration).sum();
                println!("{}", Table::new(items.iter().map(|i| PlanView::new(i, today))));
                println!("  {} {} min", "Total:".bold(), total);
            }

            PlanCommand::NextUp => {
                let items = self.planning.next_up().await?;
                if items.is_empty() {
                    println!("{}", "Next Up is empty".yellow());
                    return Ok(());
                }
                println!("{}", Table::new(items.iter().map(|i| PlanView::new(i, today))));
            }

            PlanCommand::Stage { task_id } => {
                self.require_task(&task_id).await?;
                self.planning.update_next_up(&task_id, true).await?;
                self.debug_log.log(&format!("Next Up added: {task_id}"));
                println!("{}", format!("✓ {task_id} staged for Next Up").green().bold());
            }

            PlanCommand::Unstage { task_id } => {
                self.require_task(&task_id).await?;
                self.planning.update_next_up(&task_id, false).await?;
                self.debug_log.log(&format!("Next Up removed: {task_id}"));
                println!("{}", format!("✓ {task_id} removed from Next Up").green().bold());
            }

            PlanCommand::Reorder { task_ids } => {
                self.planning.update_sort_order(&task_ids).await?;
                println!("{}", "✓ Backlog reordered".green().bold());
            }

            PlanCommand::ReorderNextUp { task_ids } => {
                self.planning.update_next_up_sort_order(&task_ids).await?;
                println!("{}", "✓ Next Up reordered".green().bold());
            }

            PlanCommand::Duration { task_id, minutes } => {
                self.require_task(&task_id).await?;
                self.planning.update_duration(&task_id, minutes).await?;
                match minutes {
                    Some(m) => println!("{}", format!("✓ Duration set to {m} min").green().bold()),
                    None => println!("{}", "✓ Duration cleared".green().bold()),
                }
            }

            PlanCommand::Assign {
                task_id,
                focus_block_id,
            } => {
                self.require_task(&task_id).await?;
                self.planning
                    .update_assigned_focus_block(&task_id, focus_block_id.clone())
                    .await?;
                self.debug_log.log(&format!(
                    "Focus block assigned: {} -> {}",
                    task_id,
                    focus_block_id.as_deref().unwrap_or("none")
                ));
                println!("{}", format!("✓ {task_id} assignment updated").green().bold());
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;

    // 2. Initialize logging
    init_tracing(&config.log_format);
    debug!("FocusBlox CLI v{} starting", VERSION);

    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let debug_log = DebugLog::new(config.debug_log_file(), time_provider.clone());

    // 3. Log commands never touch the task store
    let command = match cli.command {
        Commands::Log { action } => {
            run_log_command(action, &debug_log);
            return Ok(());
        }
        other => other,
    };

    // 4. Open the store and run
    let app = App::open(&config, time_provider, debug_log).await?;
    app.run(command).await
}
