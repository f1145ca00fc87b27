use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;

use insightflow_client::TaskUpdate;
use insightflow_common::TaskStatus;
use insightflow_workspace::{Backend, GroupKey, Workspace};

#[derive(Subcommand)]
pub enum TasksCmd {
    /// Add a task under a decision, or unassigned
    Add {
        title: String,
        /// Decision id, or "unassigned"
        #[arg(long, default_value = "unassigned")]
        decision: String,
        #[arg(long)]
        owner: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Move a task to another status column
    Move {
        id: String,
        /// todo, in_progress, or done
        status: TaskStatus,
    },
    /// Attach a task to another decision, or "unassigned"
    Relink { id: String, decision: String },
    /// Change a task's title, owner, or due date
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Delete a task
    Delete { id: String },
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, cmd: TasksCmd) -> Result<()> {
    match cmd {
        TasksCmd::Add {
            title,
            decision,
            owner,
            due,
        } => {
            let key = GroupKey::parse(&decision);
            let due = due.map(start_of_day).transpose()?;
            let task = ws.create_task(&key, &title, owner, due).await?;
            println!("Added task {} ({}) under {key}", task.title, task.id);
        }
        TasksCmd::Move { id, status } => {
            let task = ws.move_task(&id, status).await?;
            println!("Moved {} to {}", task.title, status.label());
        }
        TasksCmd::Relink { id, decision } => {
            let key = GroupKey::parse(&decision);
            let task = ws.relink_task(&id, &key).await?;
            println!("Linked {} to {key}", task.title);
        }
        TasksCmd::Edit {
            id,
            title,
            owner,
            due,
        } => {
            let update = TaskUpdate {
                title,
                owner,
                due_date: due.map(start_of_day).transpose()?,
                ..Default::default()
            };
            let task = ws.edit_task(&id, update).await?;
            println!("Updated {}", task.title);
        }
        TasksCmd::Delete { id } => {
            ws.delete_task(&id).await?;
            println!("Deleted task {id}");
        }
    }
    Ok(())
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid due date {date}"))
}
