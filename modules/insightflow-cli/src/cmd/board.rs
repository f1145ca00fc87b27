use anyhow::Result;

use insightflow_common::TaskStatus;
use insightflow_workspace::{Backend, Board, Workspace};

pub async fn run<B: Backend>(ws: &mut Workspace<B>) -> Result<()> {
    let snapshot = ws.board().await?;
    print!("{}", render_board(&snapshot.board()));
    Ok(())
}

/// One block per group, one indented list per status column.
pub fn render_board(board: &Board<'_>) -> String {
    let mut out = String::new();
    for group in board.groups() {
        out.push_str(&format!("## {}", group.title));
        if let Some(id) = group.key.decision_id() {
            out.push_str(&format!(" [{id}]"));
        }
        out.push('\n');

        for status in TaskStatus::ALL {
            let tasks = group.cell(status);
            out.push_str(&format!("  {} ({})\n", status.label(), tasks.len()));
            for task in tasks {
                out.push_str(&format!("    - {} [{}]", task.title, task.id));
                if let Some(owner) = task.owner.as_deref() {
                    out.push_str(&format!(" @{owner}"));
                }
                if let Some(due) = task.due_date {
                    out.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
                }
                out.push('\n');
            }
        }
    }
    out
}
