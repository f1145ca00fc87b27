use anyhow::Result;
use clap::Subcommand;

use insightflow_workspace::{Backend, Workspace};

#[derive(Subcommand)]
pub enum DecisionsCmd {
    /// List decisions in the selected project
    List,
    /// Delete a decision. Its tasks become unassigned.
    Delete { id: String },
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, cmd: DecisionsCmd) -> Result<()> {
    match cmd {
        DecisionsCmd::List => {
            for d in ws.decisions().await? {
                let confidence = d
                    .confidence
                    .map(|c| format!("{:.0}%", c * 100.0))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}  {}  (confidence {confidence}, {} linked claims)",
                    d.id,
                    d.title,
                    d.linked_claim_ids.len()
                );
            }
        }
        DecisionsCmd::Delete { id } => {
            ws.delete_decision(&id).await?;
            println!("Deleted decision {id}");
        }
    }
    Ok(())
}
