use anyhow::Result;
use clap::Subcommand;

use insightflow_workspace::{Backend, Workspace};

#[derive(Subcommand)]
pub enum ProjectsCmd {
    /// List all projects
    List,
    /// Create a project and select it
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project and everything in it
    Delete { id: String },
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, cmd: ProjectsCmd) -> Result<()> {
    match cmd {
        ProjectsCmd::List => {
            let projects = ws.projects().await?;
            if projects.is_empty() {
                println!("No projects yet. Create one with `insightflow projects create <name>`.");
            }
            for p in projects {
                let marker = if ws.selected_project() == Some(p.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}  {}  ({})", p.id, p.name, p.created_at.format("%Y-%m-%d"));
            }
        }
        ProjectsCmd::Create { name, description } => {
            let project = ws.create_project(&name, description).await?;
            println!("Created project {} ({})", project.name, project.id);
            println!("Set INSIGHTFLOW_PROJECT_ID={} to keep working in it.", project.id);
        }
        ProjectsCmd::Delete { id } => {
            ws.delete_project(&id).await?;
            println!("Deleted project {id}");
        }
    }
    Ok(())
}
