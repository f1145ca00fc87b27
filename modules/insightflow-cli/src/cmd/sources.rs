use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use insightflow_workspace::{Backend, UploadOptions, Workspace};

#[derive(Subcommand)]
pub enum SourcesCmd {
    /// List sources in the selected project
    List,
    /// Upload a file as a source
    Upload {
        path: PathBuf,
        /// Source kind (note, interview, pdf, ...)
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Tag to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a source
    Delete { id: String },
    /// Import notes from an Obsidian vault folder
    ImportObsidian {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        base_path: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, cmd: SourcesCmd) -> Result<()> {
    match cmd {
        SourcesCmd::List => {
            for s in ws.sources().await? {
                let tags = if s.tags.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", s.tags.join(", "))
                };
                println!("{}  {:<10} {}{tags}", s.id, s.kind, s.display_name());
            }
        }
        SourcesCmd::Upload {
            path,
            kind,
            title,
            tags,
        } => {
            let source = ws
                .upload_source(path, UploadOptions { kind, title, tags })
                .await?;
            println!("Uploaded {} ({})", source.display_name(), source.id);
        }
        SourcesCmd::Delete { id } => {
            ws.delete_source(&id).await?;
            println!("Deleted source {id}");
        }
        SourcesCmd::ImportObsidian {
            folder,
            base_path,
            limit,
        } => {
            let imported = ws.import_obsidian(folder, base_path, limit).await?;
            println!("Imported {} notes", imported.len());
            for s in imported {
                println!("  {}  {}", s.id, s.display_name());
            }
        }
    }
    Ok(())
}
