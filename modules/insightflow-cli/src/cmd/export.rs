use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use insightflow_workspace::{Backend, Workspace};

pub async fn markdown<B: Backend>(ws: &Workspace<B>, output: Option<PathBuf>) -> Result<()> {
    let markdown = ws.export_markdown().await?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, markdown)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Export written");
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

pub async fn digest<B: Backend>(ws: &Workspace<B>, date: Option<NaiveDate>) -> Result<()> {
    print!("{}", ws.daily_digest(date).await?);
    Ok(())
}
