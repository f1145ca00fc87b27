use anyhow::Result;
use clap::Subcommand;

use insightflow_common::Theme;
use insightflow_workspace::{Backend, Workspace};

#[derive(Subcommand)]
pub enum RunsCmd {
    /// List insight runs in the selected project
    List,
    /// Show a run's themes and claims
    Show { id: String },
    /// Start a new insight run over the project's sources
    Start {
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Set a run's status, e.g. after synthesis finishes elsewhere
    SetStatus { id: String, status: String },
    /// Delete an insight run
    Delete { id: String },
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, cmd: RunsCmd) -> Result<()> {
    match cmd {
        RunsCmd::List => {
            for r in ws.runs().await? {
                println!(
                    "{}  {:<10} {}",
                    r.id,
                    r.status,
                    r.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        RunsCmd::Show { id } => {
            let run = ws.refresh_run(&id).await?;
            let themes = ws.themes(&id).await?;
            println!("Run {} ({})", run.id, run.status);
            print!("{}", render_themes(&themes));
        }
        RunsCmd::Start { prompt } => {
            let run = ws.start_insight_run(prompt).await?;
            println!("Started run {} ({})", run.id, run.status);
        }
        RunsCmd::SetStatus { id, status } => {
            let run = ws.update_insight_run(&id, Some(status), None).await?;
            println!("Run {} is now {}", run.id, run.status);
        }
        RunsCmd::Delete { id } => {
            ws.delete_insight_run(&id).await?;
            println!("Deleted run {id}");
        }
    }
    Ok(())
}

/// Themes with their claims, one claim per line with its id so it can be
/// passed to `insightflow decide --claim`.
pub fn render_themes(themes: &[Theme]) -> String {
    if themes.is_empty() {
        return "No themes in this run.\n".to_string();
    }
    let mut out = String::new();
    for theme in themes {
        out.push_str(&format!(
            "\n{} ({:.0}%)\n",
            theme.title,
            theme.confidence * 100.0
        ));
        if let Some(summary) = theme.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("  {summary}\n"));
        }
        for claim in &theme.claims {
            out.push_str(&format!(
                "  - [{}] {} ({:.0}%, {} citations)\n",
                claim.id,
                claim.statement,
                claim.confidence * 100.0,
                claim.citations.len()
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insightflow_workspace::testing::{claim, theme};

    #[test]
    fn claims_are_listed_with_ids() {
        let themes = vec![theme(
            "th1",
            "Onboarding",
            vec![claim("c1", "Setup takes too long", 0.5, &["s1"])],
        )];
        let out = render_themes(&themes);
        assert!(out.contains("Onboarding (70%)"));
        assert!(out.contains("  - [c1] Setup takes too long (50%, 1 citations)"));
    }

    #[test]
    fn empty_run_says_so() {
        assert_eq!(render_themes(&[]), "No themes in this run.\n");
    }
}
