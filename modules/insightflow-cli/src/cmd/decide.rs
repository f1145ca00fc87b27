use anyhow::{Context, Result};
use clap::Args;

use insightflow_workspace::{Backend, DecisionDraft, DraftField, Workspace};

#[derive(Args)]
pub struct DecideArgs {
    /// Insight run the claims come from
    #[arg(long)]
    run: String,

    /// Claim to add as evidence; repeat for several
    #[arg(long = "claim", required = true)]
    claims: Vec<String>,

    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    rationale: Option<String>,
    #[arg(long)]
    pros: Option<String>,
    #[arg(long)]
    cons: Option<String>,
    #[arg(long)]
    risks: Option<String>,

    /// Confidence between 0 and 1
    #[arg(long)]
    confidence: Option<f64>,

    /// Print the draft without recording the decision
    #[arg(long)]
    dry_run: bool,
}

pub async fn run<B: Backend>(ws: &mut Workspace<B>, args: DecideArgs) -> Result<()> {
    for claim_id in &args.claims {
        let evidence = ws
            .add_claim_to_draft(&args.run, claim_id)
            .await
            .with_context(|| format!("Failed to add claim {claim_id}"))?;
        if !evidence.has_citations() {
            tracing::warn!(claim_id = %claim_id, "Claim has no citations");
        }
    }

    let overrides = [
        args.title.map(DraftField::Title),
        args.rationale.map(DraftField::Rationale),
        args.pros.map(DraftField::Pros),
        args.cons.map(DraftField::Cons),
        args.risks.map(DraftField::Risks),
        args.confidence.map(DraftField::Confidence),
    ];
    for field in overrides.into_iter().flatten() {
        ws.edit_draft(field);
    }

    print!("{}", render_draft(&ws.draft()));

    if args.dry_run {
        println!("\n(dry run, nothing recorded)");
        return Ok(());
    }

    ws.open_decision_form();
    let decision = ws.submit_decision().await?;
    println!("\nRecorded decision {} ({})", decision.title, decision.id);
    Ok(())
}

pub fn render_draft(draft: &DecisionDraft) -> String {
    let mut out = format!("Title: {}\n", draft.title);
    match draft.confidence {
        Some(c) => out.push_str(&format!("Confidence: {:.0}%\n", c * 100.0)),
        None => out.push_str("Confidence: not set\n"),
    }
    for (label, text) in [
        ("Rationale", &draft.rationale),
        ("Pros", &draft.pros),
        ("Cons", &draft.cons),
        ("Risks", &draft.risks),
    ] {
        if text.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("{label}:\n"));
        for line in text.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    let claims: Vec<&str> = draft.linked_claim_ids.iter().collect();
    let sources: Vec<&str> = draft.citation_source_ids.iter().collect();
    out.push_str(&format!("Linked claims: {}\n", claims.join(", ")));
    out.push_str(&format!("Cited sources: {}\n", sources.join(", ")));
    out
}
