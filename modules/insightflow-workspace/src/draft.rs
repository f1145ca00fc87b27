//! The decision draft accumulator.
//!
//! One in-progress decision, built up from claims picked on insight-run pages
//! and read back by the decision form. Narrative fields accumulate line by
//! line, id lists are sets, confidence only ever rises. The draft survives
//! dialogs being dismissed and is reset only after a decision is persisted.

use insightflow_client::DecisionInput;
use insightflow_common::{Citation, Claim, Theme};

use crate::error::{Result, WorkspaceError};
use crate::ids::IdSet;

/// Confidence the decision form shows when the draft has none recorded.
pub const DEFAULT_FORM_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionDraft {
    pub title: String,
    pub rationale: String,
    pub pros: String,
    pub cons: String,
    pub risks: String,
    /// In `[0, 1]`. `None` until a merge or an edit sets it; an explicit
    /// `0.0` is a recorded value.
    pub confidence: Option<f64>,
    pub linked_claim_ids: IdSet,
    pub citation_source_ids: IdSet,
}

impl DecisionDraft {
    pub fn is_empty(&self) -> bool {
        *self == DecisionDraft::default()
    }
}

/// A subset of draft fields to merge. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDraft {
    pub title: Option<String>,
    pub rationale: Option<String>,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub risks: Option<String>,
    pub confidence: Option<f64>,
    pub linked_claim_ids: Vec<String>,
    pub citation_source_ids: Vec<String>,
}

impl PartialDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn rationale(mut self, text: impl Into<String>) -> Self {
        self.rationale = Some(text.into());
        self
    }

    pub fn pros(mut self, text: impl Into<String>) -> Self {
        self.pros = Some(text.into());
        self
    }

    pub fn cons(mut self, text: impl Into<String>) -> Self {
        self.cons = Some(text.into());
        self
    }

    pub fn risks(mut self, text: impl Into<String>) -> Self {
        self.risks = Some(text.into());
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn claim(mut self, claim_id: impl Into<String>) -> Self {
        self.linked_claim_ids.push(claim_id.into());
        self
    }

    pub fn source(mut self, source_id: impl Into<String>) -> Self {
        self.citation_source_ids.push(source_id.into());
        self
    }
}

/// Direct overwrite of one draft field, as produced by manual form edits.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    Title(String),
    Rationale(String),
    Pros(String),
    Cons(String),
    Risks(String),
    Confidence(f64),
    LinkedClaimIds(Vec<String>),
    CitationSourceIds(Vec<String>),
}

/// What a single "add to decision draft" contributed: the claim and the
/// sources its citations point at.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRef {
    pub claim_id: String,
    pub source_ids: IdSet,
}

impl EvidenceRef {
    pub fn from_claim(claim: &Claim) -> Self {
        Self {
            claim_id: claim.id.clone(),
            source_ids: claim.citations.iter().map(|c| c.source_id.clone()).collect(),
        }
    }

    pub fn has_citations(&self) -> bool {
        !self.source_ids.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DraftAccumulator {
    draft: DecisionDraft,
}

impl DraftAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additive merge. Text appends as a new line, ids union, confidence
    /// takes the max, and the title is only filled when still blank.
    pub fn merge(&mut self, partial: PartialDraft) {
        let draft = &mut self.draft;

        if let Some(title) = partial.title {
            if draft.title.trim().is_empty() && !title.trim().is_empty() {
                draft.title = title;
            }
        }
        append_line(&mut draft.rationale, partial.rationale);
        append_line(&mut draft.pros, partial.pros);
        append_line(&mut draft.cons, partial.cons);
        append_line(&mut draft.risks, partial.risks);

        if let Some(incoming) = partial.confidence.and_then(clamp_confidence) {
            draft.confidence = Some(draft.confidence.map_or(incoming, |c| c.max(incoming)));
        }

        draft.linked_claim_ids.union(partial.linked_claim_ids);
        draft.citation_source_ids.union(partial.citation_source_ids);
    }

    /// Merge one claim picked under `theme`. A claim without citations still
    /// links its id; the source set is left as it was.
    pub fn add_claim(&mut self, theme: &Theme, claim: &Claim) -> EvidenceRef {
        let evidence = EvidenceRef::from_claim(claim);
        let line = narrative_line(claim);

        self.merge(PartialDraft {
            title: Some(format!("Decision on {}", theme.title)),
            rationale: Some(line.clone()),
            pros: Some(line),
            confidence: Some(claim.confidence),
            linked_claim_ids: vec![evidence.claim_id.clone()],
            citation_source_ids: evidence.source_ids.to_vec(),
            ..PartialDraft::default()
        });

        tracing::debug!(
            claim_id = %evidence.claim_id,
            sources = evidence.source_ids.len(),
            linked = self.draft.linked_claim_ids.len(),
            "Merged claim into decision draft"
        );
        evidence
    }

    /// Overwrite a single field. Confidence is clamped into `[0, 1]`; id
    /// lists are deduplicated.
    pub fn set_field(&mut self, field: DraftField) {
        let draft = &mut self.draft;
        match field {
            DraftField::Title(v) => draft.title = v,
            DraftField::Rationale(v) => draft.rationale = v,
            DraftField::Pros(v) => draft.pros = v,
            DraftField::Cons(v) => draft.cons = v,
            DraftField::Risks(v) => draft.risks = v,
            DraftField::Confidence(v) => {
                if let Some(v) = clamp_confidence(v) {
                    draft.confidence = Some(v);
                }
            }
            DraftField::LinkedClaimIds(ids) => draft.linked_claim_ids = ids.into_iter().collect(),
            DraftField::CitationSourceIds(ids) => {
                draft.citation_source_ids = ids.into_iter().collect()
            }
        }
    }

    /// Snapshot of the current draft.
    pub fn read(&self) -> DecisionDraft {
        self.draft.clone()
    }

    pub fn draft(&self) -> &DecisionDraft {
        &self.draft
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }

    /// Reset to the empty draft. Only a successful decision create should
    /// call this; closing or cancelling the form must not.
    pub fn clear(&mut self) {
        self.draft = DecisionDraft::default();
    }
}

/// Citations to show for a claim. A claim without any is a validation
/// error rather than an empty list, so the viewer can say so.
pub fn claim_citations(claim: &Claim) -> Result<&[Citation]> {
    if claim.citations.is_empty() {
        return Err(WorkspaceError::validation(
            "No citations available for this claim.",
        ));
    }
    Ok(&claim.citations)
}

/// Narrative line a claim contributes to rationale and pros.
pub fn narrative_line(claim: &Claim) -> String {
    format!("- {}", claim.statement.trim())
}

fn append_line(field: &mut String, incoming: Option<String>) {
    let Some(incoming) = incoming else {
        return;
    };
    if incoming.trim().is_empty() {
        return;
    }
    if field.trim().is_empty() {
        *field = incoming;
    } else {
        let kept = field.trim_end().len();
        field.truncate(kept);
        field.push('\n');
        field.push_str(&incoming);
    }
}

fn clamp_confidence(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Decision form
// ---------------------------------------------------------------------------

/// The decision dialog's fields, pre-filled from the draft when it opens.
/// Edits made while it is open are applied to both the form and the draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionForm {
    pub title: String,
    pub rationale: String,
    pub pros: String,
    pub cons: String,
    pub risks: String,
    pub confidence: f64,
    pub citation_source_ids: IdSet,
    pub linked_claim_ids: IdSet,
}

impl Default for DecisionForm {
    fn default() -> Self {
        Self::from_draft(&DecisionDraft::default())
    }
}

impl DecisionForm {
    pub fn from_draft(draft: &DecisionDraft) -> Self {
        let confidence = draft.confidence.unwrap_or(DEFAULT_FORM_CONFIDENCE);
        Self {
            title: draft.title.clone(),
            rationale: draft.rationale.clone(),
            pros: draft.pros.clone(),
            cons: draft.cons.clone(),
            risks: draft.risks.clone(),
            confidence,
            citation_source_ids: draft.citation_source_ids.clone(),
            linked_claim_ids: draft.linked_claim_ids.clone(),
        }
    }

    /// Overwrite one field, with the same clamping and dedup as
    /// [`DraftAccumulator::set_field`].
    pub fn apply(&mut self, field: &DraftField) {
        match field {
            DraftField::Title(v) => self.title = v.clone(),
            DraftField::Rationale(v) => self.rationale = v.clone(),
            DraftField::Pros(v) => self.pros = v.clone(),
            DraftField::Cons(v) => self.cons = v.clone(),
            DraftField::Risks(v) => self.risks = v.clone(),
            DraftField::Confidence(v) => {
                if let Some(v) = clamp_confidence(*v) {
                    self.confidence = v;
                }
            }
            DraftField::LinkedClaimIds(ids) => {
                self.linked_claim_ids = ids.iter().cloned().collect()
            }
            DraftField::CitationSourceIds(ids) => {
                self.citation_source_ids = ids.iter().cloned().collect()
            }
        }
    }

    /// Validate and build the create/update body. Blank narrative fields
    /// are omitted.
    pub fn to_input(&self, project_id: Option<&str>) -> Result<DecisionInput> {
        let project_id = project_id
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| WorkspaceError::validation("Select a project first"))?;
        if self.title.trim().is_empty() {
            return Err(WorkspaceError::validation("Decision title is required"));
        }

        Ok(DecisionInput {
            project_id: project_id.to_string(),
            title: self.title.trim().to_string(),
            rationale: non_blank(&self.rationale),
            pros: non_blank(&self.pros),
            cons: non_blank(&self.cons),
            risks: non_blank(&self.risks),
            confidence: clamp_confidence(self.confidence),
            citation_source_ids: self.citation_source_ids.to_vec(),
            linked_claim_ids: self.linked_claim_ids.to_vec(),
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(title: &str) -> Theme {
        Theme {
            id: "th1".into(),
            insight_run_id: Some("r1".into()),
            title: title.into(),
            summary: None,
            confidence: 0.7,
            claims: vec![],
        }
    }

    fn claim(id: &str, statement: &str, confidence: f64, sources: &[&str]) -> Claim {
        Claim {
            id: id.into(),
            theme_id: Some("th1".into()),
            statement: statement.into(),
            confidence,
            citations: sources
                .iter()
                .enumerate()
                .map(|(i, s)| Citation {
                    id: format!("{id}-cit{i}"),
                    source_id: s.to_string(),
                    quote: None,
                    location: None,
                })
                .collect(),
        }
    }

    #[test]
    fn merging_same_claim_twice_keeps_one_id() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().claim("c1"));
        acc.merge(PartialDraft::new().claim("c1"));
        assert_eq!(acc.read().linked_claim_ids.as_slice(), ["c1"]);
    }

    #[test]
    fn confidence_merge_takes_max_in_either_order() {
        let mut up = DraftAccumulator::new();
        up.merge(PartialDraft::new().confidence(0.4));
        up.merge(PartialDraft::new().confidence(0.8));

        let mut down = DraftAccumulator::new();
        down.merge(PartialDraft::new().confidence(0.8));
        down.merge(PartialDraft::new().confidence(0.4));

        assert_eq!(up.read().confidence, Some(0.8));
        assert_eq!(down.read().confidence, Some(0.8));
    }

    #[test]
    fn rationale_appends_by_line() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().rationale("A"));
        acc.merge(PartialDraft::new().rationale("B"));
        assert_eq!(acc.read().rationale, "A\nB");
    }

    #[test]
    fn blank_text_does_not_add_empty_lines() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().risks("Vendor lock-in"));
        acc.merge(PartialDraft::new().risks("   "));
        assert_eq!(acc.read().risks, "Vendor lock-in");
    }

    #[test]
    fn unspecified_fields_are_left_alone() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().cons("Costly").confidence(0.5));
        acc.merge(PartialDraft::new().pros("Fast"));
        let draft = acc.read();
        assert_eq!(draft.cons, "Costly");
        assert_eq!(draft.pros, "Fast");
        assert_eq!(draft.confidence, Some(0.5));
    }

    #[test]
    fn first_non_empty_title_wins() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().title(""));
        acc.merge(PartialDraft::new().title("Expand pilot"));
        acc.merge(PartialDraft::new().title("Something else"));
        assert_eq!(acc.read().title, "Expand pilot");

        acc.set_field(DraftField::Title("Renamed".into()));
        assert_eq!(acc.read().title, "Renamed");
    }

    #[test]
    fn clear_returns_to_fresh_state() {
        let mut acc = DraftAccumulator::new();
        acc.merge(
            PartialDraft::new()
                .title("T")
                .rationale("R")
                .confidence(0.9)
                .claim("c1")
                .source("s1"),
        );
        acc.clear();
        assert_eq!(acc.read(), DraftAccumulator::new().read());
        assert!(acc.is_empty());
    }

    #[test]
    fn set_field_overwrites_instead_of_appending() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().rationale("A"));
        acc.set_field(DraftField::Rationale("Rewritten".into()));
        acc.set_field(DraftField::Confidence(0.3));
        acc.set_field(DraftField::CitationSourceIds(vec!["s1".into(), "s1".into()]));

        let draft = acc.read();
        assert_eq!(draft.rationale, "Rewritten");
        assert_eq!(draft.confidence, Some(0.3));
        assert_eq!(draft.citation_source_ids.as_slice(), ["s1"]);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let mut acc = DraftAccumulator::new();
        acc.merge(PartialDraft::new().confidence(1.7));
        assert_eq!(acc.read().confidence, Some(1.0));
        acc.merge(PartialDraft::new().confidence(f64::NAN));
        assert_eq!(acc.read().confidence, Some(1.0));
    }

    #[test]
    fn claims_accumulate_evidence_end_to_end() {
        let mut acc = DraftAccumulator::new();
        let t = theme("Onboarding");

        let first = acc.add_claim(&t, &claim("c1", "Setup takes too long", 0.5, &["s1"]));
        assert!(first.has_citations());

        let draft = acc.read();
        assert_eq!(draft.linked_claim_ids.as_slice(), ["c1"]);
        assert_eq!(draft.citation_source_ids.as_slice(), ["s1"]);
        assert_eq!(draft.confidence, Some(0.5));
        assert_eq!(draft.rationale, "- Setup takes too long");
        assert_eq!(draft.pros, "- Setup takes too long");
        assert_eq!(draft.title, "Decision on Onboarding");

        let second = acc.add_claim(&t, &claim("c2", "Docs are hard to find", 0.9, &[]));
        assert!(!second.has_citations());

        let draft = acc.read();
        assert_eq!(draft.linked_claim_ids.as_slice(), ["c1", "c2"]);
        assert_eq!(draft.citation_source_ids.as_slice(), ["s1"]);
        assert_eq!(draft.confidence, Some(0.9));
        assert_eq!(draft.rationale, "- Setup takes too long\n- Docs are hard to find");
    }

    #[test]
    fn later_theme_does_not_rename_the_draft() {
        let mut acc = DraftAccumulator::new();
        acc.add_claim(&theme("Pricing"), &claim("c1", "Too expensive", 0.4, &[]));
        acc.add_claim(&theme("Support"), &claim("c2", "Slow replies", 0.4, &[]));
        assert_eq!(acc.read().title, "Decision on Pricing");
    }

    #[test]
    fn claim_without_citations_is_reported_not_empty() {
        let bare = claim("c1", "No evidence", 0.3, &[]);
        assert_eq!(
            claim_citations(&bare).unwrap_err(),
            WorkspaceError::Validation("No citations available for this claim.".into())
        );

        let cited = claim("c2", "Has evidence", 0.3, &["s1", "s2"]);
        assert_eq!(claim_citations(&cited).unwrap().len(), 2);
    }

    #[test]
    fn form_prefills_from_draft_and_defaults_confidence() {
        let empty = DecisionForm::from_draft(&DecisionDraft::default());
        assert_eq!(empty.confidence, DEFAULT_FORM_CONFIDENCE);

        let mut acc = DraftAccumulator::new();
        acc.add_claim(&theme("Churn"), &claim("c1", "Users leave in week 2", 0.8, &["s9"]));
        let form = DecisionForm::from_draft(acc.draft());
        assert_eq!(form.title, "Decision on Churn");
        assert_eq!(form.confidence, 0.8);
        assert_eq!(form.citation_source_ids.as_slice(), ["s9"]);
    }

    #[test]
    fn explicit_zero_confidence_is_not_replaced_by_form_default() {
        let mut acc = DraftAccumulator::new();
        acc.add_claim(&theme("Churn"), &claim("c1", "Users leave", 0.7, &["s1"]));
        acc.set_field(DraftField::Confidence(0.0));
        assert_eq!(acc.read().confidence, Some(0.0));

        let mut form = DecisionForm::from_draft(acc.draft());
        assert_eq!(form.confidence, 0.0);
        form.title = "Hold off".into();
        assert_eq!(form.to_input(Some("p1")).unwrap().confidence, Some(0.0));
    }

    #[test]
    fn zero_confidence_claim_counts_as_a_value() {
        let mut acc = DraftAccumulator::new();
        acc.add_claim(&theme("Churn"), &claim("c1", "Unscored", 0.0, &[]));
        assert_eq!(acc.read().confidence, Some(0.0));
        assert_eq!(DecisionForm::from_draft(acc.draft()).confidence, 0.0);
    }

    #[test]
    fn form_apply_matches_draft_set_field() {
        let mut form = DecisionForm::default();
        form.apply(&DraftField::Confidence(1.4));
        form.apply(&DraftField::CitationSourceIds(vec!["s1".into(), "s1".into(), "s2".into()]));
        assert_eq!(form.confidence, 1.0);
        assert_eq!(form.citation_source_ids.as_slice(), ["s1", "s2"]);
    }

    #[test]
    fn form_requires_project_and_title() {
        let mut form = DecisionForm::default();
        form.title = "Go".into();
        assert!(form.to_input(None).unwrap_err().is_validation());

        form.title = "   ".into();
        assert!(form.to_input(Some("p1")).unwrap_err().is_validation());
    }

    #[test]
    fn form_input_omits_blank_text_and_keeps_id_lists() {
        let mut acc = DraftAccumulator::new();
        acc.add_claim(&theme("Churn"), &claim("c1", "Users leave", 0.7, &["s1", "s2"]));
        let input = DecisionForm::from_draft(acc.draft()).to_input(Some("p1")).unwrap();

        assert_eq!(input.project_id, "p1");
        assert!(input.cons.is_none());
        assert_eq!(input.linked_claim_ids, vec!["c1".to_string()]);
        assert_eq!(input.citation_source_ids, vec!["s1".to_string(), "s2".to_string()]);
    }
}
