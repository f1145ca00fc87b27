//! Task board aggregation.
//!
//! The board is a derived view: decision × status cells computed from the
//! flat task and decision lists on every render. It holds no state of its
//! own beyond the text a user is typing into each group's "add task" box.

use std::collections::{BTreeMap, HashMap, HashSet};

use insightflow_client::TaskCreate;
use insightflow_common::{Decision, Task, TaskStatus};

use crate::error::{Result, WorkspaceError};

pub const UNASSIGNED: &str = "unassigned";
pub const UNASSIGNED_TITLE: &str = "Unassigned tasks";

/// Identifies one group (row) of the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Decision(String),
    Unassigned,
}

impl GroupKey {
    /// `None` for the unassigned group.
    pub fn decision_id(&self) -> Option<&str> {
        match self {
            GroupKey::Decision(id) => Some(id),
            GroupKey::Unassigned => None,
        }
    }

    /// Parse a user-supplied key. `"unassigned"` and the empty string map to
    /// the unassigned group; anything else is a decision id.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == UNASSIGNED {
            GroupKey::Unassigned
        } else {
            GroupKey::Decision(raw.to_string())
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Decision(id) => f.write_str(id),
            GroupKey::Unassigned => f.write_str(UNASSIGNED),
        }
    }
}

/// One decision's row: three status columns, always present.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardGroup<'a> {
    pub key: GroupKey,
    pub title: String,
    pub decision: Option<&'a Decision>,
    pub columns: BTreeMap<TaskStatus, Vec<&'a Task>>,
}

impl<'a> BoardGroup<'a> {
    fn new(key: GroupKey, title: String, decision: Option<&'a Decision>) -> Self {
        let columns = TaskStatus::ALL.into_iter().map(|s| (s, Vec::new())).collect();
        Self {
            key,
            title,
            decision,
            columns,
        }
    }

    pub fn cell(&self, status: TaskStatus) -> &[&'a Task] {
        self.columns.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn task_count(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }
}

/// Decision groups in backend order, followed by the unassigned group.
#[derive(Debug, Clone, PartialEq)]
pub struct Board<'a> {
    groups: Vec<BoardGroup<'a>>,
}

impl<'a> Board<'a> {
    pub fn groups(&self) -> &[BoardGroup<'a>] {
        &self.groups
    }

    pub fn group(&self, key: &GroupKey) -> Option<&BoardGroup<'a>> {
        self.groups.iter().find(|g| &g.key == key)
    }

    pub fn unassigned(&self) -> &BoardGroup<'a> {
        // `group_tasks` is the only constructor and always pushes it last.
        &self.groups[self.groups.len() - 1]
    }

    pub fn cell(&self, key: &GroupKey, status: TaskStatus) -> &[&'a Task] {
        self.group(key).map(|g| g.cell(status)).unwrap_or(&[])
    }

    pub fn task_count(&self) -> usize {
        self.groups.iter().map(BoardGroup::task_count).sum()
    }
}

/// Partition tasks into decision × status cells.
///
/// Every decision gets a group even when it has no tasks, and the unassigned
/// group is always present. Tasks whose `decision_id` does not resolve to a
/// known decision are placed under unassigned rather than dropped. Unknown
/// statuses land in `Todo`. Partitioning is stable: tasks keep the order the
/// backend returned them in.
pub fn group_tasks<'a>(tasks: &'a [Task], decisions: &'a [Decision]) -> Board<'a> {
    let mut groups: Vec<BoardGroup<'a>> = Vec::with_capacity(decisions.len() + 1);
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(decisions.len());

    for decision in decisions {
        if index.contains_key(decision.id.as_str()) {
            continue;
        }
        index.insert(decision.id.as_str(), groups.len());
        groups.push(BoardGroup::new(
            GroupKey::Decision(decision.id.clone()),
            decision.title.clone(),
            Some(decision),
        ));
    }

    let unassigned = groups.len();
    groups.push(BoardGroup::new(
        GroupKey::Unassigned,
        UNASSIGNED_TITLE.to_string(),
        None,
    ));

    let mut dangling = 0usize;
    for task in tasks {
        let slot = match task.decision_id.as_deref() {
            Some(id) => match index.get(id) {
                Some(&slot) => slot,
                None => {
                    dangling += 1;
                    unassigned
                }
            },
            None => unassigned,
        };
        groups[slot]
            .columns
            .entry(task.board_status())
            .or_default()
            .push(task);
    }

    if dangling > 0 {
        tracing::warn!(
            dangling,
            "Tasks reference decisions that no longer exist; showing them as unassigned"
        );
    }

    Board { groups }
}

/// Build the create request for a task typed into a group's "add" box.
/// Fails without touching the backend if no project is selected or the
/// title is blank.
pub fn new_task_request(
    project_id: Option<&str>,
    key: &GroupKey,
    title: &str,
) -> Result<TaskCreate> {
    let project_id = project_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| WorkspaceError::validation("Select a project first"))?;
    let title = title.trim();
    if title.is_empty() {
        return Err(WorkspaceError::validation("Task title is required"));
    }

    Ok(TaskCreate {
        project_id: project_id.to_string(),
        title: title.to_string(),
        status: TaskStatus::Todo,
        owner: None,
        due_date: None,
        decision_id: key.decision_id().map(str::to_string),
    })
}

// ---------------------------------------------------------------------------
// Per-group input text
// ---------------------------------------------------------------------------

/// Text typed into each group's "add task" box, keyed by group so moving
/// between groups never loses what was typed elsewhere.
#[derive(Debug, Default, Clone)]
pub struct CellDrafts {
    texts: HashMap<GroupKey, String>,
}

impl CellDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: GroupKey, text: impl Into<String>) {
        self.texts.insert(key, text.into());
    }

    pub fn get(&self, key: &GroupKey) -> &str {
        self.texts.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn clear(&mut self, key: &GroupKey) {
        self.texts.remove(key);
    }

    /// Drop text for groups that are no longer on the board.
    pub fn retain_groups(&mut self, board: &Board<'_>) {
        let live: HashSet<&GroupKey> = board.groups().iter().map(|g| &g.key).collect();
        self.texts.retain(|key, _| live.contains(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, status: &str, decision_id: Option<&str>) -> Task {
        Task {
            id: id.into(),
            project_id: "p1".into(),
            title: format!("Task {id}"),
            status: status.into(),
            owner: None,
            due_date: None,
            decision_id: decision_id.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn decision(id: &str, title: &str) -> Decision {
        Decision {
            id: id.into(),
            project_id: "p1".into(),
            title: title.into(),
            rationale: None,
            pros: None,
            cons: None,
            risks: None,
            confidence: Some(0.6),
            linked_claim_ids: vec![],
            created_at: Utc::now(),
        }
    }

    fn ids(cell: &[&Task]) -> Vec<String> {
        cell.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn empty_inputs_yield_only_unassigned_with_three_columns() {
        let board = group_tasks(&[], &[]);
        assert_eq!(board.groups().len(), 1);
        let group = board.unassigned();
        assert_eq!(group.key, GroupKey::Unassigned);
        assert_eq!(group.columns.len(), 3);
        assert!(group.columns.values().all(Vec::is_empty));
    }

    #[test]
    fn decision_without_tasks_still_gets_all_columns() {
        let decisions = vec![decision("d1", "Expand pilot")];
        let board = group_tasks(&[], &decisions);

        let group = board.group(&GroupKey::Decision("d1".into())).unwrap();
        assert_eq!(group.title, "Expand pilot");
        for status in TaskStatus::ALL {
            assert!(group.columns.contains_key(&status));
        }
    }

    #[test]
    fn tasks_land_in_their_decision_and_status_cell() {
        let decisions = vec![decision("d1", "Expand pilot")];
        let tasks = vec![
            task("t1", "in_progress", Some("d1")),
            task("t2", "done", None),
        ];
        let board = group_tasks(&tasks, &decisions);

        let d1 = GroupKey::Decision("d1".into());
        assert_eq!(ids(board.cell(&d1, TaskStatus::InProgress)), ["t1"]);
        assert_eq!(ids(board.cell(&GroupKey::Unassigned, TaskStatus::Done)), ["t2"]);
        assert_eq!(board.task_count(), 2);
    }

    #[test]
    fn dangling_decision_reference_is_shown_as_unassigned() {
        let decisions = vec![decision("d1", "Expand pilot")];
        let tasks = vec![task("t1", "todo", Some("missing-id"))];
        let board = group_tasks(&tasks, &decisions);

        assert_eq!(ids(board.cell(&GroupKey::Unassigned, TaskStatus::Todo)), ["t1"]);
        assert!(board.group(&GroupKey::Decision("missing-id".into())).is_none());
        assert_eq!(board.task_count(), 1);
    }

    #[test]
    fn unknown_status_goes_to_todo() {
        let tasks = vec![task("t1", "archived", None)];
        let board = group_tasks(&tasks, &[]);
        assert_eq!(ids(board.cell(&GroupKey::Unassigned, TaskStatus::Todo)), ["t1"]);
    }

    #[test]
    fn partitioning_is_stable_not_sorted() {
        let tasks = vec![
            task("t9", "todo", None),
            task("t1", "done", None),
            task("t5", "todo", None),
            task("t3", "todo", None),
        ];
        let board = group_tasks(&tasks, &[]);
        assert_eq!(
            ids(board.cell(&GroupKey::Unassigned, TaskStatus::Todo)),
            ["t9", "t5", "t3"]
        );
    }

    #[test]
    fn unassigned_group_comes_after_decisions_in_backend_order() {
        let decisions = vec![decision("d2", "Second"), decision("d1", "First")];
        let board = group_tasks(&[], &decisions);
        let keys: Vec<String> = board.groups().iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, ["d2", "d1", "unassigned"]);
    }

    #[test]
    fn duplicate_decisions_produce_one_group() {
        let decisions = vec![decision("d1", "A"), decision("d1", "A again")];
        let tasks = vec![task("t1", "todo", Some("d1"))];
        let board = group_tasks(&tasks, &decisions);
        assert_eq!(board.groups().len(), 2);
        assert_eq!(board.task_count(), 1);
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = new_task_request(Some("p1"), &GroupKey::Unassigned, "   ").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn missing_project_is_rejected() {
        let err = new_task_request(None, &GroupKey::Unassigned, "Call users").unwrap_err();
        assert_eq!(err, WorkspaceError::validation("Select a project first"));
    }

    #[test]
    fn request_derives_decision_from_group() {
        let req = new_task_request(Some("p1"), &GroupKey::Decision("d1".into()), " Call users ")
            .unwrap();
        assert_eq!(req.title, "Call users");
        assert_eq!(req.status, TaskStatus::Todo);
        assert_eq!(req.decision_id.as_deref(), Some("d1"));

        let req = new_task_request(Some("p1"), &GroupKey::Unassigned, "Call users").unwrap();
        assert!(req.decision_id.is_none());
    }

    #[test]
    fn cell_drafts_are_independent_per_group() {
        let mut drafts = CellDrafts::new();
        let d1 = GroupKey::Decision("d1".into());
        drafts.set(d1.clone(), "Write brief");
        drafts.set(GroupKey::Unassigned, "Book room");
        drafts.clear(&GroupKey::Unassigned);

        assert_eq!(drafts.get(&d1), "Write brief");
        assert_eq!(drafts.get(&GroupKey::Unassigned), "");
    }

    #[test]
    fn cell_drafts_for_removed_groups_are_dropped() {
        let mut drafts = CellDrafts::new();
        drafts.set(GroupKey::Decision("gone".into()), "Orphaned text");
        drafts.set(GroupKey::Unassigned, "Kept");

        let board = group_tasks(&[], &[]);
        drafts.retain_groups(&board);

        assert_eq!(drafts.get(&GroupKey::Decision("gone".into())), "");
        assert_eq!(drafts.get(&GroupKey::Unassigned), "Kept");
    }

    #[test]
    fn group_key_parse_recognizes_unassigned() {
        assert_eq!(GroupKey::parse("unassigned"), GroupKey::Unassigned);
        assert_eq!(GroupKey::parse(""), GroupKey::Unassigned);
        assert_eq!(GroupKey::parse("d1"), GroupKey::Decision("d1".into()));
    }
}
