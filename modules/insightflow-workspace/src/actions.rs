//! Dialogs, routes, keyboard shortcuts and the command palette.
//!
//! Everything here is plain state: resolving a key press or palette pick
//! yields an [`Action`], and [`UiState::dispatch`] applies it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialog {
    Project,
    Upload,
    Analyze,
    Decision,
    Task,
}

impl Dialog {
    /// Dialogs that create something inside the selected project.
    pub fn needs_project(&self) -> bool {
        !matches!(self, Dialog::Project)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Projects,
    Library,
    Runs,
    Run(String),
    Decisions,
    Tasks,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Projects => "/".to_string(),
            Route::Library => "/library".to_string(),
            Route::Runs => "/runs".to_string(),
            Route::Run(id) => format!("/runs/{id}"),
            Route::Decisions => "/decisions".to_string(),
            Route::Tasks => "/tasks".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        match path {
            "" | "/" => Some(Route::Projects),
            "/library" => Some(Route::Library),
            "/runs" => Some(Route::Runs),
            "/decisions" => Some(Route::Decisions),
            "/tasks" => Some(Route::Tasks),
            _ => path
                .strip_prefix("/runs/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Route::Run(id.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenDialog(Dialog),
    Navigate(Route),
    TogglePalette,
}

// ---------------------------------------------------------------------------
// Keyboard shortcuts
// ---------------------------------------------------------------------------

/// A single key press as the shell reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub ctrl: bool,
    pub meta: bool,
    /// Focus is inside a text input, textarea, select, or editable region.
    pub in_text_input: bool,
}

impl KeyPress {
    pub fn plain(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            in_text_input: false,
        }
    }

    pub fn ctrl(key: char) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn in_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// Resolves key presses to actions. Holds the pending `g` of a two-key
/// navigation sequence between presses.
#[derive(Debug, Default)]
pub struct Shortcuts {
    pending_g: bool,
}

impl Shortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, press: &KeyPress) -> Option<Action> {
        let key = press.key.to_ascii_lowercase();

        if (press.ctrl || press.meta) && key == 'k' {
            self.pending_g = false;
            return Some(Action::TogglePalette);
        }
        if press.ctrl || press.meta || press.in_text_input {
            self.pending_g = false;
            return None;
        }

        if std::mem::take(&mut self.pending_g) {
            let route = match key {
                'p' => Some(Route::Projects),
                'l' => Some(Route::Library),
                'd' => Some(Route::Decisions),
                't' => Some(Route::Tasks),
                _ => None,
            };
            if let Some(route) = route {
                return Some(Action::Navigate(route));
            }
        }

        let dialog = match key {
            'g' => {
                self.pending_g = true;
                return None;
            }
            'n' => Dialog::Project,
            'u' => Dialog::Upload,
            'a' => Dialog::Analyze,
            'd' => Dialog::Decision,
            't' => Dialog::Task,
            _ => return None,
        };
        Some(Action::OpenDialog(dialog))
    }
}

// ---------------------------------------------------------------------------
// Command palette
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub id: &'static str,
    pub label: String,
    pub shortcut: Option<char>,
    pub action: Action,
}

const SELECT_PROJECT_SUFFIX: &str = " (Select project first)";

/// The ten palette actions: five dialogs, then five routes.
pub fn palette_actions(has_project: bool) -> Vec<PaletteEntry> {
    let dialog = |id, label: &str, shortcut, dialog: Dialog| {
        let label = if dialog.needs_project() && !has_project {
            format!("{label}{SELECT_PROJECT_SUFFIX}")
        } else {
            label.to_string()
        };
        PaletteEntry {
            id,
            label,
            shortcut: Some(shortcut),
            action: Action::OpenDialog(dialog),
        }
    };
    let route = |id, label: &str, route: Route| PaletteEntry {
        id,
        label: label.to_string(),
        shortcut: None,
        action: Action::Navigate(route),
    };

    vec![
        dialog("new-project", "New Project", 'N', Dialog::Project),
        dialog("upload-source", "Upload Source", 'U', Dialog::Upload),
        dialog("start-run", "Start Insight Run", 'A', Dialog::Analyze),
        dialog("record-decision", "Record Decision", 'D', Dialog::Decision),
        dialog("create-task", "Create Task", 'T', Dialog::Task),
        route("view-projects", "Go to Projects", Route::Projects),
        route("view-library", "Go to Library", Route::Library),
        route("view-runs", "Go to Insight Runs", Route::Runs),
        route("view-decisions", "Go to Decisions", Route::Decisions),
        route("view-tasks", "Go to Tasks", Route::Tasks),
    ]
}

/// Case-insensitive substring match on labels. An empty query keeps all.
pub fn filter_palette(entries: Vec<PaletteEntry>, query: &str) -> Vec<PaletteEntry> {
    if query.is_empty() {
        return entries;
    }
    let needle = query.to_lowercase();
    entries
        .into_iter()
        .filter(|e| e.label.to_lowercase().contains(&needle))
        .collect()
}

// ---------------------------------------------------------------------------
// UI state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct UiState {
    selected_project: Option<String>,
    palette_open: bool,
    palette_search: String,
    active_dialog: Option<Dialog>,
    route: Option<Route>,
    shortcuts: Shortcuts,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_project(&self) -> Option<&str> {
        self.selected_project.as_deref()
    }

    pub fn select_project(&mut self, project_id: Option<String>) {
        self.selected_project = project_id.filter(|p| !p.trim().is_empty());
    }

    pub fn palette_open(&self) -> bool {
        self.palette_open
    }

    pub fn set_palette_open(&mut self, open: bool) {
        self.palette_open = open;
        if !open {
            self.palette_search.clear();
        }
    }

    pub fn palette_search(&self) -> &str {
        &self.palette_search
    }

    pub fn set_palette_search(&mut self, search: impl Into<String>) {
        self.palette_search = search.into();
    }

    /// Palette entries matching the current search.
    pub fn palette_entries(&self) -> Vec<PaletteEntry> {
        filter_palette(
            palette_actions(self.selected_project.is_some()),
            &self.palette_search,
        )
    }

    /// Run a palette entry. Selecting anything closes the palette.
    pub fn select_palette_entry(&mut self, id: &str) -> Option<Action> {
        let entry = self.palette_entries().into_iter().find(|e| e.id == id)?;
        self.set_palette_open(false);
        self.dispatch(entry.action.clone());
        Some(entry.action)
    }

    pub fn active_dialog(&self) -> Option<Dialog> {
        self.active_dialog
    }

    /// Opening a dialog replaces whichever one was open.
    pub fn open_dialog(&mut self, dialog: Dialog) {
        self.active_dialog = Some(dialog);
    }

    pub fn close_dialog(&mut self) {
        self.active_dialog = None;
    }

    /// Last route navigated to, if any.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn key_press(&mut self, press: &KeyPress) -> Option<Action> {
        let action = self.shortcuts.press(press)?;
        self.dispatch(action.clone());
        Some(action)
    }

    pub fn dispatch(&mut self, action: Action) {
        tracing::debug!(?action, "UI action");
        match action {
            Action::OpenDialog(dialog) => self.open_dialog(dialog),
            Action::Navigate(route) => self.route = Some(route),
            Action::TogglePalette => {
                let open = !self.palette_open;
                self.set_palette_open(open);
            }
        }
    }
}
