pub mod actions;
pub mod board;
pub mod cache;
pub mod draft;
pub mod error;
pub mod ids;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use actions::{Action, Dialog, KeyPress, PaletteEntry, Route, UiState};
pub use board::{group_tasks, Board, BoardGroup, CellDrafts, GroupKey};
pub use cache::{Collection, QueryCache, QueryKey, Scope};
pub use draft::{DecisionDraft, DecisionForm, DraftAccumulator, DraftField, EvidenceRef, PartialDraft};
pub use error::{Result, WorkspaceError};
pub use ids::IdSet;
pub use session::{BoardSnapshot, UploadOptions, Workspace};
pub use traits::Backend;
