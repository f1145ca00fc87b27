pub mod board;
pub mod decide;
pub mod decisions;
pub mod export;
pub mod projects;
pub mod runs;
pub mod sources;
pub mod tasks;
