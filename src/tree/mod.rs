//! Remote tree materialization
//!
//! Turns the editor's page tree into a local directory layout. Planning is a
//! pure walk that yields work items and the page dictionary; applying the plan
//! is the only step that touches the filesystem.

pub mod apply;
pub mod dictionary;
pub mod normalize;
pub mod plan;

pub use apply::{apply_plan, write_if_changed, ApplyReport, LocalDivergence};
pub use dictionary::{LocalPathSet, PageDictionary};
pub use normalize::{normalize, page_id_from_raw_name};
pub use plan::{plan_tree, MaterializePlan, NameCollision, WorkItem};
