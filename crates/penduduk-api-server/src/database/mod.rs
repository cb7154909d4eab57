pub mod audit;
pub mod pool;
pub mod repository;
pub mod statistics;
pub mod users;

pub use audit::ACTIVITY_VIEW_LIMIT;
pub use pool::DbPool;
pub use repository::Repository;
pub use repository::{ResidentOrder, RestoreOutcome, UpsertKind};
pub use statistics::{
    CountRow, GrowthRow, HamletBreakdown, ProgressRow, UserInputFilter, UserInputRow,
};
