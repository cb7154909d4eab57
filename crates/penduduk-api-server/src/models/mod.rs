pub mod audit;
pub mod listing;
pub mod resident;
pub mod user;

pub use audit::*;
pub use listing::*;
pub use resident::*;
pub use user::*;
