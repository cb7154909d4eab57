pub mod directory;
pub mod jwt;
pub mod password;

pub use directory::UserDirectory;
pub use jwt::{Claims, JwtManager};
pub use password::{PasswordError, PasswordService};
