//! In-memory username -> principal map in front of the `user` table.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::Repository;
use crate::models::Principal;

pub struct UserDirectory {
    repository: Arc<Repository>,
    entries: RwLock<HashMap<String, Principal>>,
}

impl UserDirectory {
    pub fn new(repository: Arc<Repository>) -> Self {
        Self {
            repository,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the cache with the current table contents. Rows with an
    /// inconsistent role are skipped.
    pub async fn reload(&self) -> sqlx::Result<usize> {
        let rows = self.repository.all_users().await?;
        let mut fresh = HashMap::with_capacity(rows.len());
        for row in rows {
            match row.principal() {
                Ok(p) => {
                    fresh.insert(p.username.clone(), p);
                }
                Err(e) => warn!("Skipping user '{}': {}", row.username, e),
            }
        }
        let count = fresh.len();
        *self.entries.write() = fresh;
        info!("User directory loaded with {} users", count);
        Ok(count)
    }

    /// Cached principal, falling back to the store on a miss.
    pub async fn lookup(&self, username: &str) -> sqlx::Result<Option<Principal>> {
        let cached = self.entries.read().get(username).cloned();
        if let Some(principal) = cached {
            return Ok(Some(principal));
        }

        debug!("User directory miss for '{}'", username);
        let Some(row) = self.repository.find_user(username).await? else {
            return Ok(None);
        };
        match row.principal() {
            Ok(principal) => {
                self.entries
                    .write()
                    .insert(principal.username.clone(), principal.clone());
                Ok(Some(principal))
            }
            Err(e) => {
                warn!("User '{}' has an invalid role: {}", username, e);
                Ok(None)
            }
        }
    }
}
