use super::Repository;
use crate::models::{UserRow, UserSummary};

impl Repository {
    pub async fn all_users(&self) -> sqlx::Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, password_hash, role, dusun, nik_masyarakat
               FROM "user" ORDER BY username"#,
        )
        .fetch_all(self.pool.get_pool())
        .await
    }

    pub async fn find_user(&self, username: &str) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, password_hash, role, dusun, nik_masyarakat
               FROM "user" WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(self.pool.get_pool())
        .await
    }

    pub async fn list_user_summaries(&self) -> sqlx::Result<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            r#"SELECT id, username, role, dusun, nik_masyarakat FROM "user" ORDER BY id"#,
        )
        .fetch_all(self.pool.get_pool())
        .await
    }

    pub async fn count_users(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(self.pool.get_pool())
            .await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        dusun: Option<&str>,
        nik_masyarakat: Option<&str>,
    ) -> sqlx::Result<i64> {
        let result = sqlx::query(
            r#"INSERT INTO "user" (username, password_hash, role, dusun, nik_masyarakat)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(dusun)
        .bind(nik_masyarakat)
        .execute(self.pool.get_pool())
        .await?;
        Ok(result.last_insert_rowid())
    }
}
