//! User repository contracts and SQLite implementation.

use crate::model::user::{User, UserId};
use crate::repo::{bool_to_int, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT uuid, fullname, email, admin, complete_profile FROM users";

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Users with complete profiles, ordered by full name.
    fn list_complete_profiles(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        if user.fullname.trim().is_empty() {
            return Err(RepoError::InvalidData("user fullname can't be blank".to_string()));
        }
        self.conn.execute(
            "INSERT INTO users (uuid, fullname, email, admin, complete_profile)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.fullname.as_str(),
                user.email.as_str(),
                bool_to_int(user.admin),
                bool_to_int(user.complete_profile),
            ],
        )?;
        Ok(user.id)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET fullname = ?2, email = ?3, admin = ?4, complete_profile = ?5
             WHERE uuid = ?1;",
            params![
                user.id.to_string(),
                user.fullname.as_str(),
                user.email.as_str(),
                bool_to_int(user.admin),
                bool_to_int(user.complete_profile),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user.id,
            });
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_complete_profiles(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE complete_profile = 1 ORDER BY fullname COLLATE NOCASE, uuid;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

/// Parses a row selected with the `users` column names.
pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        fullname: row.get("fullname")?,
        email: row.get("email")?,
        admin: parse_flag(row.get("admin")?, "users.admin")?,
        complete_profile: parse_flag(row.get("complete_profile")?, "users.complete_profile")?,
    })
}
