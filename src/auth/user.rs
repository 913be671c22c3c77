//! The single user of the application and its password.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// The ID of a row in the user table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// The ID of the treasurer, the only user.
    pub const TREASURER: UserID = UserID(1);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user that can log in.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserID,
    pub password_hash: PasswordHash,
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Set the password of the user with `id`, creating the user if needed.
pub fn upsert_user(
    id: UserID,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (id, password) VALUES (?1, ?2)
        ON CONFLICT(id) DO UPDATE SET password = excluded.password",
        (id.as_i64(), password_hash.as_ref()),
    )?;

    Ok(User { id, password_hash })
}

/// Get the user with `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no password has been set for the user.
pub fn get_user_by_id(id: UserID, connection: &Connection) -> Result<User, Error> {
    let password: String = connection.query_row(
        "SELECT password FROM user WHERE id = :id",
        &[(":id", &id.as_i64())],
        |row| row.get(0),
    )?;

    Ok(User {
        id,
        password_hash: PasswordHash::new_unchecked(&password),
    })
}
