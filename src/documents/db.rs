use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    documents::domain::{Attachment, AttachmentId, AttachmentMatch, AttachmentOwner},
    history::{Change, record_history},
};

const MODEL: &str = "attachment";

/// Create the attachment table and the tables linking attachments to
/// statements and financial transactions.
///
/// Must be called after the statement and financial transaction tables exist.
pub fn create_attachment_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS attachment (
            id INTEGER PRIMARY KEY,
            location TEXT NOT NULL,
            date_uploaded TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS statement_attachment (
            id INTEGER PRIMARY KEY,
            statement_id INTEGER NOT NULL REFERENCES statement(id) ON DELETE CASCADE,
            attachment_id INTEGER NOT NULL REFERENCES attachment(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS financial_transaction_attachment (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL
                REFERENCES financial_transaction(id) ON DELETE CASCADE,
            attachment_id INTEGER NOT NULL REFERENCES attachment(id) ON DELETE CASCADE
        );",
    )
}

pub fn create_attachment(location: &str, connection: &Connection) -> Result<Attachment, Error> {
    let date_uploaded = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO attachment (location, date_uploaded) VALUES (?1, ?2)",
        (location, date_uploaded),
    )?;

    let attachment = Attachment {
        id: connection.last_insert_rowid(),
        location: location.to_owned(),
        date_uploaded,
    };
    record_history(connection, MODEL, attachment.id, Change::Created, &attachment)?;

    Ok(attachment)
}

pub fn get_attachment(id: AttachmentId, connection: &Connection) -> Result<Attachment, Error> {
    connection
        .prepare("SELECT id, location, date_uploaded FROM attachment WHERE id = :id")?
        .query_row(&[(":id", &id)], map_attachment_row)
        .map_err(|error| error.into())
}

/// Link an attachment to `owner`.
pub fn attach(
    owner: AttachmentOwner,
    attachment_id: AttachmentId,
    connection: &Connection,
) -> Result<i64, Error> {
    let (table, column) = owner.table();

    connection.execute(
        &format!("INSERT INTO {table} ({column}, attachment_id) VALUES (?1, ?2)"),
        (owner.id(), attachment_id),
    )?;

    Ok(connection.last_insert_rowid())
}

/// The attachments linked to `owner`, oldest first.
pub fn get_attachment_matches(
    owner: AttachmentOwner,
    connection: &Connection,
) -> Result<Vec<AttachmentMatch>, Error> {
    let (table, column) = owner.table();

    connection
        .prepare(&format!(
            "SELECT m.id, a.id, a.location, a.date_uploaded
            FROM {table} m
            INNER JOIN attachment a ON a.id = m.attachment_id
            WHERE m.{column} = ?1
            ORDER BY m.id ASC"
        ))?
        .query_map([owner.id()], |row| {
            Ok(AttachmentMatch {
                id: row.get(0)?,
                attachment: Attachment {
                    id: row.get(1)?,
                    location: row.get(2)?,
                    date_uploaded: row.get(3)?,
                },
            })
        })?
        .map(|maybe_match| maybe_match.map_err(Error::from))
        .collect()
}

/// Remove the link `match_id` between `owner` and an attachment.
///
/// Only the link is removed, the attachment itself is left for
/// [delete_orphaned_attachments].
pub fn remove_attachment_match(
    owner: AttachmentOwner,
    match_id: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let (table, column) = owner.table();

    let rows_affected = connection.execute(
        &format!("DELETE FROM {table} WHERE id = ?1 AND {column} = ?2"),
        (match_id, owner.id()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the attachments that are no longer linked to anything and return
/// them so that their files can be removed.
pub fn delete_orphaned_attachments(connection: &Connection) -> Result<Vec<Attachment>, Error> {
    let orphans: Vec<Attachment> = connection
        .prepare(
            "SELECT id, location, date_uploaded FROM attachment
            WHERE id NOT IN (SELECT attachment_id FROM statement_attachment)
            AND id NOT IN (SELECT attachment_id FROM financial_transaction_attachment)",
        )?
        .query_map([], map_attachment_row)?
        .collect::<Result<_, _>>()?;

    for attachment in &orphans {
        connection.execute("DELETE FROM attachment WHERE id = ?1", [attachment.id])?;
        record_history(connection, MODEL, attachment.id, Change::Deleted, attachment)?;
    }

    Ok(orphans)
}

fn map_attachment_row(row: &Row) -> Result<Attachment, rusqlite::Error> {
    Ok(Attachment {
        id: row.get(0)?,
        location: row.get(1)?,
        date_uploaded: row.get(2)?,
    })
}
