//! An audit trail of every change made to the domain records.
//!
//! Each create, update and delete writes a row with a JSON snapshot of the
//! record, so past values can be recovered after an edit.

use std::fmt::Display;

use maud::{Markup, html};
use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE},
};

/// The kind of change recorded in the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Deleted,
}

impl Change {
    fn as_code(&self) -> &'static str {
        match self {
            Change::Created => "+",
            Change::Updated => "~",
            Change::Deleted => "-",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "+" => Some(Change::Created),
            "~" => Some(Change::Updated),
            "-" => Some(Change::Deleted),
            _ => None,
        }
    }
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Change::Created => "Created",
            Change::Updated => "Updated",
            Change::Deleted => "Deleted",
        };

        write!(f, "{label}")
    }
}

/// One entry in the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: i64,
    pub model: String,
    pub object_id: i64,
    pub change: Change,
    pub snapshot: serde_json::Value,
    pub recorded_at: OffsetDateTime,
}

pub fn create_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY,
            model TEXT NOT NULL,
            object_id INTEGER NOT NULL,
            change TEXT NOT NULL CHECK (change IN ('+', '~', '-')),
            snapshot TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_object ON history(model, object_id);",
    )
}

/// Append a snapshot of `record` to the audit trail.
///
/// For deletions `record` should be the row as it was before it was deleted.
pub fn record_history(
    connection: &Connection,
    model: &str,
    object_id: i64,
    change: Change,
    record: &impl Serialize,
) -> Result<(), Error> {
    let snapshot = serde_json::to_string(record)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    connection.execute(
        "INSERT INTO history (model, object_id, change, snapshot, recorded_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            model,
            object_id,
            change.as_code(),
            snapshot,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(())
}

/// The audit trail for one record, newest first.
pub fn history_for(
    connection: &Connection,
    model: &str,
    object_id: i64,
) -> Result<Vec<HistoryRecord>, Error> {
    connection
        .prepare(
            "SELECT id, model, object_id, change, snapshot, recorded_at
            FROM history
            WHERE model = ?1 AND object_id = ?2
            ORDER BY id DESC",
        )?
        .query_map((model, object_id), map_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// A table of the changes made to one record, newest first.
pub fn history_view(records: &[HistoryRecord]) -> Markup {
    html! {
        section id="history" class="w-full my-8"
        {
            h2 class="text-lg font-semibold mb-2" { "History" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Recorded (UTC)" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Change" }
                    }
                }

                tbody
                {
                    @for record in records {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                (record.recorded_at.date()) " "
                                (format!("{:02}:{:02}", record.recorded_at.hour(), record.recorded_at.minute()))
                            }
                            td class=(TABLE_CELL_STYLE) { (record.change) }
                        }
                    }
                }
            }
        }
    }
}

fn map_row(row: &Row) -> Result<HistoryRecord, rusqlite::Error> {
    let raw_change: String = row.get(3)?;
    let change = Change::from_code(&raw_change).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown change code {raw_change:?}").into(),
        )
    })?;
    let raw_snapshot: String = row.get(4)?;
    let snapshot = serde_json::from_str(&raw_snapshot).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(HistoryRecord {
        id: row.get(0)?,
        model: row.get(1)?,
        object_id: row.get(2)?,
        change,
        snapshot,
        recorded_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde::Serialize;
    use serde_json::json;

    use super::{Change, create_history_table, history_for, record_history};

    #[derive(Serialize)]
    struct Thing {
        id: i64,
        name: &'static str,
    }

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_history_table(&connection).expect("Could not create history table");
        connection
    }

    #[test]
    fn records_changes_newest_first() {
        let connection = get_test_connection();

        record_history(&connection, "thing", 1, Change::Created, &Thing { id: 1, name: "a" })
            .unwrap();
        record_history(&connection, "thing", 1, Change::Updated, &Thing { id: 1, name: "b" })
            .unwrap();
        record_history(&connection, "thing", 2, Change::Created, &Thing { id: 2, name: "c" })
            .unwrap();

        let history = history_for(&connection, "thing", 1).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].change, Change::Updated);
        assert_eq!(history[0].snapshot, json!({"id": 1, "name": "b"}));
        assert_eq!(history[1].change, Change::Created);
    }

    #[test]
    fn history_is_scoped_to_model() {
        let connection = get_test_connection();

        record_history(&connection, "thing", 1, Change::Deleted, &Thing { id: 1, name: "a" })
            .unwrap();

        assert!(history_for(&connection, "other", 1).unwrap().is_empty());
    }
}
