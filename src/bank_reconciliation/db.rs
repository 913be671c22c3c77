//! Database operations for reconciliation groups and the reconciled state of
//! bank and financial transactions.

use rusqlite::{Connection, params};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    bank_reconciliation::domain::{ReconciliationGroup, ReconciliationGroupId},
    bank_transactions::{
        BankTransaction, BankTransactionId, get_bank_transaction, map_bank_transaction_row,
    },
    financial_transactions::{FinancialTransactionId, get_financial_transaction},
    history::{Change, record_history},
};

const MODEL: &str = "reconciliation_group";

const BANK_TRANSACTION_COLUMNS: &str = "id, statement_id, date_transaction, description_bank, \
    description_user, amount_debit, amount_credit, reconciled_id";

/// Create the reconciliation group table.
///
/// Must be created before the tables whose rows are reconciled.
pub fn create_reconciliation_group_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS reconciliation_group (
            id INTEGER PRIMARY KEY,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn create_reconciliation_group(connection: &Connection) -> Result<ReconciliationGroup, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO reconciliation_group (created_at) VALUES (?1)",
        [created_at],
    )?;

    let group = ReconciliationGroup {
        id: connection.last_insert_rowid(),
        created_at,
    };
    record_history(connection, MODEL, group.id, Change::Created, &group)?;

    Ok(group)
}

pub fn get_reconciliation_group(
    id: ReconciliationGroupId,
    connection: &Connection,
) -> Result<ReconciliationGroup, Error> {
    connection
        .query_row(
            "SELECT id, created_at FROM reconciliation_group WHERE id = ?1",
            [id],
            |row| {
                Ok(ReconciliationGroup {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
}

/// Delete a group, its members become unreconciled.
pub fn delete_reconciliation_group(
    id: ReconciliationGroupId,
    connection: &Connection,
) -> Result<(), Error> {
    let group = get_reconciliation_group(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("reconciliation group"),
        error => error,
    })?;

    connection.execute("DELETE FROM reconciliation_group WHERE id = ?1", [id])?;
    record_history(connection, MODEL, id, Change::Deleted, &group)?;

    Ok(())
}

/// Delete those of `group_ids` that no longer have any members.
pub fn delete_empty_groups(
    group_ids: &[ReconciliationGroupId],
    connection: &Connection,
) -> Result<(), Error> {
    for &group_id in group_ids {
        let members: i64 = connection.query_row(
            "SELECT
                (SELECT COUNT(*) FROM financial_transaction WHERE reconciled_id = ?1)
                + (SELECT COUNT(*) FROM bank_transaction WHERE reconciled_id = ?1)
                + (SELECT COUNT(*) FROM investment_detail WHERE reconciled_id = ?1)",
            [group_id],
            |row| row.get(0),
        )?;

        if members == 0 {
            tracing::debug!("Deleting empty reconciliation group {group_id}");
            delete_reconciliation_group(group_id, connection)?;
        }
    }

    Ok(())
}

/// Put a financial transaction into `group_id` unless it is already
/// reconciled.
///
/// Returns whether the transaction was changed.
pub fn reconcile_financial_transaction(
    id: FinancialTransactionId,
    group_id: ReconciliationGroupId,
    connection: &Connection,
) -> Result<bool, Error> {
    let changed = connection.execute(
        "UPDATE financial_transaction SET reconciled_id = ?1
        WHERE id = ?2 AND reconciled_id IS NULL",
        [group_id, id],
    )?;

    if changed == 0 {
        return Ok(false);
    }

    let transaction = get_financial_transaction(id, connection)?;
    record_history(
        connection,
        "financial_transaction",
        id,
        Change::Updated,
        &transaction,
    )?;

    Ok(true)
}

/// Take a financial transaction out of its group.
///
/// Returns the group it was in, or `None` if it was not reconciled.
pub fn unreconcile_financial_transaction(
    id: FinancialTransactionId,
    connection: &Connection,
) -> Result<Option<ReconciliationGroupId>, Error> {
    let group_id = connection
        .query_row(
            "SELECT reconciled_id FROM financial_transaction WHERE id = ?1",
            [id],
            |row| row.get::<_, Option<ReconciliationGroupId>>(0),
        )
        .map_err(Error::from)?;

    if group_id.is_none() {
        return Ok(None);
    }

    connection.execute(
        "UPDATE financial_transaction SET reconciled_id = NULL WHERE id = ?1",
        [id],
    )?;
    let transaction = get_financial_transaction(id, connection)?;
    record_history(
        connection,
        "financial_transaction",
        id,
        Change::Updated,
        &transaction,
    )?;

    Ok(group_id)
}

/// Put a bank transaction into `group_id` unless it is already reconciled.
///
/// Returns whether the transaction was changed.
pub fn reconcile_bank_transaction(
    id: BankTransactionId,
    group_id: ReconciliationGroupId,
    connection: &Connection,
) -> Result<bool, Error> {
    let changed = connection.execute(
        "UPDATE bank_transaction SET reconciled_id = ?1
        WHERE id = ?2 AND reconciled_id IS NULL",
        [group_id, id],
    )?;

    if changed == 0 {
        return Ok(false);
    }

    let transaction = get_bank_transaction(id, connection)?;
    record_history(
        connection,
        "bank_transaction",
        id,
        Change::Updated,
        &transaction,
    )?;

    Ok(true)
}

/// Take a bank transaction out of its group.
///
/// Returns the group it was in, or `None` if it was not reconciled.
pub fn unreconcile_bank_transaction(
    id: BankTransactionId,
    connection: &Connection,
) -> Result<Option<ReconciliationGroupId>, Error> {
    let transaction = get_bank_transaction(id, connection)?;

    let Some(group_id) = transaction.reconciled else {
        return Ok(None);
    };

    connection.execute(
        "UPDATE bank_transaction SET reconciled_id = NULL WHERE id = ?1",
        [id],
    )?;
    let transaction = BankTransaction {
        reconciled: None,
        ..transaction
    };
    record_history(
        connection,
        "bank_transaction",
        id,
        Change::Updated,
        &transaction,
    )?;

    Ok(Some(group_id))
}

/// The unreconciled bank transactions dated within the range, newest first.
pub fn get_unreconciled_bank_transactions(
    date_start: Date,
    date_end: Date,
    connection: &Connection,
) -> Result<Vec<BankTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction
            WHERE date_transaction BETWEEN ?1 AND ?2 AND reconciled_id IS NULL
            ORDER BY date_transaction DESC, id DESC"
        ))?
        .query_map([date_start, date_end], map_bank_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

pub fn get_bank_transactions_in_group(
    group_id: ReconciliationGroupId,
    connection: &Connection,
) -> Result<Vec<BankTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction
            WHERE reconciled_id = ?1
            ORDER BY date_transaction ASC, id ASC"
        ))?
        .query_map([group_id], map_bank_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The groups with a financial transaction submitted in the financial range
/// or a bank transaction dated in the bank range.
pub fn get_group_ids_in_ranges(
    financial_range: (Date, Date),
    bank_range: (Date, Date),
    connection: &Connection,
) -> Result<Vec<ReconciliationGroupId>, Error> {
    connection
        .prepare(
            "SELECT reconciled_id FROM financial_transaction
            WHERE reconciled_id IS NOT NULL AND date_submitted BETWEEN ?1 AND ?2
            UNION
            SELECT reconciled_id FROM bank_transaction
            WHERE reconciled_id IS NOT NULL AND date_transaction BETWEEN ?3 AND ?4
            ORDER BY 1",
        )?
        .query_map(
            params![financial_range.0, financial_range.1, bank_range.0, bank_range.1],
            |row| row.get(0),
        )?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}
