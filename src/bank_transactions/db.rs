//! Database operations for statements and their bank transactions.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    bank_transactions::domain::{
        BankTransaction, BankTransactionDetails, BankTransactionId, Statement, StatementDetails,
        StatementId,
    },
    history::{Change, record_history},
};

const BANK_TRANSACTION_COLUMNS: &str = "id, statement_id, date_transaction, description_bank, \
    description_user, amount_debit, amount_credit, reconciled_id";

/// Create the statement and bank transaction tables.
///
/// Statements cannot be deleted from under their account, while bank
/// transactions go with their statement.
pub fn create_statement_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS statement (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE RESTRICT,
            date_start TEXT NOT NULL,
            date_end TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bank_transaction (
            id INTEGER PRIMARY KEY,
            statement_id INTEGER NOT NULL REFERENCES statement(id) ON DELETE CASCADE,
            date_transaction TEXT NOT NULL,
            description_bank TEXT NOT NULL,
            description_user TEXT,
            amount_debit TEXT NOT NULL DEFAULT '0.00',
            amount_credit TEXT NOT NULL DEFAULT '0.00',
            reconciled_id INTEGER REFERENCES reconciliation_group(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_statement_account ON statement(account_id);
        CREATE INDEX IF NOT EXISTS idx_bank_transaction_statement
            ON bank_transaction(statement_id);
        CREATE INDEX IF NOT EXISTS idx_bank_transaction_date
            ON bank_transaction(date_transaction);",
    )
}

pub fn create_statement(
    details: &StatementDetails,
    connection: &Connection,
) -> Result<Statement, Error> {
    connection.execute(
        "INSERT INTO statement (account_id, date_start, date_end) VALUES (?1, ?2, ?3)",
        (details.account_id, details.date_start, details.date_end),
    )?;

    let statement = Statement {
        id: connection.last_insert_rowid(),
        account_id: details.account_id,
        date_start: details.date_start,
        date_end: details.date_end,
    };
    record_history(connection, "statement", statement.id, Change::Created, &statement)?;

    Ok(statement)
}

pub fn get_statement(id: StatementId, connection: &Connection) -> Result<Statement, Error> {
    connection
        .prepare("SELECT id, account_id, date_start, date_end FROM statement WHERE id = :id")?
        .query_row(&[(":id", &id)], map_statement_row)
        .map_err(|error| error.into())
}

/// Every statement, grouped by account with the newest first.
pub fn get_all_statements(connection: &Connection) -> Result<Vec<Statement>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, date_start, date_end FROM statement
            ORDER BY account_id ASC, date_start DESC, id DESC",
        )?
        .query_map([], map_statement_row)?
        .map(|maybe_statement| maybe_statement.map_err(|error| error.into()))
        .collect()
}

pub fn update_statement(
    id: StatementId,
    details: &StatementDetails,
    connection: &Connection,
) -> Result<Statement, Error> {
    let rows_affected = connection.execute(
        "UPDATE statement SET account_id = ?1, date_start = ?2, date_end = ?3 WHERE id = ?4",
        (details.account_id, details.date_start, details.date_end, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("statement"));
    }

    let statement = get_statement(id, connection)?;
    record_history(connection, "statement", id, Change::Updated, &statement)?;

    Ok(statement)
}

/// Delete a statement with its bank transactions and attachment links.
pub fn delete_statement(id: StatementId, connection: &Connection) -> Result<(), Error> {
    let statement = get_statement(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("statement"),
        error => error,
    })?;

    for bank_transaction in get_bank_transactions_for_statement(id, connection)? {
        record_history(
            connection,
            "bank_transaction",
            bank_transaction.id,
            Change::Deleted,
            &bank_transaction,
        )?;
    }

    connection.execute("DELETE FROM statement WHERE id = ?1", [id])?;
    record_history(connection, "statement", id, Change::Deleted, &statement)?;

    Ok(())
}

pub fn create_bank_transaction(
    statement_id: StatementId,
    details: &BankTransactionDetails,
    connection: &Connection,
) -> Result<BankTransaction, Error> {
    connection.execute(
        "INSERT INTO bank_transaction
            (statement_id, date_transaction, description_bank, description_user,
            amount_debit, amount_credit)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            statement_id,
            details.date_transaction,
            &details.description_bank,
            &details.description_user,
            details.amount_debit,
            details.amount_credit,
        ),
    )?;

    let bank_transaction = BankTransaction {
        id: connection.last_insert_rowid(),
        statement_id,
        date_transaction: details.date_transaction,
        description_bank: details.description_bank.clone(),
        description_user: details.description_user.clone(),
        amount_debit: details.amount_debit,
        amount_credit: details.amount_credit,
        reconciled: None,
    };
    record_history(
        connection,
        "bank_transaction",
        bank_transaction.id,
        Change::Created,
        &bank_transaction,
    )?;

    Ok(bank_transaction)
}

pub fn get_bank_transaction(
    id: BankTransactionId,
    connection: &Connection,
) -> Result<BankTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_bank_transaction_row)
        .map_err(|error| error.into())
}

pub fn get_bank_transactions_for_statement(
    statement_id: StatementId,
    connection: &Connection,
) -> Result<Vec<BankTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction
            WHERE statement_id = ?1
            ORDER BY date_transaction ASC, id ASC"
        ))?
        .query_map([statement_id], map_bank_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

pub fn update_bank_transaction(
    id: BankTransactionId,
    details: &BankTransactionDetails,
    connection: &Connection,
) -> Result<BankTransaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE bank_transaction SET
            date_transaction = ?1,
            description_bank = ?2,
            description_user = ?3,
            amount_debit = ?4,
            amount_credit = ?5
        WHERE id = ?6",
        (
            details.date_transaction,
            &details.description_bank,
            &details.description_user,
            details.amount_debit,
            details.amount_credit,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("bank transaction"));
    }

    let bank_transaction = get_bank_transaction(id, connection)?;
    record_history(
        connection,
        "bank_transaction",
        id,
        Change::Updated,
        &bank_transaction,
    )?;

    Ok(bank_transaction)
}

pub fn delete_bank_transaction(id: BankTransactionId, connection: &Connection) -> Result<(), Error> {
    let bank_transaction = get_bank_transaction(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("bank transaction"),
        error => error,
    })?;

    connection.execute("DELETE FROM bank_transaction WHERE id = ?1", [id])?;
    record_history(
        connection,
        "bank_transaction",
        id,
        Change::Deleted,
        &bank_transaction,
    )?;

    Ok(())
}

fn map_statement_row(row: &Row) -> Result<Statement, rusqlite::Error> {
    Ok(Statement {
        id: row.get(0)?,
        account_id: row.get(1)?,
        date_start: row.get(2)?,
        date_end: row.get(3)?,
    })
}

pub(crate) fn map_bank_transaction_row(row: &Row) -> Result<BankTransaction, rusqlite::Error> {
    Ok(BankTransaction {
        id: row.get(0)?,
        statement_id: row.get(1)?,
        date_transaction: row.get(2)?,
        description_bank: row.get(3)?,
        description_user: row.get(4)?,
        amount_debit: row.get(5)?,
        amount_credit: row.get(6)?,
        reconciled: row.get(7)?,
    })
}


#[cfg(test)]
mod bank_transaction_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        bank_transactions::{
            BankTransactionDetails, create_bank_transaction, delete_bank_transaction,
            get_bank_transaction, update_bank_transaction,
        },
        money::Money,
        test_utils::{fixtures, get_test_connection},
    };

    fn details(description_user: Option<&str>) -> BankTransactionDetails {
        BankTransactionDetails {
            date_transaction: date!(2017 - 01 - 10),
            description_bank: "CHQ 001".to_owned(),
            description_user: description_user.map(str::to_owned),
            amount_debit: Money::from_cents(4500),
            amount_credit: Money::ZERO,
        }
    }

    #[test]
    fn create_get_update_delete() {
        let connection = get_test_connection();
        let statement = fixtures::statement(&connection);

        let created = create_bank_transaction(statement.id, &details(None), &connection).unwrap();
        assert_eq!(get_bank_transaction(created.id, &connection), Ok(created.clone()));

        let updated =
            update_bank_transaction(created.id, &details(Some("Hall rental")), &connection)
                .unwrap();
        assert_eq!(updated.description(), "Hall rental");
        assert_eq!(updated.amount_debit, Money::from_cents(4500));

        delete_bank_transaction(created.id, &connection).unwrap();
        assert_eq!(
            get_bank_transaction(created.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_missing_bank_transaction_fails() {
        let connection = get_test_connection();

        assert_eq!(
            update_bank_transaction(1, &details(None), &connection),
            Err(Error::UpdateMissing("bank transaction"))
        );
    }
}
