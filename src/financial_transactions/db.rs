//! Database operations for financial transactions, their items and the codes
//! the items are booked against.

use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    choices::Kind,
    financial_codes::FinancialCodeId,
    financial_transactions::domain::{
        CodeAssignment, CodeMatchId, FinancialCodeMatch, FinancialTransaction,
        FinancialTransactionDetails, FinancialTransactionId, Item, ItemDetails, ItemId,
        TransactionFilter, TransactionSummary, TransactionTotals,
    },
    history::{Change, record_history},
};

const TRANSACTION_COLUMNS: &str = "t.id, t.payee_payer_id, t.kind, t.memo, t.submitter, \
    t.date_submitted, t.submission_notes, t.reconciled_id";

/// Create the financial transaction, item and code match tables.
///
/// A payee/payer cannot be deleted while it has transactions. Items go with
/// their transaction and code matches go with either their item or code.
pub fn create_financial_transaction_tables(
    connection: &Connection,
) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS financial_transaction (
            id INTEGER PRIMARY KEY,
            payee_payer_id INTEGER NOT NULL REFERENCES payee_payer(id) ON DELETE RESTRICT,
            kind TEXT NOT NULL DEFAULT 'e',
            memo TEXT NOT NULL,
            submitter TEXT,
            date_submitted TEXT NOT NULL,
            submission_notes TEXT,
            reconciled_id INTEGER REFERENCES reconciliation_group(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS item (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL
                REFERENCES financial_transaction(id) ON DELETE CASCADE,
            date_item TEXT NOT NULL,
            description TEXT NOT NULL,
            amount TEXT NOT NULL DEFAULT '0.00',
            gst TEXT NOT NULL DEFAULT '0.00'
        );

        CREATE TABLE IF NOT EXISTS financial_code_match (
            id INTEGER PRIMARY KEY,
            item_id INTEGER NOT NULL REFERENCES item(id) ON DELETE CASCADE,
            financial_code_id INTEGER NOT NULL REFERENCES financial_code(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_financial_transaction_date
            ON financial_transaction(date_submitted);
        CREATE INDEX IF NOT EXISTS idx_item_transaction ON item(transaction_id);
        CREATE INDEX IF NOT EXISTS idx_financial_code_match_item ON financial_code_match(item_id);",
    )
}

pub fn create_financial_transaction(
    kind: Kind,
    details: &FinancialTransactionDetails,
    connection: &Connection,
) -> Result<FinancialTransaction, Error> {
    connection.execute(
        "INSERT INTO financial_transaction
            (payee_payer_id, kind, memo, submitter, date_submitted, submission_notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            details.payee_payer_id,
            kind,
            &details.memo,
            &details.submitter,
            details.date_submitted,
            &details.submission_notes,
        ),
    )?;

    let transaction = get_financial_transaction(connection.last_insert_rowid(), connection)?;
    record_history(
        connection,
        "financial_transaction",
        transaction.id,
        Change::Created,
        &transaction,
    )?;

    Ok(transaction)
}

pub fn get_financial_transaction(
    id: FinancialTransactionId,
    connection: &Connection,
) -> Result<FinancialTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM financial_transaction t WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Update a transaction's details. Its kind never changes.
pub fn update_financial_transaction(
    id: FinancialTransactionId,
    details: &FinancialTransactionDetails,
    connection: &Connection,
) -> Result<FinancialTransaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE financial_transaction
        SET payee_payer_id = ?1, memo = ?2, submitter = ?3, date_submitted = ?4,
            submission_notes = ?5
        WHERE id = ?6",
        (
            details.payee_payer_id,
            &details.memo,
            &details.submitter,
            details.date_submitted,
            &details.submission_notes,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("financial transaction"));
    }

    let transaction = get_financial_transaction(id, connection)?;
    record_history(
        connection,
        "financial_transaction",
        id,
        Change::Updated,
        &transaction,
    )?;

    Ok(transaction)
}

/// Delete a transaction with its items and their code matches.
pub fn delete_financial_transaction(
    id: FinancialTransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = get_financial_transaction(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("financial transaction"),
        error => error,
    })?;

    for item in get_items(id, connection)? {
        record_item_deletion(&item, connection)?;
    }

    connection.execute("DELETE FROM financial_transaction WHERE id = ?1", [id])?;
    record_history(
        connection,
        "financial_transaction",
        id,
        Change::Deleted,
        &transaction,
    )?;

    Ok(())
}

/// The transactions matching `filter`, newest first.
pub fn get_transaction_summaries(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionSummary>, Error> {
    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, p.name
            FROM financial_transaction t
            INNER JOIN payee_payer p ON p.id = t.payee_payer_id
            WHERE (?1 IS NULL OR t.kind = ?1)
                AND (?2 IS NULL OR t.date_submitted >= ?2)
                AND (?3 IS NULL OR t.date_submitted <= ?3)
                AND (?4 = 0 OR t.reconciled_id IS NULL)
            ORDER BY t.date_submitted DESC, t.id DESC"
        ))?
        .query_map(
            params![
                filter.kind,
                filter.date_start,
                filter.date_end,
                filter.unreconciled_only
            ],
            |row| Ok((map_transaction_row(row)?, row.get::<_, String>(8)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;

    summarize(transactions, connection)
}

/// The transactions in a reconciliation group.
pub fn get_reconciled_summaries(
    group_id: i64,
    connection: &Connection,
) -> Result<Vec<TransactionSummary>, Error> {
    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, p.name
            FROM financial_transaction t
            INNER JOIN payee_payer p ON p.id = t.payee_payer_id
            WHERE t.reconciled_id = ?1
            ORDER BY t.date_submitted ASC, t.id ASC"
        ))?
        .query_map([group_id], |row| {
            Ok((map_transaction_row(row)?, row.get::<_, String>(8)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    summarize(transactions, connection)
}

pub fn get_transaction_summary(
    id: FinancialTransactionId,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, p.name
            FROM financial_transaction t
            INNER JOIN payee_payer p ON p.id = t.payee_payer_id
            WHERE t.id = ?1"
        ))?
        .query_row([id], |row| {
            Ok((map_transaction_row(row)?, row.get::<_, String>(8)?))
        })?;

    summarize(vec![transaction], connection)?
        .pop()
        .ok_or(Error::NotFound)
}

fn summarize(
    transactions: Vec<(FinancialTransaction, String)>,
    connection: &Connection,
) -> Result<Vec<TransactionSummary>, Error> {
    transactions
        .into_iter()
        .map(|(transaction, payee_payer)| {
            let items = get_items(transaction.id, connection)?;

            Ok(TransactionSummary {
                transaction,
                payee_payer,
                totals: TransactionTotals::from_items(&items),
            })
        })
        .collect()
}

pub fn create_item(
    transaction_id: FinancialTransactionId,
    details: &ItemDetails,
    connection: &Connection,
) -> Result<Item, Error> {
    connection.execute(
        "INSERT INTO item (transaction_id, date_item, description, amount, gst)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            transaction_id,
            details.date_item,
            &details.description,
            details.amount,
            details.gst,
        ),
    )?;

    let item = Item {
        id: connection.last_insert_rowid(),
        transaction_id,
        date_item: details.date_item,
        description: details.description.clone(),
        amount: details.amount,
        gst: details.gst,
    };
    record_history(connection, "item", item.id, Change::Created, &item)?;

    Ok(item)
}

pub fn get_item(id: ItemId, connection: &Connection) -> Result<Item, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, date_item, description, amount, gst
            FROM item WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_item_row)
        .map_err(|error| error.into())
}

/// The items of a transaction in date order.
pub fn get_items(
    transaction_id: FinancialTransactionId,
    connection: &Connection,
) -> Result<Vec<Item>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, date_item, description, amount, gst
            FROM item WHERE transaction_id = ?1
            ORDER BY date_item ASC, id ASC",
        )?
        .query_map([transaction_id], map_item_row)?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

pub fn update_item(id: ItemId, details: &ItemDetails, connection: &Connection) -> Result<Item, Error> {
    let rows_affected = connection.execute(
        "UPDATE item SET date_item = ?1, description = ?2, amount = ?3, gst = ?4 WHERE id = ?5",
        (
            details.date_item,
            &details.description,
            details.amount,
            details.gst,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("item"));
    }

    let item = get_item(id, connection)?;
    record_history(connection, "item", id, Change::Updated, &item)?;

    Ok(item)
}

/// Delete an item and its code matches.
pub fn delete_item(id: ItemId, connection: &Connection) -> Result<(), Error> {
    let item = get_item(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("item"),
        error => error,
    })?;

    record_item_deletion(&item, connection)?;
    connection.execute("DELETE FROM item WHERE id = ?1", [id])?;

    Ok(())
}

fn record_item_deletion(item: &Item, connection: &Connection) -> Result<(), Error> {
    for assignment in get_code_assignments(item.id, connection)? {
        record_history(
            connection,
            "financial_code_match",
            assignment.code_match.id,
            Change::Deleted,
            &assignment.code_match,
        )?;
    }

    record_history(connection, "item", item.id, Change::Deleted, item)
}

pub fn create_code_match(
    item_id: ItemId,
    financial_code_id: FinancialCodeId,
    connection: &Connection,
) -> Result<FinancialCodeMatch, Error> {
    connection.execute(
        "INSERT INTO financial_code_match (item_id, financial_code_id) VALUES (?1, ?2)",
        (item_id, financial_code_id),
    )?;

    let code_match = FinancialCodeMatch {
        id: connection.last_insert_rowid(),
        item_id,
        financial_code_id,
    };
    record_history(
        connection,
        "financial_code_match",
        code_match.id,
        Change::Created,
        &code_match,
    )?;

    Ok(code_match)
}

/// The codes an item is booked against, with the system of each code.
pub fn get_code_assignments(
    item_id: ItemId,
    connection: &Connection,
) -> Result<Vec<CodeAssignment>, Error> {
    connection
        .prepare(
            "SELECT m.id, m.item_id, m.financial_code_id, y.id, y.financial_code_system_id
            FROM financial_code_match m
            INNER JOIN financial_code c ON c.id = m.financial_code_id
            INNER JOIN financial_code_group g ON g.id = c.financial_code_group_id
            INNER JOIN budget_year y ON y.id = g.budget_year_id
            WHERE m.item_id = ?1
            ORDER BY m.id ASC",
        )?
        .query_map([item_id], |row| {
            Ok(CodeAssignment {
                code_match: FinancialCodeMatch {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    financial_code_id: row.get(2)?,
                },
                budget_year_id: row.get(3)?,
                system_id: row.get(4)?,
            })
        })?
        .map(|maybe_assignment| maybe_assignment.map_err(|error| error.into()))
        .collect()
}

pub fn update_code_match(
    id: CodeMatchId,
    financial_code_id: FinancialCodeId,
    connection: &Connection,
) -> Result<FinancialCodeMatch, Error> {
    let code_match = connection
        .query_row(
            "UPDATE financial_code_match SET financial_code_id = ?1 WHERE id = ?2
            RETURNING id, item_id, financial_code_id",
            (financial_code_id, id),
            |row| {
                Ok(FinancialCodeMatch {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    financial_code_id: row.get(2)?,
                })
            },
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::UpdateMissing("financial code match"),
            error => error,
        })?;

    record_history(
        connection,
        "financial_code_match",
        id,
        Change::Updated,
        &code_match,
    )?;

    Ok(code_match)
}

pub fn delete_code_match(id: CodeMatchId, connection: &Connection) -> Result<(), Error> {
    let code_match = connection
        .query_row(
            "DELETE FROM financial_code_match WHERE id = ?1
            RETURNING id, item_id, financial_code_id",
            [id],
            |row| {
                Ok(FinancialCodeMatch {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    financial_code_id: row.get(2)?,
                })
            },
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::DeleteMissing("financial code match"),
            error => error,
        })?;

    record_history(
        connection,
        "financial_code_match",
        id,
        Change::Deleted,
        &code_match,
    )
}

pub(crate) fn map_transaction_row(row: &Row) -> Result<FinancialTransaction, rusqlite::Error> {
    Ok(FinancialTransaction {
        id: row.get(0)?,
        payee_payer_id: row.get(1)?,
        kind: row.get(2)?,
        memo: row.get(3)?,
        submitter: row.get(4)?,
        date_submitted: row.get(5)?,
        submission_notes: row.get(6)?,
        reconciled: row.get(7)?,
    })
}

fn map_item_row(row: &Row) -> Result<Item, rusqlite::Error> {
    Ok(Item {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        date_item: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        gst: row.get(5)?,
    })
}


#[cfg(test)]
mod item_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        choices::Kind,
        financial_transactions::{
            ItemDetails, create_code_match, delete_code_match, delete_item,
            get_code_assignments, get_items, update_code_match, update_item,
        },
        money::Money,
        test_utils::{fixtures, get_test_connection},
    };

    #[test]
    fn update_item_changes_amounts() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Expense);
        let item = get_items(transaction.id, &connection).unwrap().remove(0);

        let updated = update_item(
            item.id,
            &ItemDetails {
                date_item: item.date_item,
                description: "Taxi".to_owned(),
                amount: Money::from_cents(200),
                gst: Money::from_cents(10),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.total(), Money::from_cents(210));
        assert_eq!(updated.to_string(), "2017-01-15 - Taxi - $2.10");
    }

    #[test]
    fn code_assignments_know_their_system() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Expense);
        let item = get_items(transaction.id, &connection).unwrap().remove(0);

        let assignments = get_code_assignments(item.id, &connection).unwrap();

        assert_eq!(assignments.len(), 1);
        assert_eq!(
            assignments[0].system_id,
            fixtures::system_of_code(&connection, assignments[0].code_match.financial_code_id)
        );
    }

    #[test]
    fn code_matches_can_be_changed_and_removed() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Expense);
        let item = get_items(transaction.id, &connection).unwrap().remove(0);
        let code_id = get_code_assignments(item.id, &connection).unwrap()[0]
            .code_match
            .financial_code_id;

        let second = create_code_match(item.id, code_id, &connection).unwrap();
        let updated = update_code_match(second.id, code_id, &connection).unwrap();
        assert_eq!(updated.item_id, item.id);
        delete_code_match(second.id, &connection).unwrap();

        assert_eq!(get_code_assignments(item.id, &connection).unwrap().len(), 1);
        assert_eq!(
            delete_code_match(second.id, &connection),
            Err(Error::DeleteMissing("financial code match"))
        );
    }

    #[test]
    fn delete_item_removes_it() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Expense);
        let item = get_items(transaction.id, &connection).unwrap().remove(0);

        delete_item(item.id, &connection).unwrap();

        assert!(get_items(transaction.id, &connection).unwrap().is_empty());
        assert_eq!(
            update_item(
                item.id,
                &ItemDetails {
                    date_item: date!(2017 - 01 - 01),
                    description: "Gone".to_owned(),
                    amount: Money::ZERO,
                    gst: Money::ZERO,
                },
                &connection,
            ),
            Err(Error::UpdateMissing("item"))
        );
    }
}
