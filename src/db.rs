//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    auth::create_user_table,
    bank_institutions::create_institution_tables,
    bank_reconciliation::create_reconciliation_group_table,
    bank_transactions::create_statement_tables,
    documents::create_attachment_tables,
    financial_codes::create_financial_code_tables,
    financial_transactions::create_financial_transaction_tables,
    history::create_history_table,
    investments::create_investment_tables,
    payee_payers::{create_payee_payer_tables, seed_countries},
};

/// Create the tables for every domain model and seed the fixed data.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_history_table(&transaction)?;
    create_institution_tables(&transaction)?;
    create_reconciliation_group_table(&transaction)?;
    create_statement_tables(&transaction)?;
    create_financial_code_tables(&transaction)?;
    create_payee_payer_tables(&transaction)?;
    create_financial_transaction_tables(&transaction)?;
    create_investment_tables(&transaction)?;
    create_attachment_tables(&transaction)?;
    seed_countries(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialize failed");
        initialize(&connection).expect("second initialize failed");

        let countries: i64 = connection
            .query_row("SELECT COUNT(*) FROM country", [], |row| row.get(0))
            .unwrap();
        assert!(countries > 0);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
