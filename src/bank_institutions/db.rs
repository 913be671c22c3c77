//! Database operations for institutions and their accounts.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    bank_institutions::domain::{
        Account, AccountDetails, AccountId, AccountLabel, Institution, InstitutionDetails,
        InstitutionId,
    },
    history::{Change, record_history},
};

pub fn create_institution_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS institution (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            fax TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            institution_id INTEGER NOT NULL REFERENCES institution(id) ON DELETE CASCADE,
            account_number TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'a'
        );

        CREATE INDEX IF NOT EXISTS idx_account_institution ON account(institution_id);",
    )
}

pub fn create_institution(
    details: &InstitutionDetails,
    connection: &Connection,
) -> Result<Institution, Error> {
    connection.execute(
        "INSERT INTO institution (name, address, phone, fax) VALUES (?1, ?2, ?3, ?4)",
        (&details.name, &details.address, &details.phone, &details.fax),
    )?;

    let institution = Institution {
        id: connection.last_insert_rowid(),
        name: details.name.clone(),
        address: details.address.clone(),
        phone: details.phone.clone(),
        fax: details.fax.clone(),
    };
    record_history(
        connection,
        "institution",
        institution.id,
        Change::Created,
        &institution,
    )?;

    Ok(institution)
}

pub fn get_institution(id: InstitutionId, connection: &Connection) -> Result<Institution, Error> {
    connection
        .prepare("SELECT id, name, address, phone, fax FROM institution WHERE id = :id")?
        .query_row(&[(":id", &id)], map_institution_row)
        .map_err(|error| error.into())
}

/// Retrieve all institutions ordered by name.
pub fn get_all_institutions(connection: &Connection) -> Result<Vec<Institution>, Error> {
    connection
        .prepare("SELECT id, name, address, phone, fax FROM institution ORDER BY name ASC")?
        .query_map([], map_institution_row)?
        .map(|maybe_institution| maybe_institution.map_err(|error| error.into()))
        .collect()
}

pub fn update_institution(
    id: InstitutionId,
    details: &InstitutionDetails,
    connection: &Connection,
) -> Result<Institution, Error> {
    let rows_affected = connection.execute(
        "UPDATE institution SET name = ?1, address = ?2, phone = ?3, fax = ?4 WHERE id = ?5",
        (&details.name, &details.address, &details.phone, &details.fax, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("institution"));
    }

    let institution = get_institution(id, connection)?;
    record_history(connection, "institution", id, Change::Updated, &institution)?;

    Ok(institution)
}

/// Delete an institution and its accounts.
///
/// Fails with [Error::ProtectedDelete] if any of its accounts have statements.
pub fn delete_institution(id: InstitutionId, connection: &Connection) -> Result<(), Error> {
    let institution = get_institution(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("institution"),
        error => error,
    })?;

    let statement_count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM statement s
        INNER JOIN account a ON a.id = s.account_id
        WHERE a.institution_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if statement_count > 0 {
        return Err(Error::ProtectedDelete(format!(
            "{institution} has accounts with {statement_count} statement(s). \
            Delete the statements first."
        )));
    }

    for account in get_accounts_for_institution(id, connection)? {
        record_history(connection, "account", account.id, Change::Deleted, &account)?;
    }

    connection.execute("DELETE FROM institution WHERE id = ?1", [id])?;
    record_history(connection, "institution", id, Change::Deleted, &institution)?;

    Ok(())
}

pub fn create_account(
    institution_id: InstitutionId,
    details: &AccountDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account (institution_id, account_number, name, status)
        VALUES (?1, ?2, ?3, ?4)",
        (
            institution_id,
            &details.account_number,
            &details.name,
            details.status,
        ),
    )?;

    let account = Account {
        id: connection.last_insert_rowid(),
        institution_id,
        account_number: details.account_number.clone(),
        name: details.name.clone(),
        status: details.status,
    };
    record_history(connection, "account", account.id, Change::Created, &account)?;

    Ok(account)
}

pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, institution_id, account_number, name, status FROM account WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_account_row)
        .map_err(|error| error.into())
}

pub fn get_accounts_for_institution(
    institution_id: InstitutionId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, institution_id, account_number, name, status FROM account
            WHERE institution_id = ?1
            ORDER BY id ASC",
        )?
        .query_map([institution_id], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Every account with its institution name, ordered by institution then
/// account name.
pub fn get_account_labels(connection: &Connection) -> Result<Vec<AccountLabel>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.institution_id, a.account_number, a.name, a.status, i.name
            FROM account a
            INNER JOIN institution i ON i.id = a.institution_id
            ORDER BY i.name ASC, a.name ASC",
        )?
        .query_map([], |row| {
            Ok(AccountLabel {
                account: map_account_row(row)?,
                institution_name: row.get(5)?,
            })
        })?
        .map(|maybe_label| maybe_label.map_err(|error| error.into()))
        .collect()
}

pub fn update_account(
    id: AccountId,
    details: &AccountDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET account_number = ?1, name = ?2, status = ?3 WHERE id = ?4",
        (&details.account_number, &details.name, details.status, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("account"));
    }

    let account = get_account(id, connection)?;
    record_history(connection, "account", id, Change::Updated, &account)?;

    Ok(account)
}

/// Delete an account, fails if the account has statements.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let account = get_account(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("account"),
        error => error,
    })?;

    connection
        .execute("DELETE FROM account WHERE id = ?1", [id])
        .map_err(|error| match Error::from(error) {
            Error::ForeignKeyConstraint => Error::ProtectedDelete(format!(
                "The account {} ({}) has statements. Delete the statements first.",
                account.name, account.account_number
            )),
            error => error,
        })?;
    record_history(connection, "account", id, Change::Deleted, &account)?;

    Ok(())
}

fn map_institution_row(row: &Row) -> Result<Institution, rusqlite::Error> {
    Ok(Institution {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        fax: row.get(4)?,
    })
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        institution_id: row.get(1)?,
        account_number: row.get(2)?,
        name: row.get(3)?,
        status: row.get(4)?,
    })
}
