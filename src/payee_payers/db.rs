//! Database operations for countries and payee/payers.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    history::{Change, record_history},
    payee_payers::domain::{
        Country, PayeePayer, PayeePayerDetails, PayeePayerId, PayeePayerListing,
    },
};

/// The countries available when the database is created.
const COUNTRIES: [(&str, &str); 20] = [
    ("AU", "Australia"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CN", "China"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("IE", "Ireland"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("NL", "Netherlands"),
    ("NZ", "New Zealand"),
    ("PH", "Philippines"),
    ("ES", "Spain"),
    ("SE", "Sweden"),
    ("CH", "Switzerland"),
    ("US", "United States"),
];

pub fn create_payee_payer_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS country (
            id INTEGER PRIMARY KEY,
            country_code TEXT NOT NULL UNIQUE,
            country_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS payee_payer (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            address TEXT NOT NULL,
            city TEXT NOT NULL,
            province TEXT NOT NULL,
            country_id INTEGER REFERENCES country(id) ON DELETE SET NULL,
            postal_code TEXT,
            phone TEXT,
            fax TEXT,
            email TEXT,
            status TEXT NOT NULL DEFAULT 'a'
        );",
    )
}

/// Add the fixed list of countries, skipping those already present.
pub fn seed_countries(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection
        .prepare("INSERT OR IGNORE INTO country (country_code, country_name) VALUES (?1, ?2)")?;

    for (code, name) in COUNTRIES {
        statement.execute((code, name))?;
    }

    Ok(())
}

/// All countries ordered by name.
pub fn get_countries(connection: &Connection) -> Result<Vec<Country>, Error> {
    connection
        .prepare("SELECT id, country_code, country_name FROM country ORDER BY country_name ASC")?
        .query_map([], |row| {
            Ok(Country {
                id: row.get(0)?,
                country_code: row.get(1)?,
                country_name: row.get(2)?,
            })
        })?
        .map(|maybe_country| maybe_country.map_err(|error| error.into()))
        .collect()
}

/// Create a payee/payer.
///
/// # Errors
/// Returns [Error::UniqueConstraint] if the name is already taken.
pub fn create_payee_payer(
    details: &PayeePayerDetails,
    connection: &Connection,
) -> Result<PayeePayer, Error> {
    connection.execute(
        "INSERT INTO payee_payer
            (name, address, city, province, country_id, postal_code, phone, fax, email, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            &details.name,
            &details.address,
            &details.city,
            &details.province,
            details.country_id,
            &details.postal_code,
            &details.phone,
            &details.fax,
            &details.email,
            details.status,
        ),
    )?;

    let id = connection.last_insert_rowid();
    let payee_payer = get_payee_payer(id, connection)?;
    record_history(connection, "payee_payer", id, Change::Created, &payee_payer)?;

    Ok(payee_payer)
}

pub fn get_payee_payer(id: PayeePayerId, connection: &Connection) -> Result<PayeePayer, Error> {
    connection
        .prepare(
            "SELECT id, name, address, city, province, country_id, postal_code, phone, fax,
                email, status
            FROM payee_payer WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_payee_payer_row)
        .map_err(|error| error.into())
}

/// All payee/payers ordered by name.
pub fn get_all_payee_payers(connection: &Connection) -> Result<Vec<PayeePayer>, Error> {
    connection
        .prepare(
            "SELECT id, name, address, city, province, country_id, postal_code, phone, fax,
                email, status
            FROM payee_payer ORDER BY name ASC",
        )?
        .query_map([], map_payee_payer_row)?
        .map(|maybe_payee_payer| maybe_payee_payer.map_err(|error| error.into()))
        .collect()
}

/// All payee/payers with their country names, ordered by name.
pub fn get_payee_payer_listings(connection: &Connection) -> Result<Vec<PayeePayerListing>, Error> {
    connection
        .prepare(
            "SELECT p.id, p.name, p.address, p.city, p.province, p.country_id, p.postal_code,
                p.phone, p.fax, p.email, p.status, c.country_name
            FROM payee_payer p
            LEFT JOIN country c ON c.id = p.country_id
            ORDER BY p.name ASC",
        )?
        .query_map([], |row| {
            Ok(PayeePayerListing {
                payee_payer: map_payee_payer_row(row)?,
                country_name: row.get(11)?,
            })
        })?
        .map(|maybe_listing| maybe_listing.map_err(|error| error.into()))
        .collect()
}

pub fn update_payee_payer(
    id: PayeePayerId,
    details: &PayeePayerDetails,
    connection: &Connection,
) -> Result<PayeePayer, Error> {
    let rows_affected = connection.execute(
        "UPDATE payee_payer
        SET name = ?1, address = ?2, city = ?3, province = ?4, country_id = ?5,
            postal_code = ?6, phone = ?7, fax = ?8, email = ?9, status = ?10
        WHERE id = ?11",
        (
            &details.name,
            &details.address,
            &details.city,
            &details.province,
            details.country_id,
            &details.postal_code,
            &details.phone,
            &details.fax,
            &details.email,
            details.status,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("payee/payer"));
    }

    let payee_payer = get_payee_payer(id, connection)?;
    record_history(connection, "payee_payer", id, Change::Updated, &payee_payer)?;

    Ok(payee_payer)
}

/// Delete a payee/payer that no financial transaction refers to.
pub fn delete_payee_payer(id: PayeePayerId, connection: &Connection) -> Result<(), Error> {
    let payee_payer = get_payee_payer(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("payee/payer"),
        error => error,
    })?;

    let transaction_count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM financial_transaction WHERE payee_payer_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::ProtectedDelete(format!(
            "{payee_payer} has {transaction_count} financial transaction(s). \
            Delete them or assign them to another payee/payer first."
        )));
    }

    connection.execute("DELETE FROM payee_payer WHERE id = ?1", [id])?;
    record_history(connection, "payee_payer", id, Change::Deleted, &payee_payer)?;

    Ok(())
}

fn map_payee_payer_row(row: &Row) -> Result<PayeePayer, rusqlite::Error> {
    Ok(PayeePayer {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        province: row.get(4)?,
        country_id: row.get(5)?,
        postal_code: row.get(6)?,
        phone: row.get(7)?,
        fax: row.get(8)?,
        email: row.get(9)?,
        status: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        choices::{Kind, Status},
        payee_payers::{
            PayeePayerDetails, create_payee_payer, delete_payee_payer, get_countries,
            get_payee_payer, get_payee_payer_listings, update_payee_payer,
        },
        test_utils::{fixtures, get_test_connection},
    };

    fn details(name: &str) -> PayeePayerDetails {
        PayeePayerDetails {
            name: name.to_owned(),
            address: "1 Main St".to_owned(),
            city: "Edmonton".to_owned(),
            province: "Alberta".to_owned(),
            country_id: None,
            postal_code: None,
            phone: None,
            fax: None,
            email: Some("jane@example.com".to_owned()),
            status: Status::Active,
        }
    }

    #[test]
    fn countries_are_sorted_by_name() {
        let connection = get_test_connection();

        let countries = get_countries(&connection).unwrap();

        assert_eq!(countries[0].country_name, "Australia");
        assert!(countries.iter().any(|country| country.country_code == "CA"));
    }

    #[test]
    fn names_are_unique() {
        let connection = get_test_connection();
        create_payee_payer(&details("Jane Doe"), &connection).unwrap();

        let result = create_payee_payer(&details("Jane Doe"), &connection);

        assert!(matches!(result, Err(Error::UniqueConstraint(_))));
    }

    #[test]
    fn listing_includes_country_name() {
        let connection = get_test_connection();
        let canada = get_countries(&connection)
            .unwrap()
            .into_iter()
            .find(|country| country.country_code == "CA")
            .unwrap();
        let mut with_country = details("Jane Doe");
        with_country.country_id = Some(canada.id);
        create_payee_payer(&with_country, &connection).unwrap();
        create_payee_payer(&details("Acme"), &connection).unwrap();

        let listings = get_payee_payer_listings(&connection).unwrap();

        assert_eq!(listings[0].payee_payer.name, "Acme");
        assert_eq!(listings[0].country_name, None);
        assert_eq!(listings[1].country_name.as_deref(), Some("Canada"));
    }

    #[test]
    fn update_changes_fields() {
        let connection = get_test_connection();
        let payee_payer = create_payee_payer(&details("Jane Doe"), &connection).unwrap();
        let mut changed = details("Jane Smith");
        changed.status = Status::Inactive;

        update_payee_payer(payee_payer.id, &changed, &connection).unwrap();

        let got = get_payee_payer(payee_payer.id, &connection).unwrap();
        assert_eq!(got.name, "Jane Smith");
        assert_eq!(got.status, Status::Inactive);
    }

    #[test]
    fn update_missing_fails() {
        let connection = get_test_connection();

        assert_eq!(
            update_payee_payer(4, &details("Jane"), &connection),
            Err(Error::UpdateMissing("payee/payer"))
        );
    }

    #[test]
    fn payee_payer_with_transactions_is_kept() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Expense);

        let result = delete_payee_payer(transaction.payee_payer_id, &connection);

        assert!(matches!(result, Err(Error::ProtectedDelete(_))));
        assert!(get_payee_payer(transaction.payee_payer_id, &connection).is_ok());
    }

    #[test]
    fn delete_missing_fails() {
        let connection = get_test_connection();

        assert_eq!(
            delete_payee_payer(4, &connection),
            Err(Error::DeleteMissing("payee/payer"))
        );
    }
}
