//! Database operations for investments and their details.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    history::{Change, record_history},
    investments::domain::{
        Investment, InvestmentData, InvestmentDetail, InvestmentDetailData, InvestmentDetailId,
        InvestmentId, InvestmentSummary,
    },
};

const DETAIL_COLUMNS: &str =
    "id, investment_id, date_investment, detail_status, amount, reconciled_id";

/// Create the investment and investment detail tables.
///
/// Details go with their investment.
pub fn create_investment_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS investment (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            rate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS investment_detail (
            id INTEGER PRIMARY KEY,
            investment_id INTEGER NOT NULL REFERENCES investment(id) ON DELETE CASCADE,
            date_investment TEXT NOT NULL,
            detail_status TEXT NOT NULL,
            amount TEXT NOT NULL DEFAULT '0.00',
            reconciled_id INTEGER REFERENCES reconciliation_group(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_investment_detail_investment
            ON investment_detail(investment_id);",
    )
}

pub fn create_investment(data: &InvestmentData, connection: &Connection) -> Result<Investment, Error> {
    connection.execute(
        "INSERT INTO investment (name, rate) VALUES (?1, ?2)",
        (&data.name, &data.rate),
    )?;

    let investment = Investment {
        id: connection.last_insert_rowid(),
        name: data.name.clone(),
        rate: data.rate.clone(),
    };
    record_history(connection, "investment", investment.id, Change::Created, &investment)?;

    Ok(investment)
}

pub fn get_investment(id: InvestmentId, connection: &Connection) -> Result<Investment, Error> {
    connection
        .prepare("SELECT id, name, rate FROM investment WHERE id = :id")?
        .query_row(&[(":id", &id)], map_investment_row)
        .map_err(|error| error.into())
}

/// Every investment with its details, ordered by name.
pub fn get_investment_summaries(connection: &Connection) -> Result<Vec<InvestmentSummary>, Error> {
    let investments = connection
        .prepare("SELECT id, name, rate FROM investment ORDER BY name ASC, id ASC")?
        .query_map([], map_investment_row)?
        .collect::<Result<Vec<_>, _>>()?;

    investments
        .into_iter()
        .map(|investment| {
            Ok(InvestmentSummary {
                details: get_investment_details(investment.id, connection)?,
                investment,
            })
        })
        .collect()
}

pub fn update_investment(
    id: InvestmentId,
    data: &InvestmentData,
    connection: &Connection,
) -> Result<Investment, Error> {
    let rows_affected = connection.execute(
        "UPDATE investment SET name = ?1, rate = ?2 WHERE id = ?3",
        (&data.name, &data.rate, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("investment"));
    }

    let investment = get_investment(id, connection)?;
    record_history(connection, "investment", id, Change::Updated, &investment)?;

    Ok(investment)
}

/// Delete an investment with its details.
pub fn delete_investment(id: InvestmentId, connection: &Connection) -> Result<(), Error> {
    let investment = get_investment(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("investment"),
        error => error,
    })?;

    for detail in get_investment_details(id, connection)? {
        record_history(
            connection,
            "investment_detail",
            detail.id,
            Change::Deleted,
            &detail,
        )?;
    }

    connection.execute("DELETE FROM investment WHERE id = ?1", [id])?;
    record_history(connection, "investment", id, Change::Deleted, &investment)?;

    Ok(())
}

pub fn create_investment_detail(
    investment_id: InvestmentId,
    data: &InvestmentDetailData,
    connection: &Connection,
) -> Result<InvestmentDetail, Error> {
    connection.execute(
        "INSERT INTO investment_detail (investment_id, date_investment, detail_status, amount)
        VALUES (?1, ?2, ?3, ?4)",
        (
            investment_id,
            data.date_investment,
            data.detail_status,
            data.amount,
        ),
    )?;

    let detail = InvestmentDetail {
        id: connection.last_insert_rowid(),
        investment_id,
        date_investment: data.date_investment,
        detail_status: data.detail_status,
        amount: data.amount,
        reconciled: None,
    };
    record_history(
        connection,
        "investment_detail",
        detail.id,
        Change::Created,
        &detail,
    )?;

    Ok(detail)
}

pub fn get_investment_detail(
    id: InvestmentDetailId,
    connection: &Connection,
) -> Result<InvestmentDetail, Error> {
    connection
        .prepare(&format!(
            "SELECT {DETAIL_COLUMNS} FROM investment_detail WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_detail_row)
        .map_err(|error| error.into())
}

/// The details of an investment, oldest first.
pub fn get_investment_details(
    investment_id: InvestmentId,
    connection: &Connection,
) -> Result<Vec<InvestmentDetail>, Error> {
    connection
        .prepare(&format!(
            "SELECT {DETAIL_COLUMNS} FROM investment_detail
            WHERE investment_id = ?1
            ORDER BY date_investment ASC, id ASC"
        ))?
        .query_map([investment_id], map_detail_row)?
        .map(|maybe_detail| maybe_detail.map_err(|error| error.into()))
        .collect()
}

/// The details of every investment dated on or before `date`.
pub fn get_investment_details_up_to(
    date: Date,
    connection: &Connection,
) -> Result<Vec<InvestmentDetail>, Error> {
    connection
        .prepare(&format!(
            "SELECT {DETAIL_COLUMNS} FROM investment_detail
            WHERE date_investment <= ?1
            ORDER BY date_investment ASC, id ASC"
        ))?
        .query_map([date], map_detail_row)?
        .map(|maybe_detail| maybe_detail.map_err(|error| error.into()))
        .collect()
}

pub fn update_investment_detail(
    id: InvestmentDetailId,
    data: &InvestmentDetailData,
    connection: &Connection,
) -> Result<InvestmentDetail, Error> {
    let rows_affected = connection.execute(
        "UPDATE investment_detail SET date_investment = ?1, detail_status = ?2, amount = ?3
        WHERE id = ?4",
        (data.date_investment, data.detail_status, data.amount, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("investment detail"));
    }

    let detail = get_investment_detail(id, connection)?;
    record_history(connection, "investment_detail", id, Change::Updated, &detail)?;

    Ok(detail)
}

pub fn delete_investment_detail(
    id: InvestmentDetailId,
    connection: &Connection,
) -> Result<(), Error> {
    let detail = get_investment_detail(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("investment detail"),
        error => error,
    })?;

    connection.execute("DELETE FROM investment_detail WHERE id = ?1", [id])?;
    record_history(connection, "investment_detail", id, Change::Deleted, &detail)?;

    Ok(())
}

fn map_investment_row(row: &Row) -> Result<Investment, rusqlite::Error> {
    Ok(Investment {
        id: row.get(0)?,
        name: row.get(1)?,
        rate: row.get(2)?,
    })
}

fn map_detail_row(row: &Row) -> Result<InvestmentDetail, rusqlite::Error> {
    Ok(InvestmentDetail {
        id: row.get(0)?,
        investment_id: row.get(1)?,
        date_investment: row.get(2)?,
        detail_status: row.get(3)?,
        amount: row.get(4)?,
        reconciled: row.get(5)?,
    })
}

#[cfg(test)]
mod investment_query_tests {
    use crate::{
        Error,
        history::history_for,
        investments::{
            InvestmentData, create_investment, delete_investment, get_investment,
            get_investment_details, get_investment_summaries, update_investment,
        },
        test_utils::{fixtures, get_test_connection},
    };

    #[test]
    fn create_and_update_investment() {
        let connection = get_test_connection();

        let investment = create_investment(
            &InvestmentData {
                name: "GIC".to_owned(),
                rate: "1.5% for 1 year".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let updated = update_investment(
            investment.id,
            &InvestmentData {
                name: "GIC 2017".to_owned(),
                rate: "1.5% for 1 year".to_owned(),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(get_investment(investment.id, &connection), Ok(updated));
        assert_eq!(history_for(&connection, "investment", investment.id).unwrap().len(), 2);
    }

    #[test]
    fn summaries_include_details() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);

        let summaries = get_investment_summaries(&connection).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].investment, investment);
        assert_eq!(summaries[0].details.len(), 2);
    }

    #[test]
    fn delete_cascades_to_details() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);

        delete_investment(investment.id, &connection).unwrap();

        assert_eq!(get_investment(investment.id, &connection), Err(Error::NotFound));
        assert!(get_investment_details(investment.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn update_missing_investment_fails() {
        let connection = get_test_connection();

        let result = update_investment(
            4,
            &InvestmentData {
                name: "GIC".to_owned(),
                rate: "1%".to_owned(),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissing("investment")));
    }
}

#[cfg(test)]
mod detail_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        choices::DetailStatus,
        investments::{
            InvestmentDetailData, delete_investment_detail, get_investment_detail,
            get_investment_details, get_investment_details_up_to, update_investment_detail,
        },
        money::Money,
        test_utils::{fixtures, get_test_connection},
    };

    #[test]
    fn update_and_delete_detail() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);
        let detail = get_investment_details(investment.id, &connection).unwrap()[0].clone();

        let updated = update_investment_detail(
            detail.id,
            &InvestmentDetailData {
                date_investment: date!(2017 - 02 - 01),
                detail_status: DetailStatus::Cancelled,
                amount: Money::from_cents(500),
            },
            &connection,
        )
        .unwrap();
        assert_eq!(updated.detail_status, DetailStatus::Cancelled);

        delete_investment_detail(detail.id, &connection).unwrap();
        assert_eq!(
            get_investment_detail(detail.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_investment_detail(detail.id, &connection),
            Err(Error::DeleteMissing("investment detail"))
        );
    }

    #[test]
    fn details_up_to_date() {
        let connection = get_test_connection();
        fixtures::investment(&connection);

        assert_eq!(
            get_investment_details_up_to(date!(2017 - 01 - 31), &connection)
                .unwrap()
                .len(),
            1
        );
        assert!(
            get_investment_details_up_to(date!(2016 - 12 - 31), &connection)
                .unwrap()
                .is_empty()
        );
    }
}
