//! Database operations for the chart of financial codes.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    choices::Kind,
    financial_codes::domain::{
        BudgetYear, BudgetYearDetails, BudgetYearId, CodeChoiceGroup, CodeChoices, FinancialCode,
        FinancialCodeDetails, FinancialCodeGroup, FinancialCodeId, FinancialCodeSystem, GroupDetails,
        GroupId, SystemDetails, SystemId,
    },
    history::{Change, record_history},
};

/// Create the system, budget year, group and code tables.
///
/// Each level refuses to be deleted while it still has children.
pub fn create_financial_code_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS financial_code_system (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            date_start TEXT NOT NULL,
            date_end TEXT,
            submission_code INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS budget_year (
            id INTEGER PRIMARY KEY,
            financial_code_system_id INTEGER NOT NULL
                REFERENCES financial_code_system(id) ON DELETE RESTRICT,
            short_name TEXT NOT NULL,
            date_start TEXT NOT NULL,
            date_end TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS financial_code_group (
            id INTEGER PRIMARY KEY,
            budget_year_id INTEGER NOT NULL REFERENCES budget_year(id) ON DELETE RESTRICT,
            title TEXT NOT NULL,
            description TEXT,
            kind TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS financial_code (
            id INTEGER PRIMARY KEY,
            financial_code_group_id INTEGER NOT NULL
                REFERENCES financial_code_group(id) ON DELETE RESTRICT,
            code TEXT NOT NULL,
            description TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_budget_year_system
            ON budget_year(financial_code_system_id);
        CREATE INDEX IF NOT EXISTS idx_group_budget_year
            ON financial_code_group(budget_year_id);
        CREATE INDEX IF NOT EXISTS idx_code_group ON financial_code(financial_code_group_id);",
    )
}

// Systems

pub fn create_system(
    details: &SystemDetails,
    connection: &Connection,
) -> Result<FinancialCodeSystem, Error> {
    connection.execute(
        "INSERT INTO financial_code_system (title, date_start, date_end, submission_code)
        VALUES (?1, ?2, ?3, ?4)",
        (
            &details.title,
            details.date_start,
            details.date_end,
            details.submission_code,
        ),
    )?;

    let system = FinancialCodeSystem {
        id: connection.last_insert_rowid(),
        title: details.title.clone(),
        date_start: details.date_start,
        date_end: details.date_end,
        submission_code: details.submission_code,
    };
    record_history(
        connection,
        "financial_code_system",
        system.id,
        Change::Created,
        &system,
    )?;

    Ok(system)
}

pub fn get_system(id: SystemId, connection: &Connection) -> Result<FinancialCodeSystem, Error> {
    connection
        .prepare(
            "SELECT id, title, date_start, date_end, submission_code
            FROM financial_code_system WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_system_row)
        .map_err(|error| error.into())
}

pub fn get_all_systems(connection: &Connection) -> Result<Vec<FinancialCodeSystem>, Error> {
    connection
        .prepare(
            "SELECT id, title, date_start, date_end, submission_code
            FROM financial_code_system ORDER BY title ASC, id ASC",
        )?
        .query_map([], map_system_row)?
        .map(|maybe_system| maybe_system.map_err(|error| error.into()))
        .collect()
}

/// The systems that items dated `date` are coded in.
pub fn get_systems_covering(
    date: Date,
    connection: &Connection,
) -> Result<Vec<FinancialCodeSystem>, Error> {
    connection
        .prepare(
            "SELECT id, title, date_start, date_end, submission_code
            FROM financial_code_system
            WHERE date_start <= ?1 AND (date_end IS NULL OR date_end >= ?1)
            ORDER BY title ASC, id ASC",
        )?
        .query_map([date], map_system_row)?
        .map(|maybe_system| maybe_system.map_err(|error| error.into()))
        .collect()
}

pub fn update_system(
    id: SystemId,
    details: &SystemDetails,
    connection: &Connection,
) -> Result<FinancialCodeSystem, Error> {
    let rows_affected = connection.execute(
        "UPDATE financial_code_system
        SET title = ?1, date_start = ?2, date_end = ?3, submission_code = ?4
        WHERE id = ?5",
        (
            &details.title,
            details.date_start,
            details.date_end,
            details.submission_code,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("financial code system"));
    }

    let system = get_system(id, connection)?;
    record_history(
        connection,
        "financial_code_system",
        id,
        Change::Updated,
        &system,
    )?;

    Ok(system)
}

pub fn delete_system(id: SystemId, connection: &Connection) -> Result<(), Error> {
    let system = get_system(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("financial code system"),
        error => error,
    })?;

    let budget_years = get_budget_years(id, connection)?;
    if !budget_years.is_empty() {
        return Err(Error::ProtectedDelete(blocked_message(
            &system.to_string(),
            "budget years",
            &budget_years,
        )));
    }

    connection.execute("DELETE FROM financial_code_system WHERE id = ?1", [id])?;
    record_history(
        connection,
        "financial_code_system",
        id,
        Change::Deleted,
        &system,
    )?;

    Ok(())
}

// Budget years

pub fn create_budget_year(
    details: &BudgetYearDetails,
    connection: &Connection,
) -> Result<BudgetYear, Error> {
    connection.execute(
        "INSERT INTO budget_year (financial_code_system_id, short_name, date_start, date_end)
        VALUES (?1, ?2, ?3, ?4)",
        (
            details.system_id,
            &details.short_name,
            details.date_start,
            details.date_end,
        ),
    )?;

    let budget_year = BudgetYear {
        id: connection.last_insert_rowid(),
        system_id: details.system_id,
        short_name: details.short_name.clone(),
        date_start: details.date_start,
        date_end: details.date_end,
    };
    record_history(
        connection,
        "budget_year",
        budget_year.id,
        Change::Created,
        &budget_year,
    )?;

    Ok(budget_year)
}

pub fn get_budget_year(id: BudgetYearId, connection: &Connection) -> Result<BudgetYear, Error> {
    connection
        .prepare(
            "SELECT id, financial_code_system_id, short_name, date_start, date_end
            FROM budget_year WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_budget_year_row)
        .map_err(|error| error.into())
}

/// The budget years of a system, newest first.
pub fn get_budget_years(
    system_id: SystemId,
    connection: &Connection,
) -> Result<Vec<BudgetYear>, Error> {
    connection
        .prepare(
            "SELECT id, financial_code_system_id, short_name, date_start, date_end
            FROM budget_year WHERE financial_code_system_id = ?1
            ORDER BY date_start DESC, id DESC",
        )?
        .query_map([system_id], map_budget_year_row)?
        .map(|maybe_year| maybe_year.map_err(|error| error.into()))
        .collect()
}

pub fn update_budget_year(
    id: BudgetYearId,
    details: &BudgetYearDetails,
    connection: &Connection,
) -> Result<BudgetYear, Error> {
    let rows_affected = connection.execute(
        "UPDATE budget_year
        SET financial_code_system_id = ?1, short_name = ?2, date_start = ?3, date_end = ?4
        WHERE id = ?5",
        (
            details.system_id,
            &details.short_name,
            details.date_start,
            details.date_end,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("budget year"));
    }

    let budget_year = get_budget_year(id, connection)?;
    record_history(connection, "budget_year", id, Change::Updated, &budget_year)?;

    Ok(budget_year)
}

pub fn delete_budget_year(id: BudgetYearId, connection: &Connection) -> Result<(), Error> {
    let budget_year = get_budget_year(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("budget year"),
        error => error,
    })?;

    let groups = get_groups(id, connection)?;
    if !groups.is_empty() {
        return Err(Error::ProtectedDelete(blocked_message(
            &format!("budget year {budget_year}"),
            "financial code groups",
            &groups,
        )));
    }

    connection.execute("DELETE FROM budget_year WHERE id = ?1", [id])?;
    record_history(connection, "budget_year", id, Change::Deleted, &budget_year)?;

    Ok(())
}

/// Create a budget year with a copy of every group and code of `source_id`.
pub fn copy_budget_year(
    source_id: BudgetYearId,
    details: &BudgetYearDetails,
    connection: &Connection,
) -> Result<BudgetYear, Error> {
    get_budget_year(source_id, connection)?;
    let budget_year = create_budget_year(details, connection)?;

    for group in get_groups(source_id, connection)? {
        let new_group = create_group(
            &GroupDetails {
                budget_year_id: budget_year.id,
                title: group.title.clone(),
                description: group.description.clone(),
                kind: group.kind,
                status: group.status,
            },
            connection,
        )?;

        for code in get_codes(group.id, connection)? {
            create_code(
                &FinancialCodeDetails {
                    group_id: new_group.id,
                    code: code.code,
                    description: code.description,
                },
                connection,
            )?;
        }
    }

    Ok(budget_year)
}

// Groups

pub fn create_group(
    details: &GroupDetails,
    connection: &Connection,
) -> Result<FinancialCodeGroup, Error> {
    connection.execute(
        "INSERT INTO financial_code_group (budget_year_id, title, description, kind, status)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            details.budget_year_id,
            &details.title,
            &details.description,
            details.kind,
            details.status,
        ),
    )?;

    let group = FinancialCodeGroup {
        id: connection.last_insert_rowid(),
        budget_year_id: details.budget_year_id,
        title: details.title.clone(),
        description: details.description.clone(),
        kind: details.kind,
        status: details.status,
    };
    record_history(
        connection,
        "financial_code_group",
        group.id,
        Change::Created,
        &group,
    )?;

    Ok(group)
}

pub fn get_group(id: GroupId, connection: &Connection) -> Result<FinancialCodeGroup, Error> {
    connection
        .prepare(
            "SELECT id, budget_year_id, title, description, kind, status
            FROM financial_code_group WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_group_row)
        .map_err(|error| error.into())
}

pub fn get_groups(
    budget_year_id: BudgetYearId,
    connection: &Connection,
) -> Result<Vec<FinancialCodeGroup>, Error> {
    connection
        .prepare(
            "SELECT id, budget_year_id, title, description, kind, status
            FROM financial_code_group WHERE budget_year_id = ?1
            ORDER BY title ASC, id ASC",
        )?
        .query_map([budget_year_id], map_group_row)?
        .map(|maybe_group| maybe_group.map_err(|error| error.into()))
        .collect()
}

pub fn update_group(
    id: GroupId,
    details: &GroupDetails,
    connection: &Connection,
) -> Result<FinancialCodeGroup, Error> {
    let rows_affected = connection.execute(
        "UPDATE financial_code_group
        SET budget_year_id = ?1, title = ?2, description = ?3, kind = ?4, status = ?5
        WHERE id = ?6",
        (
            details.budget_year_id,
            &details.title,
            &details.description,
            details.kind,
            details.status,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("financial code group"));
    }

    let group = get_group(id, connection)?;
    record_history(
        connection,
        "financial_code_group",
        id,
        Change::Updated,
        &group,
    )?;

    Ok(group)
}

pub fn delete_group(id: GroupId, connection: &Connection) -> Result<(), Error> {
    let group = get_group(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("financial code group"),
        error => error,
    })?;

    let codes = get_codes(id, connection)?;
    if !codes.is_empty() {
        return Err(Error::ProtectedDelete(blocked_message(
            &group.to_string(),
            "financial codes",
            &codes,
        )));
    }

    connection.execute("DELETE FROM financial_code_group WHERE id = ?1", [id])?;
    record_history(
        connection,
        "financial_code_group",
        id,
        Change::Deleted,
        &group,
    )?;

    Ok(())
}

// Codes

pub fn create_code(
    details: &FinancialCodeDetails,
    connection: &Connection,
) -> Result<FinancialCode, Error> {
    connection.execute(
        "INSERT INTO financial_code (financial_code_group_id, code, description)
        VALUES (?1, ?2, ?3)",
        (details.group_id, &details.code, &details.description),
    )?;

    let code = FinancialCode {
        id: connection.last_insert_rowid(),
        group_id: details.group_id,
        code: details.code.clone(),
        description: details.description.clone(),
    };
    record_history(connection, "financial_code", code.id, Change::Created, &code)?;

    Ok(code)
}

pub fn get_code(id: FinancialCodeId, connection: &Connection) -> Result<FinancialCode, Error> {
    connection
        .prepare(
            "SELECT id, financial_code_group_id, code, description
            FROM financial_code WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_code_row)
        .map_err(|error| error.into())
}

/// The codes of a group, ordered by code.
pub fn get_codes(group_id: GroupId, connection: &Connection) -> Result<Vec<FinancialCode>, Error> {
    connection
        .prepare(
            "SELECT id, financial_code_group_id, code, description
            FROM financial_code WHERE financial_code_group_id = ?1
            ORDER BY code ASC, id ASC",
        )?
        .query_map([group_id], map_code_row)?
        .map(|maybe_code| maybe_code.map_err(|error| error.into()))
        .collect()
}

pub fn update_code(
    id: FinancialCodeId,
    details: &FinancialCodeDetails,
    connection: &Connection,
) -> Result<FinancialCode, Error> {
    let rows_affected = connection.execute(
        "UPDATE financial_code SET financial_code_group_id = ?1, code = ?2, description = ?3
        WHERE id = ?4",
        (details.group_id, &details.code, &details.description, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("financial code"));
    }

    let code = get_code(id, connection)?;
    record_history(connection, "financial_code", id, Change::Updated, &code)?;

    Ok(code)
}

/// Delete a code that no item has been coded to.
pub fn delete_code(id: FinancialCodeId, connection: &Connection) -> Result<(), Error> {
    let code = get_code(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissing("financial code"),
        error => error,
    })?;

    let item_count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM financial_code_match WHERE financial_code_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if item_count > 0 {
        return Err(Error::ProtectedDelete(format!(
            "Cannot delete {code} because {item_count} transaction item(s) are coded to it."
        )));
    }

    connection.execute("DELETE FROM financial_code WHERE id = ?1", [id])?;
    record_history(connection, "financial_code", id, Change::Deleted, &code)?;

    Ok(())
}

/// The codes an item of `kind` may be assigned in `system_id`.
///
/// Groups come from every budget year of the system and are sorted by their
/// first code. Groups without codes are left out.
pub fn get_code_choices(
    system_id: SystemId,
    kind: Kind,
    connection: &Connection,
) -> Result<CodeChoices, Error> {
    let budget_years = get_budget_years(system_id, connection)?;
    let mut groups = Vec::new();

    for budget_year in &budget_years {
        for group in get_groups(budget_year.id, connection)? {
            if group.kind != kind {
                continue;
            }

            let codes = get_codes(group.id, connection)?;
            if codes.is_empty() {
                continue;
            }

            groups.push(CodeChoiceGroup {
                title: group.title,
                budget_year_id: budget_year.id,
                codes,
            });
        }
    }

    groups.sort_by(|a, b| a.codes[0].to_string().cmp(&b.codes[0].to_string()));

    Ok(CodeChoices {
        budget_years,
        groups,
    })
}

fn blocked_message(name: &str, children: &str, blocking: &[impl std::fmt::Display]) -> String {
    let blocking = blocking
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!("Cannot delete {name} because it still has {children}: {blocking}.")
}

fn map_system_row(row: &Row) -> Result<FinancialCodeSystem, rusqlite::Error> {
    Ok(FinancialCodeSystem {
        id: row.get(0)?,
        title: row.get(1)?,
        date_start: row.get(2)?,
        date_end: row.get(3)?,
        submission_code: row.get(4)?,
    })
}

fn map_budget_year_row(row: &Row) -> Result<BudgetYear, rusqlite::Error> {
    Ok(BudgetYear {
        id: row.get(0)?,
        system_id: row.get(1)?,
        short_name: row.get(2)?,
        date_start: row.get(3)?,
        date_end: row.get(4)?,
    })
}

fn map_group_row(row: &Row) -> Result<FinancialCodeGroup, rusqlite::Error> {
    Ok(FinancialCodeGroup {
        id: row.get(0)?,
        budget_year_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        status: row.get(5)?,
    })
}

fn map_code_row(row: &Row) -> Result<FinancialCode, rusqlite::Error> {
    Ok(FinancialCode {
        id: row.get(0)?,
        group_id: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
    })
}
