//! Single character choice fields shared by several tables.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Serialize;

/// Whether a record is still in use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// Whether money is leaving (expense) or entering (revenue) the organisation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Kind {
    #[default]
    Expense,
    Revenue,
}

/// What happened to money placed in an investment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetailStatus {
    #[default]
    Invested,
    Matured,
    InterestPaid,
    Cancelled,
}

/// A value stored as a one character code.
pub trait Choice: Sized + Copy + Display + 'static {
    const ALL: &'static [Self];

    fn code(&self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|choice| choice.code() == code)
    }

    /// `(code, label)` pairs for a select element.
    fn options() -> Vec<(String, String)> {
        Self::ALL
            .iter()
            .map(|choice| (choice.code().to_owned(), choice.to_string()))
            .collect()
    }
}

impl Choice for Status {
    const ALL: &'static [Self] = &[Status::Active, Status::Inactive];

    fn code(&self) -> &'static str {
        match self {
            Status::Active => "a",
            Status::Inactive => "i",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Active => write!(f, "Active"),
            Status::Inactive => write!(f, "Inactive"),
        }
    }
}

impl Choice for Kind {
    const ALL: &'static [Self] = &[Kind::Expense, Kind::Revenue];

    fn code(&self) -> &'static str {
        match self {
            Kind::Expense => "e",
            Kind::Revenue => "r",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Expense => write!(f, "Expense"),
            Kind::Revenue => write!(f, "Revenue"),
        }
    }
}

impl Choice for DetailStatus {
    const ALL: &'static [Self] = &[
        DetailStatus::Invested,
        DetailStatus::Matured,
        DetailStatus::InterestPaid,
        DetailStatus::Cancelled,
    ];

    fn code(&self) -> &'static str {
        match self {
            DetailStatus::Invested => "v",
            DetailStatus::Matured => "m",
            DetailStatus::InterestPaid => "i",
            DetailStatus::Cancelled => "c",
        }
    }
}

impl Display for DetailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailStatus::Invested => write!(f, "Invested"),
            DetailStatus::Matured => write!(f, "Matured"),
            DetailStatus::InterestPaid => write!(f, "Interest paid"),
            DetailStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

macro_rules! impl_sql_for_choice {
    ($choice:ty) => {
        impl ToSql for $choice {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.code()))
            }
        }

        impl FromSql for $choice {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let code = value.as_str()?;
                <$choice>::from_code(code).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown choice code {code:?}").into())
                })
            }
        }
    };
}

impl_sql_for_choice!(Status);
impl_sql_for_choice!(Kind);
impl_sql_for_choice!(DetailStatus);

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{Choice, DetailStatus, Kind, Status};

    #[test]
    fn codes_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), Some(*status));
        }
        assert_eq!(Kind::from_code("r"), Some(Kind::Revenue));
        assert_eq!(Kind::from_code("x"), None);
        assert_eq!(DetailStatus::from_code("i"), Some(DetailStatus::InterestPaid));
    }

    #[test]
    fn options_use_labels() {
        assert_eq!(
            Kind::options(),
            vec![
                ("e".to_owned(), "Expense".to_owned()),
                ("r".to_owned(), "Revenue".to_owned())
            ]
        );
    }

    #[test]
    fn stored_as_code() {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute("CREATE TABLE t (status TEXT)", ()).unwrap();
        connection
            .execute("INSERT INTO t (status) VALUES (?1)", (Status::Inactive,))
            .unwrap();

        let (raw, status): (String, Status) = connection
            .query_row("SELECT status, status FROM t", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();

        assert_eq!(raw, "i");
        assert_eq!(status, Status::Inactive);
    }
}
