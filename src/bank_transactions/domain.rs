use std::fmt::Display;

use serde::Serialize;
use time::Date;

use crate::{bank_institutions::AccountId, money::Money};

pub type StatementId = i64;
pub type BankTransactionId = i64;

pub const DESCRIPTION_MAX_LENGTH: usize = 100;

/// A bank statement for one account over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub id: StatementId,
    pub account_id: AccountId,
    pub date_start: Date,
    pub date_end: Date,
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {} statement", self.date_start, self.date_end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementDetails {
    pub account_id: AccountId,
    pub date_start: Date,
    pub date_end: Date,
}

/// One line of a bank statement.
///
/// Exactly one of the debit and credit amounts is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankTransaction {
    pub id: BankTransactionId,
    pub statement_id: StatementId,
    pub date_transaction: Date,
    pub description_bank: String,
    pub description_user: Option<String>,
    pub amount_debit: Money,
    pub amount_credit: Money,
    /// The reconciliation group this line belongs to, if it has been matched.
    pub reconciled: Option<i64>,
}

impl BankTransaction {
    /// The user's description if there is one, otherwise the bank's.
    pub fn description(&self) -> &str {
        self.description_user
            .as_deref()
            .unwrap_or(self.description_bank.as_str())
    }
}

impl Display for BankTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.date_transaction, self.description())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankTransactionDetails {
    pub date_transaction: Date,
    pub description_bank: String,
    pub description_user: Option<String>,
    pub amount_debit: Money,
    pub amount_credit: Money,
}

/// The debit and credit totals of a statement's lines.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatementTotals {
    pub total_debit: Money,
    pub total_credit: Money,
}

impl StatementTotals {
    pub fn from_transactions(transactions: &[BankTransaction]) -> Self {
        Self {
            total_debit: transactions.iter().map(|line| line.amount_debit).sum(),
            total_credit: transactions.iter().map(|line| line.amount_credit).sum(),
        }
    }

    /// Credits minus debits.
    pub fn total(&self) -> Money {
        self.total_credit - self.total_debit
    }
}
