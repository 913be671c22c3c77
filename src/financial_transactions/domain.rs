use std::fmt::Display;

use serde::Serialize;
use time::Date;

use crate::{
    choices::Kind,
    financial_codes::{BudgetYearId, FinancialCodeId, SystemId},
    money::Money,
    payee_payers::PayeePayerId,
};

pub type FinancialTransactionId = i64;
pub type ItemId = i64;
pub type CodeMatchId = i64;

pub const MEMO_MAX_LENGTH: usize = 1000;
pub const SUBMITTER_MAX_LENGTH: usize = 256;
pub const SUBMISSION_NOTES_MAX_LENGTH: usize = 1000;
pub const ITEM_DESCRIPTION_MAX_LENGTH: usize = 500;

/// An expense or revenue made up of one or more items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialTransaction {
    pub id: FinancialTransactionId,
    pub payee_payer_id: PayeePayerId,
    pub kind: Kind,
    pub memo: String,
    pub submitter: Option<String>,
    pub date_submitted: Date,
    pub submission_notes: Option<String>,
    /// The reconciliation group this transaction belongs to, if it has been
    /// matched.
    pub reconciled: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialTransactionDetails {
    pub payee_payer_id: PayeePayerId,
    pub memo: String,
    pub submitter: Option<String>,
    pub date_submitted: Date,
    pub submission_notes: Option<String>,
}

/// One line of a financial transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub transaction_id: FinancialTransactionId,
    pub date_item: Date,
    pub description: String,
    /// The amount before tax.
    pub amount: Money,
    pub gst: Money,
}

impl Item {
    pub fn total(&self) -> Money {
        self.amount + self.gst
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} - {}", self.date_item, self.description, self.total())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetails {
    pub date_item: Date,
    pub description: String,
    pub amount: Money,
    pub gst: Money,
}

/// Links an item to the code it is booked against in one system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialCodeMatch {
    pub id: CodeMatchId,
    pub item_id: ItemId,
    pub financial_code_id: FinancialCodeId,
}

/// A code match with the budget year and system of its code.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAssignment {
    pub code_match: FinancialCodeMatch,
    pub budget_year_id: BudgetYearId,
    pub system_id: SystemId,
}

/// The pre-tax, tax and overall totals of a set of items.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TransactionTotals {
    pub total_before_tax: Money,
    pub total_tax: Money,
}

impl TransactionTotals {
    pub fn from_items(items: &[Item]) -> Self {
        Self {
            total_before_tax: items.iter().map(|item| item.amount).sum(),
            total_tax: items.iter().map(|item| item.gst).sum(),
        }
    }

    pub fn total(&self) -> Money {
        self.total_before_tax + self.total_tax
    }
}

/// A transaction with its payee/payer name and totals, as shown in lists.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub transaction: FinancialTransaction,
    pub payee_payer: String,
    pub totals: TransactionTotals,
}

impl Display for TransactionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let memo: String = self.transaction.memo.chars().take(100).collect();

        write!(
            f,
            "{} - {} - {} - {}",
            self.transaction.date_submitted, self.transaction.kind, self.payee_payer, memo
        )
    }
}

/// Narrows the transaction list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionFilter {
    /// `None` lists both expenses and revenue.
    pub kind: Option<Kind>,
    pub date_start: Option<Date>,
    pub date_end: Option<Date>,
    /// Leave out transactions that have been reconciled.
    pub unreconciled_only: bool,
}
