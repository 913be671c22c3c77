use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    bank_transactions::BankTransaction, financial_transactions::TransactionSummary, money::Money,
};

pub type ReconciliationGroupId = i64;

/// Links the bank transactions and financial transactions that account for
/// the same money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationGroup {
    pub id: ReconciliationGroupId,
    pub created_at: OffsetDateTime,
}

/// A financial transaction as listed by the reconciliation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialRow {
    pub id: i64,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub total: Money,
}

impl From<&TransactionSummary> for FinancialRow {
    fn from(summary: &TransactionSummary) -> Self {
        Self {
            id: summary.transaction.id,
            date: summary.transaction.date_submitted.to_string(),
            kind: summary.transaction.kind.to_string(),
            description: format!("{} - {}", summary.payee_payer, summary.transaction.memo),
            total: summary.totals.total(),
        }
    }
}

/// A bank transaction as listed by the reconciliation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
}

impl From<&BankTransaction> for BankRow {
    fn from(transaction: &BankTransaction) -> Self {
        Self {
            id: transaction.id,
            date: transaction.date_transaction.to_string(),
            description: transaction.description().to_owned(),
            debit: transaction.amount_debit,
            credit: transaction.amount_credit,
        }
    }
}

/// A reconciliation group with its members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub id: ReconciliationGroupId,
    pub financial_transactions: Vec<FinancialRow>,
    pub bank_transactions: Vec<BankRow>,
}

/// The body of a match or unmatch request.
///
/// IDs are kept as raw JSON values so that malformed IDs can be reported one
/// by one instead of rejecting the whole request.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionIds {
    #[serde(default)]
    pub financial_ids: Vec<Value>,
    #[serde(default)]
    pub bank_ids: Vec<Value>,
}

/// The body of a request to delete reconciliation groups.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct GroupIds {
    pub reconciliation_group_ids: Vec<Value>,
}

/// Read an ID given as a JSON number or a numeric string.
pub fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// An ID as the user sent it, for error messages.
pub fn display_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        value => value.to_string(),
    }
}

/// The IDs that were matched or unmatched.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ChangedIds {
    pub financial_id: Vec<i64>,
    pub bank_id: Vec<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReconciliationErrors {
    pub post_data: Vec<String>,
    pub financial_id: Vec<String>,
    pub bank_id: Vec<String>,
}

impl ReconciliationErrors {
    pub fn is_empty(&self) -> bool {
        self.post_data.is_empty() && self.financial_id.is_empty() && self.bank_id.is_empty()
    }
}

/// The response to a match or unmatch request.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReconciliationOutcome {
    pub success: ChangedIds,
    pub errors: ReconciliationErrors,
}

/// A problem with one entry of a group deletion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDeletionError {
    PostData(String),
    Ids(String),
}
