//! Expenses and revenue, their items and the financial codes the items are
//! booked against.

mod code_forms;
mod create;
mod dashboard;
mod db;
mod delete;
mod domain;
mod edit;
mod form;

pub use code_forms::get_code_forms;
pub use create::{
    create_expense_endpoint, create_revenue_endpoint, get_new_expense_page, get_new_revenue_page,
};
pub use dashboard::{get_transaction_list, get_transactions_page};
pub use db::{
    create_code_match, create_financial_transaction, create_financial_transaction_tables,
    create_item, delete_code_match, delete_financial_transaction, delete_item,
    get_code_assignments, get_financial_transaction, get_item, get_items,
    get_reconciled_summaries, get_transaction_summaries, get_transaction_summary,
    update_code_match, update_financial_transaction, update_item,
};
pub use delete::{delete_transaction_endpoint, get_delete_transaction_page};
pub use domain::{
    CodeAssignment, CodeMatchId, FinancialCodeMatch, FinancialTransaction,
    FinancialTransactionDetails, FinancialTransactionId, Item, ItemDetails, ItemId,
    TransactionFilter, TransactionSummary, TransactionTotals,
};
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use form::MAX_TRANSACTION_FILES;
