//! Bank statements and the transactions listed on them.

mod create;
mod dashboard;
mod db;
mod delete;
mod domain;
mod edit;
mod form;

pub use create::{create_statement_endpoint, get_new_statement_page};
pub use dashboard::get_statements_page;
pub use db::{
    create_bank_transaction, create_statement, create_statement_tables,
    delete_bank_transaction, delete_statement, get_all_statements, get_bank_transaction,
    get_bank_transactions_for_statement, get_statement, update_bank_transaction,
    update_statement,
};
pub use delete::{delete_statement_endpoint, get_delete_statement_page};
pub use domain::{
    BankTransaction, BankTransactionDetails, BankTransactionId, Statement, StatementDetails,
    StatementId, StatementTotals,
};
pub use edit::{get_edit_statement_page, update_statement_endpoint};

pub(crate) use db::map_bank_transaction_row;
