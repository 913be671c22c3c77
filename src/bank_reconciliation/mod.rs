//! Reconciling bank transactions against financial transactions.

mod api;
mod dashboard;
mod db;
mod domain;
mod reconcile;

pub use api::{
    match_transactions_endpoint, retrieve_matches, retrieve_transactions,
    unmatch_groups_endpoint, unmatch_transactions_endpoint,
};
pub use dashboard::get_reconciliation_page;
pub use db::create_reconciliation_group_table;
