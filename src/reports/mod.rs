//! Income statement and balance sheet reports.

mod balance_sheet;
mod db;
mod domain;
mod income_statement;

pub use balance_sheet::get_balance_sheet_endpoint;
pub use income_statement::get_reports_page;
