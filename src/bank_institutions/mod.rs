//! Banks and other financial institutions, and the accounts held at them.

mod create;
mod dashboard;
mod db;
mod delete;
mod domain;
mod edit;
mod form;

pub use create::{create_institution_endpoint, get_new_institution_page};
pub use dashboard::get_institutions_page;
pub use db::{
    create_account, create_institution, create_institution_tables, delete_account,
    delete_institution, get_account, get_account_labels, get_accounts_for_institution,
    get_all_institutions, get_institution, update_account, update_institution,
};
pub use delete::{delete_institution_endpoint, get_delete_institution_page};
pub use domain::{
    Account, AccountDetails, AccountId, AccountLabel, Institution, InstitutionDetails,
    InstitutionId,
};
pub use edit::{get_edit_institution_page, update_institution_endpoint};
