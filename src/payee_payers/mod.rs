//! The people, companies and organizations that money is paid to or received from.

mod create;
mod dashboard;
mod db;
mod delete;
mod domain;
mod edit;
mod form;

pub use create::{create_payee_payer_endpoint, get_new_payee_payer_page};
pub use dashboard::{PayeePayersState, get_payee_payer_list, get_payee_payers_page};
pub use db::{
    create_payee_payer, create_payee_payer_tables, delete_payee_payer, get_all_payee_payers,
    get_countries, get_payee_payer, get_payee_payer_listings, seed_countries, update_payee_payer,
};
pub use delete::{delete_payee_payer_endpoint, get_delete_payee_payer_page};
pub use domain::{
    Country, CountryId, PayeePayer, PayeePayerDetails, PayeePayerFilter, PayeePayerId,
    PayeePayerListing,
};
pub use edit::{get_edit_payee_payer_page, update_payee_payer_endpoint};
