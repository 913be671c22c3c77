//! Investments such as term deposits and the money moving in and out of them.

mod create;
mod dashboard;
mod db;
mod delete;
mod domain;
mod edit;
mod form;

pub use create::{create_investment_endpoint, get_new_investment_page};
pub use dashboard::get_investments_page;
pub use db::{
    create_investment, create_investment_detail, create_investment_tables, delete_investment,
    delete_investment_detail, get_investment, get_investment_detail, get_investment_details,
    get_investment_details_up_to, get_investment_summaries, update_investment,
    update_investment_detail,
};
pub use delete::{delete_investment_endpoint, get_delete_investment_page};
pub use domain::{
    Investment, InvestmentData, InvestmentDetail, InvestmentDetailData, invested_balance,
};
pub use edit::{get_edit_investment_page, update_investment_endpoint};
