//! The chart of financial codes: systems, their budget years, the groups
//! within a year and the codes that items are assigned.

mod budget_years;
mod codes;
mod dashboard;
mod db;
mod domain;
mod form;
mod groups;
mod systems;

pub use budget_years::{
    copy_budget_year_endpoint, create_budget_year_endpoint, delete_budget_year_endpoint,
    get_copy_budget_year_page, get_delete_budget_year_page, get_edit_budget_year_page,
    get_new_budget_year_page, update_budget_year_endpoint,
};
pub use codes::{
    create_code_endpoint, delete_code_endpoint, get_delete_code_page, get_edit_code_page,
    get_new_code_page, update_code_endpoint,
};
pub use dashboard::{FinancialCodesState, get_financial_codes_page};
pub use db::{
    copy_budget_year, create_budget_year, create_code, create_financial_code_tables, create_group,
    create_system, delete_budget_year, delete_code, delete_group, delete_system, get_all_systems,
    get_budget_year, get_budget_years, get_code, get_code_choices, get_codes, get_group,
    get_groups, get_system, get_systems_covering, update_budget_year, update_code, update_group,
    update_system,
};
pub use domain::{
    BudgetYear, BudgetYearDetails, BudgetYearId, CodeChoiceGroup, CodeChoices, FinancialCode,
    FinancialCodeDetails, FinancialCodeGroup, FinancialCodeId, FinancialCodeSystem, GroupDetails,
    GroupId, SystemDetails, SystemId,
};
pub use groups::{
    create_group_endpoint, delete_group_endpoint, get_delete_group_page, get_edit_group_page,
    get_new_group_page, update_group_endpoint,
};
pub use systems::{
    create_system_endpoint, delete_system_endpoint, get_delete_system_page, get_edit_system_page,
    get_new_system_page, update_system_endpoint,
};
