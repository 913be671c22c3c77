//! Forms for systems, budget years, groups and codes.

use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    choices::{Choice, Kind, Status},
    financial_codes::{
        db::{get_all_systems, get_budget_years, get_groups},
        domain::{
            BudgetYear, BudgetYearDetails, CODE_DESCRIPTION_MAX_LENGTH, CODE_MAX_LENGTH,
            FinancialCode, FinancialCodeDetails, FinancialCodeGroup, FinancialCodeSystem,
            GROUP_DESCRIPTION_MAX_LENGTH, GroupDetails, SHORT_NAME_MAX_LENGTH, SystemDetails,
            TITLE_MAX_LENGTH,
        },
    },
    form::{
        FormData, FormErrors, INVALID_CHOICE_MESSAGE, check_date_order, optional_date,
        optional_text, required_choice, required_date, required_id, required_text,
    },
    html::{Field, FormTarget, htmx_form, non_field_errors},
};

pub const YEAR_STARTS_BEFORE_SYSTEM_MESSAGE: &str =
    "The start date must occur after the start of the Financial Code System.";
pub const YEAR_ENDS_AFTER_SYSTEM_MESSAGE: &str =
    "The end date must occur before the end of the Financial Code System.";

/// `(id, label)` pairs for a select element.
pub type Options = Vec<(String, String)>;

fn finish<T>(details: Option<T>, errors: FormErrors) -> Result<T, FormErrors> {
    match details {
        Some(details) if errors.is_empty() => Ok(details),
        _ => Err(errors),
    }
}

pub fn validate_system_form(data: &FormData) -> Result<SystemDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let title = required_text(data, "title", TITLE_MAX_LENGTH, &mut errors);
    let date_start = required_date(data, "date_start", &mut errors);
    let date_end = optional_date(data, "date_end", &mut errors);
    check_date_order(date_start, date_end, "date_end", &mut errors);
    let submission_code = data.checkbox("submission_code");

    let details = date_start.map(|date_start| SystemDetails {
        title,
        date_start,
        date_end,
        submission_code,
    });

    finish(details, errors)
}

pub fn system_form_data(system: &FinancialCodeSystem) -> FormData {
    let mut data = FormData::default();
    data.push("title", system.title.as_str());
    data.push("date_start", system.date_start.to_string());
    data.push(
        "date_end",
        system.date_end.map(|date| date.to_string()).unwrap_or_default(),
    );
    if system.submission_code {
        data.push("submission_code", "on");
    }
    data
}

pub fn system_form_view(target: FormTarget, data: &FormData, errors: &FormErrors) -> Markup {
    let content = html! {
        (non_field_errors(errors))
        (Field::required("Title", "title").text(data, errors))
        (Field::required("Start date", "date_start").date(data, errors))
        (Field::optional("End date", "date_end").date(data, errors))
        (Field::optional("Use for submission codes", "submission_code").checkbox(data))
    };

    htmx_form(target, false, "Save", content)
}

/// Validate a budget year, its dates must fall within its system's dates.
pub fn validate_budget_year_form(
    data: &FormData,
    systems: &[FinancialCodeSystem],
) -> Result<BudgetYearDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let system = required_id(data, "financial_code_system", &mut errors).and_then(|id| {
        let system = systems.iter().find(|system| system.id == id);
        if system.is_none() {
            errors.add("financial_code_system", INVALID_CHOICE_MESSAGE);
        }
        system
    });
    let short_name = required_text(data, "short_name", SHORT_NAME_MAX_LENGTH, &mut errors);
    let date_start = required_date(data, "date_start", &mut errors);
    let date_end = required_date(data, "date_end", &mut errors);
    check_date_order(date_start, date_end, "date_end", &mut errors);

    if let (Some(system), Some(date_start), Some(date_end)) = (system, date_start, date_end) {
        if date_start < system.date_start {
            errors.add("date_start", YEAR_STARTS_BEFORE_SYSTEM_MESSAGE);
        }

        if system.date_end.is_some_and(|system_end| date_end > system_end) {
            errors.add("date_end", YEAR_ENDS_AFTER_SYSTEM_MESSAGE);
        }
    }

    let details = match (system, date_start, date_end) {
        (Some(system), Some(date_start), Some(date_end)) => Some(BudgetYearDetails {
            system_id: system.id,
            short_name,
            date_start,
            date_end,
        }),
        _ => None,
    };

    finish(details, errors)
}

pub fn budget_year_form_data(budget_year: &BudgetYear) -> FormData {
    let mut data = FormData::default();
    data.push("financial_code_system", budget_year.system_id.to_string());
    data.push("short_name", budget_year.short_name.as_str());
    data.push("date_start", budget_year.date_start.to_string());
    data.push("date_end", budget_year.date_end.to_string());
    data
}

pub fn system_options(systems: &[FinancialCodeSystem]) -> Options {
    systems
        .iter()
        .map(|system| (system.id.to_string(), system.to_string()))
        .collect()
}

/// Every budget year, labelled with its system.
pub fn budget_year_options(connection: &Connection) -> Result<Options, Error> {
    let mut options = Vec::new();

    for system in get_all_systems(connection)? {
        for budget_year in get_budget_years(system.id, connection)? {
            options.push((
                budget_year.id.to_string(),
                format!("{} {}", system.title, budget_year.short_name),
            ));
        }
    }

    Ok(options)
}

/// Every group, labelled with its system and budget year.
pub fn group_options(connection: &Connection) -> Result<Options, Error> {
    let mut options = Vec::new();

    for system in get_all_systems(connection)? {
        for budget_year in get_budget_years(system.id, connection)? {
            for group in get_groups(budget_year.id, connection)? {
                options.push((
                    group.id.to_string(),
                    format!("{} {} {group}", system.title, budget_year.short_name),
                ));
            }
        }
    }

    Ok(options)
}

pub fn budget_year_form_view(
    target: FormTarget,
    systems: &Options,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let content = html! {
        (non_field_errors(errors))
        (Field::required("Financial code system", "financial_code_system").select(systems, data, errors))
        (Field::required("Short name", "short_name").text(data, errors))
        (Field::required("Start date", "date_start").date(data, errors))
        (Field::required("End date", "date_end").date(data, errors))
    };

    htmx_form(target, false, "Save", content)
}

/// Validate a group, `budget_years` are the `(id, label)` choices.
pub fn validate_group_form(data: &FormData, budget_years: &Options) -> Result<GroupDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let budget_year_id = required_id(data, "budget_year", &mut errors);
    check_option(data, "budget_year", budget_years, &mut errors);
    let title = required_text(data, "title", TITLE_MAX_LENGTH, &mut errors);
    let description = optional_text(data, "description", GROUP_DESCRIPTION_MAX_LENGTH, &mut errors);
    let kind = required_choice(data, "type", Kind::from_code, &mut errors);
    let status = required_choice(data, "status", Status::from_code, &mut errors);

    let details = match (budget_year_id, kind, status) {
        (Some(budget_year_id), Some(kind), Some(status)) => Some(GroupDetails {
            budget_year_id,
            title,
            description,
            kind,
            status,
        }),
        _ => None,
    };

    finish(details, errors)
}

pub fn group_form_data(group: &FinancialCodeGroup) -> FormData {
    let mut data = FormData::default();
    data.push("budget_year", group.budget_year_id.to_string());
    data.push("title", group.title.as_str());
    data.push("description", group.description.clone().unwrap_or_default());
    data.push("type", group.kind.code());
    data.push("status", group.status.code());
    data
}

pub fn group_form_view(
    target: FormTarget,
    budget_years: &Options,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let content = html! {
        (non_field_errors(errors))
        (Field::required("Budget year", "budget_year").select(budget_years, data, errors))
        (Field::required("Title", "title").text(data, errors))
        (Field::optional("Description", "description").textarea(data, errors))
        (Field::required("Type", "type").select(&Kind::options(), data, errors))
        (Field::required("Status", "status").select(&Status::options(), data, errors))
    };

    htmx_form(target, false, "Save", content)
}

/// Validate a code, `groups` are the `(id, label)` choices.
pub fn validate_code_form(
    data: &FormData,
    groups: &Options,
) -> Result<FinancialCodeDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let group_id = required_id(data, "financial_code_group", &mut errors);
    check_option(data, "financial_code_group", groups, &mut errors);
    let code = required_text(data, "code", CODE_MAX_LENGTH, &mut errors);
    let description = required_text(data, "description", CODE_DESCRIPTION_MAX_LENGTH, &mut errors);

    let details = group_id.map(|group_id| FinancialCodeDetails {
        group_id,
        code,
        description,
    });

    finish(details, errors)
}

pub fn code_form_data(code: &FinancialCode) -> FormData {
    let mut data = FormData::default();
    data.push("financial_code_group", code.group_id.to_string());
    data.push("code", code.code.as_str());
    data.push("description", code.description.as_str());
    data
}

pub fn code_form_view(
    target: FormTarget,
    groups: &Options,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let content = html! {
        (non_field_errors(errors))
        (Field::required("Financial code group", "financial_code_group").select(groups, data, errors))
        (Field::required("Code", "code").text(data, errors))
        (Field::required("Description", "description").text(data, errors))
    };

    htmx_form(target, false, "Save", content)
}

fn check_option(data: &FormData, field: &str, options: &Options, errors: &mut FormErrors) {
    let value = data.text(field);

    if !value.is_empty()
        && !errors.has_field(field)
        && !options.iter().any(|(option, _)| option == value)
    {
        errors.add(field, INVALID_CHOICE_MESSAGE);
    }
}
