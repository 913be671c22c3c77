//! The investment form and its detail sub-forms.

use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    choices::{Choice, DetailStatus},
    form::{
        EXTRA_SUB_FORMS, FormData, FormErrors, SubForm, money_or_zero, required_choice,
        required_date, required_text, sub_forms,
    },
    html::{FIELDSET_STYLE, FORM_LABEL_STYLE, Field, FormTarget, hidden_input, htmx_form, non_field_errors},
    investments::{
        db::{
            create_investment, create_investment_detail, delete_investment_detail,
            update_investment, update_investment_detail,
        },
        domain::{
            Investment, InvestmentData, InvestmentDetail, InvestmentDetailData,
            InvestmentDetailId, InvestmentId, NAME_MAX_LENGTH, RATE_MAX_LENGTH,
        },
    },
};

pub const DETAIL_PREFIX: &str = "investmentdetail_set";
const DETAIL_FIELDS: [&str; 3] = ["date_investment", "detail_status", "amount"];

#[derive(Debug, Clone, PartialEq)]
pub enum DetailChange {
    Create(InvestmentDetailData),
    Update(InvestmentDetailId, InvestmentDetailData),
    Delete(InvestmentDetailId),
}

/// A validated investment form.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentForm {
    pub data: InvestmentData,
    pub details: Vec<DetailChange>,
}

/// Validate the investment and its detail sub-forms.
///
/// `existing_details` are the details the investment has, sub-forms may only
/// change these.
pub fn validate_investment_form(
    data: &FormData,
    existing_details: &[InvestmentDetail],
) -> Result<InvestmentForm, FormErrors> {
    let mut errors = FormErrors::new();

    let name = required_text(data, "name", NAME_MAX_LENGTH, &mut errors);
    let rate = required_text(data, "rate", RATE_MAX_LENGTH, &mut errors);

    let existing_ids: Vec<InvestmentDetailId> =
        existing_details.iter().map(|detail| detail.id).collect();
    let details = sub_forms(data, DETAIL_PREFIX, &DETAIL_FIELDS, &existing_ids, &mut errors)
        .into_iter()
        .filter_map(|sub_form| match sub_form {
            SubForm::New(row) => read_detail(data, &row, &mut errors).map(DetailChange::Create),
            SubForm::Existing(id, row) => {
                read_detail(data, &row, &mut errors).map(|detail| DetailChange::Update(id, detail))
            }
            SubForm::Deleted(id) => Some(DetailChange::Delete(id)),
        })
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(InvestmentForm {
        data: InvestmentData { name, rate },
        details,
    })
}

fn read_detail(data: &FormData, row: &str, errors: &mut FormErrors) -> Option<InvestmentDetailData> {
    let date_investment = required_date(data, &format!("{row}-date_investment"), errors);
    let detail_status = required_choice(
        data,
        &format!("{row}-detail_status"),
        DetailStatus::from_code,
        errors,
    );
    let amount = money_or_zero(data, &format!("{row}-amount"), errors);

    Some(InvestmentDetailData {
        date_investment: date_investment?,
        detail_status: detail_status?,
        amount,
    })
}

pub fn blank_form_data() -> FormData {
    let mut data = FormData::default();
    data.add_blank_sub_forms(DETAIL_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

pub fn initial_form_data(investment: &Investment, details: &[InvestmentDetail]) -> FormData {
    let mut data = FormData::default();
    data.push("name", investment.name.as_str());
    data.push("rate", investment.rate.as_str());

    for (index, detail) in details.iter().enumerate() {
        let row = format!("{DETAIL_PREFIX}-{index}");
        data.push(format!("{row}-id"), detail.id.to_string());
        data.push(
            format!("{row}-date_investment"),
            detail.date_investment.to_string(),
        );
        data.push(format!("{row}-detail_status"), detail.detail_status.code());
        data.push(format!("{row}-amount"), detail.amount.to_plain_string());
    }

    data.add_blank_sub_forms(DETAIL_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

/// Save the investment and its details in one transaction.
///
/// Creates a new investment when `investment_id` is `None`.
pub fn save_investment_form(
    investment_id: Option<InvestmentId>,
    form: &InvestmentForm,
    connection: &Connection,
) -> Result<Investment, Error> {
    let transaction = connection.unchecked_transaction()?;

    let investment = match investment_id {
        Some(id) => update_investment(id, &form.data, &transaction)?,
        None => create_investment(&form.data, &transaction)?,
    };

    for change in &form.details {
        match change {
            DetailChange::Create(detail) => {
                create_investment_detail(investment.id, detail, &transaction)?;
            }
            DetailChange::Update(id, detail) => {
                update_investment_detail(*id, detail, &transaction)?;
            }
            DetailChange::Delete(id) => delete_investment_detail(*id, &transaction)?,
        }
    }

    transaction.commit()?;

    Ok(investment)
}

pub fn investment_form_view(target: FormTarget, data: &FormData, errors: &FormErrors) -> Markup {
    let status_options = DetailStatus::options();

    let content = html! {
        (non_field_errors(errors))
        (Field::required("Name", "name").text(data, errors))
        (Field::required("Rate", "rate").text(data, errors))

        fieldset class=(FIELDSET_STYLE)
        {
            legend class=(FORM_LABEL_STYLE) { "Details" }

            @for index in data.indices(DETAIL_PREFIX) {
                @let row = format!("{DETAIL_PREFIX}-{index}");
                @let date_investment = format!("{row}-date_investment");
                @let detail_status = format!("{row}-detail_status");
                @let amount = format!("{row}-amount");
                @let delete = format!("{row}-DELETE");

                div class="grid grid-cols-1 md:grid-cols-4 gap-4 items-end"
                {
                    (hidden_input(&format!("{row}-id"), data))
                    (Field::optional("Date", &date_investment).date(data, errors))
                    (Field::optional("Status", &detail_status).select(&status_options, data, errors))
                    (Field::optional("Amount", &amount).money(data, errors))
                    (Field::optional("Delete", &delete).checkbox(data))
                }
            }
        }
    };

    htmx_form(target, false, "Save", content)
}
