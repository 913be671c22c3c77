//! The institution form and its account sub-forms.

use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    bank_institutions::{
        db::{create_account, create_institution, delete_account, update_account, update_institution},
        domain::{
            ACCOUNT_NAME_MAX_LENGTH, ACCOUNT_NUMBER_MAX_LENGTH, ADDRESS_MAX_LENGTH, Account,
            AccountDetails, AccountId, Institution, InstitutionDetails, InstitutionId,
            NAME_MAX_LENGTH, PHONE_MAX_LENGTH,
        },
    },
    choices::{Choice, Status},
    form::{
        EXTRA_SUB_FORMS, FormData, FormErrors, SubForm, required_choice, required_text,
        sub_forms,
    },
    html::{FIELDSET_STYLE, FORM_LABEL_STYLE, Field, FormTarget, hidden_input, htmx_form, non_field_errors},
};

pub const ACCOUNT_PREFIX: &str = "account_set";
const ACCOUNT_FIELDS: [&str; 3] = ["account_number", "name", "status"];

/// A change to one account requested by the institution form.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountChange {
    Create(AccountDetails),
    Update(AccountId, AccountDetails),
    Delete(AccountId),
}

/// A validated institution form.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionForm {
    pub details: InstitutionDetails,
    pub accounts: Vec<AccountChange>,
}

/// Validate the institution fields and the account sub-forms.
///
/// `existing` are the accounts of the institution being edited.
pub fn validate_institution_form(
    data: &FormData,
    existing: &[Account],
) -> Result<InstitutionForm, FormErrors> {
    let mut errors = FormErrors::new();

    let details = InstitutionDetails {
        name: required_text(data, "name", NAME_MAX_LENGTH, &mut errors),
        address: required_text(data, "address", ADDRESS_MAX_LENGTH, &mut errors),
        phone: required_text(data, "phone", PHONE_MAX_LENGTH, &mut errors),
        fax: required_text(data, "fax", PHONE_MAX_LENGTH, &mut errors),
    };

    let existing_ids: Vec<AccountId> = existing.iter().map(|account| account.id).collect();
    let accounts = sub_forms(data, ACCOUNT_PREFIX, &ACCOUNT_FIELDS, &existing_ids, &mut errors)
        .into_iter()
        .filter_map(|sub_form| match sub_form {
            SubForm::New(row) => {
                read_account(data, &row, &mut errors).map(AccountChange::Create)
            }
            SubForm::Existing(id, row) => {
                read_account(data, &row, &mut errors).map(|details| AccountChange::Update(id, details))
            }
            SubForm::Deleted(id) => Some(AccountChange::Delete(id)),
        })
        .collect();

    if errors.is_empty() {
        Ok(InstitutionForm { details, accounts })
    } else {
        Err(errors)
    }
}

fn read_account(data: &FormData, row: &str, errors: &mut FormErrors) -> Option<AccountDetails> {
    let account_number = required_text(
        data,
        &format!("{row}-account_number"),
        ACCOUNT_NUMBER_MAX_LENGTH,
        errors,
    );
    let name = required_text(data, &format!("{row}-name"), ACCOUNT_NAME_MAX_LENGTH, errors);
    let status = required_choice(data, &format!("{row}-status"), Status::from_code, errors)?;

    Some(AccountDetails {
        account_number,
        name,
        status,
    })
}

/// The form data for a new institution with empty account rows.
pub fn blank_form_data() -> FormData {
    let mut data = FormData::default();
    data.add_blank_sub_forms(ACCOUNT_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

/// The form data for editing `institution` and its accounts.
pub fn initial_form_data(institution: &Institution, accounts: &[Account]) -> FormData {
    let mut data = FormData::default();
    data.push("name", institution.name.as_str());
    data.push("address", institution.address.as_str());
    data.push("phone", institution.phone.as_str());
    data.push("fax", institution.fax.as_str());

    for (index, account) in accounts.iter().enumerate() {
        let row = format!("{ACCOUNT_PREFIX}-{index}");
        data.push(format!("{row}-id"), account.id.to_string());
        data.push(format!("{row}-account_number"), account.account_number.as_str());
        data.push(format!("{row}-name"), account.name.as_str());
        data.push(format!("{row}-status"), account.status.code());
    }

    data.add_blank_sub_forms(ACCOUNT_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

/// Save the institution and apply the account changes in one transaction.
///
/// Creates a new institution when `institution_id` is `None`.
pub fn save_institution_form(
    institution_id: Option<InstitutionId>,
    form: &InstitutionForm,
    connection: &Connection,
) -> Result<Institution, Error> {
    let transaction = connection.unchecked_transaction()?;

    let institution = match institution_id {
        Some(id) => update_institution(id, &form.details, &transaction)?,
        None => create_institution(&form.details, &transaction)?,
    };

    for change in &form.accounts {
        match change {
            AccountChange::Create(details) => {
                create_account(institution.id, details, &transaction)?;
            }
            AccountChange::Update(id, details) => {
                update_account(*id, details, &transaction)?;
            }
            AccountChange::Delete(id) => delete_account(*id, &transaction)?,
        }
    }

    transaction.commit()?;

    Ok(institution)
}

pub fn institution_form_view(target: FormTarget, data: &FormData, errors: &FormErrors) -> Markup {
    let status_options = Status::options();

    let content = html! {
        (non_field_errors(errors))

        (Field::required("Name", "name").text(data, errors))
        (Field::required("Address", "address").textarea(data, errors))
        (Field::required("Phone number", "phone").text(data, errors))
        (Field::required("Fax number", "fax").text(data, errors))

        fieldset class=(FIELDSET_STYLE)
        {
            legend class=(FORM_LABEL_STYLE) { "Accounts" }

            @for index in data.indices(ACCOUNT_PREFIX) {
                @let row = format!("{ACCOUNT_PREFIX}-{index}");
                @let account_number = format!("{row}-account_number");
                @let name = format!("{row}-name");
                @let status = format!("{row}-status");
                @let delete = format!("{row}-DELETE");

                div class="grid grid-cols-1 md:grid-cols-4 gap-4 items-end"
                {
                    (hidden_input(&format!("{row}-id"), data))
                    (Field::optional("Account number", &account_number).text(data, errors))
                    (Field::optional("Account name", &name).text(data, errors))
                    (Field::optional("Status", &status).select(&status_options, data, errors))
                    (Field::optional("Delete", &delete).checkbox(data))
                }
            }
        }
    };

    htmx_form(target, false, "Save", content)
}

#[cfg(test)]
mod tests {
    use crate::{
        bank_institutions::{
            Account, AccountDetails,
            form::{AccountChange, validate_institution_form},
        },
        choices::Status,
        form::{INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE},
        test_utils::form_data,
    };

    fn existing_account() -> Account {
        Account {
            id: 7,
            institution_id: 1,
            account_number: "1".to_owned(),
            name: "Old".to_owned(),
            status: Status::Active,
        }
    }

    #[test]
    fn valid_form_with_new_updated_and_deleted_accounts() {
        let data = form_data(&[
            ("name", "Credit Union"),
            ("address", "1 Main St"),
            ("phone", "555"),
            ("fax", "556"),
            ("account_set-0-id", "7"),
            ("account_set-0-account_number", "1"),
            ("account_set-0-name", "Renamed"),
            ("account_set-0-status", "i"),
            ("account_set-1-id", ""),
            ("account_set-1-account_number", "2"),
            ("account_set-1-name", "Savings"),
            ("account_set-1-status", "a"),
            ("account_set-2-id", ""),
            ("account_set-2-account_number", ""),
            ("account_set-2-name", ""),
            ("account_set-2-status", ""),
        ]);

        let form = validate_institution_form(&data, &[existing_account()]).unwrap();

        assert_eq!(form.details.name, "Credit Union");
        assert_eq!(
            form.accounts,
            vec![
                AccountChange::Update(
                    7,
                    AccountDetails {
                        account_number: "1".to_owned(),
                        name: "Renamed".to_owned(),
                        status: Status::Inactive,
                    }
                ),
                AccountChange::Create(AccountDetails {
                    account_number: "2".to_owned(),
                    name: "Savings".to_owned(),
                    status: Status::Active,
                }),
            ]
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let data = form_data(&[
            ("name", "Credit Union"),
            ("account_set-0-id", ""),
            ("account_set-0-name", "Savings"),
        ]);

        let errors = validate_institution_form(&data, &[]).unwrap_err();

        assert_eq!(errors.field("address"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.field("account_set-0-account_number"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.field("account_set-0-status"), [REQUIRED_MESSAGE]);
    }

    #[test]
    fn accounts_of_other_institutions_are_rejected() {
        let data = form_data(&[
            ("name", "Credit Union"),
            ("address", "1 Main St"),
            ("phone", "555"),
            ("fax", "556"),
            ("account_set-0-id", "8"),
            ("account_set-0-DELETE", "on"),
        ]);

        let errors = validate_institution_form(&data, &[existing_account()]).unwrap_err();

        assert_eq!(errors.field("account_set-0-id"), [INVALID_CHOICE_MESSAGE]);
    }
}
