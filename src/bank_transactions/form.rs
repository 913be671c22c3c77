//! The statement form, its bank transaction sub-forms and attachments.

use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    bank_institutions::AccountLabel,
    bank_transactions::{
        db::{
            create_bank_transaction, create_statement, delete_bank_transaction,
            update_bank_transaction, update_statement,
        },
        domain::{
            BankTransaction, BankTransactionDetails, BankTransactionId, DESCRIPTION_MAX_LENGTH,
            Statement, StatementDetails, StatementId,
        },
    },
    documents::{
        AttachmentChanges, AttachmentMatch, AttachmentOwner, MediaStorage, MultipartForm,
        apply_attachment_changes, attachment_fields, read_attachment_changes, with_file_changes,
    },
    form::{
        EXTRA_SUB_FORMS, FormData, FormErrors, INVALID_CHOICE_MESSAGE, SubForm,
        check_date_order, money_or_zero, optional_text, required_date, required_id,
        required_text, sub_forms,
    },
    html::{FIELDSET_STYLE, FORM_LABEL_STYLE, Field, FormTarget, hidden_input, htmx_form, non_field_errors},
};

pub const BANK_TRANSACTION_PREFIX: &str = "banktransaction_set";
const BANK_TRANSACTION_FIELDS: [&str; 5] = [
    "date_transaction",
    "description_bank",
    "description_user",
    "amount_debit",
    "amount_credit",
];

/// The most files that can be attached to a statement in one submission.
pub const MAX_STATEMENT_FILES: usize = 10;

pub const MISSING_AMOUNT_MESSAGE: &str = "Please enter a debit or credit value.";
pub const BOTH_AMOUNTS_MESSAGE: &str =
    "A single transaction cannot have both debit and credit amounts entered.";

#[derive(Debug, Clone, PartialEq)]
pub enum BankTransactionChange {
    Create(BankTransactionDetails),
    Update(BankTransactionId, BankTransactionDetails),
    Delete(BankTransactionId),
}

/// A validated statement form.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementForm {
    pub details: StatementDetails,
    pub bank_transactions: Vec<BankTransactionChange>,
    pub attachments: AttachmentChanges,
}

/// What an existing statement has that the form may change.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistingStatement<'a> {
    pub bank_transactions: &'a [BankTransaction],
    pub attachments: &'a [AttachmentMatch],
}

/// Validate the statement, its bank transactions and attachment changes.
///
/// `accounts` are the accounts a statement may belong to.
pub fn validate_statement_form(
    form: &MultipartForm,
    accounts: &[AccountLabel],
    existing: ExistingStatement,
) -> Result<StatementForm, FormErrors> {
    let data = &form.data;
    let mut errors = FormErrors::new();

    let account_id = required_id(data, "account", &mut errors);
    if let Some(account_id) = account_id {
        if !accounts.iter().any(|label| label.account.id == account_id) {
            errors.add("account", INVALID_CHOICE_MESSAGE);
        }
    }

    let date_start = required_date(data, "date_start", &mut errors);
    let date_end = required_date(data, "date_end", &mut errors);
    check_date_order(date_start, date_end, "date_end", &mut errors);

    let existing_ids: Vec<BankTransactionId> = existing
        .bank_transactions
        .iter()
        .map(|line| line.id)
        .collect();
    let bank_transactions = sub_forms(
        data,
        BANK_TRANSACTION_PREFIX,
        &BANK_TRANSACTION_FIELDS,
        &existing_ids,
        &mut errors,
    )
    .into_iter()
    .filter_map(|sub_form| match sub_form {
        SubForm::New(row) => {
            read_bank_transaction(data, &row, &mut errors).map(BankTransactionChange::Create)
        }
        SubForm::Existing(id, row) => read_bank_transaction(data, &row, &mut errors)
            .map(|details| BankTransactionChange::Update(id, details)),
        SubForm::Deleted(id) => Some(BankTransactionChange::Delete(id)),
    })
    .collect();

    let attachments =
        read_attachment_changes(form, MAX_STATEMENT_FILES, existing.attachments, &mut errors);

    match (account_id, date_start, date_end) {
        (Some(account_id), Some(date_start), Some(date_end)) if errors.is_empty() => {
            Ok(StatementForm {
                details: StatementDetails {
                    account_id,
                    date_start,
                    date_end,
                },
                bank_transactions,
                attachments,
            })
        }
        _ => Err(errors),
    }
}

fn read_bank_transaction(
    data: &FormData,
    row: &str,
    errors: &mut FormErrors,
) -> Option<BankTransactionDetails> {
    let date_transaction = required_date(data, &format!("{row}-date_transaction"), errors);
    let description_bank = required_text(
        data,
        &format!("{row}-description_bank"),
        DESCRIPTION_MAX_LENGTH,
        errors,
    );
    let description_user = optional_text(
        data,
        &format!("{row}-description_user"),
        DESCRIPTION_MAX_LENGTH,
        errors,
    );

    let debit_field = format!("{row}-amount_debit");
    let credit_field = format!("{row}-amount_credit");
    let amount_debit = money_or_zero(data, &debit_field, errors);
    let amount_credit = money_or_zero(data, &credit_field, errors);

    if !errors.has_field(&debit_field) && !errors.has_field(&credit_field) {
        match (amount_debit.is_zero(), amount_credit.is_zero()) {
            (true, true) => errors.add(&debit_field, MISSING_AMOUNT_MESSAGE),
            (false, false) => errors.add(&credit_field, BOTH_AMOUNTS_MESSAGE),
            _ => {}
        }
    }

    Some(BankTransactionDetails {
        date_transaction: date_transaction?,
        description_bank,
        description_user,
        amount_debit,
        amount_credit,
    })
}

/// The form data for a new statement with empty bank transaction rows.
pub fn blank_form_data() -> FormData {
    let mut data = FormData::default();
    data.add_blank_sub_forms(BANK_TRANSACTION_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

/// The form data for editing `statement` and its bank transactions.
pub fn initial_form_data(statement: &Statement, bank_transactions: &[BankTransaction]) -> FormData {
    let mut data = FormData::default();
    data.push("account", statement.account_id.to_string());
    data.push("date_start", statement.date_start.to_string());
    data.push("date_end", statement.date_end.to_string());

    for (index, line) in bank_transactions.iter().enumerate() {
        let row = format!("{BANK_TRANSACTION_PREFIX}-{index}");
        data.push(format!("{row}-id"), line.id.to_string());
        data.push(
            format!("{row}-date_transaction"),
            line.date_transaction.to_string(),
        );
        data.push(format!("{row}-description_bank"), line.description_bank.as_str());
        data.push(
            format!("{row}-description_user"),
            line.description_user.clone().unwrap_or_default(),
        );
        data.push(format!("{row}-amount_debit"), line.amount_debit.to_plain_string());
        data.push(format!("{row}-amount_credit"), line.amount_credit.to_plain_string());
    }

    data.add_blank_sub_forms(BANK_TRANSACTION_PREFIX, "id", EXTRA_SUB_FORMS);
    data
}

/// Save the statement, its bank transactions and attachments in one
/// transaction.
///
/// Creates a new statement when `statement_id` is `None`. New files are
/// removed again if saving fails.
pub fn save_statement_form(
    statement_id: Option<StatementId>,
    form: &StatementForm,
    storage: &MediaStorage,
    connection: &Connection,
) -> Result<Statement, Error> {
    with_file_changes(storage, |file_changes| {
        let transaction = connection.unchecked_transaction()?;

        let statement = match statement_id {
            Some(id) => update_statement(id, &form.details, &transaction)?,
            None => create_statement(&form.details, &transaction)?,
        };

        for change in &form.bank_transactions {
            match change {
                BankTransactionChange::Create(details) => {
                    create_bank_transaction(statement.id, details, &transaction)?;
                }
                BankTransactionChange::Update(id, details) => {
                    update_bank_transaction(*id, details, &transaction)?;
                }
                BankTransactionChange::Delete(id) => delete_bank_transaction(*id, &transaction)?,
            }
        }

        apply_attachment_changes(
            AttachmentOwner::Statement(statement.id),
            &form.attachments,
            storage,
            file_changes,
            &transaction,
        )?;

        transaction.commit()?;

        Ok(statement)
    })
}

pub fn statement_form_view(
    target: FormTarget,
    accounts: &[AccountLabel],
    attachments: &[AttachmentMatch],
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let account_options: Vec<(String, String)> = accounts
        .iter()
        .map(|label| (label.account.id.to_string(), label.to_string()))
        .collect();

    let content = html! {
        (non_field_errors(errors))

        (Field::required("Account", "account").select(&account_options, data, errors))

        div class="grid grid-cols-1 md:grid-cols-2 gap-4"
        {
            (Field::required("Start date", "date_start").date(data, errors))
            (Field::required("End date", "date_end").date(data, errors))
        }

        fieldset class=(FIELDSET_STYLE)
        {
            legend class=(FORM_LABEL_STYLE) { "Bank transactions" }

            @for index in data.indices(BANK_TRANSACTION_PREFIX) {
                @let row = format!("{BANK_TRANSACTION_PREFIX}-{index}");
                @let date_transaction = format!("{row}-date_transaction");
                @let description_bank = format!("{row}-description_bank");
                @let description_user = format!("{row}-description_user");
                @let amount_debit = format!("{row}-amount_debit");
                @let amount_credit = format!("{row}-amount_credit");
                @let delete = format!("{row}-DELETE");

                div class="grid grid-cols-1 md:grid-cols-6 gap-4 items-end"
                {
                    (hidden_input(&format!("{row}-id"), data))
                    (Field::optional("Date", &date_transaction).date(data, errors))
                    (Field::optional("Bank description", &description_bank).text(data, errors))
                    (Field::optional("Your description", &description_user).text(data, errors))
                    (Field::optional("Debit", &amount_debit).money(data, errors))
                    (Field::optional("Credit", &amount_credit).money(data, errors))
                    (Field::optional("Delete", &delete).checkbox(data))
                }
            }
        }

        (attachment_fields(attachments, data, errors))
    };

    htmx_form(target, true, "Save", content)
}

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::{
        bank_institutions::{Account, AccountLabel},
        bank_transactions::{BankTransaction, BankTransactionDetails},
        choices::Status,
        documents::MultipartForm,
        form::{DATE_ORDER_MESSAGE, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE},
        money::Money,
        test_utils::form_data,
    };

    use super::{
        BOTH_AMOUNTS_MESSAGE, BankTransactionChange, ExistingStatement, MISSING_AMOUNT_MESSAGE,
        validate_statement_form,
    };

    fn accounts() -> Vec<AccountLabel> {
        vec![AccountLabel {
            account: Account {
                id: 1,
                institution_id: 1,
                account_number: "12345".to_owned(),
                name: "Chequing".to_owned(),
                status: Status::Active,
            },
            institution_name: "Test Bank".to_owned(),
        }]
    }

    fn multipart(pairs: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            data: form_data(pairs),
            files: Vec::new(),
        }
    }

    #[test]
    fn valid_statement_with_lines() {
        let form = multipart(&[
            ("account", "1"),
            ("date_start", "2017-01-01"),
            ("date_end", "2017-01-31"),
            ("banktransaction_set-0-id", ""),
            ("banktransaction_set-0-date_transaction", "2017-01-05"),
            ("banktransaction_set-0-description_bank", "DEPOSIT"),
            ("banktransaction_set-0-description_user", ""),
            ("banktransaction_set-0-amount_debit", ""),
            ("banktransaction_set-0-amount_credit", "150.00"),
            ("banktransaction_set-1-id", ""),
            ("banktransaction_set-1-date_transaction", ""),
            ("banktransaction_set-1-description_bank", ""),
        ]);

        let statement = validate_statement_form(&form, &accounts(), ExistingStatement::default())
            .unwrap();

        assert_eq!(statement.details.date_end, date!(2017 - 01 - 31));
        assert_eq!(
            statement.bank_transactions,
            vec![BankTransactionChange::Create(BankTransactionDetails {
                date_transaction: date!(2017 - 01 - 05),
                description_bank: "DEPOSIT".to_owned(),
                description_user: None,
                amount_debit: Money::ZERO,
                amount_credit: Money::from_cents(15000),
            })]
        );
    }

    #[test]
    fn end_before_start_is_rejected() {
        let form = multipart(&[
            ("account", "1"),
            ("date_start", "2017-02-01"),
            ("date_end", "2017-01-01"),
        ]);

        let errors = validate_statement_form(&form, &accounts(), ExistingStatement::default())
            .unwrap_err();

        assert_eq!(errors.field("date_end"), [DATE_ORDER_MESSAGE]);
    }

    #[test]
    fn unknown_account_is_rejected() {
        let form = multipart(&[
            ("account", "9"),
            ("date_start", "2017-01-01"),
            ("date_end", "2017-01-31"),
        ]);

        let errors = validate_statement_form(&form, &accounts(), ExistingStatement::default())
            .unwrap_err();

        assert_eq!(errors.field("account"), [INVALID_CHOICE_MESSAGE]);
    }

    #[test]
    fn line_needs_exactly_one_amount() {
        let form = multipart(&[
            ("account", "1"),
            ("date_start", "2017-01-01"),
            ("date_end", "2017-01-31"),
            ("banktransaction_set-0-date_transaction", "2017-01-05"),
            ("banktransaction_set-0-description_bank", "NOTHING"),
            ("banktransaction_set-1-date_transaction", "2017-01-06"),
            ("banktransaction_set-1-description_bank", "BOTH"),
            ("banktransaction_set-1-amount_debit", "1.00"),
            ("banktransaction_set-1-amount_credit", "2.00"),
            ("banktransaction_set-2-description_bank", "NO DATE"),
            ("banktransaction_set-2-amount_debit", "1.00"),
        ]);

        let errors = validate_statement_form(&form, &accounts(), ExistingStatement::default())
            .unwrap_err();

        assert_eq!(
            errors.field("banktransaction_set-0-amount_debit"),
            [MISSING_AMOUNT_MESSAGE]
        );
        assert_eq!(
            errors.field("banktransaction_set-1-amount_credit"),
            [BOTH_AMOUNTS_MESSAGE]
        );
        assert_eq!(
            errors.field("banktransaction_set-2-date_transaction"),
            [REQUIRED_MESSAGE]
        );
    }

    #[test]
    fn existing_lines_can_be_updated_and_deleted() {
        let existing = [
            BankTransaction {
                id: 3,
                statement_id: 1,
                date_transaction: date!(2017 - 01 - 05),
                description_bank: "CHQ".to_owned(),
                description_user: None,
                amount_debit: Money::from_cents(100),
                amount_credit: Money::ZERO,
                reconciled: None,
            },
            BankTransaction {
                id: 4,
                statement_id: 1,
                date_transaction: date!(2017 - 01 - 06),
                description_bank: "FEE".to_owned(),
                description_user: None,
                amount_debit: Money::from_cents(5),
                amount_credit: Money::ZERO,
                reconciled: None,
            },
        ];
        let form = multipart(&[
            ("account", "1"),
            ("date_start", "2017-01-01"),
            ("date_end", "2017-01-31"),
            ("banktransaction_set-0-id", "3"),
            ("banktransaction_set-0-date_transaction", "2017-01-05"),
            ("banktransaction_set-0-description_bank", "CHQ"),
            ("banktransaction_set-0-description_user", "Rent"),
            ("banktransaction_set-0-amount_debit", "1.00"),
            ("banktransaction_set-1-id", "4"),
            ("banktransaction_set-1-DELETE", "on"),
        ]);

        let statement = validate_statement_form(
            &form,
            &accounts(),
            ExistingStatement {
                bank_transactions: &existing,
                attachments: &[],
            },
        )
        .unwrap();

        assert_eq!(statement.bank_transactions.len(), 2);
        assert!(matches!(
            &statement.bank_transactions[0],
            BankTransactionChange::Update(3, details) if details.description_user.as_deref() == Some("Rent")
        ));
        assert_eq!(statement.bank_transactions[1], BankTransactionChange::Delete(4));
    }
}
