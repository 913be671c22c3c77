//! The compiled transaction form.
//!
//! A transaction form holds the transaction fields, one sub-form per item,
//! and for every item one code sub-form per financial code system covering
//! the item's date. Item rows are named `items-{i}-{field}` and code rows
//! `items-{i}-coding_set-{system_id}-{field}`.

use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    choices::{Choice, Kind},
    documents::{
        AttachmentChanges, AttachmentMatch, AttachmentOwner, MediaStorage, MultipartForm,
        apply_attachment_changes, attachment_fields, read_attachment_changes, with_file_changes,
    },
    endpoints,
    financial_codes::{
        CodeChoiceGroup, CodeChoices, FinancialCodeId, FinancialCodeSystem, SystemId,
        get_all_systems, get_code_choices,
    },
    financial_transactions::{
        db::{
            create_code_match, create_financial_transaction, create_item, delete_code_match,
            delete_item, get_code_assignments, update_code_match, update_financial_transaction,
            update_item,
        },
        domain::{
            CodeAssignment, CodeMatchId, FinancialTransaction, FinancialTransactionDetails,
            FinancialTransactionId, ITEM_DESCRIPTION_MAX_LENGTH, Item, ItemDetails, ItemId,
            MEMO_MAX_LENGTH, SUBMISSION_NOTES_MAX_LENGTH, SUBMITTER_MAX_LENGTH,
        },
    },
    form::{
        EXTRA_SUB_FORMS, FormData, FormErrors, INVALID_CHOICE_MESSAGE, SubForm, money_or_zero,
        optional_id, optional_text, parse_date, required_date, required_id, required_text,
        sub_forms,
    },
    html::{
        FIELDSET_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, Field, FormTarget, field_errors,
        hidden_input, htmx_form, non_field_errors,
    },
    payee_payers::PayeePayer,
};

pub const ITEM_PREFIX: &str = "items";
const CODING_SET: &str = "coding_set";
/// A new item row is skipped when all of these are blank.
const ITEM_FIELDS: [&str; 3] = ["description", "amount", "gst"];

/// The most files that can be attached to a transaction in one submission.
pub const MAX_TRANSACTION_FILES: usize = 20;

pub const NO_ITEMS_MESSAGE: &str = "Please submit 1 or more forms.";

/// Narrows each code select to the codes of its chosen budget year.
pub const CODE_FORMS_SCRIPT: &str = "/static/code_forms.js";

/// The code choices of every financial code system for one kind of
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeCatalog {
    pub kind: Kind,
    systems: Vec<(FinancialCodeSystem, CodeChoices)>,
}

impl CodeCatalog {
    pub fn load(kind: Kind, connection: &Connection) -> Result<Self, Error> {
        let systems = get_all_systems(connection)?
            .into_iter()
            .map(|system| {
                let choices = get_code_choices(system.id, kind, connection)?;
                Ok((system, choices))
            })
            .collect::<Result<_, Error>>()?;

        Ok(Self { kind, systems })
    }

    /// The systems an item dated `date` must be coded in.
    pub fn covering(
        &self,
        date: Date,
    ) -> impl Iterator<Item = &(FinancialCodeSystem, CodeChoices)> {
        self.systems
            .iter()
            .filter(move |(system, _)| system.covers(date))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeChange {
    Create(FinancialCodeId),
    Update(CodeMatchId, FinancialCodeId),
}

/// A validated item sub-form with its code sub-forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemForm {
    pub details: ItemDetails,
    pub codes: Vec<CodeChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    Create(ItemForm),
    Update(ItemId, ItemForm),
    Delete(ItemId),
}

/// A validated transaction form.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub details: FinancialTransactionDetails,
    pub items: Vec<ItemChange>,
    pub attachments: AttachmentChanges,
}

/// What an existing transaction has that the form may change.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistingTransaction<'a> {
    pub items: &'a [Item],
    pub codes: &'a [CodeAssignment],
    pub attachments: &'a [AttachmentMatch],
}

fn coding_prefix(row: &str, system_id: SystemId) -> String {
    format!("{row}-{CODING_SET}-{system_id}")
}

/// Validate the transaction, its items, their codes and the attachment
/// changes.
pub fn validate_transaction_form(
    form: &MultipartForm,
    payee_payers: &[PayeePayer],
    catalog: &CodeCatalog,
    existing: ExistingTransaction,
) -> Result<TransactionForm, FormErrors> {
    let data = &form.data;
    let mut errors = FormErrors::new();

    let payee_payer_id = required_id(data, "payee_payer", &mut errors);
    if payee_payer_id.is_some_and(|id| !payee_payers.iter().any(|payee| payee.id == id)) {
        errors.add("payee_payer", INVALID_CHOICE_MESSAGE);
    }

    let memo = required_text(data, "memo", MEMO_MAX_LENGTH, &mut errors);
    let submitter = optional_text(data, "submitter", SUBMITTER_MAX_LENGTH, &mut errors);
    let date_submitted = required_date(data, "date_submitted", &mut errors);
    let submission_notes = optional_text(
        data,
        "submission_notes",
        SUBMISSION_NOTES_MAX_LENGTH,
        &mut errors,
    );

    let existing_ids: Vec<ItemId> = existing.items.iter().map(|item| item.id).collect();
    let rows = sub_forms(data, ITEM_PREFIX, &ITEM_FIELDS, &existing_ids, &mut errors);

    if rows.iter().all(|row| matches!(row, SubForm::Deleted(_))) {
        errors.add_non_field(NO_ITEMS_MESSAGE);
    }

    let items = rows
        .into_iter()
        .filter_map(|row| match row {
            SubForm::New(row) => {
                read_item(data, &row, None, catalog, existing.codes, &mut errors)
                    .map(ItemChange::Create)
            }
            SubForm::Existing(id, row) => {
                read_item(data, &row, Some(id), catalog, existing.codes, &mut errors)
                    .map(|item| ItemChange::Update(id, item))
            }
            SubForm::Deleted(id) => Some(ItemChange::Delete(id)),
        })
        .collect();

    let attachments = read_attachment_changes(
        form,
        MAX_TRANSACTION_FILES,
        existing.attachments,
        &mut errors,
    );

    match (payee_payer_id, date_submitted) {
        (Some(payee_payer_id), Some(date_submitted)) if errors.is_empty() => Ok(TransactionForm {
            details: FinancialTransactionDetails {
                payee_payer_id,
                memo,
                submitter,
                date_submitted,
                submission_notes,
            },
            items,
            attachments,
        }),
        _ => Err(errors),
    }
}

fn read_item(
    data: &FormData,
    row: &str,
    item_id: Option<ItemId>,
    catalog: &CodeCatalog,
    existing_codes: &[CodeAssignment],
    errors: &mut FormErrors,
) -> Option<ItemForm> {
    let date_item = required_date(data, &format!("{row}-date_item"), errors);
    let description = required_text(
        data,
        &format!("{row}-description"),
        ITEM_DESCRIPTION_MAX_LENGTH,
        errors,
    );
    let amount = money_or_zero(data, &format!("{row}-amount"), errors);
    let gst = money_or_zero(data, &format!("{row}-gst"), errors);

    // Without a date there is no telling which systems the item is coded in.
    let date_item = date_item?;

    let item_codes: Vec<&CodeAssignment> = existing_codes
        .iter()
        .filter(|assignment| Some(assignment.code_match.item_id) == item_id)
        .collect();

    let codes = catalog
        .covering(date_item)
        .filter_map(|(system, choices)| {
            read_code(
                data,
                &coding_prefix(row, system.id),
                system.id,
                choices,
                &item_codes,
                errors,
            )
        })
        .collect();

    Some(ItemForm {
        details: ItemDetails {
            date_item,
            description,
            amount,
            gst,
        },
        codes,
    })
}

fn read_code(
    data: &FormData,
    prefix: &str,
    system_id: SystemId,
    choices: &CodeChoices,
    item_codes: &[&CodeAssignment],
    errors: &mut FormErrors,
) -> Option<CodeChange> {
    let match_field = format!("{prefix}-financial_code_match_id");
    let match_id = optional_id(data, &match_field, errors);
    if match_id.is_some_and(|match_id| {
        !item_codes.iter().any(|assignment| {
            assignment.code_match.id == match_id && assignment.system_id == system_id
        })
    }) {
        errors.add(&match_field, INVALID_CHOICE_MESSAGE);
    }

    let year_field = format!("{prefix}-budget_year");
    let year_id = optional_id(data, &year_field, errors);
    if year_id.is_some_and(|year_id| !choices.budget_years.iter().any(|year| year.id == year_id)) {
        errors.add(&year_field, INVALID_CHOICE_MESSAGE);
    }

    let code_field = format!("{prefix}-code");
    let code_id = required_id(data, &code_field, errors)?;
    // A chosen budget year narrows the choices to the codes of that year.
    let in_year =
        |group: &CodeChoiceGroup| year_id.is_none_or(|year_id| group.budget_year_id == year_id);
    if !choices.find(code_id).is_some_and(|(group, _)| in_year(group)) {
        errors.add(&code_field, INVALID_CHOICE_MESSAGE);
        return None;
    }

    Some(match match_id {
        Some(match_id) => CodeChange::Update(match_id, code_id),
        None => CodeChange::Create(code_id),
    })
}

/// Save the transaction, its items, their code matches and attachments in one
/// transaction.
///
/// Creates a new transaction of `kind` when `transaction_id` is `None`. Code
/// matches of an updated item that the form did not keep are deleted.
pub fn save_transaction_form(
    transaction_id: Option<FinancialTransactionId>,
    kind: Kind,
    form: &TransactionForm,
    storage: &MediaStorage,
    connection: &Connection,
) -> Result<FinancialTransaction, Error> {
    with_file_changes(storage, |file_changes| {
        let sql_transaction = connection.unchecked_transaction()?;

        let transaction = match transaction_id {
            Some(id) => update_financial_transaction(id, &form.details, &sql_transaction)?,
            None => create_financial_transaction(kind, &form.details, &sql_transaction)?,
        };

        for change in &form.items {
            match change {
                ItemChange::Create(item_form) => {
                    let item = create_item(transaction.id, &item_form.details, &sql_transaction)?;
                    save_codes(item.id, &item_form.codes, &sql_transaction)?;
                }
                ItemChange::Update(id, item_form) => {
                    update_item(*id, &item_form.details, &sql_transaction)?;
                    save_codes(*id, &item_form.codes, &sql_transaction)?;
                }
                ItemChange::Delete(id) => delete_item(*id, &sql_transaction)?,
            }
        }

        apply_attachment_changes(
            AttachmentOwner::FinancialTransaction(transaction.id),
            &form.attachments,
            storage,
            file_changes,
            &sql_transaction,
        )?;

        sql_transaction.commit()?;

        Ok(transaction)
    })
}

fn save_codes(item_id: ItemId, codes: &[CodeChange], connection: &Connection) -> Result<(), Error> {
    let mut kept = Vec::new();

    for change in codes {
        match change {
            CodeChange::Create(code_id) => {
                kept.push(create_code_match(item_id, *code_id, connection)?.id);
            }
            CodeChange::Update(match_id, code_id) => {
                kept.push(update_code_match(*match_id, *code_id, connection)?.id);
            }
        }
    }

    for assignment in get_code_assignments(item_id, connection)? {
        if !kept.contains(&assignment.code_match.id) {
            delete_code_match(assignment.code_match.id, connection)?;
        }
    }

    Ok(())
}

fn add_blank_items(data: &mut FormData, today: Date) {
    let next = data
        .indices(ITEM_PREFIX)
        .last()
        .map(|index| index + 1)
        .unwrap_or_default();

    for index in next..next + EXTRA_SUB_FORMS {
        data.push(format!("{ITEM_PREFIX}-{index}-id"), "");
        data.push(format!("{ITEM_PREFIX}-{index}-date_item"), today.to_string());
    }
}

/// The form data for a new transaction submitted `today`.
pub fn blank_form_data(today: Date) -> FormData {
    let mut data = FormData::default();
    data.push("date_submitted", today.to_string());
    add_blank_items(&mut data, today);
    data
}

/// The form data for editing `transaction` with its items and their codes.
pub fn initial_form_data(
    transaction: &FinancialTransaction,
    items: &[Item],
    codes: &[CodeAssignment],
    today: Date,
) -> FormData {
    let mut data = FormData::default();
    data.push("payee_payer", transaction.payee_payer_id.to_string());
    data.push("memo", transaction.memo.as_str());
    data.push("submitter", transaction.submitter.clone().unwrap_or_default());
    data.push("date_submitted", transaction.date_submitted.to_string());
    data.push(
        "submission_notes",
        transaction.submission_notes.clone().unwrap_or_default(),
    );

    for (index, item) in items.iter().enumerate() {
        let row = format!("{ITEM_PREFIX}-{index}");
        data.push(format!("{row}-id"), item.id.to_string());
        data.push(format!("{row}-date_item"), item.date_item.to_string());
        data.push(format!("{row}-description"), item.description.as_str());
        data.push(format!("{row}-amount"), item.amount.to_plain_string());
        data.push(format!("{row}-gst"), item.gst.to_plain_string());

        for assignment in codes
            .iter()
            .filter(|assignment| assignment.code_match.item_id == item.id)
        {
            let prefix = coding_prefix(&row, assignment.system_id);
            data.push(
                format!("{prefix}-financial_code_match_id"),
                assignment.code_match.id.to_string(),
            );
            data.push(
                format!("{prefix}-budget_year"),
                assignment.budget_year_id.to_string(),
            );
            data.push(
                format!("{prefix}-code"),
                assignment.code_match.financial_code_id.to_string(),
            );
        }
    }

    add_blank_items(&mut data, today);
    data
}

pub fn transaction_form_view(
    target: FormTarget,
    payee_payers: &[PayeePayer],
    catalog: &CodeCatalog,
    attachments: &[AttachmentMatch],
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let payee_payer_options: Vec<(String, String)> = payee_payers
        .iter()
        .map(|payee_payer| (payee_payer.id.to_string(), payee_payer.name.clone()))
        .collect();

    let content = html! {
        (non_field_errors(errors))

        (Field::required("Payee or payer", "payee_payer").select(&payee_payer_options, data, errors))
        (Field::required("Memo", "memo").textarea(data, errors))

        div class="grid grid-cols-1 md:grid-cols-2 gap-4"
        {
            (Field::optional("Submitter", "submitter").text(data, errors))
            (Field::required("Submission date", "date_submitted").date(data, errors))
        }

        (Field::optional("Submission notes", "submission_notes").textarea(data, errors))

        fieldset class=(FIELDSET_STYLE)
        {
            legend class=(FORM_LABEL_STYLE) { "Items" }

            @for index in data.indices(ITEM_PREFIX) {
                @let row = format!("{ITEM_PREFIX}-{index}");
                @let description = format!("{row}-description");
                @let amount = format!("{row}-amount");
                @let gst = format!("{row}-gst");
                @let delete = format!("{row}-DELETE");
                @let id = format!("{row}-id");

                div class="space-y-2 pb-4 border-b border-gray-200 dark:border-gray-700"
                {
                    div class="grid grid-cols-1 md:grid-cols-5 gap-4 items-end"
                    {
                        (hidden_input(&id, data))
                        (item_date_input(catalog.kind, index, &row, data, errors))
                        (Field::optional("Description", &description).text(data, errors))
                        (Field::optional("Amount", &amount).money(data, errors))
                        (Field::optional("GST/HST", &gst).money(data, errors))

                        @if !data.text(&id).is_empty() {
                            (Field::optional("Delete", &delete).checkbox(data))
                        }
                    }

                    div id={ (row) "-codes" } class="grid grid-cols-1 md:grid-cols-2 gap-4"
                    {
                        (code_forms_view(catalog, &row, data, errors))
                    }
                }
            }
        }

        (attachment_fields(attachments, data, errors))
    };

    htmx_form(target, true, "Save", content)
}

/// The item date input, which fetches the item's code sub-forms again when
/// the date changes.
fn item_date_input(
    kind: Kind,
    index: usize,
    row: &str,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let name = format!("{row}-date_item");
    let vals = format!(r#"{{"transaction_type": "{}", "item": "{index}"}}"#, kind.code());
    // The row's current code matches and codes go along so that they survive
    // the new date.
    let include = format!("[name^='{row}-']");

    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { "Date" }

            input
                id=(name)
                type="date"
                name=(name)
                value=(data.text(&name))
                hx-get=(endpoints::TRANSACTION_CODE_FORMS)
                hx-vals=(vals)
                hx-include=(include)
                hx-target={ "#" (row) "-codes" }
                hx-trigger="change"
                class=(FORM_TEXT_INPUT_STYLE);

            (field_errors(errors.field(&name)))
        }
    }
}

/// The code sub-forms of the item at `row`, one per system covering the
/// item's date. Nothing is rendered while the date is blank or invalid.
pub fn code_forms_view(
    catalog: &CodeCatalog,
    row: &str,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let date_item = parse_date(data.text(&format!("{row}-date_item")));

    html! {
        @if let Some(date_item) = date_item {
            @for (system, choices) in catalog.covering(date_item) {
                (code_form_view(system, choices, &coding_prefix(row, system.id), data, errors))
            }
        }
    }
}

fn code_form_view(
    system: &FinancialCodeSystem,
    choices: &CodeChoices,
    prefix: &str,
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let match_field = format!("{prefix}-financial_code_match_id");
    let year_field = format!("{prefix}-budget_year");
    let code_field = format!("{prefix}-code");
    let selected_code = data.text(&code_field);

    let year_options: Vec<(String, String)> = choices
        .budget_years
        .iter()
        .map(|year| (year.id.to_string(), year.short_name.clone()))
        .collect();

    html! {
        fieldset class="grid grid-cols-1 md:grid-cols-2 gap-4 p-2 border rounded border-gray-200 dark:border-gray-700"
        {
            legend class="text-sm font-medium text-gray-900 dark:text-white" { (system.title) }

            (hidden_input(&match_field, data))
            (field_errors(errors.field(&match_field)))

            (Field::optional("Budget year", &year_field).select(&year_options, data, errors))

            div
            {
                label for=(code_field) class=(FORM_LABEL_STYLE) { "Financial code" }

                select
                    id=(code_field)
                    name=(code_field)
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "---------" }

                    @for group in &choices.groups {
                        optgroup label=(group.title)
                        {
                            @for code in &group.codes {
                                @let value = code.id.to_string();

                                option
                                    value=(value)
                                    data-year_id=(group.budget_year_id)
                                    selected[value == selected_code]
                                {
                                    (code)
                                }
                            }
                        }
                    }
                }

                (field_errors(errors.field(&code_field)))
            }
        }
    }
}
