//! Financial transaction editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    documents::{
        AttachmentMatch, AttachmentOwner, MediaStorage, MultipartForm, get_attachment_matches,
        read_multipart,
    },
    endpoints,
    financial_transactions::{
        db::{get_code_assignments, get_financial_transaction, get_items},
        domain::{CodeAssignment, FinancialTransaction, FinancialTransactionId, Item},
        form::{
            CODE_FORMS_SCRIPT, CodeCatalog, ExistingTransaction, initial_form_data,
            save_transaction_form, transaction_form_view, validate_transaction_form,
        },
    },
    form::FormErrors,
    history::{history_for, history_view},
    html::{FormTarget, HeadElement, form_page_with_head},
    navigation::NavBar,
    payee_payers::{PayeePayer, get_all_payee_payers},
    timezone::local_today,
};

/// The state needed for editing a financial transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A stored transaction with everything its form shows.
struct StoredTransaction {
    transaction: FinancialTransaction,
    items: Vec<Item>,
    codes: Vec<CodeAssignment>,
    attachments: Vec<AttachmentMatch>,
    payee_payers: Vec<PayeePayer>,
    catalog: CodeCatalog,
}

impl StoredTransaction {
    fn load(id: FinancialTransactionId, connection: &Connection) -> Result<Self, Error> {
        let transaction = get_financial_transaction(id, connection)?;
        let items = get_items(id, connection)?;

        let mut codes = Vec::new();
        for item in &items {
            codes.extend(get_code_assignments(item.id, connection)?);
        }

        Ok(Self {
            items,
            codes,
            attachments: get_attachment_matches(
                AttachmentOwner::FinancialTransaction(id),
                connection,
            )?,
            payee_payers: get_all_payee_payers(connection)?,
            catalog: CodeCatalog::load(transaction.kind, connection)?,
            transaction,
        })
    }
}

/// Render the transaction editing page.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<FinancialTransactionId>,
    State(state): State<EditTransactionState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stored = StoredTransaction::load(transaction_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::TRANSACTION, transaction_id);

    let form = transaction_form_view(
        FormTarget::Update(&update_endpoint),
        &stored.payee_payers,
        &stored.catalog,
        &stored.attachments,
        &initial_form_data(&stored.transaction, &stored.items, &stored.codes, today),
        &FormErrors::new(),
    );
    let history = history_for(&connection, "financial_transaction", transaction_id)?;

    Ok(form_page_with_head(
        "Edit Transaction",
        &[HeadElement::ScriptLink(CODE_FORMS_SCRIPT.to_owned())],
        NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html(),
        &format!("Edit {}", stored.transaction.kind.to_string().to_lowercase()),
        html! {
            (form)
            (history_view(&history))
        },
    )
    .into_response())
}

/// Handle transaction update form submission.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<FinancialTransactionId>,
    State(state): State<EditTransactionState>,
    multipart: Multipart,
) -> Response {
    match read_multipart(multipart).await {
        Ok(form) => update_transaction_from_form(transaction_id, &state, form),
        Err(error) => error.into_alert_response(),
    }
}

fn update_transaction_from_form(
    transaction_id: FinancialTransactionId,
    state: &EditTransactionState,
    form: MultipartForm,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let stored = match StoredTransaction::load(transaction_id, &connection) {
        Ok(stored) => stored,
        Err(Error::NotFound) => {
            return Error::UpdateMissing("financial transaction").into_alert_response();
        }
        Err(error) => return error.into_alert_response(),
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::TRANSACTION, transaction_id);
    let transaction_form = match validate_transaction_form(
        &form,
        &stored.payee_payers,
        &stored.catalog,
        ExistingTransaction {
            items: &stored.items,
            codes: &stored.codes,
            attachments: &stored.attachments,
        },
    ) {
        Ok(transaction_form) => transaction_form,
        Err(errors) => {
            return transaction_form_view(
                FormTarget::Update(&update_endpoint),
                &stored.payee_payers,
                &stored.catalog,
                &stored.attachments,
                &form.data,
                &errors,
            )
            .into_response();
        }
    };

    // The kind of a transaction never changes once it is created.
    match save_transaction_form(
        Some(transaction_id),
        stored.transaction.kind,
        &transaction_form,
        &state.media,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update financial transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}
