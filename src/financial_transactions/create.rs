//! Expense and revenue creation pages and endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    choices::Kind,
    documents::{MediaStorage, MultipartForm, read_multipart},
    endpoints,
    financial_transactions::form::{
        CODE_FORMS_SCRIPT, CodeCatalog, ExistingTransaction, blank_form_data,
        save_transaction_form, transaction_form_view, validate_transaction_form,
    },
    form::FormErrors,
    html::{FormTarget, HeadElement, form_page_with_head},
    navigation::NavBar,
    payee_payers::get_all_payee_payers,
    timezone::local_today,
};

/// The state needed for creating a financial transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
    /// Used for the default dates of a new transaction.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn post_endpoint(kind: Kind) -> &'static str {
    match kind {
        Kind::Expense => endpoints::POST_EXPENSE,
        Kind::Revenue => endpoints::POST_REVENUE,
    }
}

pub async fn get_new_expense_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    new_transaction_page(Kind::Expense, &state)
}

pub async fn get_new_revenue_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    new_transaction_page(Kind::Revenue, &state)
}

fn new_transaction_page(kind: Kind, state: &CreateTransactionState) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payee_payers = get_all_payee_payers(&connection)?;
    let catalog = CodeCatalog::load(kind, &connection)?;
    let form = transaction_form_view(
        FormTarget::Create(post_endpoint(kind)),
        &payee_payers,
        &catalog,
        &[],
        &blank_form_data(today),
        &FormErrors::new(),
    );

    let (title, heading) = match kind {
        Kind::Expense => ("Add Expense", "Add expense"),
        Kind::Revenue => ("Add Revenue", "Add revenue"),
    };

    Ok(form_page_with_head(
        title,
        &[HeadElement::ScriptLink(CODE_FORMS_SCRIPT.to_owned())],
        NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html(),
        heading,
        form,
    )
    .into_response())
}

/// Handle expense creation form submission.
pub async fn create_expense_endpoint(
    State(state): State<CreateTransactionState>,
    multipart: Multipart,
) -> Response {
    match read_multipart(multipart).await {
        Ok(form) => create_transaction_from_form(Kind::Expense, &state, form),
        Err(error) => error.into_alert_response(),
    }
}

/// Handle revenue creation form submission.
pub async fn create_revenue_endpoint(
    State(state): State<CreateTransactionState>,
    multipart: Multipart,
) -> Response {
    match read_multipart(multipart).await {
        Ok(form) => create_transaction_from_form(Kind::Revenue, &state, form),
        Err(error) => error.into_alert_response(),
    }
}

fn create_transaction_from_form(
    kind: Kind,
    state: &CreateTransactionState,
    form: MultipartForm,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let choices = get_all_payee_payers(&connection)
        .and_then(|payee_payers| Ok((payee_payers, CodeCatalog::load(kind, &connection)?)));
    let (payee_payers, catalog) = match choices {
        Ok(choices) => choices,
        Err(error) => return error.into_alert_response(),
    };

    let transaction_form = match validate_transaction_form(
        &form,
        &payee_payers,
        &catalog,
        ExistingTransaction::default(),
    ) {
        Ok(transaction_form) => transaction_form,
        Err(errors) => {
            return transaction_form_view(
                FormTarget::Create(post_endpoint(kind)),
                &payee_payers,
                &catalog,
                &[],
                &form.data,
                &errors,
            )
            .into_response();
        }
    };

    match save_transaction_form(None, kind, &transaction_form, &state.media, &connection) {
        Ok(transaction) => {
            tracing::info!("Created {} {}", transaction.kind, transaction.id);
            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create financial transaction: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use axum::http::StatusCode;
    use tempfile::TempDir;

    use crate::{
        choices::Kind,
        documents::{MediaStorage, MultipartForm},
        endpoints,
        financial_transactions::{
            TransactionFilter, get_code_assignments, get_items, get_transaction_summaries,
        },
        financial_transactions::form::NO_ITEMS_MESSAGE,
        form::INVALID_CHOICE_MESSAGE,
        test_utils::{
            assert_form_has_error, assert_hx_redirect, fixtures, form_data, get_test_connection,
            must_get_form, parse_html_fragment, shared,
        },
    };

    use super::{CreateTransactionState, create_transaction_from_form};

    struct Setup {
        state: CreateTransactionState,
        payee_payer_id: String,
        code_id: String,
        system_id: i64,
    }

    fn setup(media_root: &TempDir, kind: Kind) -> Setup {
        let connection = get_test_connection();
        let payee_payer = fixtures::payee_payer(&connection, "Jane Doe");
        let code = fixtures::financial_code(&connection, kind);
        let system_id = fixtures::system_of_code(&connection, code.id);

        Setup {
            state: CreateTransactionState {
                db_connection: shared(connection),
                media: MediaStorage::new(media_root.path()),
                local_timezone: "Etc/UTC".to_owned(),
            },
            payee_payer_id: payee_payer.id.to_string(),
            code_id: code.id.to_string(),
            system_id,
        }
    }

    #[tokio::test]
    async fn creates_expense_with_coded_item() {
        let media_root = TempDir::new().unwrap();
        let setup = setup(&media_root, Kind::Expense);
        let code_field = format!("items-0-coding_set-{}-code", setup.system_id);
        let form = MultipartForm {
            data: form_data(&[
                ("payee_payer", &setup.payee_payer_id),
                ("memo", "Conference travel"),
                ("submitter", ""),
                ("date_submitted", "2017-02-01"),
                ("submission_notes", ""),
                ("items-0-id", ""),
                ("items-0-date_item", "2017-01-15"),
                ("items-0-description", "Mileage"),
                ("items-0-amount", "20.00"),
                ("items-0-gst", "1.00"),
                (&code_field, &setup.code_id),
                ("items-1-id", ""),
                ("items-1-date_item", "2017-02-01"),
                ("items-1-description", ""),
                ("items-1-amount", ""),
                ("items-1-gst", ""),
            ]),
            files: Vec::new(),
        };

        let response = create_transaction_from_form(Kind::Expense, &setup.state, form);

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = setup.state.db_connection.lock().unwrap();
        let summaries =
            get_transaction_summaries(&TransactionFilter::default(), &connection).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].transaction.kind, Kind::Expense);
        assert_eq!(summaries[0].totals.total().to_string(), "$21.00");
        let items = get_items(summaries[0].transaction.id, &connection).unwrap();
        assert_eq!(items.len(), 1);
        let codes = get_code_assignments(items[0].id, &connection).unwrap();
        assert_eq!(codes[0].code_match.financial_code_id.to_string(), setup.code_id);
    }

    #[tokio::test]
    async fn revenue_code_is_not_an_expense_choice() {
        let media_root = TempDir::new().unwrap();
        let setup = setup(&media_root, Kind::Revenue);
        let code_field = format!("items-0-coding_set-{}-code", setup.system_id);
        let form = MultipartForm {
            data: form_data(&[
                ("payee_payer", &setup.payee_payer_id),
                ("memo", "Conference travel"),
                ("date_submitted", "2017-02-01"),
                ("items-0-date_item", "2017-01-15"),
                ("items-0-description", "Mileage"),
                ("items-0-amount", "20.00"),
                (&code_field, &setup.code_id),
            ]),
            files: Vec::new(),
        };

        let response = create_transaction_from_form(Kind::Expense, &setup.state, form);

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_has_error(&must_get_form(&html), INVALID_CHOICE_MESSAGE);
    }

    #[tokio::test]
    async fn transaction_without_items_is_rejected() {
        let media_root = TempDir::new().unwrap();
        let setup = setup(&media_root, Kind::Expense);
        let form = MultipartForm {
            data: form_data(&[
                ("payee_payer", &setup.payee_payer_id),
                ("memo", "Conference travel"),
                ("date_submitted", "2017-02-01"),
                ("items-0-id", ""),
                ("items-0-date_item", "2017-02-01"),
            ]),
            files: Vec::new(),
        };

        let response = create_transaction_from_form(Kind::Expense, &setup.state, form);

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_has_error(&must_get_form(&html), NO_ITEMS_MESSAGE);
        let connection = setup.state.db_connection.lock().unwrap();
        assert!(
            get_transaction_summaries(&TransactionFilter::default(), &connection)
                .unwrap()
                .is_empty()
        );
    }
}
