//! The JSON endpoints used by the reconciliation page.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    bank_reconciliation::{
        db::{get_bank_transactions_in_group, get_group_ids_in_ranges, get_unreconciled_bank_transactions},
        domain::{BankRow, FinancialRow, GroupDeletionError, GroupRow, ReconciliationErrors},
        reconcile::{match_transactions, read_transaction_ids, unmatch_groups, unmatch_transactions},
    },
    financial_transactions::{TransactionFilter, get_reconciled_summaries, get_transaction_summaries},
    form::parse_date,
};

const INVALID_DATE_MESSAGE: &str = "Provided date(s) not in valid format ('yyyy-mm-dd').";

/// The state needed for the reconciliation endpoints.
#[derive(Debug, Clone)]
pub struct ReconciliationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReconciliationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond to an unexpected failure of a JSON endpoint.
fn json_error_response(error: Error) -> Response {
    tracing::error!("Reconciliation request failed: {error}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"errors": {"server": "An unexpected error occurred."}})),
    )
        .into_response()
}

fn lock(state: &ReconciliationState) -> Result<std::sync::MutexGuard<'_, Connection>, Error> {
    state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// "financial" or "bank".
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_end: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TransactionRows {
    Financial(Vec<FinancialRow>),
    Bank(Vec<BankRow>),
}

#[derive(Debug, Default, Serialize)]
pub struct TransactionsResponse {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub data: Option<TransactionRows>,
    pub errors: Option<BTreeMap<&'static str, &'static str>>,
}

impl TransactionsResponse {
    fn failed(transaction_type: Option<String>, errors: &[(&'static str, &'static str)]) -> Self {
        Self {
            transaction_type,
            data: None,
            errors: Some(errors.iter().copied().collect()),
        }
    }
}

/// List the unreconciled financial or bank transactions in a date range.
pub async fn retrieve_transactions(
    State(state): State<ReconciliationState>,
    Query(query): Query<TransactionsQuery>,
) -> Response {
    let transaction_type = query.transaction_type.as_str();
    if transaction_type != "financial" && transaction_type != "bank" {
        return Json(TransactionsResponse::failed(
            None,
            &[("transaction_type", "Invalid transaction type provided.")],
        ))
        .into_response();
    }

    let kind = Some(transaction_type.to_owned());

    if query.date_start.is_empty() {
        return Json(TransactionsResponse::failed(
            kind,
            &[("date_start", "Must specify start date.")],
        ))
        .into_response();
    }

    if query.date_end.is_empty() {
        return Json(TransactionsResponse::failed(
            kind,
            &[("date_end", "Must specify end date.")],
        ))
        .into_response();
    }

    let (Some(date_start), Some(date_end)) =
        (parse_date(&query.date_start), parse_date(&query.date_end))
    else {
        return Json(TransactionsResponse::failed(
            kind,
            &[
                ("date_start", INVALID_DATE_MESSAGE),
                ("date_end", INVALID_DATE_MESSAGE),
            ],
        ))
        .into_response();
    };

    let connection = match lock(&state) {
        Ok(connection) => connection,
        Err(error) => return json_error_response(error),
    };

    let rows = if transaction_type == "financial" {
        get_transaction_summaries(
            &TransactionFilter {
                kind: None,
                date_start: Some(date_start),
                date_end: Some(date_end),
                unreconciled_only: true,
            },
            &connection,
        )
        .map(|summaries| TransactionRows::Financial(summaries.iter().map(FinancialRow::from).collect()))
    } else {
        get_unreconciled_bank_transactions(date_start, date_end, &connection)
            .map(|lines| TransactionRows::Bank(lines.iter().map(BankRow::from).collect()))
    };

    match rows {
        Ok(rows) => Json(TransactionsResponse {
            transaction_type: kind,
            data: Some(rows),
            errors: None,
        })
        .into_response(),
        Err(error) => json_error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchesQuery {
    #[serde(default)]
    pub financial_date_start: String,
    #[serde(default)]
    pub financial_date_end: String,
    #[serde(default)]
    pub bank_date_start: String,
    #[serde(default)]
    pub bank_date_end: String,
}

#[derive(Debug, Default, Serialize)]
pub struct MatchesResponse {
    pub data: Vec<GroupRow>,
    pub errors: Vec<BTreeMap<&'static str, &'static str>>,
}

impl MatchesQuery {
    fn ranges(&self) -> Result<((Date, Date), (Date, Date)), MatchesResponse> {
        let mut response = MatchesResponse::default();
        let fields = [
            ("financial_date_start", &self.financial_date_start, "Must specify financial start date."),
            ("financial_date_end", &self.financial_date_end, "Must specify financial end date."),
            ("bank_date_start", &self.bank_date_start, "Must specify bank start date."),
            ("bank_date_end", &self.bank_date_end, "Must specify bank end date."),
        ];

        for (field, value, message) in fields {
            if value.is_empty() {
                response.errors.push(BTreeMap::from([(field, message)]));
            }
        }

        if !response.errors.is_empty() {
            return Err(response);
        }

        match (
            parse_date(&self.financial_date_start),
            parse_date(&self.financial_date_end),
            parse_date(&self.bank_date_start),
            parse_date(&self.bank_date_end),
        ) {
            (Some(financial_start), Some(financial_end), Some(bank_start), Some(bank_end)) => {
                Ok(((financial_start, financial_end), (bank_start, bank_end)))
            }
            _ => {
                response.errors.push(BTreeMap::from([("dates", INVALID_DATE_MESSAGE)]));
                Err(response)
            }
        }
    }
}

fn load_groups(
    financial_range: (Date, Date),
    bank_range: (Date, Date),
    connection: &Connection,
) -> Result<Vec<GroupRow>, Error> {
    get_group_ids_in_ranges(financial_range, bank_range, connection)?
        .into_iter()
        .map(|id| {
            Ok(GroupRow {
                id,
                financial_transactions: get_reconciled_summaries(id, connection)?
                    .iter()
                    .map(FinancialRow::from)
                    .collect(),
                bank_transactions: get_bank_transactions_in_group(id, connection)?
                    .iter()
                    .map(BankRow::from)
                    .collect(),
            })
        })
        .collect()
}

/// List the reconciliation groups with a member in the financial or bank
/// date range.
pub async fn retrieve_matches(
    State(state): State<ReconciliationState>,
    Query(query): Query<MatchesQuery>,
) -> Response {
    let (financial_range, bank_range) = match query.ranges() {
        Ok(ranges) => ranges,
        Err(response) => return Json(response).into_response(),
    };

    let connection = match lock(&state) {
        Ok(connection) => connection,
        Err(error) => return json_error_response(error),
    };

    match load_groups(financial_range, bank_range, &connection) {
        Ok(data) => Json(MatchesResponse {
            data,
            errors: Vec::new(),
        })
        .into_response(),
        Err(error) => json_error_response(error),
    }
}

/// Reconcile the financial and bank transactions in the request body with
/// each other.
pub async fn match_transactions_endpoint(
    State(state): State<ReconciliationState>,
    body: Bytes,
) -> Response {
    let mut errors = ReconciliationErrors::default();
    let request = read_transaction_ids(&body, &mut errors);

    let connection = match lock(&state) {
        Ok(connection) => connection,
        Err(error) => return json_error_response(error),
    };

    match match_transactions(&request, errors, &connection) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(error) => json_error_response(error),
    }
}

/// Detach the financial and bank transactions in the request body from their
/// reconciliation groups.
pub async fn unmatch_transactions_endpoint(
    State(state): State<ReconciliationState>,
    body: Bytes,
) -> Response {
    let mut errors = ReconciliationErrors::default();
    let request = read_transaction_ids(&body, &mut errors);

    let connection = match lock(&state) {
        Ok(connection) => connection,
        Err(error) => return json_error_response(error),
    };

    match unmatch_transactions(&request, errors, &connection) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(error) => json_error_response(error),
    }
}

#[derive(Debug, Serialize)]
struct GroupDeletionResponse {
    errors: Vec<GroupDeletionError>,
}

/// Delete the reconciliation groups in the request body.
pub async fn unmatch_groups_endpoint(
    State(state): State<ReconciliationState>,
    body: Bytes,
) -> Response {
    let connection = match lock(&state) {
        Ok(connection) => connection,
        Err(error) => return json_error_response(error),
    };

    match unmatch_groups(&body, &connection) {
        Ok(errors) => Json(GroupDeletionResponse { errors }).into_response(),
        Err(error) => json_error_response(error),
    }
}

#[cfg(test)]
mod retrieve_tests {
    use axum::extract::{Query, State};
    use serde_json::json;

    use crate::{
        choices::Kind,
        test_utils::{fixtures, get_test_connection, parse_json, shared},
    };

    use super::{
        MatchesQuery, ReconciliationState, TransactionsQuery, match_transactions_endpoint,
        retrieve_matches, retrieve_transactions,
    };

    fn transactions_query(transaction_type: &str, start: &str, end: &str) -> Query<TransactionsQuery> {
        Query(TransactionsQuery {
            transaction_type: transaction_type.to_owned(),
            date_start: start.to_owned(),
            date_end: end.to_owned(),
        })
    }

    #[tokio::test]
    async fn lists_unreconciled_financial_transactions() {
        let connection = get_test_connection();
        let expense = fixtures::financial_transaction(&connection, Kind::Expense);
        let state = ReconciliationState {
            db_connection: shared(connection),
        };

        let response = retrieve_transactions(
            State(state),
            transactions_query("financial", "2017-01-01", "2017-01-31"),
        )
        .await;

        assert_eq!(
            parse_json(response).await,
            json!({
                "type": "financial",
                "data": [{
                    "id": expense.id,
                    "date": "2017-01-20",
                    "type": "Expense",
                    "description": "Payee 1 - Conference",
                    "total": "21.00",
                }],
                "errors": null,
            })
        );
    }

    #[tokio::test]
    async fn lists_bank_transactions_in_range() {
        let connection = get_test_connection();
        let line = fixtures::bank_transaction(&connection, 1250, 0);
        let state = ReconciliationState {
            db_connection: shared(connection),
        };

        let response = retrieve_transactions(
            State(state.clone()),
            transactions_query("bank", "2017-01-01", "2017-01-31"),
        )
        .await;
        let json = parse_json(response).await;
        assert_eq!(json["data"][0]["id"], line.id);
        assert_eq!(json["data"][0]["debit"], "12.50");
        assert_eq!(json["data"][0]["description"], "POS PURCHASE");

        let response = retrieve_transactions(
            State(state),
            transactions_query("bank", "2017-02-01", "2017-02-28"),
        )
        .await;
        assert_eq!(parse_json(response).await["data"], json!([]));
    }

    #[tokio::test]
    async fn reports_bad_queries() {
        let state = ReconciliationState {
            db_connection: shared(get_test_connection()),
        };
        let cases = [
            (
                transactions_query("cash", "2017-01-01", "2017-01-31"),
                json!({"type": null, "data": null, "errors": {"transaction_type": "Invalid transaction type provided."}}),
            ),
            (
                transactions_query("bank", "", "2017-01-31"),
                json!({"type": "bank", "data": null, "errors": {"date_start": "Must specify start date."}}),
            ),
            (
                transactions_query("bank", "2017-01-01", ""),
                json!({"type": "bank", "data": null, "errors": {"date_end": "Must specify end date."}}),
            ),
            (
                transactions_query("financial", "2017-01-01", "31/01/2017"),
                json!({"type": "financial", "data": null, "errors": {
                    "date_start": "Provided date(s) not in valid format ('yyyy-mm-dd').",
                    "date_end": "Provided date(s) not in valid format ('yyyy-mm-dd').",
                }}),
            ),
        ];

        for (query, want) in cases {
            let response = retrieve_transactions(State(state.clone()), query).await;

            assert_eq!(parse_json(response).await, want);
        }
    }

    #[tokio::test]
    async fn matched_groups_are_listed_with_their_members() {
        let connection = get_test_connection();
        let expense = fixtures::financial_transaction(&connection, Kind::Expense);
        let line = fixtures::bank_transaction(&connection, 2100, 0);
        let state = ReconciliationState {
            db_connection: shared(connection),
        };
        let body = json!({"financial_ids": [expense.id], "bank_ids": [line.id]}).to_string();
        let response = match_transactions_endpoint(State(state.clone()), body.into()).await;
        assert_eq!(
            parse_json(response).await["success"],
            json!({"financial_id": [expense.id], "bank_id": [line.id]})
        );

        let response = retrieve_matches(
            State(state),
            Query(MatchesQuery {
                financial_date_start: "2017-01-01".to_owned(),
                financial_date_end: "2017-01-31".to_owned(),
                bank_date_start: "2018-01-01".to_owned(),
                bank_date_end: "2018-01-31".to_owned(),
            }),
        )
        .await;

        let json = parse_json(response).await;
        assert_eq!(json["errors"], json!([]));
        let groups = json["data"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["financial_transactions"][0]["total"], "21.00");
        assert_eq!(groups[0]["bank_transactions"][0]["id"], line.id);
    }

    #[tokio::test]
    async fn matches_need_every_date() {
        let state = ReconciliationState {
            db_connection: shared(get_test_connection()),
        };

        let response = retrieve_matches(
            State(state.clone()),
            Query(MatchesQuery {
                financial_date_start: "2017-01-01".to_owned(),
                ..Default::default()
            }),
        )
        .await;
        assert_eq!(
            parse_json(response).await,
            json!({"data": [], "errors": [
                {"financial_date_end": "Must specify financial end date."},
                {"bank_date_start": "Must specify bank start date."},
                {"bank_date_end": "Must specify bank end date."},
            ]})
        );

        let response = retrieve_matches(
            State(state),
            Query(MatchesQuery {
                financial_date_start: "2017-01-01".to_owned(),
                financial_date_end: "2017-01-31".to_owned(),
                bank_date_start: "yesterday".to_owned(),
                bank_date_end: "2017-01-31".to_owned(),
            }),
        )
        .await;
        assert_eq!(
            parse_json(response).await["errors"],
            json!([{"dates": "Provided date(s) not in valid format ('yyyy-mm-dd')."}])
        );
    }
}
