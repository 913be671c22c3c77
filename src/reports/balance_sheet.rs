use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    form::parse_date,
    reports::{db::get_balance_sheet, domain::BalanceSheet, income_statement::ReportsState},
};

#[derive(Debug, Default, Deserialize)]
pub struct BalanceSheetQuery {
    #[serde(default)]
    pub date: String,
}

/// The balance sheet as JSON, all zero when `date` is missing or invalid.
pub async fn get_balance_sheet_endpoint(
    State(state): State<ReportsState>,
    Query(query): Query<BalanceSheetQuery>,
) -> Response {
    let Some(date) = parse_date(&query.date) else {
        return Json(BalanceSheet::default()).into_response();
    };

    let sheet = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| get_balance_sheet(date, &connection));

    match sheet {
        Ok(sheet) => Json(sheet).into_response(),
        Err(error) => {
            tracing::error!("Could not get the balance sheet for {date}: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"errors": {"server": "An unexpected error occurred."}})),
            )
                .into_response()
        }
    }
}
