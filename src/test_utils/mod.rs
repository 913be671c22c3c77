#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod form;
pub(crate) mod response;

use std::sync::{Arc, Mutex};

use axum::Form;
use rusqlite::Connection;

pub(crate) use form::{
    assert_form_error_message, assert_form_has_error, assert_form_input,
    assert_form_input_with_value, assert_form_submit_button, assert_hx_endpoint, must_get_form,
};
pub(crate) use response::{
    assert_hx_redirect, assert_valid_html, get_header, parse_html_document, parse_html_fragment,
    parse_json,
};

use crate::{db::initialize, form::FormData};

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn shared(connection: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(connection))
}

/// The body of a url-encoded form submission.
pub(crate) fn form_pairs(pairs: &[(&str, &str)]) -> Form<Vec<(String, String)>> {
    Form(
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    )
}

pub(crate) fn form_data(pairs: &[(&str, &str)]) -> FormData {
    FormData::new(
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    )
}
