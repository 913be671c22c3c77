//! Matching bank transactions with financial transactions and undoing those
//! matches.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::Value;

use crate::{
    Error,
    bank_reconciliation::{
        db::{
            create_reconciliation_group, delete_empty_groups, delete_reconciliation_group,
            reconcile_bank_transaction, reconcile_financial_transaction,
            unreconcile_bank_transaction, unreconcile_financial_transaction,
        },
        domain::{
            GroupDeletionError, GroupIds, ReconciliationErrors, ReconciliationOutcome,
            TransactionIds, display_id, parse_id,
        },
    },
    bank_transactions::get_bank_transaction,
    financial_transactions::get_transaction_summary,
};

pub const INVALID_DATA_MESSAGE: &str = "Invalid data submitted to server.";
pub const NO_FINANCIAL_MESSAGE: &str = "Please select at least one financial transaction.";
pub const NO_BANK_MESSAGE: &str = "Please select at least one bank transaction.";

fn invalid_id_message(raw: &Value, kind: &str) -> String {
    format!(
        "{} is not a valid {kind} transaction ID. Please make a valid selection.",
        display_id(raw)
    )
}

fn already_reconciled_message(transaction: impl std::fmt::Display) -> String {
    format!("{transaction} is already reconciled. Unmatch the transaction before reassigning it.")
}

fn not_matched_message(transaction: impl std::fmt::Display) -> String {
    format!("{transaction} is not a matched transaction.")
}

/// Read a match or unmatch request body, recording a post data error when it
/// is not a JSON object of ID lists.
pub fn read_transaction_ids(body: &[u8], errors: &mut ReconciliationErrors) -> TransactionIds {
    serde_json::from_slice(body).unwrap_or_else(|error| {
        tracing::debug!("Could not read reconciliation request: {error}");
        errors.post_data.push(INVALID_DATA_MESSAGE.to_owned());
        TransactionIds::default()
    })
}

/// Resolve the financial IDs that exist and are not reconciled yet, recording
/// an error for every other ID.
fn check_financial_ids(
    raw_ids: &[Value],
    connection: &Connection,
    errors: &mut Vec<String>,
) -> Result<Vec<i64>, Error> {
    let mut ids = Vec::new();

    for raw in raw_ids {
        let summary = match parse_id(raw).map(|id| get_transaction_summary(id, connection)) {
            Some(Ok(summary)) => summary,
            None | Some(Err(Error::NotFound)) => {
                errors.push(invalid_id_message(raw, "financial"));
                continue;
            }
            Some(Err(error)) => return Err(error),
        };

        if summary.transaction.reconciled.is_some() {
            errors.push(already_reconciled_message(&summary));
        } else if !ids.contains(&summary.transaction.id) {
            ids.push(summary.transaction.id);
        }
    }

    Ok(ids)
}

fn check_bank_ids(
    raw_ids: &[Value],
    connection: &Connection,
    errors: &mut Vec<String>,
) -> Result<Vec<i64>, Error> {
    let mut ids = Vec::new();

    for raw in raw_ids {
        let transaction = match parse_id(raw).map(|id| get_bank_transaction(id, connection)) {
            Some(Ok(transaction)) => transaction,
            None | Some(Err(Error::NotFound)) => {
                errors.push(invalid_id_message(raw, "bank"));
                continue;
            }
            Some(Err(error)) => return Err(error),
        };

        if transaction.reconciled.is_some() {
            errors.push(already_reconciled_message(&transaction));
        } else if !ids.contains(&transaction.id) {
            ids.push(transaction.id);
        }
    }

    Ok(ids)
}

/// Put the requested financial and bank transactions into one new
/// reconciliation group.
///
/// Nothing is changed unless every ID is valid and unreconciled. The checks
/// and updates share one immediate transaction, and the updates only touch
/// unreconciled rows, so two requests can never reconcile the same
/// transaction.
pub fn match_transactions(
    request: &TransactionIds,
    mut errors: ReconciliationErrors,
    connection: &Connection,
) -> Result<ReconciliationOutcome, Error> {
    let mut outcome = ReconciliationOutcome::default();

    if request.financial_ids.is_empty() {
        errors.financial_id.push(NO_FINANCIAL_MESSAGE.to_owned());
    }
    if request.bank_ids.is_empty() {
        errors.bank_id.push(NO_BANK_MESSAGE.to_owned());
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let financial_ids =
        check_financial_ids(&request.financial_ids, &transaction, &mut errors.financial_id)?;
    let bank_ids = check_bank_ids(&request.bank_ids, &transaction, &mut errors.bank_id)?;

    if !errors.is_empty() {
        outcome.errors = errors;
        return Ok(outcome);
    }

    let group = create_reconciliation_group(&transaction)?;

    for &id in &financial_ids {
        if !reconcile_financial_transaction(id, group.id, &transaction)? {
            let summary = get_transaction_summary(id, &transaction)?;
            outcome.errors.financial_id.push(already_reconciled_message(&summary));
            return Ok(outcome);
        }
    }

    for &id in &bank_ids {
        if !reconcile_bank_transaction(id, group.id, &transaction)? {
            let line = get_bank_transaction(id, &transaction)?;
            outcome.errors.bank_id.push(already_reconciled_message(&line));
            return Ok(outcome);
        }
    }

    transaction.commit()?;
    tracing::info!(
        "Reconciled financial transactions {financial_ids:?} with bank transactions {bank_ids:?} in group {}",
        group.id
    );

    outcome.success.financial_id = financial_ids;
    outcome.success.bank_id = bank_ids;
    Ok(outcome)
}

/// Take the requested transactions out of their reconciliation groups and
/// delete the groups left without members.
///
/// Valid IDs are unmatched even when other IDs in the request are not.
pub fn unmatch_transactions(
    request: &TransactionIds,
    errors: ReconciliationErrors,
    connection: &Connection,
) -> Result<ReconciliationOutcome, Error> {
    let mut outcome = ReconciliationOutcome {
        errors,
        ..Default::default()
    };
    let mut touched_groups = Vec::new();

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    for raw in &request.financial_ids {
        let Some(id) = parse_id(raw) else {
            outcome.errors.financial_id.push(invalid_id_message(raw, "financial"));
            continue;
        };

        match unreconcile_financial_transaction(id, &transaction) {
            Ok(Some(group_id)) => {
                touched_groups.push(group_id);
                outcome.success.financial_id.push(id);
            }
            Ok(None) => {
                let summary = get_transaction_summary(id, &transaction)?;
                outcome.errors.financial_id.push(not_matched_message(&summary));
            }
            Err(Error::NotFound) => {
                outcome.errors.financial_id.push(invalid_id_message(raw, "financial"));
            }
            Err(error) => return Err(error),
        }
    }

    for raw in &request.bank_ids {
        let Some(id) = parse_id(raw) else {
            outcome.errors.bank_id.push(invalid_id_message(raw, "bank"));
            continue;
        };

        match unreconcile_bank_transaction(id, &transaction) {
            Ok(Some(group_id)) => {
                touched_groups.push(group_id);
                outcome.success.bank_id.push(id);
            }
            Ok(None) => {
                let line = get_bank_transaction(id, &transaction)?;
                outcome.errors.bank_id.push(not_matched_message(&line));
            }
            Err(Error::NotFound) => {
                outcome.errors.bank_id.push(invalid_id_message(raw, "bank"));
            }
            Err(error) => return Err(error),
        }
    }

    touched_groups.sort_unstable();
    touched_groups.dedup();
    delete_empty_groups(&touched_groups, &transaction)?;

    transaction.commit()?;

    Ok(outcome)
}

/// Delete the requested reconciliation groups, which unreconciles their
/// members.
pub fn unmatch_groups(body: &[u8], connection: &Connection) -> Result<Vec<GroupDeletionError>, Error> {
    let request: GroupIds = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(error) => {
            return Ok(vec![GroupDeletionError::PostData(format!(
                "Invalid data submitted to server: {error}"
            ))]);
        }
    };

    let mut errors = Vec::new();
    let transaction = connection.unchecked_transaction()?;

    for raw in &request.reconciliation_group_ids {
        let Some(id) = parse_id(raw) else {
            errors.push(GroupDeletionError::Ids(format!(
                "Provided ID ({}) is on wrong format",
                display_id(raw)
            )));
            continue;
        };

        match delete_reconciliation_group(id, &transaction) {
            Ok(()) => {}
            Err(Error::DeleteMissing(_)) => {
                errors.push(GroupDeletionError::Ids(format!(
                    "Provided ID ({id}) does not exist"
                )));
            }
            Err(error) => return Err(error),
        }
    }

    transaction.commit()?;

    Ok(errors)
}
