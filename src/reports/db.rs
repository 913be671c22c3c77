use rusqlite::{Connection, params};
use time::Date;

use crate::{
    Error,
    choices::Kind,
    financial_codes::SystemId,
    financial_transactions::{TransactionFilter, get_transaction_summaries},
    investments::{get_investment_details_up_to, invested_balance},
    money::Money,
    reports::domain::{BalanceSheet, CodedAmount},
};

/// Every item amount coded in `system_id` whose transaction was submitted
/// within the range, inclusive.
pub fn get_coded_amounts(
    system_id: SystemId,
    date_start: Date,
    date_end: Date,
    connection: &Connection,
) -> Result<Vec<CodedAmount>, Error> {
    connection
        .prepare(
            "SELECT g.kind, g.title, c.code, c.description, i.amount, i.gst
            FROM financial_code_match m
            INNER JOIN item i ON i.id = m.item_id
            INNER JOIN financial_transaction t ON t.id = i.transaction_id
            INNER JOIN financial_code c ON c.id = m.financial_code_id
            INNER JOIN financial_code_group g ON g.id = c.financial_code_group_id
            INNER JOIN budget_year b ON b.id = g.budget_year_id
            WHERE b.financial_code_system_id = ?1
                AND t.date_submitted BETWEEN ?2 AND ?3",
        )?
        .query_map(params![system_id, date_start, date_end], |row| {
            let amount: Money = row.get(4)?;
            let gst: Money = row.get(5)?;

            Ok(CodedAmount {
                kind: row.get(0)?,
                group: row.get(1)?,
                code: row.get(2)?,
                description: row.get(3)?,
                amount: amount + gst,
            })
        })?
        .map(|maybe_amount| maybe_amount.map_err(Error::from))
        .collect()
}

/// Bank credits minus debits dated on or before `date`.
pub fn get_cash_up_to(date: Date, connection: &Connection) -> Result<Money, Error> {
    let amounts = connection
        .prepare(
            "SELECT amount_debit, amount_credit FROM bank_transaction
            WHERE date_transaction <= ?1",
        )?
        .query_map([date], |row| {
            Ok((row.get::<_, Money>(0)?, row.get::<_, Money>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(amounts
        .into_iter()
        .map(|(debit, credit)| credit - debit)
        .sum())
}

fn get_unreconciled_total(kind: Kind, connection: &Connection) -> Result<Money, Error> {
    let filter = TransactionFilter {
        kind: Some(kind),
        unreconciled_only: true,
        ..Default::default()
    };

    Ok(get_transaction_summaries(&filter, connection)?
        .iter()
        .map(|summary| summary.totals.total())
        .sum())
}

pub fn get_balance_sheet(date: Date, connection: &Connection) -> Result<BalanceSheet, Error> {
    let cash = get_cash_up_to(date, connection)?;
    let investments = invested_balance(&get_investment_details_up_to(date, connection)?);
    let accounts_receivable = get_unreconciled_total(Kind::Revenue, connection)?;
    let accounts_payable = get_unreconciled_total(Kind::Expense, connection)?;

    Ok(BalanceSheet::new(
        cash,
        investments,
        accounts_receivable,
        accounts_payable,
    ))
}
