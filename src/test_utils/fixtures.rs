//! Rows for tests that need existing data.

use rusqlite::Connection;
use time::macros::date;

use crate::{
    bank_institutions::{
        Account, AccountDetails, InstitutionDetails, create_account, create_institution,
    },
    bank_transactions::{
        BankTransaction, BankTransactionDetails, Statement, StatementDetails, StatementId,
        create_bank_transaction, create_statement,
    },
    choices::{DetailStatus, Kind, Status},
    financial_codes::{
        BudgetYearDetails, FinancialCode, FinancialCodeDetails, FinancialCodeId, GroupDetails,
        SystemDetails, SystemId, create_budget_year, create_code, create_group, create_system,
    },
    financial_transactions::{
        FinancialTransaction, FinancialTransactionDetails, ItemDetails, create_code_match,
        create_financial_transaction, create_item,
    },
    investments::{
        Investment, InvestmentData, InvestmentDetailData, create_investment,
        create_investment_detail,
    },
    money::Money,
    payee_payers::{PayeePayer, PayeePayerDetails, create_payee_payer},
};

/// Institution "Test Bank" with the active account "Chequing" (12345).
pub(crate) fn account(connection: &Connection) -> Account {
    let institution = create_institution(
        &InstitutionDetails {
            name: "Test Bank".to_owned(),
            address: "1 Main St".to_owned(),
            phone: "555-0100".to_owned(),
            fax: "555-0101".to_owned(),
        },
        connection,
    )
    .expect("Could not create institution");

    create_account(
        institution.id,
        &AccountDetails {
            account_number: "12345".to_owned(),
            name: "Chequing".to_owned(),
            status: Status::Active,
        },
        connection,
    )
    .expect("Could not create account")
}

/// A January 2017 statement for a new [account].
pub(crate) fn statement(connection: &Connection) -> Statement {
    let account = account(connection);

    create_statement(
        &StatementDetails {
            account_id: account.id,
            date_start: date!(2017 - 01 - 01),
            date_end: date!(2017 - 01 - 31),
        },
        connection,
    )
    .expect("Could not create statement")
}

/// A bank transaction dated 2017-01-15 on a new [statement].
pub(crate) fn bank_transaction(
    connection: &Connection,
    debit_cents: i64,
    credit_cents: i64,
) -> BankTransaction {
    let statement = statement(connection);
    bank_transaction_for(connection, statement.id, debit_cents, credit_cents)
}

pub(crate) fn bank_transaction_for(
    connection: &Connection,
    statement_id: StatementId,
    debit_cents: i64,
    credit_cents: i64,
) -> BankTransaction {
    create_bank_transaction(
        statement_id,
        &BankTransactionDetails {
            date_transaction: date!(2017 - 01 - 15),
            description_bank: "POS PURCHASE".to_owned(),
            description_user: None,
            amount_debit: Money::from_cents(debit_cents),
            amount_credit: Money::from_cents(credit_cents),
        },
        connection,
    )
    .expect("Could not create bank transaction")
}

/// A code in a new open-ended "CASBA" system with a "2017" budget year.
///
/// Expense codes are "5000 - Mileage" under "Travel", revenue codes are
/// "1100 - Operating grant" under "Grants".
pub(crate) fn financial_code(connection: &Connection, kind: Kind) -> FinancialCode {
    let system = create_system(
        &SystemDetails {
            title: "CASBA".to_owned(),
            date_start: date!(2017 - 01 - 01),
            date_end: None,
            submission_code: true,
        },
        connection,
    )
    .expect("Could not create financial code system");

    let budget_year = create_budget_year(
        &BudgetYearDetails {
            system_id: system.id,
            short_name: "2017".to_owned(),
            date_start: date!(2017 - 01 - 01),
            date_end: date!(2017 - 12 - 31),
        },
        connection,
    )
    .expect("Could not create budget year");

    let (title, code, description) = match kind {
        Kind::Expense => ("Travel", "5000", "Mileage"),
        Kind::Revenue => ("Grants", "1100", "Operating grant"),
    };

    let group = create_group(
        &GroupDetails {
            budget_year_id: budget_year.id,
            title: title.to_owned(),
            description: None,
            kind,
            status: Status::Active,
        },
        connection,
    )
    .expect("Could not create financial code group");

    create_code(
        &FinancialCodeDetails {
            group_id: group.id,
            code: code.to_owned(),
            description: description.to_owned(),
        },
        connection,
    )
    .expect("Could not create financial code")
}

pub(crate) fn system_of_code(connection: &Connection, code_id: FinancialCodeId) -> SystemId {
    connection
        .query_row(
            "SELECT budget_year.financial_code_system_id
            FROM financial_code
            INNER JOIN financial_code_group
                ON financial_code_group.id = financial_code.financial_code_group_id
            INNER JOIN budget_year ON budget_year.id = financial_code_group.budget_year_id
            WHERE financial_code.id = ?1",
            [code_id],
            |row| row.get(0),
        )
        .expect("Could not find the system of the financial code")
}

/// An active payee/payer in Edmonton, Alberta.
pub(crate) fn payee_payer(connection: &Connection, name: &str) -> PayeePayer {
    create_payee_payer(
        &PayeePayerDetails {
            name: name.to_owned(),
            address: "1 Main St".to_owned(),
            city: "Edmonton".to_owned(),
            province: "Alberta".to_owned(),
            country_id: None,
            postal_code: None,
            phone: None,
            fax: None,
            email: None,
            status: Status::Active,
        },
        connection,
    )
    .expect("Could not create payee/payer")
}

/// A transaction submitted 2017-01-20 with one $20.00 + $1.00 GST item dated
/// 2017-01-15, coded against a new [financial_code] of the same kind.
///
/// Each call adds a new payee/payer named "Payee {n}".
pub(crate) fn financial_transaction(connection: &Connection, kind: Kind) -> FinancialTransaction {
    let code = financial_code(connection, kind);
    let payee_payer_count: i64 = connection
        .query_row("SELECT COUNT(*) FROM payee_payer", [], |row| row.get(0))
        .expect("Could not count payee/payers");
    let payee_payer = payee_payer(connection, &format!("Payee {}", payee_payer_count + 1));

    let transaction = create_financial_transaction(
        kind,
        &FinancialTransactionDetails {
            payee_payer_id: payee_payer.id,
            memo: "Conference".to_owned(),
            submitter: None,
            date_submitted: date!(2017 - 01 - 20),
            submission_notes: None,
        },
        connection,
    )
    .expect("Could not create financial transaction");

    let item = create_item(
        transaction.id,
        &ItemDetails {
            date_item: date!(2017 - 01 - 15),
            description: "Mileage".to_owned(),
            amount: Money::from_cents(2000),
            gst: Money::from_cents(100),
        },
        connection,
    )
    .expect("Could not create item");

    create_code_match(item.id, code.id, connection).expect("Could not code item");

    transaction
}

/// Investment "GIC" with $1000.00 invested on 2017-01-10 and $12.50 interest
/// paid on 2017-06-10.
pub(crate) fn investment(connection: &Connection) -> Investment {
    let investment = create_investment(
        &InvestmentData {
            name: "GIC".to_owned(),
            rate: "1.25% for 1 year".to_owned(),
        },
        connection,
    )
    .expect("Could not create investment");

    for (date_investment, detail_status, cents) in [
        (date!(2017 - 01 - 10), DetailStatus::Invested, 100_000),
        (date!(2017 - 06 - 10), DetailStatus::InterestPaid, 1_250),
    ] {
        create_investment_detail(
            investment.id,
            &InvestmentDetailData {
                date_investment,
                detail_status,
                amount: Money::from_cents(cents),
            },
            connection,
        )
        .expect("Could not create investment detail");
    }

    investment
}
