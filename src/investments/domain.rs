use std::fmt::Display;

use serde::Serialize;
use time::Date;

use crate::{choices::DetailStatus, money::Money};

pub type InvestmentId = i64;
pub type InvestmentDetailId = i64;

pub const NAME_MAX_LENGTH: usize = 256;
pub const RATE_MAX_LENGTH: usize = 256;

/// Money placed with an institution, e.g. a term deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub name: String,
    /// Free text describing the rate, term and similar terms.
    pub rate: String,
}

impl Display for Investment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentData {
    pub name: String,
    pub rate: String,
}

/// An amount invested, matured, paid out as interest or cancelled on a date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentDetail {
    pub id: InvestmentDetailId,
    pub investment_id: InvestmentId,
    pub date_investment: Date,
    pub detail_status: DetailStatus,
    pub amount: Money,
    /// The reconciliation group this detail belongs to, if any.
    pub reconciled: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentDetailData {
    pub date_investment: Date,
    pub detail_status: DetailStatus,
    pub amount: Money,
}

/// The money still held by investments with the given details.
///
/// Invested amounts add to the balance, matured and cancelled amounts take
/// away from it. Interest payments leave it unchanged.
pub fn invested_balance<'a>(details: impl IntoIterator<Item = &'a InvestmentDetail>) -> Money {
    details
        .into_iter()
        .map(|detail| match detail.detail_status {
            DetailStatus::Invested => detail.amount,
            DetailStatus::Matured | DetailStatus::Cancelled => -detail.amount,
            DetailStatus::InterestPaid => Money::ZERO,
        })
        .sum()
}

/// An investment with its details, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentSummary {
    pub investment: Investment,
    pub details: Vec<InvestmentDetail>,
}

impl InvestmentSummary {
    pub fn balance(&self) -> Money {
        invested_balance(&self.details)
    }
}
