use std::collections::BTreeMap;

use serde::Serialize;

use crate::{choices::Kind, money::Money};

/// One coded item amount, before it is totalled into the report.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedAmount {
    pub kind: Kind,
    pub group: String,
    pub code: String,
    pub description: String,
    /// The item amount including GST.
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeTotal {
    pub code: String,
    pub description: String,
    pub total: Money,
}

/// The codes of one group title with their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub title: String,
    pub codes: Vec<CodeTotal>,
}

impl GroupTotal {
    pub fn subtotal(&self) -> Money {
        self.codes.iter().map(|code| code.total).sum()
    }
}

/// Revenue and expenses per financial code over a date range.
///
/// Groups are merged by title and codes by their code and description, so a
/// code carried over to the next budget year is reported once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeStatement {
    pub revenue: Vec<GroupTotal>,
    pub expenses: Vec<GroupTotal>,
}

impl IncomeStatement {
    pub fn from_amounts(amounts: impl IntoIterator<Item = CodedAmount>) -> Self {
        let mut revenue = BTreeMap::new();
        let mut expenses = BTreeMap::new();

        for amount in amounts {
            let groups = match amount.kind {
                Kind::Revenue => &mut revenue,
                Kind::Expense => &mut expenses,
            };

            *groups
                .entry(amount.group)
                .or_insert_with(BTreeMap::new)
                .entry((amount.code, amount.description))
                .or_insert(Money::ZERO) += amount.amount;
        }

        Self {
            revenue: into_group_totals(revenue),
            expenses: into_group_totals(expenses),
        }
    }

    pub fn total_revenue(&self) -> Money {
        self.revenue.iter().map(GroupTotal::subtotal).sum()
    }

    pub fn total_expenses(&self) -> Money {
        self.expenses.iter().map(GroupTotal::subtotal).sum()
    }

    pub fn net_income(&self) -> Money {
        self.total_revenue() - self.total_expenses()
    }
}

fn into_group_totals(groups: BTreeMap<String, BTreeMap<(String, String), Money>>) -> Vec<GroupTotal> {
    groups
        .into_iter()
        .map(|(title, codes)| GroupTotal {
            title,
            codes: codes
                .into_iter()
                .map(|((code, description), total)| CodeTotal {
                    code,
                    description,
                    total,
                })
                .collect(),
        })
        .collect()
}

/// Assets and liabilities as of a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub cash: Money,
    pub investments: Money,
    pub accounts_receivable: Money,
    pub assets_total: Money,
    /// Debt is not tracked, it is always zero.
    pub debt: Money,
    pub accounts_payable: Money,
    pub liabilities_total: Money,
}

impl BalanceSheet {
    pub fn new(
        cash: Money,
        investments: Money,
        accounts_receivable: Money,
        accounts_payable: Money,
    ) -> Self {
        let debt = Money::ZERO;

        Self {
            cash,
            investments,
            accounts_receivable,
            assets_total: cash + investments + accounts_receivable,
            debt,
            accounts_payable,
            liabilities_total: debt + accounts_payable,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{choices::Kind, money::Money};

    use super::{BalanceSheet, CodedAmount, IncomeStatement};

    fn coded(kind: Kind, group: &str, code: &str, cents: i64) -> CodedAmount {
        CodedAmount {
            kind,
            group: group.to_owned(),
            code: code.to_owned(),
            description: format!("Code {code}"),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn totals_are_merged_by_group_and_code() {
        let statement = IncomeStatement::from_amounts([
            coded(Kind::Expense, "Travel", "5000", 2100),
            coded(Kind::Expense, "Travel", "5000", 900),
            coded(Kind::Expense, "Travel", "5010", 500),
            coded(Kind::Expense, "Office", "6000", 1000),
            coded(Kind::Revenue, "Grants", "1100", 10_000),
        ]);

        let titles: Vec<&str> = statement
            .expenses
            .iter()
            .map(|group| group.title.as_str())
            .collect();
        assert_eq!(titles, ["Office", "Travel"]);
        assert_eq!(statement.expenses[1].codes.len(), 2);
        assert_eq!(statement.expenses[1].codes[0].total, Money::from_cents(3000));
        assert_eq!(statement.expenses[1].subtotal(), Money::from_cents(3500));
        assert_eq!(statement.total_expenses(), Money::from_cents(4500));
        assert_eq!(statement.total_revenue(), Money::from_cents(10_000));
        assert_eq!(statement.net_income(), Money::from_cents(5500));
    }

    #[test]
    fn empty_statement_nets_to_zero() {
        let statement = IncomeStatement::from_amounts(Vec::new());

        assert!(statement.revenue.is_empty());
        assert_eq!(statement.net_income(), Money::ZERO);
    }

    #[test]
    fn balance_sheet_totals() {
        let sheet = BalanceSheet::new(
            Money::from_cents(5000),
            Money::from_cents(100_000),
            Money::from_cents(2100),
            Money::from_cents(1050),
        );

        assert_eq!(sheet.assets_total, Money::from_cents(107_100));
        assert_eq!(sheet.debt, Money::ZERO);
        assert_eq!(sheet.liabilities_total, Money::from_cents(1050));
    }
}
