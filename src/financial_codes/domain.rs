use std::fmt::Display;

use serde::Serialize;
use time::Date;

use crate::choices::{Kind, Status};

pub type SystemId = i64;
pub type BudgetYearId = i64;
pub type GroupId = i64;
pub type FinancialCodeId = i64;

pub const TITLE_MAX_LENGTH: usize = 100;
pub const SHORT_NAME_MAX_LENGTH: usize = 16;
pub const GROUP_DESCRIPTION_MAX_LENGTH: usize = 500;
pub const CODE_MAX_LENGTH: usize = 6;
pub const CODE_DESCRIPTION_MAX_LENGTH: usize = 100;

/// A chart of accounts that items are coded against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialCodeSystem {
    pub id: SystemId,
    pub title: String,
    pub date_start: Date,
    /// `None` while the system is still in use.
    pub date_end: Option<Date>,
    /// Whether this system's codes are the ones quoted on submission forms.
    pub submission_code: bool,
}

impl FinancialCodeSystem {
    /// Whether items dated `date` are coded in this system.
    pub fn covers(&self, date: Date) -> bool {
        self.date_start <= date && self.date_end.is_none_or(|end| end >= date)
    }
}

impl Display for FinancialCodeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.date_end {
            Some(date_end) => write!(f, "{} ({} to {})", self.title, self.date_start, date_end),
            None => write!(f, "{} ({} to Present)", self.title, self.date_start),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemDetails {
    pub title: String,
    pub date_start: Date,
    pub date_end: Option<Date>,
    pub submission_code: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetYear {
    pub id: BudgetYearId,
    pub system_id: SystemId,
    pub short_name: String,
    pub date_start: Date,
    pub date_end: Date,
}

impl Display for BudgetYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.date_start, self.date_end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetYearDetails {
    pub system_id: SystemId,
    pub short_name: String,
    pub date_start: Date,
    pub date_end: Date,
}

/// A heading that codes of one kind are grouped under within a budget year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialCodeGroup {
    pub id: GroupId,
    pub budget_year_id: BudgetYearId,
    pub title: String,
    pub description: Option<String>,
    pub kind: Kind,
    pub status: Status,
}

impl Display for FinancialCodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.kind, self.title)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDetails {
    pub budget_year_id: BudgetYearId,
    pub title: String,
    pub description: Option<String>,
    pub kind: Kind,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialCode {
    pub id: FinancialCodeId,
    pub group_id: GroupId,
    pub code: String,
    pub description: String,
}

impl Display for FinancialCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code, self.description)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialCodeDetails {
    pub group_id: GroupId,
    pub code: String,
    pub description: String,
}

/// The codes of one group that an item may be assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeChoiceGroup {
    pub title: String,
    /// The budget year the group belongs to.
    pub budget_year_id: BudgetYearId,
    pub codes: Vec<FinancialCode>,
}

/// Everything an item of one kind can be coded to in one system.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeChoices {
    /// Newest first.
    pub budget_years: Vec<BudgetYear>,
    pub groups: Vec<CodeChoiceGroup>,
}

impl CodeChoices {
    pub fn contains(&self, code_id: FinancialCodeId) -> bool {
        self.find(code_id).is_some()
    }

    pub fn find(&self, code_id: FinancialCodeId) -> Option<(&CodeChoiceGroup, &FinancialCode)> {
        self.groups.iter().find_map(|group| {
            group
                .codes
                .iter()
                .find(|code| code.id == code_id)
                .map(|code| (group, code))
        })
    }
}
