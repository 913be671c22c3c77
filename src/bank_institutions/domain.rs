use std::fmt::Display;

use serde::Serialize;

use crate::choices::Status;

pub type InstitutionId = i64;
pub type AccountId = i64;

pub const NAME_MAX_LENGTH: usize = 250;
pub const ADDRESS_MAX_LENGTH: usize = 1000;
pub const PHONE_MAX_LENGTH: usize = 30;
pub const ACCOUNT_NUMBER_MAX_LENGTH: usize = 100;
pub const ACCOUNT_NAME_MAX_LENGTH: usize = 100;

/// A bank or other financial institution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub fax: String,
}

impl Display for Institution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The fields of an institution before it is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub fax: String,
}

/// An account held at an [Institution].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub institution_id: InstitutionId,
    pub account_number: String,
    pub name: String,
    pub status: Status,
}

/// The fields of an account before it is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDetails {
    pub account_number: String,
    pub name: String,
    pub status: Status,
}

/// An account with the name of its institution, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountLabel {
    pub account: Account,
    pub institution_name: String,
}

impl Display for AccountLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.institution_name, self.account.name, self.account.account_number
        )
    }
}
