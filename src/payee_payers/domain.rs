use std::fmt::Display;

use serde::Serialize;

use crate::choices::Status;

pub type CountryId = i64;
pub type PayeePayerId = i64;

pub const NAME_MAX_LENGTH: usize = 250;
pub const ADDRESS_MAX_LENGTH: usize = 1000;
pub const CITY_MAX_LENGTH: usize = 1000;
pub const PROVINCE_MAX_LENGTH: usize = 100;
pub const POSTAL_CODE_MAX_LENGTH: usize = 10;
pub const PHONE_MAX_LENGTH: usize = 30;
pub const EMAIL_MAX_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub id: CountryId,
    pub country_code: String,
    pub country_name: String,
}

impl Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.country_name)
    }
}

/// A person, company or organization that is paid or pays money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayeePayer {
    pub id: PayeePayerId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub country_id: Option<CountryId>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub status: Status,
}

impl Display for PayeePayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayeePayerDetails {
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub country_id: Option<CountryId>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub status: Status,
}

/// A payee/payer with the name of its country, for the list.
#[derive(Debug, Clone, PartialEq)]
pub struct PayeePayerListing {
    pub payee_payer: PayeePayer,
    pub country_name: Option<String>,
}

/// Narrows the payee/payer list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayeePayerFilter {
    /// Matched case-insensitively against the name, location and contact
    /// details. Blank matches everything.
    pub text: String,
    /// `None` matches either status.
    pub status: Option<Status>,
}

impl PayeePayerFilter {
    pub fn matches(&self, listing: &PayeePayerListing) -> bool {
        if self
            .status
            .is_some_and(|status| status != listing.payee_payer.status)
        {
            return false;
        }

        let text = self.text.trim().to_lowercase();
        if text.is_empty() {
            return true;
        }

        let payee_payer = &listing.payee_payer;
        [
            Some(payee_payer.name.as_str()),
            Some(payee_payer.city.as_str()),
            Some(payee_payer.province.as_str()),
            listing.country_name.as_deref(),
            payee_payer.phone.as_deref(),
            payee_payer.fax.as_deref(),
            payee_payer.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&text))
    }
}

#[cfg(test)]
mod tests {
    use crate::choices::Status;

    use super::{PayeePayer, PayeePayerFilter, PayeePayerListing};

    fn listing() -> PayeePayerListing {
        PayeePayerListing {
            payee_payer: PayeePayer {
                id: 1,
                name: "Jane Doe".to_owned(),
                address: "1 Main St".to_owned(),
                city: "Edmonton".to_owned(),
                province: "Alberta".to_owned(),
                country_id: Some(1),
                postal_code: None,
                phone: Some("780-555-0100".to_owned()),
                fax: None,
                email: Some("jane@example.com".to_owned()),
                status: Status::Active,
            },
            country_name: Some("Canada".to_owned()),
        }
    }

    #[test]
    fn blank_filter_matches_everything() {
        assert!(PayeePayerFilter::default().matches(&listing()));
    }

    #[test]
    fn text_matches_any_detail() {
        for text in ["jane", "EDMONTON", "alberta", "canada", "555", "example.com"] {
            let filter = PayeePayerFilter {
                text: text.to_owned(),
                status: None,
            };

            assert!(filter.matches(&listing()), "{text} should match");
        }

        let filter = PayeePayerFilter {
            text: "Calgary".to_owned(),
            status: None,
        };
        assert!(!filter.matches(&listing()));
    }

    #[test]
    fn status_must_match() {
        let filter = PayeePayerFilter {
            text: String::new(),
            status: Some(Status::Inactive),
        };

        assert!(!filter.matches(&listing()));
    }
}
