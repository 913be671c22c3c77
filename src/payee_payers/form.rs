use email_address::EmailAddress;
use maud::{Markup, html};

use crate::{
    choices::{Choice, Status},
    form::{
        FormData, FormErrors, optional_id, optional_text, required_choice, required_text,
        INVALID_CHOICE_MESSAGE,
    },
    html::{Field, FormTarget, htmx_form, non_field_errors},
    payee_payers::domain::{
        ADDRESS_MAX_LENGTH, CITY_MAX_LENGTH, Country, EMAIL_MAX_LENGTH, NAME_MAX_LENGTH,
        PHONE_MAX_LENGTH, POSTAL_CODE_MAX_LENGTH, PROVINCE_MAX_LENGTH, PayeePayer,
        PayeePayerDetails,
    },
};

pub const DUPLICATE_NAME_MESSAGE: &str = "Payee/Payer with this Name already exists.";
pub const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";

pub fn validate_payee_payer_form(
    data: &FormData,
    countries: &[Country],
) -> Result<PayeePayerDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let name = required_text(data, "name", NAME_MAX_LENGTH, &mut errors);
    let address = required_text(data, "address", ADDRESS_MAX_LENGTH, &mut errors);
    let city = required_text(data, "city", CITY_MAX_LENGTH, &mut errors);
    let province = required_text(data, "province", PROVINCE_MAX_LENGTH, &mut errors);

    let country_id = optional_id(data, "country", &mut errors);
    if country_id.is_some_and(|id| !countries.iter().any(|country| country.id == id)) {
        errors.add("country", INVALID_CHOICE_MESSAGE);
    }

    let postal_code = optional_text(data, "postal_code", POSTAL_CODE_MAX_LENGTH, &mut errors);
    let phone = optional_text(data, "phone", PHONE_MAX_LENGTH, &mut errors);
    let fax = optional_text(data, "fax", PHONE_MAX_LENGTH, &mut errors);

    let email = optional_text(data, "email", EMAIL_MAX_LENGTH, &mut errors);
    if email
        .as_deref()
        .is_some_and(|email| !EmailAddress::is_valid(email))
    {
        errors.add("email", INVALID_EMAIL_MESSAGE);
    }

    let status = required_choice(data, "status", Status::from_code, &mut errors);

    match status {
        Some(status) if errors.is_empty() => Ok(PayeePayerDetails {
            name,
            address,
            city,
            province,
            country_id,
            postal_code,
            phone,
            fax,
            email,
            status,
        }),
        _ => Err(errors),
    }
}

pub fn payee_payer_form_data(payee_payer: &PayeePayer) -> FormData {
    let mut data = FormData::default();
    data.push("name", payee_payer.name.as_str());
    data.push("address", payee_payer.address.as_str());
    data.push(
        "country",
        payee_payer
            .country_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
    );
    data.push("province", payee_payer.province.as_str());
    data.push("city", payee_payer.city.as_str());

    for (name, value) in [
        ("postal_code", &payee_payer.postal_code),
        ("phone", &payee_payer.phone),
        ("fax", &payee_payer.fax),
        ("email", &payee_payer.email),
    ] {
        data.push(name, value.clone().unwrap_or_default());
    }

    data.push("status", payee_payer.status.code());
    data
}

pub fn payee_payer_form_view(
    target: FormTarget,
    countries: &[Country],
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    let country_options: Vec<(String, String)> = countries
        .iter()
        .map(|country| (country.id.to_string(), country.country_name.clone()))
        .collect();

    let content = html! {
        (non_field_errors(errors))
        (Field::required("Name", "name").text(data, errors))
        (Field::required("Address", "address").textarea(data, errors))
        (Field::optional("Country", "country").select(&country_options, data, errors))
        (Field::required("Province", "province").text(data, errors))
        (Field::required("City", "city").text(data, errors))
        (Field::optional("Postal code", "postal_code").text(data, errors))
        (Field::optional("Phone number", "phone").text(data, errors))
        (Field::optional("Fax number", "fax").text(data, errors))
        (Field::optional("Email", "email").email(data, errors))
        (Field::required("Status", "status").select(&Status::options(), data, errors))
    };

    htmx_form(target, false, "Save", content)
}

#[cfg(test)]
mod tests {
    use crate::{
        form::{INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE},
        payee_payers::Country,
        test_utils::form_data,
    };

    use super::{INVALID_EMAIL_MESSAGE, validate_payee_payer_form};

    fn countries() -> Vec<Country> {
        vec![Country {
            id: 3,
            country_code: "CA".to_owned(),
            country_name: "Canada".to_owned(),
        }]
    }

    #[test]
    fn optional_fields_may_be_blank() {
        let details = validate_payee_payer_form(
            &form_data(&[
                ("name", "Jane Doe"),
                ("address", "1 Main St"),
                ("country", ""),
                ("province", "Alberta"),
                ("city", "Edmonton"),
                ("postal_code", ""),
                ("email", ""),
                ("status", "a"),
            ]),
            &countries(),
        )
        .unwrap();

        assert_eq!(details.country_id, None);
        assert_eq!(details.postal_code, None);
        assert_eq!(details.email, None);
    }

    #[test]
    fn invalid_values_are_reported() {
        let errors = validate_payee_payer_form(
            &form_data(&[
                ("name", "Jane Doe"),
                ("country", "9"),
                ("postal_code", "T5J 0N3 EXTRA"),
                ("email", "not an email"),
                ("status", "a"),
            ]),
            &countries(),
        )
        .unwrap_err();

        assert_eq!(errors.field("address"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.field("country"), [INVALID_CHOICE_MESSAGE]);
        assert_eq!(
            errors.field("postal_code"),
            ["Ensure this value has at most 10 characters (it has 13)."]
        );
        assert_eq!(errors.field("email"), [INVALID_EMAIL_MESSAGE]);
    }
}
