//! Reading and validating submitted forms.
//!
//! Forms are decoded into a flat list of name/value pairs so that nested
//! sub-forms can be addressed with prefixed names such as
//! `items-0-coding_set-2-code`. Field readers record a message in
//! [FormErrors] instead of failing, so every problem with a submission is
//! shown to the user at once.

use std::collections::{BTreeMap, BTreeSet};

use time::{Date, macros::format_description};

use crate::money::Money;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_DATE_MESSAGE: &str = "Enter a valid date.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const DATE_ORDER_MESSAGE: &str = "The end date must occur after the start date.";

/// Validation messages keyed by field name, plus messages for the form as a
/// whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// The messages for `field`, empty if the field is valid.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields
            .get(field)
            .map(|messages| messages.as_slice())
            .unwrap_or_default()
    }

    pub fn has_field(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// The raw name/value pairs of a submitted form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// The first value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The trimmed value of `name`, or `""` if it was not submitted.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).map(str::trim).unwrap_or_default()
    }

    /// Whether a checkbox named `name` was ticked.
    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.get(name), Some(value) if !value.is_empty() && value != "off" && value != "false")
    }

    /// The sub-form indices submitted under `prefix`, e.g. `{0, 1, 3}` for
    /// fields named `items-0-memo`, `items-1-memo` and `items-3-memo` when the
    /// prefix is `items`.
    pub fn indices(&self, prefix: &str) -> BTreeSet<usize> {
        let prefix = format!("{prefix}-");

        self.pairs
            .iter()
            .filter_map(|(key, _)| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('-'))
            .filter_map(|(index, _)| index.parse().ok())
            .collect()
    }

    /// Whether every field of the sub-form at `prefix` was left blank.
    pub fn is_blank(&self, prefix: &str, fields: &[&str]) -> bool {
        fields
            .iter()
            .all(|field| self.text(&format!("{prefix}-{field}")).is_empty())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Append `count` empty sub-forms after the last one under `prefix`.
    ///
    /// `field` is any field of the sub-form, it is added with an empty value
    /// so that the sub-form shows up in [FormData::indices].
    pub fn add_blank_sub_forms(&mut self, prefix: &str, field: &str, count: usize) {
        let next = self
            .indices(prefix)
            .last()
            .map(|index| index + 1)
            .unwrap_or_default();

        for index in next..next + count {
            self.push(format!("{prefix}-{index}-{field}"), "");
        }
    }
}

/// The number of empty sub-forms offered below the existing ones.
pub const EXTRA_SUB_FORMS: usize = 2;

/// What to do with one submitted sub-form of an inline form set.
#[derive(Debug, Clone, PartialEq)]
pub enum SubForm {
    /// A new row, holds the field name prefix of the sub-form.
    New(String),
    /// An existing row to update, holds its ID and field name prefix.
    Existing(i64, String),
    /// An existing row marked for deletion.
    Deleted(i64),
}

/// Sort the sub-forms submitted under `prefix` into new, changed and deleted
/// rows.
///
/// New sub-forms with every one of `fields` blank are skipped. The `id` of an
/// existing sub-form must be one of `existing_ids`, otherwise an error is
/// recorded against it.
pub fn sub_forms(
    data: &FormData,
    prefix: &str,
    fields: &[&str],
    existing_ids: &[i64],
    errors: &mut FormErrors,
) -> Vec<SubForm> {
    let mut sub_forms = Vec::new();

    for index in data.indices(prefix) {
        let row = format!("{prefix}-{index}");
        let id_field = format!("{row}-id");
        let deleted = data.checkbox(&format!("{row}-DELETE"));
        let raw_id = data.text(&id_field);

        if raw_id.is_empty() {
            if !deleted && !data.is_blank(&row, fields) {
                sub_forms.push(SubForm::New(row));
            }
            continue;
        }

        match raw_id.parse::<i64>() {
            Ok(id) if existing_ids.contains(&id) => {
                sub_forms.push(if deleted {
                    SubForm::Deleted(id)
                } else {
                    SubForm::Existing(id, row)
                })
            }
            _ => errors.add(&id_field, INVALID_CHOICE_MESSAGE),
        }
    }

    sub_forms
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

fn check_length(field: &str, value: &str, max_length: usize, errors: &mut FormErrors) {
    let length = value.chars().count();

    if length > max_length {
        errors.add(
            field,
            format!("Ensure this value has at most {max_length} characters (it has {length})."),
        );
    }
}

/// Read a required text field no longer than `max_length` characters.
pub fn required_text(
    data: &FormData,
    field: &str,
    max_length: usize,
    errors: &mut FormErrors,
) -> String {
    let value = data.text(field);

    if value.is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
    } else {
        check_length(field, value, max_length, errors);
    }

    value.to_owned()
}

/// Read an optional text field, blank values are `None`.
pub fn optional_text(
    data: &FormData,
    field: &str,
    max_length: usize,
    errors: &mut FormErrors,
) -> Option<String> {
    let value = data.text(field);

    if value.is_empty() {
        return None;
    }

    check_length(field, value, max_length, errors);
    Some(value.to_owned())
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn required_date(data: &FormData, field: &str, errors: &mut FormErrors) -> Option<Date> {
    let value = data.text(field);

    if value.is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
        return None;
    }

    let date = parse_date(value);
    if date.is_none() {
        errors.add(field, INVALID_DATE_MESSAGE);
    }

    date
}

pub fn optional_date(data: &FormData, field: &str, errors: &mut FormErrors) -> Option<Date> {
    let value = data.text(field);

    if value.is_empty() {
        return None;
    }

    let date = parse_date(value);
    if date.is_none() {
        errors.add(field, INVALID_DATE_MESSAGE);
    }

    date
}

/// Read a non-negative amount where a blank field means zero.
pub fn money_or_zero(data: &FormData, field: &str, errors: &mut FormErrors) -> Money {
    let value = data.text(field);

    if value.is_empty() {
        return Money::ZERO;
    }

    match Money::parse_input(value) {
        Ok(amount) if amount.is_negative() => {
            errors.add(field, "Ensure this value is greater than or equal to 0.");
            Money::ZERO
        }
        Ok(amount) => amount,
        Err(message) => {
            errors.add(field, message);
            Money::ZERO
        }
    }
}

/// Read a row ID, such as the value of a select element.
pub fn required_id(data: &FormData, field: &str, errors: &mut FormErrors) -> Option<i64> {
    let value = data.text(field);

    if value.is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
        return None;
    }

    let id = value.parse().ok();
    if id.is_none() {
        errors.add(field, INVALID_CHOICE_MESSAGE);
    }

    id
}

pub fn optional_id(data: &FormData, field: &str, errors: &mut FormErrors) -> Option<i64> {
    let value = data.text(field);

    if value.is_empty() {
        return None;
    }

    let id = value.parse().ok();
    if id.is_none() {
        errors.add(field, INVALID_CHOICE_MESSAGE);
    }

    id
}

/// Read a single character choice such as a status code.
pub fn required_choice<T>(
    data: &FormData,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
    errors: &mut FormErrors,
) -> Option<T> {
    let value = data.text(field);

    if value.is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
        return None;
    }

    let choice = parse(value);
    if choice.is_none() {
        errors.add(field, INVALID_CHOICE_MESSAGE);
    }

    choice
}

/// Record the date ordering error on `end_field` when `end` precedes `start`.
pub fn check_date_order(
    start: Option<Date>,
    end: Option<Date>,
    end_field: &str,
    errors: &mut FormErrors,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.add(end_field, DATE_ORDER_MESSAGE);
        }
    }
}


#[cfg(test)]
mod sub_form_tests {
    use super::{FormData, FormErrors, INVALID_CHOICE_MESSAGE, SubForm, sub_forms};

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn sorts_rows() {
        let data = form(&[
            ("account_set-0-id", "1"),
            ("account_set-0-name", "Chequing"),
            ("account_set-1-id", "2"),
            ("account_set-1-DELETE", "on"),
            ("account_set-2-id", ""),
            ("account_set-2-name", "Savings"),
            ("account_set-3-id", ""),
            ("account_set-3-name", ""),
            ("account_set-4-name", "Ignored"),
            ("account_set-4-DELETE", "on"),
        ]);
        let mut errors = FormErrors::new();

        let rows = sub_forms(&data, "account_set", &["name"], &[1, 2], &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            rows,
            vec![
                SubForm::Existing(1, "account_set-0".to_owned()),
                SubForm::Deleted(2),
                SubForm::New("account_set-2".to_owned()),
            ]
        );
    }

    #[test]
    fn foreign_id_is_rejected() {
        let data = form(&[("account_set-0-id", "9"), ("account_set-0-name", "x")]);
        let mut errors = FormErrors::new();

        let rows = sub_forms(&data, "account_set", &["name"], &[1], &mut errors);

        assert!(rows.is_empty());
        assert_eq!(errors.field("account_set-0-id"), [INVALID_CHOICE_MESSAGE]);
    }
}
