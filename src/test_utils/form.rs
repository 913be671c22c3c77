use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

#[track_caller]
fn must_get_input<'a>(form: &ElementRef<'a>, name: &str) -> ElementRef<'a> {
    form.select(&Selector::parse("input, select, textarea").unwrap())
        .find(|input| input.value().attr("name") == Some(name))
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""))
}

/// Assert that `form` has a required input named `name`.
///
/// `type_` is the input type, or the tag name for select and textarea elements.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = must_get_input(form, name);
    let got_type = input
        .value()
        .attr("type")
        .unwrap_or_else(|| input.value().name());

    assert_eq!(got_type, type_, "want input {name} with type \"{type_}\"");
    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );
}

/// Assert the current value of the input named `name`.
#[track_caller]
pub(crate) fn assert_form_input_with_value(form: &ElementRef<'_>, name: &str, value: &str) {
    let input = must_get_input(form, name);

    let got_value = match input.value().name() {
        "select" => input
            .select(&Selector::parse("option[selected]").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"))
            .unwrap_or_default()
            .to_owned(),
        "textarea" => input.text().collect::<String>(),
        _ => input.value().attr("value").unwrap_or_default().to_owned(),
    };

    assert_eq!(got_value, value, "want input {name} with value \"{value}\"");
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let submit_button = form
        .select(&Selector::parse("button[type=submit]").unwrap())
        .next();

    assert!(submit_button.is_some(), "want submit button with type=\"submit\"");
}

/// Assert that the first message in `form` is `want_error_message`.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_message = form
        .select(&Selector::parse("p").unwrap())
        .next()
        .expect("No error message found")
        .text()
        .collect::<String>();

    assert_eq!(want_error_message, error_message.trim());
}

/// Assert that `want_error_message` is one of the messages shown in `form`.
#[track_caller]
pub(crate) fn assert_form_has_error(form: &ElementRef<'_>, want_error_message: &str) {
    let messages: Vec<String> = form
        .select(&Selector::parse("p").unwrap())
        .map(|p| p.text().collect::<String>().trim().to_owned())
        .collect();

    assert!(
        messages.iter().any(|message| message == want_error_message),
        "want error message {want_error_message:?}, got {messages:?}"
    );
}
