//! Shared page layout, styles and form widgets.

use maud::{DOCTYPE, Markup, html};

use crate::form::{FormData, FormErrors};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_SECONDARY_STYLE: &str = "w-full py-2.5 px-5 mb-2 \
    text-sm font-medium text-gray-900 bg-white rounded border border-gray-200 \
    hover:bg-gray-100 hover:text-blue-700 focus:z-10 dark:bg-gray-800 \
    dark:text-gray-400 dark:border-gray-600 dark:hover:text-white \
    dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "w-full px-4 py-2 bg-red-600 \
    dark:bg-red-700 hover:bg-red-500 dark:hover:bg-red-600 text-white rounded";

// Form styles
pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const WIDE_FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-screen-lg text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";
pub const FORM_ERROR_STYLE: &str = "text-red-600 dark:text-red-400 text-sm";
pub const FIELDSET_STYLE: &str = "w-full space-y-4 p-4 border rounded border-gray-300 \
    dark:border-gray-600";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Status badge style
pub const BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-blue-800 bg-blue-100 rounded-full \
    dark:bg-blue-900 dark:text-blue-300";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    ScriptLink(String),
}

pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Treasurer Tools" }
                link href="/static/main.css" rel="stylesheet";

                script src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js" {}
                script src="https://unpkg.com/htmx-ext-response-targets@2.0.4/dist/response-targets.js" {}

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptLink(path) => script src=(path) defer {}
                    }
                }
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                // Alert container for out-of-band swaps
                div
                    id="alert-container"
                    class="hidden w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 focus:ring-4 focus:outline-hidden
                            focus:ring-blue-300 font-medium rounded text-sm px-5
                            py-2.5 text-center dark:focus:ring-blue-900 my-4"
                    {
                        "Back to Homepage"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// A page with a single form below the navigation bar.
pub fn form_page(title: &str, nav_bar: Markup, heading: &str, form: Markup) -> Markup {
    form_page_with_head(title, &[], nav_bar, heading, form)
}

/// A [form_page] that also loads `head_elements`, e.g. a script driving the
/// form.
pub fn form_page_with_head(
    title: &str,
    head_elements: &[HeadElement],
    nav_bar: Markup,
    heading: &str,
    form: Markup,
) -> Markup {
    let content = html! {
        (nav_bar)
        div class=(WIDE_FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { (heading) }
            (form)
        }
    };

    base(title, head_elements, &content)
}

pub fn log_in_form_container(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            span class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "Treasurer Tools"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

pub fn password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="password" class=(FORM_LABEL_STYLE) { "Password" }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus;

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

pub fn loading_spinner() -> Markup {
    // Spinner SVG adapted from https://flowbite.com/docs/components/spinner/
    html! {
        svg
            aria-hidden="true"
            role="status"
            class="inline text-white w-4 h-4 me-2 mb-1 animate-spin"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="#E5E7EB" {}
            path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentColor" {}
        }
    }
}

/// The messages for one field, nothing when the field is valid.
pub fn field_errors(messages: &[String]) -> Markup {
    html! {
        @for message in messages {
            p class=(FORM_ERROR_STYLE) { (message) }
        }
    }
}

/// Messages that apply to the form as a whole.
pub fn non_field_errors(errors: &FormErrors) -> Markup {
    field_errors(errors.non_field())
}

/// Describes one labelled input element.
pub struct Field<'a> {
    pub label: &'a str,
    pub name: &'a str,
    pub required: bool,
}

impl<'a> Field<'a> {
    pub fn required(label: &'a str, name: &'a str) -> Self {
        Self {
            label,
            name,
            required: true,
        }
    }

    pub fn optional(label: &'a str, name: &'a str) -> Self {
        Self {
            label,
            name,
            required: false,
        }
    }

    fn input(&self, type_: &str, data: &FormData, errors: &FormErrors, extra_step: Option<&str>) -> Markup {
        html! {
            div
            {
                label for=(self.name) class=(FORM_LABEL_STYLE) { (self.label) }

                input
                    id=(self.name)
                    type=(type_)
                    name=(self.name)
                    value=(data.text(self.name))
                    step=[extra_step]
                    required[self.required]
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_errors(errors.field(self.name)))
            }
        }
    }

    pub fn text(&self, data: &FormData, errors: &FormErrors) -> Markup {
        self.input("text", data, errors, None)
    }

    pub fn email(&self, data: &FormData, errors: &FormErrors) -> Markup {
        self.input("email", data, errors, None)
    }

    pub fn date(&self, data: &FormData, errors: &FormErrors) -> Markup {
        self.input("date", data, errors, None)
    }

    pub fn money(&self, data: &FormData, errors: &FormErrors) -> Markup {
        self.input("number", data, errors, Some("0.01"))
    }

    pub fn textarea(&self, data: &FormData, errors: &FormErrors) -> Markup {
        html! {
            div
            {
                label for=(self.name) class=(FORM_LABEL_STYLE) { (self.label) }

                textarea
                    id=(self.name)
                    name=(self.name)
                    rows="3"
                    required[self.required]
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (data.text(self.name))
                }

                (field_errors(errors.field(self.name)))
            }
        }
    }

    /// A select element, `options` are `(value, label)` pairs.
    pub fn select(
        &self,
        options: &[(String, String)],
        data: &FormData,
        errors: &FormErrors,
    ) -> Markup {
        let selected = data.text(self.name);

        html! {
            div
            {
                label for=(self.name) class=(FORM_LABEL_STYLE) { (self.label) }

                select
                    id=(self.name)
                    name=(self.name)
                    required[self.required]
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "---------" }

                    @for (value, label) in options {
                        option value=(value) selected[value == selected] { (label) }
                    }
                }

                (field_errors(errors.field(self.name)))
            }
        }
    }

    pub fn checkbox(&self, data: &FormData) -> Markup {
        html! {
            div class="flex items-center gap-x-3"
            {
                input
                    id=(self.name)
                    type="checkbox"
                    name=(self.name)
                    checked[data.checkbox(self.name)];

                label for=(self.name) class=(FORM_LABEL_STYLE) { (self.label) }
            }
        }
    }
}

/// Where and how an htmx form is submitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormTarget<'a> {
    /// Send a POST request to create a record.
    Create(&'a str),
    /// Send a PUT request to update a record.
    Update(&'a str),
}

impl<'a> FormTarget<'a> {
    fn hx_post(&self) -> Option<&'a str> {
        match self {
            FormTarget::Create(endpoint) => Some(endpoint),
            FormTarget::Update(_) => None,
        }
    }

    fn hx_put(&self) -> Option<&'a str> {
        match self {
            FormTarget::Create(_) => None,
            FormTarget::Update(endpoint) => Some(endpoint),
        }
    }
}

/// A form that submits with htmx and is replaced by the response.
///
/// Validation failures answer with the form re-rendered, errors are shown in
/// the alert container.
pub fn htmx_form(target: FormTarget, multipart: bool, submit_label: &str, content: Markup) -> Markup {
    html! {
        form
            hx-post=[target.hx_post()]
            hx-put=[target.hx_put()]
            hx-encoding=[multipart.then_some("multipart/form-data")]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (content)

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}

/// A hidden input carrying the current value of `name`.
pub fn hidden_input(name: &str, data: &FormData) -> Markup {
    html! {
        input type="hidden" name=(name) value=(data.text(name));
    }
}

/// Links to edit a row and to confirm its deletion.
pub fn edit_delete_action_links(edit_url: &str, delete_url: &str) -> Markup {
    html! {
        div class="flex gap-4"
        {
            a href=(edit_url) class=(LINK_STYLE) { "Edit" }
            a href=(delete_url) class="text-red-600 hover:text-red-500 dark:text-red-500 dark:hover:text-red-400 underline" { "Delete" }
        }
    }
}

/// A page asking the user to confirm deleting `description`.
///
/// The delete button sends an `hx-delete` request to `delete_endpoint`,
/// errors are shown in the alert container.
pub fn confirm_delete_view(
    title: &str,
    nav_bar: Markup,
    description: &str,
    delete_endpoint: &str,
    cancel_url: &str,
) -> Markup {
    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { (title) }

            form
                hx-delete=(delete_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                span class="block" { "Are you sure you want to delete " strong { (description) } "?" }

                button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }

                a href=(cancel_url) class=(LINK_STYLE) { "Cancel" }
            }
        }
    };

    base(title, &[], &content)
}

#[cfg(test)]
mod widget_tests {
    use maud::html;
    use scraper::{Html, Selector};

    use crate::form::{FormData, FormErrors};

    use super::Field;

    #[test]
    fn text_input_keeps_value_and_shows_errors() {
        let data = FormData::new(vec![("name".to_owned(), "Bank".to_owned())]);
        let mut errors = FormErrors::new();
        errors.add("name", "Too short");

        let markup = html! { form { (Field::required("Name", "name").text(&data, &errors)) } };
        let html = Html::parse_fragment(&markup.into_string());

        let input = html
            .select(&Selector::parse("input[name=name]").unwrap())
            .next()
            .expect("No input found");
        assert_eq!(input.value().attr("value"), Some("Bank"));
        assert!(input.value().attr("required").is_some());
        let error = html
            .select(&Selector::parse("p").unwrap())
            .next()
            .expect("No error found");
        assert_eq!(error.text().collect::<String>(), "Too short");
    }

    #[test]
    fn select_marks_current_value() {
        let data = FormData::new(vec![("status".to_owned(), "i".to_owned())]);
        let options = [
            ("a".to_owned(), "Active".to_owned()),
            ("i".to_owned(), "Inactive".to_owned()),
        ];

        let markup = Field::required("Status", "status").select(&options, &data, &FormErrors::new());
        let html = Html::parse_fragment(&markup.into_string());

        let selected = html
            .select(&Selector::parse("option[selected]").unwrap())
            .next()
            .expect("No selected option");
        assert_eq!(selected.value().attr("value"), Some("i"));
    }
}
