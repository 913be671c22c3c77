//! Alert messages for reporting the outcome of htmx requests.
//!
//! Alerts are swapped into the `#alert-container` element of the base page
//! out of band, so any endpoint can respond with one regardless of its target.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissible success or error message.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message with details explaining how to fix the problem.
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "text-green-800 border-green-300 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                message,
                details,
            ),
            Alert::SuccessSimple { message } => (
                "text-green-800 border-green-300 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                message,
                String::new(),
            ),
            Alert::Error { message, details } => (
                "text-red-800 border-red-300 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                details,
            ),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class={ "flex items-start gap-3 p-4 mb-4 border rounded-lg " (container_style) }
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            span class="text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                        class="text-sm font-semibold"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}
