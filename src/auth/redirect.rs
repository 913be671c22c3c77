//! Where to send the treasurer after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Reduce `raw_url` to a local path and query, or `None` if it points
/// elsewhere or back at the log in page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return None;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    (path != endpoints::LOG_IN_VIEW).then(|| path_and_query.to_owned())
}

/// The log in page URL with the page to return to after logging in.
///
/// Page requests return to the requested URL. htmx requests return to the
/// page that made the request, read from the `HX-Current-URL` header. Only
/// the path and query of that header are kept.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = if is_hx_request(request) {
        request
            .headers()
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.parse::<Uri>().ok())
            .and_then(|uri| {
                uri.path_and_query()
                    .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
            })
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    log_in_url_with_target(target.as_deref().unwrap_or(endpoints::TRANSACTIONS_VIEW))
}

fn is_hx_request(request: &Request) -> bool {
    request
        .headers()
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"))
}

fn log_in_url_with_target(target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(query) => format!("{}?{}", endpoints::LOG_IN_VIEW, query),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_local_paths_with_query() {
        assert_eq!(
            normalize_redirect_url("/transactions?transaction_type=e"),
            Some("/transactions?transaction_type=e".to_owned())
        );
    }

    #[test]
    fn rejects_other_hosts_and_log_in_page() {
        assert_eq!(normalize_redirect_url("https://example.com/transactions"), None);
        assert_eq!(normalize_redirect_url("//example.com/transactions"), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }

    #[test]
    fn page_request_returns_to_requested_url() {
        let request = Request::builder()
            .uri("/banking/statements")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            "/log_in?redirect_url=%2Fbanking%2Fstatements"
        );
    }

    #[test]
    fn hx_request_returns_to_current_page() {
        let request = Request::builder()
            .uri("/api/statements")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/banking/statements/new")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            "/log_in?redirect_url=%2Fbanking%2Fstatements%2Fnew"
        );
    }
}
