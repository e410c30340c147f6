//! Error overlay for failed requests.
//!
//! When the server handler fails, the browser gets an HTML page showing the
//! error and its cause chain instead of a blank 500.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;

use super::middleware::ErrorHandler;

/// Default host error continuation: log the error and render the overlay.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayErrorHandler;

impl ErrorHandler for OverlayErrorHandler {
    fn handle_error(&self, error: anyhow::Error) -> Response {
        tracing::error!("Server handler error: {:#}", error);

        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        let html = generate_error_overlay(&error.to_string(), &causes);

        let mut response = Response::new(Body::from(html));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        response
    }
}

/// Generate the overlay page for `message` and its `causes`.
///
/// # Security
///
/// Every message is HTML-escaped; error text often contains markup or
/// user-controlled paths.
pub fn generate_error_overlay(message: &str, causes: &[String]) -> String {
    let causes_html: String = causes
        .iter()
        .map(|cause| format!("            <li>{}</li>\n", html_escape(cause)))
        .collect();

    let causes_section = if causes_html.is_empty() {
        String::new()
    } else {
        format!(
            "        <div class=\"causes\">\n          Caused by:\n          <ol>\n{}          </ol>\n        </div>\n",
            causes_html
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Server Error - Fob Dev Server</title>
    <style>
        body {{
            font-family: 'Menlo', 'Monaco', 'Courier New', monospace;
            background: #1a1a1a;
            color: #e8e8e8;
            padding: 20px;
            line-height: 1.6;
        }}

        .container {{
            max-width: 1200px;
            margin: 0 auto;
        }}

        .header {{
            background: #ff4444;
            color: white;
            padding: 20px 30px;
            border-radius: 8px 8px 0 0;
            font-size: 18px;
            font-weight: bold;
        }}

        .error-content {{
            background: #2a2a2a;
            padding: 30px;
            border-radius: 0 0 8px 8px;
            border: 2px solid #ff4444;
            border-top: none;
        }}

        pre {{
            background: #1a1a1a;
            padding: 20px;
            border-radius: 4px;
            white-space: pre-wrap;
            word-wrap: break-word;
            color: #ff6b6b;
            border-left: 4px solid #ff4444;
        }}

        .causes {{
            margin-top: 20px;
            color: #a8c8e8;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">Server Error</div>
        <div class="error-content">
            <pre>{}</pre>
{}        </div>
    </div>
</body>
</html>"#,
        html_escape(message),
        causes_section
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
