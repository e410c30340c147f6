//! Translation between host requests and fetch-shaped requests.
//!
//! Host requests carry an origin-form URI (`/path?query`) plus a `Host`
//! header. Fetch handlers expect an absolute URL, so the request is rebuilt
//! as `scheme://authority/path?query` before it is handed over. Responses
//! travel the other way unchanged: status, every header value, and the body
//! stream.

use crate::error::BridgeError;
use crate::runner::{FetchHandler, FetchRequest, FetchResponse};
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, Method, Uri, header, uri::Scheme};
use axum::response::Response;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Build the absolute URL a fetch handler sees for `uri`.
///
/// - scheme: first value of `X-Forwarded-Proto`, else the URI's own scheme, else `http`
/// - authority: the `Host` header, else the URI's own authority, else `localhost`
pub fn absolute_uri(uri: &Uri, headers: &HeaderMap) -> Result<Uri, BridgeError> {
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| Scheme::HTTP.to_string());

    let authority = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, authority, path_and_query)
        .parse()
        .map_err(|e| BridgeError::InvalidRequest(format!("cannot build request URL: {}", e)))
}

/// Convert a host request into a fetch request.
///
/// The body is forwarded as a stream, except for `GET` and `HEAD` which never
/// carry one.
pub fn to_fetch_request(request: Request) -> Result<FetchRequest, BridgeError> {
    let (mut parts, body) = request.into_parts();
    parts.uri = absolute_uri(&parts.uri, &parts.headers)?;

    let body = if parts.method == Method::GET || parts.method == Method::HEAD {
        Body::empty()
    } else {
        body
    };

    Ok(FetchRequest::from_parts(parts, body))
}

/// Convert a fetch response into the host response.
pub fn from_fetch_response(response: FetchResponse) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, body)
}

/// Run `handler` for a host request and translate its response back.
///
/// Failures building the fetch request and failures of the handler itself
/// are both returned; write errors on the response body are left to the
/// transport.
pub async fn serve_fetch(
    handler: &dyn FetchHandler,
    request: Request,
) -> Result<Response, BridgeError> {
    let request = to_fetch_request(request)?;
    let response = handler.fetch(request).await.map_err(BridgeError::Handler)?;
    Ok(from_fetch_response(response))
}
