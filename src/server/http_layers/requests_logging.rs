//! Request logging middleware

use super::super::state::ServerState;
use crate::server::metrics::record_http_request;
use axum::extract::{MatchedPath, State};
use axum::{
    body::Body,
    http::{header::HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

enum ContentLengthParseResult {
    Ok(usize),
    No(&'static str),
}

fn parse_content_length(headers: &HeaderMap) -> ContentLengthParseResult {
    let value = match headers.get("content-length") {
        Some(x) => x,
        None => return ContentLengthParseResult::No("Content-length not set."),
    };

    let str_value = match value.to_str() {
        Ok(x) => x,
        Err(_) => {
            return ContentLengthParseResult::No("Could not get Content-length string value.")
        }
    };

    match str_value.parse::<usize>() {
        Ok(x) => ContentLengthParseResult::Ok(x),
        Err(_) => ContentLengthParseResult::No("Could not parse Content-length numeric value."),
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub async fn log_requests(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let level = state.config.requests_logging_level.clone();

    let start = Instant::now();

    let method = request.method().to_string();
    let uri = request.uri().to_string();
    // Route templates keep the metric label set bounded.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    if level > RequestsLoggingLevel::None {
        info!(">>> {} {}", method, uri);
    }

    if level >= RequestsLoggingLevel::Headers {
        info!("  Req Headers:");
        for header in request.headers().iter() {
            info!("    {:?}: {:?}", header.0, header.1);
        }
    }

    if level >= RequestsLoggingLevel::Body {
        match parse_content_length(request.headers()) {
            ContentLengthParseResult::No(reason) => info!("  Req Body: {}", reason),
            ContentLengthParseResult::Ok(size) => {
                if size < MAX_LOGGABLE_BODY_LENGTH {
                    let (parts, body) = request.into_parts();
                    let bytes = match axum::body::to_bytes(body, size).await {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            error!("Failed to read request body: {:?}", err);
                            return internal_error();
                        }
                    };
                    info!("  Req Body:\n{}", String::from_utf8_lossy(&bytes));
                    request = Request::from_parts(parts, Body::from(bytes))
                } else {
                    info!(
                        "  Req Body: Too big to log ({:#})",
                        byte_unit::Byte::from(size)
                    );
                }
            }
        }
    }

    let mut response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        info!("  Resp Headers:");
        for header in response.headers().iter() {
            info!("    {:?}: {:?}", header.0, header.1);
        }
    }

    if level >= RequestsLoggingLevel::Body {
        match parse_content_length(response.headers()) {
            ContentLengthParseResult::No(reason) => info!("  Resp Body: {}", reason),
            ContentLengthParseResult::Ok(size) => {
                if size < MAX_LOGGABLE_BODY_LENGTH {
                    let (parts, body) = response.into_parts();
                    let bytes = match axum::body::to_bytes(body, size).await {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            error!("Failed to read response body: {:?}", err);
                            return internal_error();
                        }
                    };
                    info!("  Resp Body:\n{}", String::from_utf8_lossy(&bytes));
                    response = Response::from_parts(parts, Body::from(bytes))
                } else {
                    info!(
                        "  Resp Body: Too big to log ({:#})",
                        byte_unit::Byte::from(size)
                    );
                }
            }
        }
    }

    let status = response.status().as_u16();
    let duration = start.elapsed();

    if level > RequestsLoggingLevel::None {
        info!("<<< {} ({}ms)", status, duration.as_millis());
    }

    record_http_request(&method, &route, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        let none = RequestsLoggingLevel::None;

        assert!(none < RequestsLoggingLevel::Headers);
        assert!(RequestsLoggingLevel::Body > RequestsLoggingLevel::None);
        assert!(RequestsLoggingLevel::Path < RequestsLoggingLevel::Headers);
    }

    #[test]
    fn content_length_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            parse_content_length(&headers),
            ContentLengthParseResult::No(_)
        ));

        headers.insert("content-length", "42".parse().unwrap());
        assert!(matches!(
            parse_content_length(&headers),
            ContentLengthParseResult::Ok(42)
        ));

        headers.insert("content-length", "lots".parse().unwrap());
        assert!(matches!(
            parse_content_length(&headers),
            ContentLengthParseResult::No(_)
        ));
    }
}
