use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Creates a CORS layer restricted to `allowed_origins`.
///
/// # Returns
/// A configured `CorsLayer` with:
/// - The given origins
/// - Methods GET, POST, PUT, DELETE, PATCH, OPTIONS
/// - Headers Content-Type, Authorization, Accept
/// - Credentials allowed
/// - 1 hour max age
///
/// # Errors
/// Fails if the list is empty or an origin is not a valid header value.
pub fn create_cors_layer<S: AsRef<str>>(allowed_origins: &[S]) -> io::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS origin: {}", e),
            )
        })?;

    if origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "At least one CORS origin is required",
        ));
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

/// Creates a permissive CORS layer for development.
///
/// Mirrors any origin, method and header and allows credentials.
/// **DO NOT USE IN PRODUCTION**.
pub fn create_permissive_cors_layer() -> CorsLayer {
    CorsLayer::very_permissive()
}
