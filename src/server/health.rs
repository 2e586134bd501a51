//! Liveness endpoint.

use axum::http::StatusCode;

/// `GET /health`: always 200 with body `OK` while the process is serving.
///
/// Does not touch GitHub; a bot whose installation token is broken still
/// reports healthy and logs the failures per evaluation instead.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_ok() {
        assert_eq!(health_handler().await, (StatusCode::OK, "OK"));
    }
}
