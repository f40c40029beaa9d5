//! Local HTTP stand-in for the remote API, used by the gateway tests.

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ApiConfig;

pub const TEST_KEY: &str = "sk-test";

/// Serve `router` on an ephemeral loopback port and return an [`ApiConfig`]
/// pointing at it.
pub async fn serve(router: Router) -> ApiConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ApiConfig {
        base_url: format!("http://{addr}"),
        api_key: Some(TEST_KEY.into()),
        timeout_secs: 5,
    }
}

/// An [`ApiConfig`] whose port was just released, so connects are refused.
pub async fn unreachable() -> ApiConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiConfig {
        base_url: format!("http://{addr}"),
        api_key: None,
        timeout_secs: 5,
    }
}
