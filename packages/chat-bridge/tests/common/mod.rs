//! Shared helpers: fake upstream services and apply-stage plumbing.

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use axum::Router;
use chat_bridge::host::{self, ApplyStage, HostAction};
use chat_bridge::{BridgeContext, Capabilities};

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn context() -> (BridgeContext, ApplyStage) {
    context_with(&Capabilities::none())
}

/// Context whose apply stage uses the companions bound in `caps`.
pub fn context_with(caps: &Capabilities) -> (BridgeContext, ApplyStage) {
    let (handle, stage) = host::channel(caps);
    (BridgeContext::new(handle), stage)
}

/// Next host action, or `None` if nothing arrives within `wait`.
pub async fn next_action(stage: &mut ApplyStage, wait: Duration) -> Option<HostAction> {
    tokio::time::timeout(wait, stage.recv()).await.ok().flatten()
}

/// Next presented line within `wait`.
pub async fn next_presented(stage: &mut ApplyStage, wait: Duration) -> Option<String> {
    match next_action(stage, wait).await? {
        HostAction::Present(text) => Some(text),
        other => panic!("expected presented text, got {:?}", other),
    }
}

/// Poll `check` every 50ms until it holds or `wait` elapses.
pub async fn eventually<F, Fut>(wait: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + wait;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
