use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use relay_core::Directive;

use crate::error::AppError;
use crate::state::AppState;

/// POST /messages — decode one directive and dispatch it synchronously.
///
/// The response is sent only after the work order has been enqueued (200) or
/// dispatch has failed (400 for an invalid directive, 500 otherwise).
pub async fn post_message(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let directive = Directive::parse(&body)?;

    if let Err(e) = app.dispatcher.dispatch(&directive).await {
        tracing::error!(error = %e, "error processing message");
        return Err(e.into());
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Message processed successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::queue::MemoryQueue;
    use axum::extract::State;
    use relay_core::{ProjectDescriptor, Registry, RelayError};
    use std::sync::Arc;

    fn app() -> (AppState, Arc<MemoryQueue>) {
        let registry = Registry::from_descriptors([ProjectDescriptor {
            up_commands: vec!["start.sh".into()],
            ..ProjectDescriptor::new("org/app", "/srv/app")
        }]);
        let queue = Arc::new(MemoryQueue::new());
        let dispatcher =
            Dispatcher::new(Arc::new(registry), queue.clone(), "poppit:notifications");
        (AppState::new(dispatcher), queue)
    }

    #[tokio::test]
    async fn post_message_returns_success_payload() {
        let (state, queue) = app();
        let result = post_message(State(state), Bytes::from_static(br#"{"up":"org/app"}"#))
            .await
            .unwrap();
        assert_eq!(result.0["status"], "success");
        assert_eq!(result.0["message"], "Message processed successfully");
        assert_eq!(queue.len("poppit:notifications").await, 1);
    }

    #[tokio::test]
    async fn post_message_rejects_malformed_json() {
        let (state, queue) = app();
        let err = post_message(State(state), Bytes::from_static(b"{oops"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.0.downcast_ref::<RelayError>(),
            Some(RelayError::InvalidDirective(_))
        ));
        assert_eq!(queue.len("poppit:notifications").await, 0);
    }
}
