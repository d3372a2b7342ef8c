use async_trait::async_trait;

use super::new_payload_request::NewPayloadRequest;

#[async_trait]
pub trait ExecutionApi {
    /// Return ``true`` if and only if the payload in ``new_payload_request``
    /// is valid with respect to the engine's execution state. Idempotent.
    async fn verify_and_notify_new_payload(
        &self,
        new_payload_request: NewPayloadRequest,
    ) -> anyhow::Result<bool>;
}
