use async_trait::async_trait;

use super::{engine_trait::ExecutionApi, new_payload_request::NewPayloadRequest};

/// Engine stub returning a fixed verdict, for tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct MockExecutionEngine {
    pub execution_valid: bool,
}

impl MockExecutionEngine {
    pub fn new(execution_valid: bool) -> Self {
        Self { execution_valid }
    }
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ExecutionApi for MockExecutionEngine {
    async fn verify_and_notify_new_payload(
        &self,
        _new_payload_request: NewPayloadRequest,
    ) -> anyhow::Result<bool> {
        Ok(self.execution_valid)
    }
}
