pub mod accessor;
pub mod block;
pub mod context;
pub mod deposit_store;
pub mod epoch;
pub mod errors;
pub mod metrics;
pub mod processor;

pub use accessor::{StateAccessError, StateAccessor};
pub use context::Context;
pub use deposit_store::{DepositStore, InMemoryDepositStore};
pub use errors::StateTransitionError;
pub use metrics::{NoopTelemetry, TelemetrySink};
pub use processor::{AddressFromPubkey, StateProcessor};
