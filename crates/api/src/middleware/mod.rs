//! HTTP middleware components.

pub mod internal_auth;
pub mod logging;
pub mod metrics;
pub mod routing;
pub mod telemetry;
pub mod trace_id;

pub use internal_auth::{require_internal_token, INTERNAL_TOKEN_HEADER};
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use routing::route_request;
pub use telemetry::collect_events;
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
