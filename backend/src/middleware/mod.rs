pub mod observability;

pub use observability::{detailed_health_check, make_span, request_id, Timer};
