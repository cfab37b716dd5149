//! Connector to the analytic query service (SQL over HTTP).

pub mod pinot;
pub mod row;

pub use pinot::{PinotConnector, QueryService};
pub use row::{Row, Scalar};
