//! Authorization
//!
//! The security agent seam and the request kinds it is asked about.

pub mod agent;
pub mod request;

pub use agent::SecurityAgent;
pub use request::Request;
