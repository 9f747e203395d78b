//! Core client primitives for Taskforge services.
//!
//! Everything in this crate is pure computation: the API description data
//! model, argument binding, route templates, topic-exchange routing-key
//! patterns, and the Hawk credential/signature engine. The HTTP side lives
//! in `taskforge-client`.

pub mod args;
pub mod credentials;
pub mod error;
pub mod hawk;
pub mod reference;
pub mod route;
pub mod topic;

pub use args::{CallArg, CallArgs};
pub use credentials::{create_temporary_credentials, slug_id, Certificate, Credentials};
pub use error::{Error, Result};
pub use reference::{ApiReference, Entry, FunctionEntry, RoutingKeyToken, TopicExchangeEntry};
pub use topic::{ExchangePattern, PatternArg, PatternArgs};
