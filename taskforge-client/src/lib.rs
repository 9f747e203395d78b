//! Async client for Taskforge services.
//!
//! A [`Client`] is built from a machine-readable API description plus a
//! [`ClientConfig`] snapshot. Every generated service binding is just such
//! a description; the client interprets the entry table at call time:
//! argument binding, route construction, Hawk signing, and HTTP dispatch
//! with retry all live here and in `taskforge-core`.
//!
//! ```no_run
//! use taskforge_client::{Client, ClientConfig};
//! use taskforge_core::{ApiReference, CallArgs};
//!
//! # async fn example(reference: ApiReference) -> taskforge_core::Result<()> {
//! let config = ClientConfig {
//!     base_url: Some("https://queue.taskforge.net/v1".to_owned()),
//!     ..ClientConfig::default()
//! };
//! let client = Client::new("Queue", reference, config)?;
//! let status = client
//!     .call("status", &CallArgs::positional(["task-id"]), None)
//!     .await?;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod dispatch;

pub use client::Client;
pub use config::ClientConfig;

// The core types callers need at every call site.
pub use taskforge_core::{CallArg, CallArgs, Credentials, Error, ExchangePattern, PatternArgs, Result};
