//! # tower-failover
//!
//! Credential rotation and retry-with-backoff for calls to metered LLM APIs.
//!
//! Generative-AI deployments often hold several API keys for the same
//! upstream service. This crate executes a caller-supplied unit of work,
//! parameterized by a single credential, under a policy that retries
//! transient overloads with exponential backoff against the same credential
//! and rotates to the next credential when one is rejected for auth reasons,
//! surfacing the last error only once every credential is exhausted.
//!
//! ## Core Concepts
//!
//! - **[`CredentialPool`]**: ordered, non-empty set of keys parsed from a
//!   comma-separated configuration value
//! - **[`ErrorKind`]**: pure classification of an error message into auth,
//!   overload, or fatal; the only place upstream message matching lives
//! - **[`Failover`]** / **[`invoke_with_failover`]**: the rotate/retry loop
//!   as a higher-order async function
//! - **[`FailoverLayer`]**: the same policy as Tower middleware for
//!   credential-parameterized services
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use tower_failover::Failover;
//!
//! # async fn call_model(_key: &str) -> Result<String, tower_failover::BoxError> {
//! #     Ok(String::new())
//! # }
//! # async fn example() -> Result<(), tower_failover::BoxError> {
//! let failover = Failover::from_env("GEMINI_API_KEYS")?;
//! let summary = failover
//!     .run(|credential| async move { call_model(credential.as_str()).await })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Attempts within one call are strictly sequential, and concurrent calls
//! share no state: every invocation walks its own view of the pool, so no
//! locking is needed and a bad key in one request never poisons another.

pub mod classify;
pub mod config;
pub mod credentials;
pub mod error;
pub mod failover;
pub mod layer;

// Public re-exports for convenience
pub use classify::{classify, classify_message, ErrorKind};
pub use config::FailoverConfig;
pub use credentials::{Credential, CredentialPool};
pub use error::{FailoverError, Result};
pub use failover::{invoke_with_failover, Failover};
pub use layer::{FailoverLayer, FailoverService};

// Re-export Tower types that appear in our public signatures
pub use tower::{BoxError, Layer, Service, ServiceExt};
