//! Core components for signing and sending EC2 Query API requests.
//!
//! This crate provides the foundational types shared by the ec2sign crates.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//! - **Error**: A single error type whose [`ErrorKind`] tells configuration, request,
//!   transport and service-reported failures apart
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use ec2sign_core::{Context, HttpSend, Result};
//!
//! #[derive(Debug)]
//! struct EchoHttpSend;
//!
//! #[async_trait]
//! impl HttpSend for EchoHttpSend {
//!     async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
//!         Ok(http::Response::new(req.into_body()))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_http_send(EchoHttpSend);
//! let resp = ctx.http_send(http::Request::new(Bytes::from("hello"))).await?;
//! assert_eq!(resp.body().as_ref(), b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::HttpSend;
pub use context::NoopEnv;
pub use context::NoopHttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};
