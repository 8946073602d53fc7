//! AislePay HTTP API Service.
//!
//! This crate provides the HTTP API for the AislePay escrow platform,
//! including:
//!
//! - Booking registration
//! - Escrow account lifecycle (create, release, refund, dispute)
//! - Ledger and notification listings
//! - Payment-gateway webhooks with signature verification
//! - The auto-release sweeper
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **JWT bearer tokens** - For marketplace users (customers and vendors)
//! 2. **Admin API key** - For platform operators, via `x-admin-key`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod policy;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use auth::Actor;
pub use config::ServiceConfig;
pub use error::{ApiError, FieldIssue};
pub use routes::create_router;
pub use state::AppState;
