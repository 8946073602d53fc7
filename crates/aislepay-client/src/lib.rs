//! AislePay Client SDK.
//!
//! This crate provides a client library for services that consume the
//! AislePay escrow API (the marketplace backend, dashboards, support
//! tooling).
//!
//! # Example
//!
//! ```no_run
//! use aislepay_client::{AislePayClient, Credentials, ReleaseRequest};
//!
//! # async fn example() -> Result<(), aislepay_client::ClientError> {
//! let client = AislePayClient::new("http://aislepay.internal:8080");
//! let credentials = Credentials::UserJwt("eyJ...".to_string());
//!
//! // Release the advance to the vendor after the event
//! let result = client
//!     .release(
//!         &credentials,
//!         ReleaseRequest {
//!             escrow_id: "2f4a...".to_string(),
//!             amount_paise: 3_000_000,
//!             notes: Some("Advance payout after venue walkthrough".to_string()),
//!             external_transfer_id: None,
//!         },
//!     )
//!     .await?;
//!
//! println!("{} ({} paise still held)", result.message, result.escrow.available_paise);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{AislePayClient, ClientOptions, Credentials};
pub use error::ClientError;
pub use types::*;
