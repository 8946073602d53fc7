//! AislePay HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BookingEnvelope, CreateBookingRequest, CreateEscrowRequest,
    EscrowEnvelope, EscrowListEnvelope, LedgerEnvelope, MutationEnvelope,
    NotificationListEnvelope, RefundRequest, ReleaseRequest,
};

/// Credentials attached to a request.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A marketplace user's bearer JWT.
    UserJwt(String),
    /// The platform operator key, sent as `x-admin-key`.
    AdminKey(String),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::UserJwt(jwt) => request.header("authorization", format!("Bearer {jwt}")),
            Self::AdminKey(key) => request.header("x-admin-key", key.clone()),
        }
    }
}

/// AislePay API client.
///
/// Provides typed methods over the escrow API for marketplace services
/// and dashboards.
#[derive(Debug, Clone)]
pub struct AislePayClient {
    client: Client,
    base_url: String,
}

impl AislePayClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g. `"http://aislepay:8080"`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Register a booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_booking(
        &self,
        credentials: &Credentials,
        request: CreateBookingRequest,
    ) -> Result<BookingEnvelope, ClientError> {
        let url = format!("{}/v1/bookings", self.base_url);
        let response = credentials
            .apply(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create the escrow account for a booking.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Conflict` when the booking already has one.
    pub async fn create_escrow(
        &self,
        credentials: &Credentials,
        request: CreateEscrowRequest,
    ) -> Result<EscrowEnvelope, ClientError> {
        let url = format!("{}/v1/escrow", self.base_url);
        let response = credentials
            .apply(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// List escrow accounts visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_escrows(
        &self,
        credentials: &Credentials,
        booking_id: Option<&str>,
        escrow_id: Option<&str>,
    ) -> Result<EscrowListEnvelope, ClientError> {
        let url = format!("{}/v1/escrow", self.base_url);
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(booking_id) = booking_id {
            query.push(("booking_id", booking_id));
        }
        if let Some(escrow_id) = escrow_id {
            query.push(("escrow_id", escrow_id));
        }

        let response = credentials
            .apply(self.client.get(&url))
            .query(&query)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Release held funds to the vendor.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientFunds` when the amount exceeds the
    /// available balance.
    pub async fn release(
        &self,
        credentials: &Credentials,
        request: ReleaseRequest,
    ) -> Result<MutationEnvelope, ClientError> {
        let url = format!("{}/v1/escrow/release", self.base_url);
        let response = credentials
            .apply(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Refund held funds to the customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientFunds` when the amount exceeds the
    /// available balance.
    pub async fn refund(
        &self,
        credentials: &Credentials,
        request: RefundRequest,
    ) -> Result<MutationEnvelope, ClientError> {
        let url = format!("{}/v1/escrow/refund", self.base_url);
        let response = credentials
            .apply(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// List the ledger of an escrow account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_transactions(
        &self,
        credentials: &Credentials,
        escrow_id: &str,
    ) -> Result<LedgerEnvelope, ClientError> {
        let url = format!("{}/v1/escrow/{escrow_id}/transactions", self.base_url);
        let response = credentials.apply(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    /// List the caller's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_notifications(
        &self,
        credentials: &Credentials,
    ) -> Result<NotificationListEnvelope, ClientError> {
        let url = format!("{}/v1/notifications", self.base_url);
        let response = credentials.apply(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse the error envelope
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                match code {
                    "insufficient_funds" => {
                        let available_paise = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("available_paise"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);
                        let requested_paise = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("requested_paise"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);

                        Err(ClientError::InsufficientFunds {
                            available_paise,
                            requested_paise,
                        })
                    }
                    "conflict" => Err(ClientError::Conflict(message)),
                    "not_found" => Err(ClientError::NotFound(message)),
                    "forbidden" => Err(ClientError::Forbidden(message)),
                    "unauthorized" => Err(ClientError::Unauthorized),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = AislePayClient::new("http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = AislePayClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn credentials_shapes() {
        let jwt = Credentials::UserJwt("token".into());
        let admin = Credentials::AdminKey("key".into());
        assert!(matches!(jwt, Credentials::UserJwt(_)));
        assert!(matches!(admin, Credentials::AdminKey(_)));
    }
}
