//! Rust client for Safaricom's M-Pesa Daraja API
//!
//! This crate builds signed, validated request payloads for the gateway's
//! financial operations, manages the OAuth bearer token lifecycle
//! transparently and dispatches authenticated HTTP calls.
//!
//! # Endpoints
//!
//! | Method | Endpoint | Operation |
//! |--------|----------|-----------|
//! | GET | `/oauth/v1/generate` | Token issuance (basic auth) |
//! | POST | `/mpesa/accountbalance/v1/query` | Account balance |
//! | POST | `/mpesa/c2b/v1/registerurl` | C2B URL registration |
//! | POST | `/mpesa/c2b/v1/simulate` | C2B simulation (sandbox) |
//! | POST | `/mpesa/stkpush/v1/processrequest` | STK push |
//! | POST | `/mpesa/stkpushquery/v1/query` | STK push status |
//! | POST | `/mpesa/b2c/v3/paymentrequest` | B2C disbursement |
//! | POST | `/mpesa/b2cvalidate/v2/paymentrequest` | ID-validated B2C |
//! | POST | `/mpesa/b2b/v1/paymentrequest` | B2B pay bill / buy goods |
//! | POST | `/mpesa/transactionstatus/v1/query` | Transaction status |
//! | POST | `/mpesa/reversal/v1/request` | Reversal |
//! | POST | `/mpesa/qrcode/v1/generate` | Dynamic QR |
//! | POST | `/mpesa/b2b/v1/remittax` | Tax remittance |
//! | POST | `/v1/billmanager-invoice/optin` | Bill manager opt-in |
//! | POST | `/v1/billmanager-invoice/single-invoicing` | Send invoice |
//!
//! # Usage
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use daraja_rs::{InMemoryTokenStore, Mpesa, MpesaConfig};
//! # #[tokio::main]
//! # async fn main() -> Result<(), daraja_rs::Error> {
//! let config = MpesaConfig::from_env()?;
//! let mpesa = Mpesa::new(config, Arc::new(InMemoryTokenStore::new()))?;
//!
//! let response = mpesa
//!     .stk_push(100.0, "0712345678", "INV-001", "Order 001")
//!     .await?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```
//!
//! Responses are returned as raw `serde_json::Value`; interpreting the
//! gateway's per-operation result codes is left to the integration.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use url::Url;

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod token;
pub mod util;

pub use api::error::DarajaApiError;
pub use api::types::{
    AccountBalanceRequest, B2bCommand, B2bRequest, B2cCommand, B2cRequest, B2cValidatedRequest,
    BillManagerOptinRequest, C2bCommand, C2bSimulateRequest, DynamicQrRequest, InvoiceItem,
    QrTransactionCode, RegisterUrlsRequest, ResponseType, ReversalRequest, SendInvoiceRequest,
    StkPushRequest, StkPushStatusRequest, TaxRemittanceRequest, TransactionStatusRequest,
};
pub use api::DarajaApi;
pub use config::{CallbackUrls, Environment, MpesaConfig};
pub use credentials::{CertificateDir, CertificateSource};
pub use error::Error;
pub use token::{InMemoryTokenStore, Token, TokenManager, TokenStore};
pub use util::IdentifierType;

const HTTP_TIMEOUT_SECS: u64 = 30;

/// M-Pesa gateway client
///
/// One method per gateway operation. Each call validates its inputs, signs
/// what needs signing, then dispatches with a bearer token drawn from the
/// shared [`TokenManager`]. Cloning is cheap and clones share the token
/// cache.
#[derive(Clone)]
pub struct Mpesa {
    config: MpesaConfig,
    api: DarajaApi,
    certificates: Arc<dyn CertificateSource>,
}

impl Mpesa {
    /// Create a client for the configured environment
    pub fn new(config: MpesaConfig, token_store: Arc<dyn TokenStore>) -> Result<Self, Error> {
        let base_url = Url::parse(config.environment.base_url())?;
        Self::with_base_url(config, token_store, base_url)
    }

    /// Create a client against an explicit base URL instead of the
    /// environment's host. Useful for proxies and test harnesses.
    pub fn with_base_url(
        config: MpesaConfig,
        token_store: Arc<dyn TokenStore>,
        base_url: Url,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            base_url.clone(),
            config.consumer_key.clone(),
            config.consumer_secret.clone(),
            token_store,
        ));

        let api = DarajaApi::new(http, base_url, tokens);
        let certificates = Arc::new(CertificateDir::new(config.certificate_dir.clone()));

        Ok(Self {
            config,
            api,
            certificates,
        })
    }

    /// Replace the certificate source (default: [`CertificateDir`] over the
    /// configured directory)
    pub fn with_certificate_source(mut self, source: Arc<dyn CertificateSource>) -> Self {
        self.certificates = source;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    /// Query the working account balance of the shortcode
    pub async fn account_balance(&self, remarks: &str) -> Result<Value, Error> {
        let request = AccountBalanceRequest::new(
            self.initiator_name()?,
            self.security_credential()?,
            &self.config.shortcode,
            remarks,
            required(self.config.urls.balance_timeout.as_ref(), "balance timeout URL")?,
            required(self.config.urls.balance_result.as_ref(), "balance result URL")?,
        )?;
        self.api.post(AccountBalanceRequest::PATH, &request).await
    }

    /// Register the C2B validation and confirmation URLs
    pub async fn register_c2b_urls(&self, response_type: ResponseType) -> Result<Value, Error> {
        let request = RegisterUrlsRequest::new(
            &self.config.shortcode,
            response_type,
            required(
                self.config.urls.stk_confirmation.as_ref(),
                "C2B confirmation URL",
            )?,
            required(
                self.config.urls.stk_validation.as_ref(),
                "C2B validation URL",
            )?,
        )?;
        self.api.post(RegisterUrlsRequest::PATH, &request).await
    }

    /// Simulate a customer payment (sandbox only)
    pub async fn c2b_simulate(
        &self,
        amount: f64,
        phone_number: &str,
        bill_ref_number: &str,
        command: C2bCommand,
    ) -> Result<Value, Error> {
        let request = C2bSimulateRequest::new(
            &self.config.shortcode,
            command,
            amount,
            phone_number,
            bill_ref_number,
        )?;
        self.api.post(C2bSimulateRequest::PATH, &request).await
    }

    /// Prompt the payer's device for a PIN-authorized payment
    pub async fn stk_push(
        &self,
        amount: f64,
        phone_number: &str,
        account_reference: &str,
        description: &str,
    ) -> Result<Value, Error> {
        let timestamp = util::signing_timestamp(util::unix_time());
        let request = StkPushRequest::new(
            &self.config.shortcode,
            self.stk_passkey()?,
            &timestamp,
            amount,
            phone_number,
            account_reference,
            description,
            required(self.config.urls.stk_callback.as_ref(), "STK callback URL")?,
        )?;
        self.api.post(StkPushRequest::PATH, &request).await
    }

    /// Query the outcome of a prior STK push
    pub async fn stk_push_status(&self, checkout_request_id: &str) -> Result<Value, Error> {
        let timestamp = util::signing_timestamp(util::unix_time());
        let request = StkPushStatusRequest::new(
            &self.config.shortcode,
            self.stk_passkey()?,
            &timestamp,
            checkout_request_id,
        )?;
        self.api.post(StkPushStatusRequest::PATH, &request).await
    }

    /// Disburse money to a customer phone
    pub async fn b2c_payment(
        &self,
        amount: f64,
        phone_number: &str,
        command: B2cCommand,
        remarks: &str,
        occasion: Option<&str>,
    ) -> Result<Value, Error> {
        let request = B2cRequest::new(
            originator_conversation_id(),
            self.initiator_name()?,
            self.security_credential()?,
            command,
            amount,
            &self.config.shortcode,
            phone_number,
            remarks,
            occasion,
            required(self.config.urls.b2c_timeout.as_ref(), "B2C timeout URL")?,
            required(self.config.urls.b2c_result.as_ref(), "B2C result URL")?,
        )?;
        self.api.post(B2cRequest::PATH, &request).await
    }

    /// Disburse money to a customer phone, validated against their ID number
    pub async fn b2c_validated_payment(
        &self,
        amount: f64,
        phone_number: &str,
        id_number: &str,
        command: B2cCommand,
        remarks: &str,
        occasion: Option<&str>,
    ) -> Result<Value, Error> {
        let request = B2cValidatedRequest::new(
            originator_conversation_id(),
            self.initiator_name()?,
            self.security_credential()?,
            command,
            id_number,
            amount,
            &self.config.shortcode,
            phone_number,
            remarks,
            occasion,
            required(self.config.urls.b2c_timeout.as_ref(), "B2C timeout URL")?,
            required(self.config.urls.b2c_result.as_ref(), "B2C result URL")?,
        )?;
        self.api.post(B2cValidatedRequest::PATH, &request).await
    }

    /// Pay a bill at another organization's shortcode
    pub async fn b2b_paybill(
        &self,
        amount: f64,
        receiver_shortcode: &str,
        account_reference: &str,
        requester: Option<&str>,
        remarks: &str,
    ) -> Result<Value, Error> {
        self.b2b(
            B2bCommand::BusinessPayBill,
            amount,
            receiver_shortcode,
            account_reference,
            requester,
            remarks,
        )
        .await
    }

    /// Buy goods from another organization's till
    pub async fn b2b_buy_goods(
        &self,
        amount: f64,
        receiver_shortcode: &str,
        account_reference: &str,
        requester: Option<&str>,
        remarks: &str,
    ) -> Result<Value, Error> {
        self.b2b(
            B2bCommand::BusinessBuyGoods,
            amount,
            receiver_shortcode,
            account_reference,
            requester,
            remarks,
        )
        .await
    }

    async fn b2b(
        &self,
        command: B2bCommand,
        amount: f64,
        receiver_shortcode: &str,
        account_reference: &str,
        requester: Option<&str>,
        remarks: &str,
    ) -> Result<Value, Error> {
        let request = B2bRequest::new(
            self.initiator_name()?,
            self.security_credential()?,
            command,
            amount,
            &self.config.shortcode,
            receiver_shortcode,
            account_reference,
            requester,
            remarks,
            required(self.config.urls.b2b_timeout.as_ref(), "B2B timeout URL")?,
            required(self.config.urls.b2b_result.as_ref(), "B2B result URL")?,
        )?;
        self.api.post(B2bRequest::PATH, &request).await
    }

    /// Query the status of a past transaction
    pub async fn transaction_status(
        &self,
        transaction_id: &str,
        identifier_type: IdentifierType,
        remarks: &str,
        occasion: Option<&str>,
    ) -> Result<Value, Error> {
        let request = TransactionStatusRequest::new(
            self.initiator_name()?,
            self.security_credential()?,
            transaction_id,
            &self.config.shortcode,
            identifier_type,
            remarks,
            occasion,
            required(
                self.config.urls.transaction_status_result.as_ref(),
                "transaction status result URL",
            )?,
            required(
                self.config.urls.transaction_status_timeout.as_ref(),
                "transaction status timeout URL",
            )?,
        )?;
        self.api.post(TransactionStatusRequest::PATH, &request).await
    }

    /// Reverse a settled transaction
    pub async fn reverse_transaction(
        &self,
        transaction_id: &str,
        amount: f64,
        receiver_shortcode: &str,
        remarks: &str,
        occasion: Option<&str>,
    ) -> Result<Value, Error> {
        let request = ReversalRequest::new(
            self.initiator_name()?,
            self.security_credential()?,
            transaction_id,
            amount,
            receiver_shortcode,
            remarks,
            occasion,
            required(self.config.urls.reversal_result.as_ref(), "reversal result URL")?,
            required(self.config.urls.reversal_timeout.as_ref(), "reversal timeout URL")?,
        )?;
        self.api.post(ReversalRequest::PATH, &request).await
    }

    /// Generate a dynamic payment QR code
    pub async fn dynamic_qr(
        &self,
        merchant_name: &str,
        ref_no: &str,
        amount: f64,
        trx_code: QrTransactionCode,
        cpi: &str,
        size: &str,
    ) -> Result<Value, Error> {
        let request = DynamicQrRequest::new(merchant_name, ref_no, amount, trx_code, cpi, size)?;
        self.api.post(DynamicQrRequest::PATH, &request).await
    }

    /// Remit tax to the revenue authority against a payment registration number
    pub async fn tax_remittance(
        &self,
        amount: f64,
        payment_registration_no: &str,
    ) -> Result<Value, Error> {
        let request = TaxRemittanceRequest::new(
            self.initiator_name()?,
            self.security_credential()?,
            amount,
            &self.config.shortcode,
            payment_registration_no,
            required(
                self.config.urls.tax_remittance_timeout.as_ref(),
                "tax remittance timeout URL",
            )?,
            required(
                self.config.urls.tax_remittance_result.as_ref(),
                "tax remittance result URL",
            )?,
        )?;
        self.api.post(TaxRemittanceRequest::PATH, &request).await
    }

    /// Opt the shortcode into the bill manager service
    pub async fn bill_manager_optin(
        &self,
        email: &str,
        official_contact: &str,
        send_reminders: bool,
        logo: Option<&str>,
    ) -> Result<Value, Error> {
        let request = BillManagerOptinRequest::new(
            &self.config.shortcode,
            email,
            official_contact,
            send_reminders,
            logo,
            required(
                self.config.urls.bill_optin_callback.as_ref(),
                "bill manager callback URL",
            )?,
        )?;
        self.api.post(BillManagerOptinRequest::PATH, &request).await
    }

    /// Send a single bill manager invoice
    #[allow(clippy::too_many_arguments)]
    pub async fn send_invoice(
        &self,
        external_reference: &str,
        billed_full_name: &str,
        billed_phone_number: &str,
        billed_period: &str,
        invoice_name: &str,
        due_date: &str,
        account_reference: &str,
        amount: f64,
        invoice_items: Vec<InvoiceItem>,
    ) -> Result<Value, Error> {
        let request = SendInvoiceRequest::new(
            external_reference,
            billed_full_name,
            billed_phone_number,
            billed_period,
            invoice_name,
            due_date,
            account_reference,
            amount,
            invoice_items,
        )?;
        self.api.post(SendInvoiceRequest::PATH, &request).await
    }

    fn initiator_name(&self) -> Result<&str, Error> {
        if self.config.initiator_name.is_empty() {
            return Err(Error::Config(
                "initiator_name is not configured".to_string(),
            ));
        }
        Ok(&self.config.initiator_name)
    }

    fn stk_passkey(&self) -> Result<&str, Error> {
        if self.config.stk_passkey.is_empty() {
            return Err(Error::Config("stk_passkey is not configured".to_string()));
        }
        Ok(&self.config.stk_passkey)
    }

    /// Encrypt the initiator password with the environment's certificate.
    ///
    /// Recomputed per call; configuration may rotate between calls and the
    /// encryption is cheap relative to the network round trip.
    fn security_credential(&self) -> Result<String, Error> {
        if self.config.initiator_password.is_empty() {
            return Err(Error::Config(
                "initiator_password is not configured".to_string(),
            ));
        }
        let pem = self.certificates.certificate_pem(self.config.environment)?;
        credentials::security_credential(&self.config.initiator_password, &pem)
    }
}

fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, Error> {
    value
        .map(String::as_str)
        .ok_or_else(|| Error::Config(format!("{} is not configured", name)))
}

/// Time-derived unique ID for B2C requests
fn originator_conversation_id() -> String {
    let mut rng = rand::rng();
    format!(
        "{}{}",
        util::signing_timestamp(util::unix_time()),
        rng.random_range(10u32..100)
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use axum::routing::{get, post};
    use axum::{Json, Router};
    use openssl::rsa::Rsa;
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn with_token_endpoint(app: Router) -> Router {
        app.route(
            "/oauth/v1/generate",
            get(|| async { Json(json!({"access_token": "test-token", "expires_in": "3599"})) }),
        )
    }

    fn test_config(certificate_dir: PathBuf) -> MpesaConfig {
        let urls = CallbackUrls {
            stk_callback: Some("https://myapp.example.com/stk".to_string()),
            b2c_result: Some("https://myapp.example.com/b2c/result".to_string()),
            b2c_timeout: Some("https://myapp.example.com/b2c/timeout".to_string()),
            ..CallbackUrls::default()
        };
        MpesaConfig {
            environment: Environment::Sandbox,
            consumer_key: "key".to_string(),
            consumer_secret: "secret".to_string(),
            shortcode: "174379".to_string(),
            initiator_name: "apiop".to_string(),
            initiator_password: "Secret123!".to_string(),
            stk_passkey: "passkey".to_string(),
            certificate_dir,
            urls,
        }
    }

    fn write_sandbox_certificate(dir: &std::path::Path) {
        let rsa = Rsa::generate(2048).unwrap();
        let pem = rsa.public_key_to_pem().unwrap();
        let path = dir.join(Environment::Sandbox.certificate_file());
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(&pem).unwrap();
    }

    fn client(base_url: Url, certificate_dir: PathBuf) -> Mpesa {
        Mpesa::with_base_url(
            test_config(certificate_dir),
            Arc::new(InMemoryTokenStore::new()),
            base_url,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_stk_push_end_to_end() {
        let app = with_token_endpoint(Router::new().route(
            StkPushRequest::PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["BusinessShortCode"], "174379");
                assert_eq!(body["Amount"], 100);
                assert_eq!(body["PhoneNumber"], "254712345678");
                Json(json!({
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResponseCode": "0"
                }))
            }),
        ));
        let dir = tempfile::tempdir().unwrap();
        let mpesa = client(serve(app).await, dir.path().to_path_buf());

        let response = mpesa
            .stk_push(100.5, "0712 345 678", "INV-001", "Order 001")
            .await
            .unwrap();

        assert_eq!(response["ResponseCode"], "0");
    }

    #[tokio::test]
    async fn test_b2c_signs_with_certificate() {
        let app = with_token_endpoint(Router::new().route(
            B2cRequest::PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["CommandID"], "BusinessPayment");
                // the credential is base64 RSA output, never the raw password
                let credential = body["SecurityCredential"].as_str().unwrap();
                assert!(!credential.is_empty());
                assert_ne!(credential, "Secret123!");
                Json(json!({"ResponseCode": "0"}))
            }),
        ));

        let dir = tempfile::tempdir().unwrap();
        write_sandbox_certificate(dir.path());
        let mpesa = client(serve(app).await, dir.path().to_path_buf());

        let response = mpesa
            .b2c_payment(
                250.0,
                "0712345678",
                B2cCommand::BusinessPayment,
                "payout",
                None,
            )
            .await
            .unwrap();
        assert_eq!(response["ResponseCode"], "0");
    }

    #[tokio::test]
    async fn test_missing_callback_url_fails_before_dispatch() {
        // no routes at all: a dispatch attempt would fail loudly
        let dir = tempfile::tempdir().unwrap();
        let mpesa = client(serve(Router::new()).await, dir.path().to_path_buf());

        // C2B URLs are not set in the test config
        let err = mpesa
            .register_c2b_urls(ResponseType::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_certificate_fails_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        // b2c urls are configured but no certificate exists on disk
        let mpesa = client(serve(Router::new()).await, dir.path().to_path_buf());

        let err = mpesa
            .b2c_payment(100.0, "0712345678", B2cCommand::SalaryPayment, "pay", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyLoad(_)));
    }

    #[test]
    fn test_originator_conversation_id_shape() {
        let id = originator_conversation_id();
        // signing timestamp plus a two-digit suffix
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }
}
