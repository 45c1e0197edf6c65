//! Request payload types for the gateway operations
//!
//! Field names and casing are the gateway's wire contract and are reproduced
//! exactly, including its historical misspellings (`RecieverIdentifierType`,
//! `Occassion`). Every type carries a validating constructor that normalizes
//! phone numbers, floors amounts, truncates capped text fields and rejects
//! callback URLs pointing back at the gateway, all before any network I/O.
//!
//! Constructors are pure: time-dependent inputs (signing timestamp, security
//! credential, originator conversation ID) are passed in by the caller, so
//! building the same request twice from the same inputs yields an identical
//! payload.

use serde::Serialize;

use crate::credentials;
use crate::error::Error;
use crate::util::{sanitize_phone_number, truncate, whole_amount, IdentifierType};

/// Maximum length of the STK push transaction description
pub const MAX_TRANSACTION_DESC_LEN: usize = 13;
/// Maximum length of remarks fields
pub const MAX_REMARKS_LEN: usize = 100;
/// Maximum length of occasion fields
pub const MAX_OCCASION_LEN: usize = 100;
/// Maximum length of the STK push account reference
pub const MAX_ACCOUNT_REFERENCE_LEN: usize = 12;
/// Maximum length of the B2B account reference
pub const MAX_B2B_ACCOUNT_REFERENCE_LEN: usize = 13;

/// Shortcode of the tax authority, fixed by the gateway
const KRA_SHORTCODE: &str = "572572";
/// Receiver identifier the reversal API expects
const REVERSAL_RECEIVER_IDENTIFIER: u32 = 11;
/// ID document type code for ID-validated B2C (national ID)
const NATIONAL_ID_TYPE: &str = "01";

fn validated_callback(url: &str) -> Result<String, Error> {
    if crate::util::is_valid_callback_url(url) {
        Ok(url.to_string())
    } else {
        Err(Error::InvalidCallbackUrl(url.to_string()))
    }
}

/// C2B registration response type applied when the validation URL is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    /// Complete the transaction
    Completed,
    /// Cancel the transaction
    Cancelled,
}

/// Transaction kind for C2B simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum C2bCommand {
    /// Pay bill
    CustomerPayBillOnline,
    /// Buy goods
    CustomerBuyGoodsOnline,
}

/// Disbursement kind for B2C payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B2cCommand {
    /// Salary payment
    SalaryPayment,
    /// Business payment
    BusinessPayment,
    /// Promotion payment
    PromotionPayment,
}

/// Transfer kind for B2B payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B2bCommand {
    /// Pay a bill at the receiving shortcode
    BusinessPayBill,
    /// Buy goods from the receiving till
    BusinessBuyGoods,
}

/// Transaction code embedded in a dynamic QR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QrTransactionCode {
    /// Buy goods
    #[serde(rename = "BG")]
    BuyGoods,
    /// Agent withdrawal
    #[serde(rename = "WA")]
    Withdraw,
    /// Pay bill
    #[serde(rename = "PB")]
    PayBill,
    /// Send money to a phone number
    #[serde(rename = "SM")]
    SendMoney,
    /// Send money to a business
    #[serde(rename = "SB")]
    SendToBusiness,
}

/// Account balance query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalanceRequest {
    /// Initiator name
    #[serde(rename = "Initiator")]
    pub initiator: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Fixed command `AccountBalance`
    #[serde(rename = "CommandID")]
    pub command_id: String,
    /// Queried shortcode
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Identifier code of `PartyA`
    #[serde(rename = "IdentifierType")]
    pub identifier_type: u32,
    /// Free-text remarks
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl AccountBalanceRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/accountbalance/v1/query";

    /// Build a balance query for `shortcode`
    pub fn new(
        initiator: &str,
        security_credential: String,
        shortcode: &str,
        remarks: &str,
        timeout_url: &str,
        result_url: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            initiator: initiator.to_string(),
            security_credential,
            command_id: "AccountBalance".to_string(),
            party_a: shortcode.to_string(),
            identifier_type: IdentifierType::Shortcode.code(),
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            queue_timeout_url: validated_callback(timeout_url)?,
            result_url: validated_callback(result_url)?,
        })
    }
}

/// C2B validation/confirmation URL registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterUrlsRequest {
    /// Shortcode the URLs are registered against
    #[serde(rename = "ShortCode")]
    pub shortcode: String,
    /// Behavior when the validation URL is unreachable
    #[serde(rename = "ResponseType")]
    pub response_type: ResponseType,
    /// Confirmation endpoint
    #[serde(rename = "ConfirmationURL")]
    pub confirmation_url: String,
    /// Validation endpoint
    #[serde(rename = "ValidationURL")]
    pub validation_url: String,
}

impl RegisterUrlsRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/c2b/v1/registerurl";

    /// Build a URL registration request
    pub fn new(
        shortcode: &str,
        response_type: ResponseType,
        confirmation_url: &str,
        validation_url: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            shortcode: shortcode.to_string(),
            response_type,
            confirmation_url: validated_callback(confirmation_url)?,
            validation_url: validated_callback(validation_url)?,
        })
    }
}

/// Sandbox-only C2B payment simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct C2bSimulateRequest {
    /// Receiving shortcode
    #[serde(rename = "ShortCode")]
    pub shortcode: String,
    /// Transaction kind
    #[serde(rename = "CommandID")]
    pub command_id: C2bCommand,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Paying phone number, normalized
    #[serde(rename = "Msisdn")]
    pub msisdn: String,
    /// Account/bill reference
    #[serde(rename = "BillRefNumber")]
    pub bill_ref_number: String,
}

impl C2bSimulateRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/c2b/v1/simulate";

    /// Build a simulated customer payment
    pub fn new(
        shortcode: &str,
        command: C2bCommand,
        amount: f64,
        phone_number: &str,
        bill_ref_number: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            shortcode: shortcode.to_string(),
            command_id: command,
            amount: whole_amount(amount)?,
            msisdn: sanitize_phone_number(phone_number)?,
            bill_ref_number: bill_ref_number.to_string(),
        })
    }
}

/// STK push (gateway-initiated PIN prompt on the payer's device)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StkPushRequest {
    /// Merchant shortcode
    #[serde(rename = "BusinessShortCode")]
    pub business_shortcode: String,
    /// Time-boxed password derived from shortcode, passkey and timestamp
    #[serde(rename = "Password")]
    pub password: String,
    /// Signing timestamp matching the password
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// Fixed transaction type `CustomerPayBillOnline`
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Paying phone number
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Receiving shortcode
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Phone number prompted for the PIN
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    /// Result callback URL
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    /// Account reference shown to the payer, capped at 12 chars
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    /// Description shown to the payer, capped at 13 chars
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

impl StkPushRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/stkpush/v1/processrequest";

    /// Build an STK push request
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shortcode: &str,
        passkey: &str,
        timestamp: &str,
        amount: f64,
        phone_number: &str,
        account_reference: &str,
        description: &str,
        callback_url: &str,
    ) -> Result<Self, Error> {
        let phone = sanitize_phone_number(phone_number)?;
        Ok(Self {
            business_shortcode: shortcode.to_string(),
            password: credentials::stk_password(shortcode, passkey, timestamp)?,
            timestamp: timestamp.to_string(),
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount: whole_amount(amount)?,
            party_a: phone.clone(),
            party_b: shortcode.to_string(),
            phone_number: phone,
            callback_url: validated_callback(callback_url)?,
            account_reference: truncate(account_reference, MAX_ACCOUNT_REFERENCE_LEN),
            transaction_desc: truncate(description, MAX_TRANSACTION_DESC_LEN),
        })
    }
}

/// STK push status query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StkPushStatusRequest {
    /// Merchant shortcode
    #[serde(rename = "BusinessShortCode")]
    pub business_shortcode: String,
    /// Time-boxed password
    #[serde(rename = "Password")]
    pub password: String,
    /// Signing timestamp matching the password
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    /// ID returned by the push request
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
}

impl StkPushStatusRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/stkpushquery/v1/query";

    /// Build a status query for a prior push
    pub fn new(
        shortcode: &str,
        passkey: &str,
        timestamp: &str,
        checkout_request_id: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            business_shortcode: shortcode.to_string(),
            password: credentials::stk_password(shortcode, passkey, timestamp)?,
            timestamp: timestamp.to_string(),
            checkout_request_id: checkout_request_id.to_string(),
        })
    }
}

/// B2C disbursement to a customer phone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2cRequest {
    /// Caller-unique request ID
    #[serde(rename = "OriginatorConversationID")]
    pub originator_conversation_id: String,
    /// Initiator name
    #[serde(rename = "InitiatorName")]
    pub initiator_name: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Disbursement kind
    #[serde(rename = "CommandID")]
    pub command_id: B2cCommand,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Sending shortcode
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Receiving phone number, normalized
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    /// Occasion, capped at 100 chars; gateway spells it with a double `s`
    #[serde(rename = "Occassion")]
    pub occasion: String,
}

impl B2cRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/b2c/v3/paymentrequest";

    /// Build a B2C disbursement
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        originator_conversation_id: String,
        initiator: &str,
        security_credential: String,
        command: B2cCommand,
        amount: f64,
        shortcode: &str,
        phone_number: &str,
        remarks: &str,
        occasion: Option<&str>,
        timeout_url: &str,
        result_url: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            originator_conversation_id,
            initiator_name: initiator.to_string(),
            security_credential,
            command_id: command,
            amount: whole_amount(amount)?,
            party_a: shortcode.to_string(),
            party_b: sanitize_phone_number(phone_number)?,
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            queue_timeout_url: validated_callback(timeout_url)?,
            result_url: validated_callback(result_url)?,
            occasion: truncate(occasion.unwrap_or_default(), MAX_OCCASION_LEN),
        })
    }
}

/// B2C disbursement validated against the recipient's national ID
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2cValidatedRequest {
    /// Caller-unique request ID
    #[serde(rename = "OriginatorConversationID")]
    pub originator_conversation_id: String,
    /// Initiator name
    #[serde(rename = "InitiatorName")]
    pub initiator_name: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Disbursement kind
    #[serde(rename = "CommandID")]
    pub command_id: B2cCommand,
    /// ID document type (`01` = national ID)
    #[serde(rename = "IDType")]
    pub id_type: String,
    /// Recipient's ID number
    #[serde(rename = "IDNumber")]
    pub id_number: String,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Sending shortcode
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Receiving phone number, normalized
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    /// Occasion, capped at 100 chars
    #[serde(rename = "Occassion")]
    pub occasion: String,
}

impl B2cValidatedRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/b2cvalidate/v2/paymentrequest";

    /// Build an ID-validated B2C disbursement
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        originator_conversation_id: String,
        initiator: &str,
        security_credential: String,
        command: B2cCommand,
        id_number: &str,
        amount: f64,
        shortcode: &str,
        phone_number: &str,
        remarks: &str,
        occasion: Option<&str>,
        timeout_url: &str,
        result_url: &str,
    ) -> Result<Self, Error> {
        if id_number.is_empty() {
            return Err(Error::InvalidArgument("ID number is empty".to_string()));
        }

        Ok(Self {
            originator_conversation_id,
            initiator_name: initiator.to_string(),
            security_credential,
            command_id: command,
            id_type: NATIONAL_ID_TYPE.to_string(),
            id_number: id_number.to_string(),
            amount: whole_amount(amount)?,
            party_a: shortcode.to_string(),
            party_b: sanitize_phone_number(phone_number)?,
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            queue_timeout_url: validated_callback(timeout_url)?,
            result_url: validated_callback(result_url)?,
            occasion: truncate(occasion.unwrap_or_default(), MAX_OCCASION_LEN),
        })
    }
}

/// B2B transfer between organizations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2bRequest {
    /// Initiator name
    #[serde(rename = "Initiator")]
    pub initiator: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Transfer kind
    #[serde(rename = "CommandID")]
    pub command_id: B2bCommand,
    /// Identifier code of the sender (shortcode)
    #[serde(rename = "SenderIdentifierType")]
    pub sender_identifier_type: u32,
    /// Identifier code of the receiver; gateway misspells `Receiver`
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: u32,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Sending shortcode
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Receiving shortcode
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Account reference at the receiver, capped at 13 chars
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    /// Phone number of the person requesting the payment, if any
    #[serde(rename = "Requester", skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl B2bRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/b2b/v1/paymentrequest";

    /// Build a B2B transfer
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initiator: &str,
        security_credential: String,
        command: B2bCommand,
        amount: f64,
        sender_shortcode: &str,
        receiver_shortcode: &str,
        account_reference: &str,
        requester: Option<&str>,
        remarks: &str,
        timeout_url: &str,
        result_url: &str,
    ) -> Result<Self, Error> {
        let requester = match requester {
            Some(phone) => Some(sanitize_phone_number(phone)?),
            None => None,
        };

        Ok(Self {
            initiator: initiator.to_string(),
            security_credential,
            command_id: command,
            sender_identifier_type: IdentifierType::Shortcode.code(),
            receiver_identifier_type: IdentifierType::Shortcode.code(),
            amount: whole_amount(amount)?,
            party_a: sender_shortcode.to_string(),
            party_b: receiver_shortcode.to_string(),
            account_reference: truncate(account_reference, MAX_B2B_ACCOUNT_REFERENCE_LEN),
            requester,
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            queue_timeout_url: validated_callback(timeout_url)?,
            result_url: validated_callback(result_url)?,
        })
    }
}

/// Transaction status query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStatusRequest {
    /// Initiator name
    #[serde(rename = "Initiator")]
    pub initiator: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Fixed command `TransactionStatusQuery`
    #[serde(rename = "CommandID")]
    pub command_id: String,
    /// Gateway receipt of the queried transaction
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    /// Party the transaction is queried against
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Identifier code of `PartyA`
    #[serde(rename = "IdentifierType")]
    pub identifier_type: u32,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Occasion, capped at 100 chars
    #[serde(rename = "Occasion")]
    pub occasion: String,
}

impl TransactionStatusRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/transactionstatus/v1/query";

    /// Build a transaction status query
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initiator: &str,
        security_credential: String,
        transaction_id: &str,
        party: &str,
        identifier_type: IdentifierType,
        remarks: &str,
        occasion: Option<&str>,
        result_url: &str,
        timeout_url: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            initiator: initiator.to_string(),
            security_credential,
            command_id: "TransactionStatusQuery".to_string(),
            transaction_id: transaction_id.to_string(),
            party_a: party.to_string(),
            identifier_type: identifier_type.code(),
            result_url: validated_callback(result_url)?,
            queue_timeout_url: validated_callback(timeout_url)?,
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            occasion: truncate(occasion.unwrap_or_default(), MAX_OCCASION_LEN),
        })
    }
}

/// Transaction reversal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReversalRequest {
    /// Initiator name
    #[serde(rename = "Initiator")]
    pub initiator: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Fixed command `TransactionReversal`
    #[serde(rename = "CommandID")]
    pub command_id: String,
    /// Gateway receipt of the transaction to reverse
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    /// Whole-unit amount of the original transaction
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Shortcode that received the original transaction
    #[serde(rename = "ReceiverParty")]
    pub receiver_party: String,
    /// Fixed receiver identifier code for reversals
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: u32,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Occasion, capped at 100 chars
    #[serde(rename = "Occasion")]
    pub occasion: String,
}

impl ReversalRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/reversal/v1/request";

    /// Build a reversal request
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initiator: &str,
        security_credential: String,
        transaction_id: &str,
        amount: f64,
        receiver_shortcode: &str,
        remarks: &str,
        occasion: Option<&str>,
        result_url: &str,
        timeout_url: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            initiator: initiator.to_string(),
            security_credential,
            command_id: "TransactionReversal".to_string(),
            transaction_id: transaction_id.to_string(),
            amount: whole_amount(amount)?,
            receiver_party: receiver_shortcode.to_string(),
            receiver_identifier_type: REVERSAL_RECEIVER_IDENTIFIER,
            result_url: validated_callback(result_url)?,
            queue_timeout_url: validated_callback(timeout_url)?,
            remarks: truncate(remarks, MAX_REMARKS_LEN),
            occasion: truncate(occasion.unwrap_or_default(), MAX_OCCASION_LEN),
        })
    }
}

/// Dynamic QR code generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicQrRequest {
    /// Name shown to the scanning customer
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    /// Transaction reference
    #[serde(rename = "RefNo")]
    pub ref_no: String,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Transaction code
    #[serde(rename = "TrxCode")]
    pub trx_code: QrTransactionCode,
    /// Credit party identifier (shortcode, till or phone, per `TrxCode`)
    #[serde(rename = "CPI")]
    pub cpi: String,
    /// QR image size in pixels
    #[serde(rename = "Size")]
    pub size: String,
}

impl DynamicQrRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/qrcode/v1/generate";

    /// Build a QR generation request
    pub fn new(
        merchant_name: &str,
        ref_no: &str,
        amount: f64,
        trx_code: QrTransactionCode,
        cpi: &str,
        size: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            merchant_name: merchant_name.to_string(),
            ref_no: ref_no.to_string(),
            amount: whole_amount(amount)?,
            trx_code,
            cpi: cpi.to_string(),
            size: size.to_string(),
        })
    }
}

/// Tax remittance to the revenue authority
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRemittanceRequest {
    /// Initiator name
    #[serde(rename = "Initiator")]
    pub initiator: String,
    /// Encrypted initiator password
    #[serde(rename = "SecurityCredential")]
    pub security_credential: String,
    /// Fixed command `PayTaxToKRA`
    #[serde(rename = "CommandID")]
    pub command_id: String,
    /// Identifier code of the sender
    #[serde(rename = "SenderIdentifierType")]
    pub sender_identifier_type: u32,
    /// Identifier code of the receiver
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: u32,
    /// Whole-unit amount
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Remitting shortcode
    #[serde(rename = "PartyA")]
    pub party_a: String,
    /// Tax authority shortcode, fixed by the gateway
    #[serde(rename = "PartyB")]
    pub party_b: String,
    /// Payment registration number issued by the authority
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    /// Free-text remarks, capped at 100 chars
    #[serde(rename = "Remarks")]
    pub remarks: String,
    /// Queue timeout notification URL
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_timeout_url: String,
    /// Result notification URL
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl TaxRemittanceRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/mpesa/b2b/v1/remittax";

    /// Build a tax remittance request
    pub fn new(
        initiator: &str,
        security_credential: String,
        amount: f64,
        shortcode: &str,
        payment_registration_no: &str,
        timeout_url: &str,
        result_url: &str,
    ) -> Result<Self, Error> {
        if payment_registration_no.is_empty() {
            return Err(Error::InvalidArgument(
                "payment registration number is empty".to_string(),
            ));
        }

        Ok(Self {
            initiator: initiator.to_string(),
            security_credential,
            command_id: "PayTaxToKRA".to_string(),
            sender_identifier_type: IdentifierType::Shortcode.code(),
            receiver_identifier_type: IdentifierType::Shortcode.code(),
            amount: whole_amount(amount)?,
            party_a: shortcode.to_string(),
            party_b: KRA_SHORTCODE.to_string(),
            account_reference: payment_registration_no.to_string(),
            remarks: "Tax Remittance to KRA".to_string(),
            queue_timeout_url: validated_callback(timeout_url)?,
            result_url: validated_callback(result_url)?,
        })
    }
}

/// Bill manager opt-in
///
/// The bill manager endpoints use lowercase/camelCase field names, unlike the
/// `/mpesa` family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillManagerOptinRequest {
    /// Merchant shortcode
    pub shortcode: String,
    /// Merchant contact email
    pub email: String,
    /// Official contact phone number, normalized
    #[serde(rename = "officialContact")]
    pub official_contact: String,
    /// Whether the gateway sends payment reminders (1) or not (0)
    #[serde(rename = "sendReminders")]
    pub send_reminders: u8,
    /// Merchant logo URL shown on invoices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Invoice payment callback URL
    #[serde(rename = "callbackurl")]
    pub callback_url: String,
}

impl BillManagerOptinRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/v1/billmanager-invoice/optin";

    /// Build an opt-in request
    pub fn new(
        shortcode: &str,
        email: &str,
        official_contact: &str,
        send_reminders: bool,
        logo: Option<&str>,
        callback_url: &str,
    ) -> Result<Self, Error> {
        if email.is_empty() {
            return Err(Error::InvalidArgument("email is empty".to_string()));
        }

        Ok(Self {
            shortcode: shortcode.to_string(),
            email: email.to_string(),
            official_contact: sanitize_phone_number(official_contact)?,
            send_reminders: u8::from(send_reminders),
            logo: logo.map(str::to_string),
            callback_url: validated_callback(callback_url)?,
        })
    }
}

/// Line item on a bill manager invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    /// Item description
    #[serde(rename = "itemName")]
    pub item_name: String,
    /// Whole-unit item amount
    pub amount: u64,
}

/// Bill manager single invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendInvoiceRequest {
    /// Merchant's own invoice reference
    #[serde(rename = "externalReference")]
    pub external_reference: String,
    /// Billed customer's full name
    #[serde(rename = "billedFullName")]
    pub billed_full_name: String,
    /// Billed customer's phone number, normalized
    #[serde(rename = "billedPhoneNumber")]
    pub billed_phone_number: String,
    /// Billing period, e.g. `August 2025`
    #[serde(rename = "billedPeriod")]
    pub billed_period: String,
    /// Invoice title
    #[serde(rename = "invoiceName")]
    pub invoice_name: String,
    /// Due date
    #[serde(rename = "dueDate")]
    pub due_date: String,
    /// Account the payment is reconciled against
    #[serde(rename = "accountReference")]
    pub account_reference: String,
    /// Whole-unit invoice total
    pub amount: u64,
    /// Line items, omitted when empty
    #[serde(rename = "invoiceItems", skip_serializing_if = "Vec::is_empty")]
    pub invoice_items: Vec<InvoiceItem>,
}

impl SendInvoiceRequest {
    /// Gateway endpoint path
    pub const PATH: &'static str = "/v1/billmanager-invoice/single-invoicing";

    /// Build a single-invoice request
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        external_reference: &str,
        billed_full_name: &str,
        billed_phone_number: &str,
        billed_period: &str,
        invoice_name: &str,
        due_date: &str,
        account_reference: &str,
        amount: f64,
        invoice_items: Vec<InvoiceItem>,
    ) -> Result<Self, Error> {
        Ok(Self {
            external_reference: external_reference.to_string(),
            billed_full_name: billed_full_name.to_string(),
            billed_phone_number: sanitize_phone_number(billed_phone_number)?,
            billed_period: billed_period.to_string(),
            invoice_name: invoice_name.to_string(),
            due_date: due_date.to_string(),
            account_reference: account_reference.to_string(),
            amount: whole_amount(amount)?,
            invoice_items,
        })
    }
}
