//! Normalization helpers and constants shared across operations

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

use crate::error::Error;

/// Country calling code prefixed to normalized phone numbers
pub const COUNTRY_CODE: &str = "254";

/// Substrings the gateway forbids in callback URLs
///
/// A callback pointing back at the gateway's own domain would loop, so these
/// are rejected as literal (case-sensitive) matches.
pub const GATEWAY_URL_KEYWORDS: &[&str] = &["mpesa", "safaricom"];

/// Party identifier kinds accepted by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    /// Phone number
    Msisdn,
    /// Merchant till number
    TillNumber,
    /// Organization shortcode
    Shortcode,
}

impl IdentifierType {
    /// Numeric code the gateway expects on the wire
    pub fn code(&self) -> u32 {
        match self {
            IdentifierType::Msisdn => 1,
            IdentifierType::TillNumber => 2,
            IdentifierType::Shortcode => 4,
        }
    }
}

impl FromStr for IdentifierType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "msisdn" => Ok(IdentifierType::Msisdn),
            "till_number" => Ok(IdentifierType::TillNumber),
            "shortcode" => Ok(IdentifierType::Shortcode),
            _ => Err(Error::UnknownIdentifierType(value.to_string())),
        }
    }
}

/// Normalize a loosely formatted local phone number to the gateway's
/// international format: the last 9 digits prefixed with `254`.
///
/// Whitespace and punctuation are ignored. Inputs with fewer than 9 digits
/// are rejected rather than sent malformed.
pub fn sanitize_phone_number(phone: &str) -> Result<String, Error> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 9 {
        return Err(Error::InvalidPhoneNumber(phone.to_string()));
    }

    Ok(format!("{}{}", COUNTRY_CODE, &digits[digits.len() - 9..]))
}

/// Check that a callback URL is syntactically valid http(s) and does not
/// point back at the gateway's own domain.
pub fn is_valid_callback_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    !GATEWAY_URL_KEYWORDS
        .iter()
        .any(|keyword| url.contains(keyword))
}

/// Floor a monetary amount to whole currency units.
///
/// The gateway APIs carry no fractional units; zero and negative amounts are
/// a caller error.
pub fn whole_amount(amount: f64) -> Result<u64, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(amount.floor() as u64)
}

/// Left-anchored truncation to a gateway-documented maximum length
pub fn truncate(value: &str, max_len: usize) -> String {
    value.chars().take(max_len).collect()
}

/// Current unix time in seconds
pub fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Convert unix timestamp (seconds) to the gateway's signing timestamp
/// format: `YYYYMMDDHHmmss`, no separators, UTC.
pub fn signing_timestamp(unix_secs: u64) -> String {
    const SECONDS_PER_DAY: u64 = 86400;
    const SECONDS_PER_HOUR: u64 = 3600;
    const SECONDS_PER_MINUTE: u64 = 60;

    // Days since Unix epoch (1970-01-01)
    let mut days = unix_secs / SECONDS_PER_DAY;
    let remainder = unix_secs % SECONDS_PER_DAY;

    let hours = remainder / SECONDS_PER_HOUR;
    let minutes = (remainder % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = remainder % SECONDS_PER_MINUTE;

    let mut year = 1970;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    // Now days is the day of year (0-indexed)
    let days_in_months = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    for (m, &days_in_month) in days_in_months.iter().enumerate() {
        if days < days_in_month as u64 {
            month = m + 1;
            break;
        }
        days -= days_in_month as u64;
    }

    let day = days + 1; // Convert from 0-indexed to 1-indexed

    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        year, month, day, hours, minutes, seconds
    )
}

/// Check if a year is a leap year
pub fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_phone_number() {
        assert_eq!(
            sanitize_phone_number("0712345678").unwrap(),
            "254712345678"
        );
        assert_eq!(
            sanitize_phone_number("254712345678").unwrap(),
            "254712345678"
        );
        assert_eq!(
            sanitize_phone_number("+254 712 345 678").unwrap(),
            "254712345678"
        );
        assert_eq!(
            sanitize_phone_number("0712 345 678").unwrap(),
            "254712345678"
        );
        // 9 bare digits are accepted as-is
        assert_eq!(sanitize_phone_number("712345678").unwrap(), "254712345678");
    }

    #[test]
    fn test_sanitize_phone_number_too_short() {
        assert!(matches!(
            sanitize_phone_number("12345"),
            Err(Error::InvalidPhoneNumber(_))
        ));
        assert!(matches!(
            sanitize_phone_number(""),
            Err(Error::InvalidPhoneNumber(_))
        ));
    }

    #[test]
    fn test_identifier_type_codes() {
        assert_eq!(IdentifierType::Msisdn.code(), 1);
        assert_eq!(IdentifierType::TillNumber.code(), 2);
        assert_eq!(IdentifierType::Shortcode.code(), 4);
    }

    #[test]
    fn test_identifier_type_from_str() {
        assert_eq!(
            "msisdn".parse::<IdentifierType>().unwrap(),
            IdentifierType::Msisdn
        );
        assert_eq!(
            "Till_Number".parse::<IdentifierType>().unwrap(),
            IdentifierType::TillNumber
        );
        assert_eq!(
            "shortcode".parse::<IdentifierType>().unwrap(),
            IdentifierType::Shortcode
        );
        assert!(matches!(
            "paybill".parse::<IdentifierType>(),
            Err(Error::UnknownIdentifierType(_))
        ));
    }

    #[test]
    fn test_is_valid_callback_url() {
        assert!(is_valid_callback_url("https://myapp.example.com/cb"));
        assert!(is_valid_callback_url("http://myapp.example.com/cb"));

        // Gateway's own domain is forbidden
        assert!(!is_valid_callback_url("https://sandbox.safaricom.co.ke/cb"));
        assert!(!is_valid_callback_url("https://example.com/mpesa/callback"));

        // Malformed or non-http
        assert!(!is_valid_callback_url("not-a-url"));
        assert!(!is_valid_callback_url("ftp://example.com/cb"));
    }

    #[test]
    fn test_whole_amount() {
        assert_eq!(whole_amount(100.0).unwrap(), 100);
        assert_eq!(whole_amount(100.75).unwrap(), 100);
        assert_eq!(whole_amount(0.5).unwrap(), 0);

        assert!(matches!(whole_amount(0.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(whole_amount(-5.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(
            whole_amount(f64::NAN),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 13), "short");
        assert_eq!(truncate("a very long transaction note", 13), "a very long t");
        assert_eq!(truncate("", 13), "");
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2000)); // Divisible by 400
        assert!(is_leap_year(2024)); // Divisible by 4, not by 100
        assert!(!is_leap_year(1900)); // Divisible by 100, not by 400
        assert!(!is_leap_year(2023)); // Not divisible by 4
    }

    #[test]
    fn test_signing_timestamp() {
        // Test epoch
        assert_eq!(signing_timestamp(0), "19700101000000");

        // 2024-01-01 00:00:00 UTC = 1704067200
        assert_eq!(signing_timestamp(1704067200), "20240101000000");

        // 2024-06-15 14:40:45 UTC = 1718462445
        assert_eq!(signing_timestamp(1718462445), "20240615144045");

        // 2025-01-01 12:00:00 UTC = 1735732800
        assert_eq!(signing_timestamp(1735732800), "20250101120000");
    }
}
