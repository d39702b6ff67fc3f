// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Validated business keys

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static CUSTOMER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("customer number regex is valid"));
static ACCOUNT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]+)$").expect("account key regex is valid"));
static REG_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("registration number regex is valid"));
static ACCOUNT_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("account number regex is valid"));

/// Errors raised when a key does not match its format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Customer numbers are exactly ten digits
    #[error("invalid customer number '{value}': expected 10 digits")]
    InvalidCustomerNumber {
        /// Rejected input
        value: String,
    },

    /// Account keys are `<4-digit reg no>-<account no>`
    #[error("invalid account key '{value}': expected <4 digit reg no>-<account no>")]
    InvalidAccountKey {
        /// Rejected input
        value: String,
    },
}

/// Ten-digit customer number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerNumber(String);

impl CustomerNumber {
    /// Validate and wrap a customer number
    pub fn new(value: impl Into<String>) -> Result<Self, KeyError> {
        let value = value.into();
        if CUSTOMER_NUMBER.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(KeyError::InvalidCustomerNumber { value })
        }
    }

    /// The digits
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CustomerNumber {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CustomerNumber {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CustomerNumber> for String {
    fn from(number: CustomerNumber) -> Self {
        number.0
    }
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration number and account number identifying an account
///
/// Rendered and parsed as `<reg_no>-<account_no>`, e.g. `5479-1234567`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey {
    reg_no: String,
    account_no: String,
}

impl AccountKey {
    /// Validate both parts of the key
    pub fn new(reg_no: impl Into<String>, account_no: impl Into<String>) -> Result<Self, KeyError> {
        let reg_no = reg_no.into();
        let account_no = account_no.into();
        if REG_NO.is_match(&reg_no) && ACCOUNT_NO.is_match(&account_no) {
            Ok(Self { reg_no, account_no })
        } else {
            Err(KeyError::InvalidAccountKey {
                value: format!("{reg_no}-{account_no}"),
            })
        }
    }

    /// Four-digit registration number
    pub fn reg_no(&self) -> &str {
        &self.reg_no
    }

    /// Account number within the registration
    pub fn account_no(&self) -> &str {
        &self.account_no
    }
}

impl FromStr for AccountKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = ACCOUNT_KEY
            .captures(s)
            .ok_or_else(|| KeyError::InvalidAccountKey {
                value: s.to_string(),
            })?;
        Ok(Self {
            reg_no: captures[1].to_string(),
            account_no: captures[2].to_string(),
        })
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.reg_no, self.account_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_number_requires_ten_digits() {
        assert!("0123456789".parse::<CustomerNumber>().is_ok());
        for invalid in ["012345678", "01234567890", "01234x6789", ""] {
            assert_eq!(
                invalid.parse::<CustomerNumber>(),
                Err(KeyError::InvalidCustomerNumber {
                    value: invalid.to_string()
                })
            );
        }
    }

    #[test]
    fn customer_number_deserializes_with_validation() {
        let number: CustomerNumber =
            serde_json::from_str("\"0123456789\"").expect("valid number deserializes");
        assert_eq!(number.as_str(), "0123456789");
        assert!(serde_json::from_str::<CustomerNumber>("\"123\"").is_err());
    }

    #[test]
    fn account_key_splits_on_dash() {
        let key: AccountKey = "5479-1234567".parse().expect("key parses");
        assert_eq!(key.reg_no(), "5479");
        assert_eq!(key.account_no(), "1234567");
        assert_eq!(key.to_string(), "5479-1234567");
    }

    #[test]
    fn malformed_account_keys_are_rejected() {
        for invalid in ["547-1234567", "5479-", "5479", "54791234567", "5479-12a4"] {
            assert!(invalid.parse::<AccountKey>().is_err(), "{invalid:?}");
        }
        assert!(AccountKey::new("5479", "").is_err());
        assert!(AccountKey::new("54790", "1").is_err());
    }
}
