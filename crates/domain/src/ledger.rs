use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tallyflow_core::{AppError, AppResult};

/// General-ledger account code, e.g. `5100` or `5100-Equipment`.
///
/// Only the identifier format is checked; whether the account exists in the
/// chart of accounts is the ledger's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlAccount(String);

impl GlAccount {
    /// Parses an account code: four digits, optionally followed by `-` and a label.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        let (number, label) = match trimmed.split_once('-') {
            Some((number, label)) => (number, Some(label)),
            None => (trimmed, None),
        };

        if number.len() != 4 || !number.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "gl account '{value}' must start with a four-digit account number"
            )));
        }

        if let Some(label) = label {
            let valid_label = label
                .chars()
                .next()
                .is_some_and(|first| first.is_ascii_alphanumeric())
                && label
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_' | '&'));
            if !valid_label {
                return Err(AppError::Validation(format!(
                    "gl account '{value}' has an invalid label"
                )));
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the full account code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the four-digit account number.
    #[must_use]
    pub fn account_number(&self) -> &str {
        &self.0[..4]
    }
}

impl Display for GlAccount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Cost center code charged at posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostCenter(String);

impl CostCenter {
    const MAX_LENGTH: usize = 32;

    /// Parses a cost center code of letters, digits, `-` or `_`.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > Self::MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "cost center must be between 1 and {} characters",
                Self::MAX_LENGTH
            )));
        }

        if !trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        {
            return Err(AppError::Validation(format!(
                "cost center '{value}' contains invalid characters"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the cost center code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CostCenter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{CostCenter, GlAccount};

    #[test]
    fn gl_account_accepts_number_with_label() {
        let account = GlAccount::parse("5100-Equipment");
        assert!(account.is_ok());
        let account = account.unwrap_or_else(|_| unreachable!());
        assert_eq!(account.account_number(), "5100");
        assert_eq!(account.as_str(), "5100-Equipment");
    }

    #[test]
    fn gl_account_accepts_bare_number() {
        assert!(GlAccount::parse("4000").is_ok());
    }

    #[test]
    fn gl_account_rejects_malformed_codes() {
        for value in ["", "51-Equipment", "ABCD", "5100-", "5100-!x", "51000"] {
            assert!(GlAccount::parse(value).is_err(), "accepted '{value}'");
        }
    }

    #[test]
    fn cost_center_rejects_spaces() {
        assert!(CostCenter::parse("LAB 01").is_err());
        assert!(CostCenter::parse("LAB-01").is_ok());
    }
}
