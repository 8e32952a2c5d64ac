//! Paid entry verification boundary and replay protection.
//!
//! Checking an entry transaction against a chain is an external concern.
//! The store only needs an [`EntryVerifier`] to ask, and it keeps the set of
//! hashes already used so the same payment cannot admit two agents. The
//! verifier is always called without the world lock held.

/// Errors from paid entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    /// Free joins are disabled and no entry transaction was supplied.
    #[error("payment required: join with an entry transaction")]
    PaymentRequired,

    /// The transaction hash is not `0x` followed by 64 hex digits.
    #[error("invalid entry tx hash: {0:?}")]
    InvalidTxHash(String),

    /// The transaction hash was already used to join.
    #[error("entry tx hash already used: {0}")]
    ReplayedTx(String),

    /// The verifier rejected the transaction.
    #[error("entry verification failed: {message}")]
    Rejected {
        /// Why the verifier refused it.
        message: String,
    },

    /// The verifier could not reach its backend.
    #[error("entry verifier unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl EntryError {
    /// Whether the caller's request was at fault, as opposed to the verifier
    /// backend.
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }
}

/// A transaction the verifier accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEntry {
    /// The normalized transaction hash.
    pub tx_hash: String,
    /// The paying address, as reported by the verifier.
    pub from: String,
    /// Amount paid, in the chain's smallest unit.
    pub value_wei: u128,
}

/// Verifies entry transactions.
pub trait EntryVerifier {
    /// Check a normalized transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Rejected`] for a transaction that does not pay
    /// for entry, or [`EntryError::Unavailable`] when the check could not
    /// be made.
    fn verify(&self, tx_hash: &str) -> Result<VerifiedEntry, EntryError>;
}

/// A verifier that accepts every well-formed hash as paying a fixed value.
///
/// For local runs and tests where no chain is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEntryVerifier {
    /// Value reported for every accepted entry.
    pub value_wei: u128,
}

impl StubEntryVerifier {
    /// Create a stub verifier reporting `value_wei` per entry.
    pub const fn new(value_wei: u128) -> Self {
        Self { value_wei }
    }
}

impl EntryVerifier for StubEntryVerifier {
    fn verify(&self, tx_hash: &str) -> Result<VerifiedEntry, EntryError> {
        let tx_hash = normalize_tx_hash(tx_hash)?;
        Ok(VerifiedEntry {
            tx_hash,
            from: String::new(),
            value_wei: self.value_wei,
        })
    }
}

/// Trim and lower-case a transaction hash, checking its shape.
///
/// # Errors
///
/// Returns [`EntryError::InvalidTxHash`] unless the hash is `0x` followed
/// by exactly 64 hex digits.
pub fn normalize_tx_hash(raw: &str) -> Result<String, EntryError> {
    let normalized = raw.trim().to_ascii_lowercase();
    let well_formed = normalized
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()));
    if well_formed {
        Ok(normalized)
    } else {
        Err(EntryError::InvalidTxHash(raw.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_trimmed_and_lower_cased() {
        let raw = format!("  0X{}  ", "AB".repeat(32));
        assert_eq!(
            normalize_tx_hash(&raw).unwrap(),
            format!("0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        assert!(normalize_tx_hash("0x1234").is_err());
        assert!(normalize_tx_hash(&"1".repeat(66)).is_err());
        assert!(normalize_tx_hash(&format!("0x{}", "g".repeat(64))).is_err());
    }

    #[test]
    fn stub_reports_its_value() {
        let verifier = StubEntryVerifier::new(7);
        let entry = verifier.verify(&format!("0x{}", "1".repeat(64))).unwrap();
        assert_eq!(entry.value_wei, 7);
    }

    #[test]
    fn only_backend_failures_are_not_rejections() {
        assert!(EntryError::PaymentRequired.is_rejection());
        assert!(
            !EntryError::Unavailable {
                message: "timeout".to_owned()
            }
            .is_rejection()
        );
    }
}
