//! Connect-Token Cache
//!
//! Decides when the cached connect token must be regenerated: on first use
//! of a record, when the merchant identity changes (e.g. the host's network
//! interface was swapped), or when no token exists yet. The encoder that
//! turns the connect URL into a scannable payload is external and sits
//! behind the [`TokenEncoder`] trait.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use super::types::MerchantRecord;

/// Encoder errors
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode empty URL")]
    EmptyUrl,

    #[error("encoder rejected URL: {0}")]
    Rejected(String),
}

/// Turns a connect URL into an opaque token
///
/// Implementations render the URL as whatever payload the customer-facing
/// client can consume; the default produces a base64 `data:` URL. Swap in a
/// scannable-image encoder behind the same seam.
pub trait TokenEncoder: Send + Sync {
    fn encode(&self, url: &str) -> Result<String, EncodeError>;
}

/// Default encoder producing a base64 `data:` URL payload
pub struct Base64TokenEncoder;

impl TokenEncoder for Base64TokenEncoder {
    fn encode(&self, url: &str) -> Result<String, EncodeError> {
        if url.is_empty() {
            return Err(EncodeError::EmptyUrl);
        }
        Ok(format!("data:text/plain;base64,{}", STANDARD.encode(url)))
    }
}

/// Build the URL customers use to connect to a specific merchant
pub fn connect_url(scheme: &str, host: &str, identity: &str) -> String {
    format!("{}://{}/customer.html?merchant={}", scheme, host, identity)
}

/// Ensure `record` carries a token valid for `current_identity`
///
/// Returns `true` when the record changed and must be persisted by the
/// caller. On encoder failure the error propagates and the token stays
/// unset, so the next call retries; no partial token is ever stored.
pub fn ensure_token<F>(
    record: &mut MerchantRecord,
    current_identity: &str,
    build_url: F,
    encoder: &dyn TokenEncoder,
) -> Result<bool, EncodeError>
where
    F: FnOnce() -> String,
{
    let mut changed = false;

    match record.identity.as_deref() {
        None => {
            record.identity = Some(current_identity.to_string());
            record.token = None;
            changed = true;
        }
        Some(previous) if previous != current_identity => {
            tracing::info!(
                previous = %previous,
                current = %current_identity,
                "merchant identity changed, regenerating connect token"
            );
            record.identity = Some(current_identity.to_string());
            record.token = None;
            changed = true;
        }
        Some(_) => {}
    }

    if record.token.is_none() {
        let token = encoder.encode(&build_url())?;
        record.token = Some(token);
        changed = true;
    }

    Ok(changed)
}

/// Encoder that always fails, for tests
#[cfg(test)]
pub struct FailingEncoder;

#[cfg(test)]
impl TokenEncoder for FailingEncoder {
    fn encode(&self, url: &str) -> Result<String, EncodeError> {
        Err(EncodeError::Rejected(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encoder that counts invocations
    struct CountingEncoder(AtomicUsize);

    impl TokenEncoder for CountingEncoder {
        fn encode(&self, url: &str) -> Result<String, EncodeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Base64TokenEncoder.encode(url)
        }
    }

    fn url_for(identity: &str) -> String {
        connect_url("http", "pos.local:3000", identity)
    }

    #[test]
    fn test_first_call_encodes_and_adopts_identity() {
        let mut record = MerchantRecord::default();
        let identity = "aa:bb:cc:dd:ee:ff";
        let encoder = CountingEncoder(Default::default());

        let changed =
            ensure_token(&mut record, identity, || url_for(identity), &encoder).unwrap();

        assert!(changed);
        assert_eq!(record.identity.as_deref(), Some(identity));
        assert_eq!(encoder.0.load(Ordering::SeqCst), 1);

        // Token source URL embeds the identity
        let token = record.token.as_deref().unwrap();
        let encoded = token.strip_prefix("data:text/plain;base64,").unwrap();
        let url = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(url.contains("merchant=aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_repeat_calls_are_idempotent() {
        let mut record = MerchantRecord::default();
        let identity = "aa:bb:cc:dd:ee:ff";
        let encoder = CountingEncoder(Default::default());

        ensure_token(&mut record, identity, || url_for(identity), &encoder).unwrap();
        let first_token = record.token.clone();

        for _ in 0..3 {
            let changed =
                ensure_token(&mut record, identity, || url_for(identity), &encoder).unwrap();
            assert!(!changed);
        }

        assert_eq!(record.token, first_token);
        assert_eq!(encoder.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_identity_change_invalidates_token() {
        let mut record = MerchantRecord::default();
        let encoder = CountingEncoder(Default::default());

        ensure_token(&mut record, "aa:aa:aa:aa:aa:aa", || {
            url_for("aa:aa:aa:aa:aa:aa")
        }, &encoder)
        .unwrap();
        let first_token = record.token.clone();

        let changed = ensure_token(&mut record, "bb:bb:bb:bb:bb:bb", || {
            url_for("bb:bb:bb:bb:bb:bb")
        }, &encoder)
        .unwrap();

        assert!(changed);
        assert_ne!(record.token, first_token);
        assert_eq!(record.identity.as_deref(), Some("bb:bb:bb:bb:bb:bb"));
        assert_eq!(encoder.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_encoder_failure_leaves_token_unset() {
        let mut record = MerchantRecord::default();
        let identity = "aa:bb:cc:dd:ee:ff";

        let result = ensure_token(&mut record, identity, || url_for(identity), &FailingEncoder);

        assert!(result.is_err());
        assert!(record.token.is_none());

        // Next call with a working encoder succeeds
        let changed = ensure_token(
            &mut record,
            identity,
            || url_for(identity),
            &Base64TokenEncoder,
        )
        .unwrap();
        assert!(changed);
        assert!(record.token.is_some());
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(matches!(
            Base64TokenEncoder.encode(""),
            Err(EncodeError::EmptyUrl)
        ));
    }
}
