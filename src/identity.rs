//! Merchant Identity Resolution
//!
//! A merchant is identified by the hardware address of the host's first
//! usable network interface. The identity is stable across restarts as long
//! as the host keeps the same interface; swapping interfaces invalidates the
//! cached connect token (see `session::token`).

use mac_address::MacAddressIterator;

/// Sentinel identity used when no usable interface exists
pub const UNKNOWN_IDENTITY: &str = "unknown-mac";

/// Supplies the current merchant identity
///
/// Implementations must never fail; absence of a usable interface is a
/// normal case reported via [`UNKNOWN_IDENTITY`].
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self) -> String;
}

/// Production resolver backed by the host's network interfaces
///
/// Returns the first hardware address that is not all-zero (loopback
/// interfaces report the all-zero address), formatted lowercase
/// colon-separated.
pub struct MacResolver;

impl IdentityResolver for MacResolver {
    fn resolve(&self) -> String {
        let addresses = match MacAddressIterator::new() {
            Ok(iter) => iter,
            Err(_) => return UNKNOWN_IDENTITY.to_string(),
        };

        addresses
            .filter(|mac| mac.bytes() != [0u8; 6])
            .map(|mac| mac.to_string().to_lowercase())
            .next()
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
    }
}

/// Resolver returning a preset identity, for tests
#[cfg(test)]
pub struct FixedResolver(pub String);

#[cfg(test)]
impl IdentityResolver for FixedResolver {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}
