//! Display helpers for addresses.

use alloy_primitives::Address;

/// Shortens an address to `0x1234...abcd` using its checksummed form.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
