//! Deterministic aggregate root derivation.

use uuid::Uuid;

/// RFC 4122 reserved namespace used for all root derivations: NAMESPACE_OID.
pub const NAMESPACE_OID: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x12, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30, 0xc8,
]);

/// Derive a deterministic aggregate root from a domain and a natural key.
///
/// `compute_root(domain, key) = uuid5(NAMESPACE_OID, "angzarr" + domain + key)`.
/// Two calls with the same domain and key always produce the same root, so
/// callers can address an aggregate without a prior lookup.
///
/// # Examples
/// ```
/// use angzarr_client::compute_root;
/// assert_eq!(compute_root("player", "a@b.com"), compute_root("player", "a@b.com"));
/// ```
pub fn compute_root(domain: &str, key: &str) -> Uuid {
    let name = format!("angzarr{domain}{key}");
    Uuid::new_v5(&NAMESPACE_OID, name.as_bytes())
}
