//! Ordering and hashing policies, plus the stock families most tables use.
//!
//! Containers take these as plain function pointers so a table can carry its
//! policies by value. An [`OrderFn`] defines both chain sort order and
//! equality (two payloads are equal when it returns [`Ordering::Equal`]). A
//! [`HashFn`] maps a key to a bucket-selecting integer; any result `<= 0`
//! marks the key as invalid for that table, and insert/lookup/remove silently
//! reject it.

use core::cmp::Ordering;

/// Three-way comparison over raw payload bytes.
pub type OrderFn = fn(&[u8], &[u8]) -> Ordering;

/// Maps a key to a bucket-selecting integer. Results `<= 0` mark the key
/// invalid.
pub type HashFn = fn(&[u8]) -> i64;

#[inline]
fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes(bytes.try_into().expect("i32 payload must be 4 bytes"))
}

/// Orders two 4-byte native-endian `i32` payloads numerically.
///
/// # Panics
///
/// Panics if either payload is not exactly 4 bytes.
///
/// # Examples
///
/// ```rust
/// use core::cmp::Ordering;
///
/// use chain_table::policy::order_i32;
///
/// assert_eq!(order_i32(&3i32.to_ne_bytes(), &7i32.to_ne_bytes()), Ordering::Less);
/// assert_eq!(order_i32(&7i32.to_ne_bytes(), &7i32.to_ne_bytes()), Ordering::Equal);
/// ```
pub fn order_i32(a: &[u8], b: &[u8]) -> Ordering {
    read_i32(a).cmp(&read_i32(b))
}

/// Orders two payloads lexicographically by byte content.
///
/// For ASCII or UTF-8 text this matches string comparison.
pub fn order_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Hashes a 4-byte native-endian `i32` key to its absolute value.
///
/// Known limitation: zero hashes to `0`, which the table treats as an invalid
/// key, so a table using this helper silently ignores the key `0`. That is a
/// property of this helper, not of the container contract; supply a hash
/// function that never returns a non-positive value (such as `hash_fold`)
/// to accept every key.
///
/// # Panics
///
/// Panics if the key is not exactly 4 bytes.
pub fn hash_i32(key: &[u8]) -> i64 {
    i64::from(read_i32(key).unsigned_abs())
}

/// Hashes a key to its byte length plus one.
///
/// Cheap and always valid, but heavy on collisions for same-length keys.
pub fn hash_len(key: &[u8]) -> i64 {
    key.len() as i64 + 1
}

/// Buckets a key by the first letter of its text, `a` through `z`.
///
/// Intended for 26-bucket tables: letters hash to `26..=51` (the letter
/// index modulo 26), everything else (including an empty key) hashes to 26.
pub fn hash_alpha(key: &[u8]) -> i64 {
    let first = match key.first() {
        Some(byte) => byte.to_ascii_lowercase(),
        None => return 26,
    };
    if first.is_ascii_lowercase() {
        i64::from(first - b'a') + 26
    } else {
        26
    }
}

/// Hashes arbitrary key bytes with `foldhash`, never returning an invalid
/// result.
///
/// The general-purpose choice when keys are not small integers: every key is
/// valid and distribution is uniform across buckets.
///
/// # Examples
///
/// ```rust
/// use chain_table::policy::hash_fold;
///
/// assert!(hash_fold(b"") > 0);
/// assert!(hash_fold(b"any key at all") > 0);
/// ```
#[cfg(feature = "foldhash")]
pub fn hash_fold(key: &[u8]) -> i64 {
    use core::hash::BuildHasher;

    let hash = foldhash::fast::FixedState::default().hash_one(key);
    // Drop the top bit so the result fits in a positive i64; remap the one
    // remaining zero.
    core::cmp::max((hash >> 1) as i64, 1)
}
