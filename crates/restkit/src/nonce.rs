//! Random string generation

use rand::RngCore;

/// 64-character nonce alphabet: digits, uppercase (sans `W`), lowercase,
/// `-`, `.` and `_`. Exactly 64 entries, so rejection against the alphabet
/// length leaves no modulo bias.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

/// Generate a cryptographically random string of exactly `length` characters
///
/// Bytes are drawn from an OS-seeded CSPRNG and rejection-sampled: a byte is
/// used only if it indexes into the alphabet, otherwise it is discarded and
/// redrawn.
///
/// # Panics
///
/// Panics if `length` is zero (a programming error, not a recoverable
/// failure). An unavailable entropy source aborts inside `rand`; callers
/// cannot recover from that either.
pub fn random_string(length: usize) -> String {
    assert!(length > 0, "nonce length must be greater than zero");

    let mut rng = rand::rng();
    let mut result = String::with_capacity(length);
    let mut byte = [0u8; 1];

    while result.len() < length {
        rng.fill_bytes(&mut byte);
        let index = byte[0] as usize;
        if index < ALPHABET.len() {
            result.push(ALPHABET[index] as char);
        }
    }

    result
}
