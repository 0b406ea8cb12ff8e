//! Identifier generation for entities created without a caller-supplied uid.
//!
//! Identifiers only need to be unique within one graph, so a thread-local
//! PRNG is used rather than the OS entropy source.

use rand::RngCore;
use uuid::Builder;

/// Generate a version-4 shaped identifier (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`).
pub fn generate() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}
