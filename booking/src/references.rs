//! Booking reference generation

use busline_core::environment::ReferenceGenerator;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random part of a reference
pub const REFERENCE_LEN: usize = 9;

/// `ECO-` followed by nine random base-36 characters
///
/// References are short enough to read out over the phone; collisions are
/// possible and not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReferences;

impl ReferenceGenerator for RandomReferences {
    fn next_reference(&self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..REFERENCE_LEN)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        format!("ECO-{suffix}")
    }
}
