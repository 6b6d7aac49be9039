use rand::Rng;

/// Characters a completion code may contain. Visually confusable characters
/// (I, O, 0, 1) are excluded.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a completion code.
pub const CODE_LEN: usize = 8;

/// Generates a participant-facing completion code.
///
/// Uniqueness is probabilistic only; codes are proof of completion, not keys.
pub fn generate_completion_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
