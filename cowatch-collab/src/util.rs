use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// The alphabet invite codes are drawn from.
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Generates a code from the uppercase alphanumeric alphabet.
pub fn invite_code(length: usize) -> String {
    let mut rng = thread_rng();

    (0..length)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}
