use rand::Rng;

pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random six character code from `A-Z0-9`.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

/// Canonical form used for every lookup and insert.
pub fn normalize_room_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// True for a normalized code of the generated shape.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN
        && code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
