//! Random identifiers for generated fixtures.

use rand::Rng;

/// Prefix of generated confidential client ids.
pub const CLIENT_ID_PREFIX: &str = "perf-client-";

const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a random lowercase alphanumeric string.
#[must_use]
pub fn random_lower_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(LOWER_ALPHANUMERIC[rng.random_range(0..LOWER_ALPHANUMERIC.len())]))
        .collect()
}

/// Generates a client id such as `perf-client-k3v9a0qz`.
#[must_use]
pub fn generate_client_id() -> String {
    format!("{CLIENT_ID_PREFIX}{}", random_lower_alphanumeric(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_client_id_shape() {
        let id = generate_client_id();
        assert!(id.starts_with(CLIENT_ID_PREFIX));
        let suffix = &id[CLIENT_ID_PREFIX.len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_client_id(), generate_client_id());
    }
}
