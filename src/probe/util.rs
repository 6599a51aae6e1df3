use rand::Rng;

const DECOY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase-alphanumeric local part.
pub fn random_local_part(len: usize) -> String {
    let length = len.clamp(6, 32);
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(DECOY_ALPHABET[rng.gen_range(0..DECOY_ALPHABET.len())]))
        .collect()
}

pub fn decoy_address(domain: &str, len: usize) -> String {
    format!("{}@{domain}", random_local_part(len))
}

pub(crate) fn elapsed_ms(started: tokio::time::Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoys_are_lowercase_alphanumeric() {
        let local = random_local_part(8);
        assert_eq!(local.len(), 8);
        assert!(
            local
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn decoy_length_is_clamped() {
        assert_eq!(random_local_part(1).len(), 6);
        assert_eq!(random_local_part(100).len(), 32);
    }

    #[test]
    fn decoy_address_keeps_domain() {
        let addr = decoy_address("example.com", 8);
        let (local, domain) = addr.split_once('@').expect("has @");
        assert_eq!(domain, "example.com");
        assert_eq!(local.len(), 8);
    }

    #[test]
    fn consecutive_decoys_differ() {
        assert_ne!(random_local_part(16), random_local_part(16));
    }
}
