//! Content hashing: digests, deterministic scores and seeded jitter

use rand::{SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};

/// Hex digest of the content, used as cache key and in logs
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Map bytes onto 0..=100 by reducing the leading 32 bits of the digest modulo 101.
pub fn deterministic_score(data: &[u8]) -> f64 {
    let digest = Sha256::digest(data);
    let leading = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (leading % 101) as f64
}

/// Salted hash mapped onto [0, 1) in steps of 1/1000.
pub fn salted_unit(data: &[u8], salt: &[u8]) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.update(salt);
    let digest = hasher.finalize();

    let mut leading = [0u8; 8];
    leading.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(leading) % 1000) as f64 / 1000.0
}

/// RNG seeded from the content so jittered values repeat for identical uploads
pub fn seeded_rng(data: &[u8]) -> StdRng {
    let digest = Sha256::digest(data);
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn deterministic_score_uses_leading_bits() {
        // 0xba7816bf % 101
        assert_eq!(deterministic_score(b"abc"), (0xba78_16bf_u32 % 101) as f64);
        assert_eq!(deterministic_score(b"abc"), deterministic_score(b"abc"));
    }

    #[test]
    fn deterministic_score_stays_in_range() {
        for i in 0..500u32 {
            let score = deterministic_score(&i.to_le_bytes());
            assert!((0.0..=100.0).contains(&score));
            assert_eq!(score.fract(), 0.0);
        }
    }

    #[test]
    fn salts_change_the_value() {
        let data = b"frame pixels";
        let a = salted_unit(data, b"fft");
        let b = salted_unit(data, b"noise");
        assert!((0.0..1.0).contains(&a));
        assert!((0.0..1.0).contains(&b));
        assert_eq!(a, salted_unit(data, b"fft"));
        assert_ne!(
            (0..20).map(|i| salted_unit(&[i], b"fft")).collect::<Vec<_>>(),
            (0..20).map(|i| salted_unit(&[i], b"noise")).collect::<Vec<_>>()
        );
    }

    #[test]
    fn seeded_rng_repeats() {
        let mut a = seeded_rng(b"same");
        let mut b = seeded_rng(b"same");
        let xs: Vec<f64> = (0..5).map(|_| a.random()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }
}
