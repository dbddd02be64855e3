//! Random fragment generation
//!
//! Uniform, independent draws from the configured [`Charset`]. There is
//! deliberately no structural bias toward valid syntax; the whole point is
//! raw sampling of the combination space.

use rand::Rng;

use crate::charset::Charset;

/// Generate `len` characters drawn uniformly at random from `charset`.
///
/// `len == 0` yields an empty string, which still drives a deterministic
/// empty-program-body probe downstream.
pub fn random_content<R: Rng>(rng: &mut R, len: usize, charset: &Charset) -> String {
    let pool = charset.as_slice();
    (0..len).map(|_| pool[rng.gen_range(0..pool.len())]).collect()
}

/// Seed for one task's RNG, derived from the operating process id and the
/// task id. Repeated runs with the same ids reproduce the same content;
/// concurrent tasks get statistically independent streams. This is a
/// reproducibility convenience, not a collision-free guarantee.
pub fn task_seed(process_id: u32, task_id: u64) -> u64 {
    u64::from(process_id).wrapping_add(task_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharsetOptions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn digits() -> Charset {
        Charset::build(&CharsetOptions {
            custom: Some("0123456789".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn output_has_exact_length_and_stays_in_alphabet() {
        let charset = digits();
        let mut rng = StdRng::seed_from_u64(7);
        for len in [0usize, 1, 5, 128] {
            let content = random_content(&mut rng, len, &charset);
            assert_eq!(content.chars().count(), len);
            assert!(content.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn zero_length_is_empty() {
        let charset = digits();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(random_content(&mut rng, 0, &charset), "");
    }

    #[test]
    fn same_seed_reproduces_content() {
        let charset = digits();
        let a = random_content(&mut StdRng::seed_from_u64(42), 64, &charset);
        let b = random_content(&mut StdRng::seed_from_u64(42), 64, &charset);
        assert_eq!(a, b);
    }

    #[test]
    fn different_task_ids_give_different_seeds() {
        assert_ne!(task_seed(1000, 0), task_seed(1000, 1));
        assert_ne!(task_seed(1000, 5), task_seed(1001, 5));
    }
}
