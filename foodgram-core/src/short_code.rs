//! Short codes for shareable recipe links.
//!
//! A short code is six characters drawn uniformly from `[A-Za-z0-9]`, giving
//! 62^6 (about 5.7e10) possible values. Uniqueness is decided by storage, not
//! by this module: [`claim_unique_short_code`] keeps sampling candidates and
//! hands each one to a caller-supplied claim step until storage accepts one.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::error::ShortCodeError;

pub const SHORT_CODE_LENGTH: usize = 6;

/// Upper bound on candidates tried before giving up.
pub const MAX_SHORT_CODE_ATTEMPTS: u32 = 16;

/// Outcome of trying to reserve a candidate code in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim<T> {
    /// Storage accepted the code; carries whatever the claim step produced
    /// (usually the id of the freshly inserted row).
    Claimed(T),
    /// Some other row already holds this code.
    Taken,
}

/// Generate a random candidate code.
pub fn generate_short_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(Alphanumeric)
        .take(SHORT_CODE_LENGTH)
        .map(char::from)
        .collect()
}

pub fn is_valid_short_code(code: &str) -> bool {
    code.len() == SHORT_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Draw candidates until `try_claim` reserves one.
///
/// `try_claim` must be atomic with respect to other writers (an insert that
/// fails on a unique constraint, for instance). A `Taken` answer discards the
/// candidate and draws again; after `max_attempts` rejections this returns
/// [`ShortCodeError::Exhausted`]. Errors from `try_claim` stop the loop
/// immediately.
pub fn claim_unique_short_code<R, T, E, F>(
    rng: &mut R,
    max_attempts: u32,
    mut try_claim: F,
) -> Result<(String, T), ShortCodeError<E>>
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> Result<Claim<T>, E>,
{
    for attempt in 1..=max_attempts {
        let code = generate_short_code(rng);
        match try_claim(&code).map_err(ShortCodeError::Storage)? {
            Claim::Claimed(value) => return Ok((code, value)),
            Claim::Taken => {
                tracing::debug!(attempt, code = %code, "short code collision, retrying");
            }
        }
    }

    tracing::error!(
        attempts = max_attempts,
        "short code space exhausted, could not assign a free code"
    );
    Err(ShortCodeError::Exhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let code = generate_short_code(&mut rng);
            assert_eq!(code.len(), SHORT_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
            assert!(is_valid_short_code(&code));
        }
    }

    #[test]
    fn test_generated_codes_use_whole_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut lower = false;
        let mut upper = false;
        let mut digit = false;
        for _ in 0..500 {
            for c in generate_short_code(&mut rng).chars() {
                lower |= c.is_ascii_lowercase();
                upper |= c.is_ascii_uppercase();
                digit |= c.is_ascii_digit();
            }
        }
        assert!(lower && upper && digit);
    }

    #[test]
    fn test_is_valid_short_code() {
        assert!(is_valid_short_code("Ab12Cd"));
        assert!(!is_valid_short_code("Ab12C"));
        assert!(!is_valid_short_code("Ab12Cde"));
        assert!(!is_valid_short_code("Ab-2Cd"));
        assert!(!is_valid_short_code("Ab12Cé"));
    }

    #[test]
    fn test_claim_returns_first_free_code() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut taken = HashSet::new();

        let (code, id) = claim_unique_short_code(&mut rng, 4, |code| {
            Ok::<_, ()>(if taken.insert(code.to_string()) {
                Claim::Claimed(99)
            } else {
                Claim::Taken
            })
        })
        .unwrap();

        assert_eq!(id, 99);
        assert!(is_valid_short_code(&code));
    }

    #[test]
    fn test_claim_retries_on_collision() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = Vec::new();

        let (code, _) = claim_unique_short_code(&mut rng, 5, |code| {
            seen.push(code.to_string());
            Ok::<_, ()>(if seen.len() < 3 {
                Claim::Taken
            } else {
                Claim::Claimed(())
            })
        })
        .unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&code));
    }

    #[test]
    fn test_claim_gives_up_after_max_attempts() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut calls = 0;

        let result = claim_unique_short_code(&mut rng, 3, |_| {
            calls += 1;
            Ok::<Claim<()>, ()>(Claim::Taken)
        });

        assert!(matches!(
            result,
            Err(ShortCodeError::Exhausted { attempts: 3 })
        ));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_claim_propagates_storage_errors() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut calls = 0;

        let result = claim_unique_short_code(&mut rng, 10, |_| {
            calls += 1;
            Err::<Claim<()>, _>("connection reset")
        });

        assert!(matches!(
            result,
            Err(ShortCodeError::Storage("connection reset"))
        ));
        assert_eq!(calls, 1);
    }
}
