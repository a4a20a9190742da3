//! Mastermind feedback scoring.

use crate::game::record::Feedback;
use std::collections::HashMap;

/// Score `guess` against `secret`.
///
/// Black pegs count exact-position matches. Those positions are then set
/// aside, and white pegs count the size of the multiset intersection of the
/// remaining secret and guess tokens, so a repeated color never earns more
/// white pegs than it has unmatched occurrences on either side.
///
/// Both slices are expected to have the same length; extra tokens on the
/// longer side are ignored.
pub fn score_feedback(secret: &[String], guess: &[String]) -> Feedback {
    let mut black = 0;
    let mut secret_rest: HashMap<&str, usize> = HashMap::new();
    let mut guess_rest: HashMap<&str, usize> = HashMap::new();

    for (s, g) in secret.iter().zip(guess) {
        if s == g {
            black += 1;
        } else {
            *secret_rest.entry(s.as_str()).or_insert(0) += 1;
            *guess_rest.entry(g.as_str()).or_insert(0) += 1;
        }
    }

    let white = guess_rest
        .iter()
        .map(|(token, &count)| count.min(secret_rest.get(token).copied().unwrap_or(0)))
        .sum();

    Feedback {
        black,
        white,
        guess: guess.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn code(tokens: &str) -> Vec<String> {
        tokens.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn duplicate_colors_in_secret() {
        let fb = score_feedback(&code("RRGB"), &code("GBRR"));
        assert_eq!((fb.black, fb.white), (0, 4));
    }

    #[test]
    fn mixed_exact_and_color_matches() {
        let fb = score_feedback(&code("RGBY"), &code("RYBG"));
        assert_eq!((fb.black, fb.white), (2, 2));
        assert_eq!(fb.guess, code("RYBG"));
    }

    #[test]
    fn repeated_guess_color_is_capped_by_secret() {
        // Secret has one unmatched R, guess offers three.
        let fb = score_feedback(&code("RGGG"), &code("BRRR"));
        assert_eq!((fb.black, fb.white), (0, 1));
    }

    #[test]
    fn exact_matches_are_not_double_counted() {
        let fb = score_feedback(&code("RRGB"), &code("RRRR"));
        assert_eq!((fb.black, fb.white), (2, 0));
    }

    #[test]
    fn no_overlap() {
        let fb = score_feedback(&code("RRRR"), &code("GGGG"));
        assert_eq!((fb.black, fb.white), (0, 0));
    }

    #[test]
    fn pegs_never_exceed_length_and_self_match_is_all_black() {
        let colors = code("RGUYKW");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let len = rng.gen_range(1..7);
            let secret: Vec<String> = (0..len)
                .map(|_| colors[rng.gen_range(0..colors.len())].clone())
                .collect();
            let guess: Vec<String> = (0..len)
                .map(|_| colors[rng.gen_range(0..colors.len())].clone())
                .collect();

            let fb = score_feedback(&secret, &guess);
            assert!(fb.black + fb.white <= len);

            let own = score_feedback(&secret, &secret);
            assert_eq!((own.black, own.white), (len, 0));
        }
    }
}
