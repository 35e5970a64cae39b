use crate::models::Strategy;

/// Admission probability (percent) and risk tier of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub probability: i32,
    pub strategy: Strategy,
}

/// Used when either the candidate score or the target's cutoff is unknown
pub const FALLBACK: Classification = Classification {
    probability: 50,
    strategy: Strategy::Stable,
};

/// Classify a target by the gap between the candidate's score and its cutoff.
///
/// Probability is a step function of `diff = candidate - cutoff`:
/// `<= -20 → 0`, `<= -10 → 20`, `<= 0 → 40`, `<= 10 → 60`, `<= 20 → 80`, else `95`.
/// Strategy: `diff <= -5` is rush, `diff >= 10` is safe, stable in between.
#[inline]
pub fn classify(candidate_score: i32, cutoff_score: i32) -> Classification {
    let diff = i64::from(candidate_score) - i64::from(cutoff_score);

    let probability = match diff {
        d if d <= -20 => 0,
        d if d <= -10 => 20,
        d if d <= 0 => 40,
        d if d <= 10 => 60,
        d if d <= 20 => 80,
        _ => 95,
    };

    let strategy = if diff <= -5 {
        Strategy::Rush
    } else if diff >= 10 {
        Strategy::Safe
    } else {
        Strategy::Stable
    };

    Classification { probability, strategy }
}

/// [`classify`] when both scores are known, [`FALLBACK`] otherwise
#[inline]
pub fn classify_or_fallback(candidate_score: Option<i32>, cutoff_score: Option<i32>) -> Classification {
    match (candidate_score, cutoff_score) {
        (Some(candidate), Some(cutoff)) => classify(candidate, cutoff),
        _ => FALLBACK,
    }
}
