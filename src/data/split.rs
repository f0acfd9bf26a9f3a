//! Seeded train/holdout split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::TaxCase;

/// Rows used for fitting and rows reserved for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<TaxCase>,
    pub holdout: Vec<TaxCase>,
}

/// Shuffle with `seed` and reserve `ceil(fraction · n)` rows for holdout.
///
/// Returns everything as training data when `fraction` is not in `(0, 1)` or
/// the split would leave fewer than 2 training rows.
pub fn split_holdout(rows: Vec<TaxCase>, fraction: f64, seed: u64) -> Split {
    let n = rows.len();
    let n_holdout = if fraction > 0.0 && fraction < 1.0 {
        (fraction * n as f64).ceil() as usize
    } else {
        0
    };

    if n_holdout == 0 || n.saturating_sub(n_holdout) < 2 {
        return Split {
            train: rows,
            holdout: Vec::new(),
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = rows;
    shuffled.shuffle(&mut rng);
    let train = shuffled.split_off(n_holdout);

    Split {
        train,
        holdout: shuffled,
    }
}
