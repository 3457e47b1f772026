//! Similarity between two agents' controllers.
//!
//! The state machine compares similarity against configured thresholds and
//! otherwise treats it as opaque.

use crate::controller::Controller;

/// Similarity in `[0, 1]` between two controllers.
///
/// Controllers with equal-length genomes score the fraction of identical
/// genome bytes. Any other pairing is considered fully similar.
#[allow(clippy::cast_precision_loss)]
pub fn genome_similarity(a: &dyn Controller, b: &dyn Controller) -> f64 {
    match (a.genome(), b.genome()) {
        (Some(x), Some(y)) if x.len() == y.len() && !x.is_empty() => {
            let same = x.iter().zip(y).filter(|(p, q)| p == q).count();
            same as f64 / x.len() as f64
        }
        _ => 1.0,
    }
}
