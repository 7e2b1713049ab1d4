//! Bayesian-average rating over a candidate pool

use crate::retrieval::Candidate;

/// Pool-wide statistics the Bayesian average pulls towards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingPrior {
    /// Mean rating across the pool, weighted by rating count
    pub global_avg: f64,
    /// Confidence threshold: rating count at the configured percentile
    pub confidence: f64,
}

impl RatingPrior {
    /// Compute the prior for `candidates` using the `percentile`-th
    /// rating count (0.0-1.0) as confidence threshold
    pub fn from_candidates(candidates: &[Candidate], percentile: f64) -> Self {
        let counts: Vec<f64> = candidates.iter().map(|c| evidence(c).1 as f64).collect();

        Self {
            global_avg: global_average(candidates),
            confidence: percentile_linear(&counts, percentile),
        }
    }

    /// `(C * avg + r * n) / (C + n)`, falling back to the global average
    /// when there is neither confidence nor evidence
    pub fn bayesian_rating(&self, candidate: &Candidate) -> f64 {
        let (rating, count) = evidence(candidate);
        let count = count as f64;
        let denominator = self.confidence + count;

        if denominator <= 0.0 {
            return self.global_avg;
        }

        (self.confidence * self.global_avg + rating * count) / denominator
    }
}

/// Rating and count actually backing a candidate; unrated recipes carry none
fn evidence(candidate: &Candidate) -> (f64, u64) {
    match candidate.rating {
        Some(rating) => (rating, candidate.rating_count),
        None => (0.0, 0),
    }
}

fn global_average(candidates: &[Candidate]) -> f64 {
    let (weighted, total) = candidates.iter().fold((0.0, 0u64), |(sum, n), c| {
        let (rating, count) = evidence(c);
        (sum + rating * count as f64, n + count)
    });

    if total > 0 {
        return weighted / total as f64;
    }

    let rated: Vec<f64> = candidates.iter().filter_map(|c| c.rating).collect();
    if rated.is_empty() {
        0.0
    } else {
        rated.iter().sum::<f64>() / rated.len() as f64
    }
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile_linear(values: &[f64], percentile: f64) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));

            let rank = percentile.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;

            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(id: &str, rating: f64, count: u64) -> Candidate {
        Candidate::new(id, id).with_rating(rating, count)
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 100.0];
        assert!((percentile_linear(&values, 0.1) - 10.9).abs() < 1e-9);

        let values = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert!((percentile_linear(&values, 0.5) - 3.0).abs() < 1e-9);
        assert!((percentile_linear(&values, 0.1) - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_small_inputs() {
        assert_eq!(percentile_linear(&[], 0.1), 0.0);
        assert_eq!(percentile_linear(&[42.0], 0.1), 42.0);
    }

    #[test]
    fn test_global_average_is_count_weighted() {
        let pool = [rated("a", 5.0, 1), rated("b", 4.0, 3)];
        let prior = RatingPrior::from_candidates(&pool, 0.1);
        assert!((prior.global_avg - 4.25).abs() < 1e-9);
    }

    #[test]
    fn test_global_average_without_counts_is_plain_mean() {
        let pool = [
            rated("a", 4.0, 0),
            rated("b", 3.0, 0),
            Candidate::new("c", "c"),
        ];
        let prior = RatingPrior::from_candidates(&pool, 0.1);
        assert!((prior.global_avg - 3.5).abs() < 1e-9);
        assert_eq!(prior.confidence, 0.0);
    }

    #[test]
    fn test_global_average_with_nothing_rated() {
        let pool = [Candidate::new("a", "a"), Candidate::new("b", "b")];
        assert_eq!(RatingPrior::from_candidates(&pool, 0.1).global_avg, 0.0);
    }

    #[test]
    fn test_zero_counts_fall_back_to_global_average() {
        let pool = [rated("a", 4.5, 0), rated("b", 2.5, 0), rated("c", 3.0, 0)];
        let prior = RatingPrior::from_candidates(&pool, 0.1);

        for candidate in &pool {
            assert!((prior.bayesian_rating(candidate) - prior.global_avg).abs() < 1e-12);
        }
    }

    #[test]
    fn test_heavy_evidence_stays_near_raw_rating() {
        let mut pool: Vec<Candidate> = (0..9)
            .map(|i| rated(&format!("r{}", i), 3.0, 10))
            .collect();
        pool.push(rated("popular", 4.5, 10_000));

        let prior = RatingPrior::from_candidates(&pool, 0.1);
        assert_eq!(prior.confidence, 10.0);

        let bayesian = prior.bayesian_rating(&pool[9]);
        assert!((bayesian - 4.5).abs() < 0.01, "got {}", bayesian);
    }

    #[test]
    fn test_identical_counts_set_confidence() {
        let pool = [rated("a", 4.0, 25), rated("b", 3.0, 25), rated("c", 5.0, 25)];
        let prior = RatingPrior::from_candidates(&pool, 0.1);
        assert_eq!(prior.confidence, 25.0);
        assert!((prior.bayesian_rating(&pool[2]) - 4.5).abs() < 1e-9);
    }
}
