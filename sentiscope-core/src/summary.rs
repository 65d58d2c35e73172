use crate::model::AnalysisResult;
use crate::model::Sentiment;

/// Number of equal-width confidence bins over [0, 1].
pub const CONFIDENCE_BINS: usize = 10;

/// Per-class totals in fixed display order: Positive, Negative, Neutral.
pub fn sentiment_counts(results: &[AnalysisResult]) -> [(Sentiment, usize); 3] {
    let mut counts = Sentiment::ALL.map(|sentiment| (sentiment, 0usize));
    for result in results {
        for slot in counts.iter_mut() {
            if slot.0 == result.sentiment {
                slot.1 += 1;
            }
        }
    }
    counts
}

/// Histogram of confidence scores across [`CONFIDENCE_BINS`] equal bins.
///
/// The top edge is inclusive: a confidence of exactly 1.0 lands in the last
/// bin rather than overflowing past it. Out-of-range values clamp to the
/// nearest bin.
pub fn confidence_histogram(results: &[AnalysisResult]) -> [usize; CONFIDENCE_BINS] {
    let mut bins = [0usize; CONFIDENCE_BINS];
    for result in results {
        let scaled = (result.confidence.max(0.0) * CONFIDENCE_BINS as f64) as usize;
        bins[scaled.min(CONFIDENCE_BINS - 1)] += 1;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(sentiment: Sentiment, confidence: f64) -> AnalysisResult {
        AnalysisResult {
            original_text: "t".to_string(),
            sentiment,
            confidence,
            keywords: vec![],
            explanation: String::new(),
        }
    }

    #[test]
    fn counts_come_back_in_fixed_class_order() {
        let results = vec![
            result_with(Sentiment::Neutral, 0.5),
            result_with(Sentiment::Positive, 0.9),
            result_with(Sentiment::Neutral, 0.4),
        ];

        let counts = sentiment_counts(&results);
        assert_eq!(counts[0], (Sentiment::Positive, 1));
        assert_eq!(counts[1], (Sentiment::Negative, 0));
        assert_eq!(counts[2], (Sentiment::Neutral, 2));
    }

    #[test]
    fn full_confidence_lands_in_the_last_bin() {
        let results = vec![result_with(Sentiment::Positive, 1.0)];

        let bins = confidence_histogram(&results);
        assert_eq!(bins[CONFIDENCE_BINS - 1], 1);
        assert_eq!(bins.iter().sum::<usize>(), 1);
    }

    #[test]
    fn bin_edges_follow_the_floor_rule() {
        let results = vec![
            result_with(Sentiment::Neutral, 0.0),
            result_with(Sentiment::Neutral, 0.09),
            result_with(Sentiment::Neutral, 0.1),
            result_with(Sentiment::Neutral, 0.95),
        ];

        let bins = confidence_histogram(&results);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[1], 1);
        assert_eq!(bins[9], 1);
    }

    #[test]
    fn out_of_range_values_clamp_to_the_nearest_bin() {
        let results = vec![
            result_with(Sentiment::Neutral, -0.2),
            result_with(Sentiment::Neutral, 1.7),
        ];

        let bins = confidence_histogram(&results);
        assert_eq!(bins[0], 1);
        assert_eq!(bins[CONFIDENCE_BINS - 1], 1);
    }
}
