use serde::{Deserialize, Serialize};

/// Descriptive statistics of the fitness values of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Upper median for even-sized populations.
    pub median: u64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl FitnessSummary {
    /// Computes the summary of unsorted fitness values, or `None` for an empty population.
    ///
    /// ```
    /// use tetro_training::summary::FitnessSummary;
    ///
    /// let summary = FitnessSummary::new([5, 2, 4, 1, 3]).unwrap();
    /// assert_eq!((summary.min, summary.max, summary.median), (1, 5, 3));
    /// assert_eq!(summary.mean, 3.0);
    /// assert!(FitnessSummary::new([]).is_none());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_unstable();

        let min = *values.first()?;
        let max = *values.last()?;
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let median = values[values.len() / 2];
        let variance = values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        let summary = FitnessSummary::new([7]).unwrap();
        assert_eq!(summary.min, 7);
        assert_eq!(summary.max, 7);
        assert_eq!(summary.median, 7);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn test_spread() {
        let summary = FitnessSummary::new([2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.std_dev, 2.0);
        assert_eq!(summary.median, 5);
    }
}
