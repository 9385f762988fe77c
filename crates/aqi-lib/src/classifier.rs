//! AQI severity classification
//!
//! Maps a continuous AQI score onto the six ordinal bands. The bands live in
//! an ordered range table; each entry stores its inclusive upper bound and
//! the lower bound is implied by the previous entry. Scores are matched
//! low-to-high and the first band whose upper bound is not exceeded wins, so
//! boundary values (50, 100, 150, 200, 300) fall in the lower band and a
//! score such as 50.4 falls in the upper one.

use crate::error::{AqiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// AQI category, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Ordinal position among the six bands, 0 = Good
    pub fn severity_rank(&self) -> u8 {
        *self as u8
    }

    pub fn color(&self) -> SeverityColor {
        match self {
            AqiCategory::Good => SeverityColor::Green,
            AqiCategory::Moderate => SeverityColor::Yellow,
            AqiCategory::UnhealthyForSensitiveGroups => SeverityColor::Orange,
            AqiCategory::Unhealthy => SeverityColor::Red,
            AqiCategory::VeryUnhealthy => SeverityColor::Purple,
            AqiCategory::Hazardous => SeverityColor::Maroon,
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display color token attached to each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    Maroon,
}

impl SeverityColor {
    /// EPA reference color
    pub fn hex(&self) -> &'static str {
        match self {
            SeverityColor::Green => "#00E400",
            SeverityColor::Yellow => "#FFFF00",
            SeverityColor::Orange => "#FF7E00",
            SeverityColor::Red => "#FF0000",
            SeverityColor::Purple => "#8F3F97",
            SeverityColor::Maroon => "#7E0023",
        }
    }
}

/// One row of the range table
#[derive(Debug, Clone, Copy)]
pub struct CategoryBand {
    /// Inclusive upper bound of the band
    pub upper: f64,
    pub category: AqiCategory,
}

/// Standard AQI bands, low to high
pub const AQI_BANDS: [CategoryBand; 6] = [
    CategoryBand { upper: 50.0, category: AqiCategory::Good },
    CategoryBand { upper: 100.0, category: AqiCategory::Moderate },
    CategoryBand { upper: 150.0, category: AqiCategory::UnhealthyForSensitiveGroups },
    CategoryBand { upper: 200.0, category: AqiCategory::Unhealthy },
    CategoryBand { upper: 300.0, category: AqiCategory::VeryUnhealthy },
    CategoryBand { upper: f64::INFINITY, category: AqiCategory::Hazardous },
];

/// Category, rank and color for a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: AqiCategory,
    pub severity_rank: u8,
    pub color: SeverityColor,
}

impl From<AqiCategory> for Classification {
    fn from(category: AqiCategory) -> Self {
        Self {
            category,
            severity_rank: category.severity_rank(),
            color: category.color(),
        }
    }
}

/// Classifier over a validated range table
#[derive(Debug, Clone)]
pub struct AqiClassifier {
    bands: Vec<CategoryBand>,
}

impl AqiClassifier {
    /// Classifier over the standard bands
    pub fn new() -> Self {
        Self {
            bands: AQI_BANDS.to_vec(),
        }
    }

    /// Classifier over the standard bands, checked the same way as a custom
    /// table. Servers build their classifier with this at startup.
    pub fn standard() -> Result<Self> {
        Self::with_bands(AQI_BANDS.to_vec())
    }

    /// Build a classifier over a custom table, rejecting tables that do not
    /// partition [0, inf)
    pub fn with_bands(bands: Vec<CategoryBand>) -> Result<Self> {
        validate_bands(&bands)?;
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[CategoryBand] {
        &self.bands
    }

    /// Classify a non-negative score
    pub fn classify(&self, score: f64) -> Result<Classification> {
        if score.is_nan() || score < 0.0 {
            return Err(AqiError::invalid_input(
                "score",
                format!("AQI score must be >= 0, got {}", score),
            ));
        }

        self.bands
            .iter()
            .find(|band| score <= band.upper)
            .map(|band| Classification::from(band.category))
            .ok_or_else(|| {
                AqiError::CategoryTable(format!("no band covers score {}", score))
            })
    }
}

impl Default for AqiClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that upper bounds strictly increase, categories are in severity
/// order, and the last band is unbounded
pub fn validate_bands(bands: &[CategoryBand]) -> Result<()> {
    let last = bands
        .last()
        .ok_or_else(|| AqiError::CategoryTable("table is empty".to_string()))?;

    if last.upper != f64::INFINITY {
        return Err(AqiError::CategoryTable(format!(
            "last band ends at {}, expected an unbounded band",
            last.upper
        )));
    }

    if bands[0].upper.is_nan() || bands[0].upper < 0.0 {
        return Err(AqiError::CategoryTable(format!(
            "first band ends at {}, below zero",
            bands[0].upper
        )));
    }

    for pair in bands.windows(2) {
        if !(pair[0].upper < pair[1].upper) {
            return Err(AqiError::CategoryTable(format!(
                "band {} ({}) does not end below band {} ({})",
                pair[0].category, pair[0].upper, pair[1].category, pair[1].upper
            )));
        }
        if pair[0].category >= pair[1].category {
            return Err(AqiError::CategoryTable(format!(
                "{} listed before {}",
                pair[0].category, pair[1].category
            )));
        }
    }

    Ok(())
}

/// Classify against the standard bands
pub fn classify(score: f64) -> Result<Classification> {
    AqiClassifier::new().classify(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bands_are_valid() {
        validate_bands(&AQI_BANDS).unwrap();
        let classifier = AqiClassifier::standard().unwrap();
        assert_eq!(classifier.bands().len(), AQI_BANDS.len());
    }

    #[test]
    fn test_boundary_values_fall_in_lower_band() {
        assert_eq!(classify(0.0).unwrap().category, AqiCategory::Good);
        assert_eq!(classify(50.0).unwrap().category, AqiCategory::Good);
        assert_eq!(classify(51.0).unwrap().category, AqiCategory::Moderate);
        assert_eq!(classify(100.0).unwrap().category, AqiCategory::Moderate);
        assert_eq!(
            classify(101.0).unwrap().category,
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(
            classify(150.0).unwrap().category,
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(classify(151.0).unwrap().category, AqiCategory::Unhealthy);
        assert_eq!(classify(200.0).unwrap().category, AqiCategory::Unhealthy);
        assert_eq!(classify(201.0).unwrap().category, AqiCategory::VeryUnhealthy);
        assert_eq!(classify(300.0).unwrap().category, AqiCategory::VeryUnhealthy);
        assert_eq!(classify(301.0).unwrap().category, AqiCategory::Hazardous);
    }

    #[test]
    fn test_fractional_scores_between_integer_bounds() {
        assert_eq!(classify(50.4).unwrap().category, AqiCategory::Moderate);
        assert_eq!(classify(300.01).unwrap().category, AqiCategory::Hazardous);
        assert_eq!(classify(1e9).unwrap().category, AqiCategory::Hazardous);
    }

    #[test]
    fn test_every_score_lands_in_exactly_one_band() {
        let mut score = 0.0;
        while score < 600.0 {
            let matching: Vec<_> = AQI_BANDS
                .iter()
                .enumerate()
                .filter(|(i, band)| {
                    let lower_ok = if *i == 0 {
                        score >= 0.0
                    } else {
                        score > AQI_BANDS[i - 1].upper
                    };
                    lower_ok && score <= band.upper
                })
                .collect();
            assert_eq!(matching.len(), 1, "score {} matched {} bands", score, matching.len());
            assert_eq!(classify(score).unwrap().category, matching[0].1.category);
            score += 0.25;
        }
    }

    #[test]
    fn test_rank_and_color_follow_category() {
        let c = classify(175.0).unwrap();
        assert_eq!(c.category, AqiCategory::Unhealthy);
        assert_eq!(c.severity_rank, 3);
        assert_eq!(c.color, SeverityColor::Red);

        let ranks: Vec<u8> = AqiCategory::ALL.iter().map(|c| c.severity_rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_classify_is_idempotent() {
        for score in [0.0, 42.9, 99.99, 250.0, 1000.0] {
            assert_eq!(classify(score).unwrap(), classify(score).unwrap());
        }
    }

    #[test]
    fn test_negative_and_nan_scores_rejected() {
        assert!(matches!(classify(-0.1), Err(AqiError::InvalidInput { .. })));
        assert!(matches!(classify(f64::NAN), Err(AqiError::InvalidInput { .. })));
    }

    #[test]
    fn test_gapped_or_unordered_tables_rejected() {
        let bounded = vec![
            CategoryBand { upper: 50.0, category: AqiCategory::Good },
            CategoryBand { upper: 100.0, category: AqiCategory::Moderate },
        ];
        assert!(AqiClassifier::with_bands(bounded).is_err());

        let unordered = vec![
            CategoryBand { upper: 100.0, category: AqiCategory::Good },
            CategoryBand { upper: 50.0, category: AqiCategory::Moderate },
            CategoryBand { upper: f64::INFINITY, category: AqiCategory::Hazardous },
        ];
        assert!(AqiClassifier::with_bands(unordered).is_err());

        assert!(AqiClassifier::with_bands(Vec::new()).is_err());
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&AqiCategory::UnhealthyForSensitiveGroups).unwrap();
        assert_eq!(json, "\"Unhealthy for Sensitive Groups\"");
        let json = serde_json::to_string(&SeverityColor::Maroon).unwrap();
        assert_eq!(json, "\"maroon\"");
    }
}
