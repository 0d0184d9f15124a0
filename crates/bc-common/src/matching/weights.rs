use super::scoring::round6;
use super::WeightOverrides;

/// Default weight vector applied when a request overrides nothing.
pub const DEFAULT_WEIGHTS: Weights = Weights {
    skills: 0.50,
    interests: 0.30,
    work_type: 0.20,
};

/// Warning recorded when the requested weights sum to zero.
pub const ZERO_SUM_WARNING: &str = "Weights sum is 0. Using defaults 0.50/0.30/0.20";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub interests: f64,
    pub work_type: f64,
}

impl Weights {
    /// Merge request overrides onto the defaults, component by component.
    pub fn from_overrides(overrides: Option<&WeightOverrides>) -> Self {
        let overrides = match overrides {
            Some(w) => *w,
            None => return DEFAULT_WEIGHTS,
        };

        Weights {
            skills: overrides.skills.unwrap_or(DEFAULT_WEIGHTS.skills),
            interests: overrides.interests.unwrap_or(DEFAULT_WEIGHTS.interests),
            work_type: overrides.work_type.unwrap_or(DEFAULT_WEIGHTS.work_type),
        }
    }

    pub fn sum(&self) -> f64 {
        self.skills + self.interests + self.work_type
    }

    pub fn has_negative(&self) -> bool {
        self.skills < 0.0 || self.interests < 0.0 || self.work_type < 0.0
    }

    /// Scale the vector so its components sum to 1.
    ///
    /// A sum of zero (all components zero) falls back to the defaults and
    /// reports a warning instead of dividing by zero.
    pub fn normalize(&self) -> (Weights, Option<&'static str>) {
        let sum = self.sum();
        if sum <= 0.0 {
            return (DEFAULT_WEIGHTS, Some(ZERO_SUM_WARNING));
        }

        (
            Weights {
                skills: round6(self.skills / sum),
                interests: round6(self.interests / sum),
                work_type: round6(self.work_type / sum),
            },
            None,
        )
    }
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_scales_arbitrary_inputs() {
        let raw = Weights {
            skills: 50.0,
            interests: 30.0,
            work_type: 20.0,
        };

        let (normalized, warning) = raw.normalize();
        assert!(warning.is_none());
        assert!((normalized.sum() - 1.0).abs() < 1e-6);
        assert!((normalized.skills - 0.5).abs() < 1e-9);
        assert!((normalized.work_type - 0.2).abs() < 1e-9);
    }

    #[test]
    fn zero_sum_falls_back_to_defaults_with_warning() {
        let raw = Weights {
            skills: 0.0,
            interests: 0.0,
            work_type: 0.0,
        };

        let (normalized, warning) = raw.normalize();
        assert_eq!(normalized, DEFAULT_WEIGHTS);
        let warning = warning.expect("zero-sum weights must warn");
        assert!(warning.contains('0'));
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let overrides = WeightOverrides {
            skills: Some(0.8),
            interests: None,
            work_type: None,
        };

        let merged = Weights::from_overrides(Some(&overrides));
        assert!((merged.skills - 0.8).abs() < 1e-9);
        assert!((merged.interests - DEFAULT_WEIGHTS.interests).abs() < 1e-9);

        assert_eq!(Weights::from_overrides(None), DEFAULT_WEIGHTS);
    }
}
