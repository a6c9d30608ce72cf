// SPDX-License-Identifier: MIT OR Apache-2.0

//! Size-derived cluster weights.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Growth function applied to cluster size. Both variants map 1 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightFn {
    /// `sqrt(n)`
    #[default]
    Sqrt,
    /// `1 + ln(n)`
    Log,
}

impl WeightFn {
    /// Evaluates the function; sizes below 1 are treated as 1.
    pub fn apply(self, size: usize) -> f32 {
        let n = size.max(1) as f32;
        match self {
            WeightFn::Sqrt => n.sqrt(),
            WeightFn::Log => 1.0 + n.ln(),
        }
    }
}

impl std::str::FromStr for WeightFn {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(WeightFn::Sqrt),
            "log" | "ln" => Ok(WeightFn::Log),
            other => Err(ConfigError::UnknownVariant {
                kind: "weight function",
                value: other.to_string(),
            }),
        }
    }
}

/// `min(scale_constant * f(size), weight_cap)`.
pub fn compute_weight(
    size: usize,
    weight_fn: WeightFn,
    scale_constant: f32,
    weight_cap: f32,
) -> f32 {
    (scale_constant * weight_fn.apply(size)).min(weight_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_gets_scale_constant() {
        for f in [WeightFn::Sqrt, WeightFn::Log] {
            assert_eq!(compute_weight(1, f, 1.5, 10.0), 1.5);
            assert_eq!(compute_weight(0, f, 1.5, 10.0), 1.5);
        }
    }

    #[test]
    fn weight_is_monotone_and_capped() {
        for f in [WeightFn::Sqrt, WeightFn::Log] {
            let weights: Vec<f32> = (1..200).map(|n| compute_weight(n, f, 1.0, 4.0)).collect();
            assert!(weights.windows(2).all(|w| w[0] <= w[1]));
            assert!(weights.iter().all(|&w| (1.0..=4.0).contains(&w)));
            assert_eq!(*weights.last().unwrap(), 4.0);
        }
    }

    #[test]
    fn known_values() {
        assert!((compute_weight(4, WeightFn::Sqrt, 1.0, 10.0) - 2.0).abs() < 1e-6);
        let log5 = compute_weight(5, WeightFn::Log, 1.0, 10.0);
        assert!((log5 - (1.0 + 5f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn parses_names() {
        assert_eq!("SQRT".parse::<WeightFn>(), Ok(WeightFn::Sqrt));
        assert_eq!("ln".parse::<WeightFn>(), Ok(WeightFn::Log));
        assert!("linear".parse::<WeightFn>().is_err());
    }
}
