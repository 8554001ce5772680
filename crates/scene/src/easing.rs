//! Easing curves mapping linear progress onto eased progress.
//!
//! Every curve maps `0 → 0` and `1 → 1`. The back, bounce and elastic
//! families may leave `[0, 1]` in between.
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

const BACK_OVERSHOOT: f32 = 1.70158;
const BACK_IN_OUT_OVERSHOOT: f32 = BACK_OVERSHOOT * 1.525;
const ELASTIC_PERIOD: f32 = 0.3;
const BOUNCE_N: f32 = 7.5625;
const BOUNCE_D: f32 = 2.75;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
}

impl Easing {
    /// Eased value of `t`, clamped to `[0, 1]` first.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInBack => {
                let c3 = BACK_OVERSHOOT + 1.0;
                c3 * t * t * t - BACK_OVERSHOOT * t * t
            }
            Self::EaseOutBack => {
                let c3 = BACK_OVERSHOOT + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u * u * u + BACK_OVERSHOOT * u * u
            }
            Self::EaseInOutBack => {
                let c2 = BACK_IN_OUT_OVERSHOOT;
                if t < 0.5 {
                    (2.0 * t).powi(2) * ((c2 + 1.0) * 2.0 * t - c2) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((c2 + 1.0) * (2.0 * t - 2.0) + c2) + 2.0) / 2.0
                }
            }
            Self::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Self::EaseOutBounce => bounce_out(t),
            Self::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Self::EaseInElastic => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let c4 = (2.0 * PI) / (ELASTIC_PERIOD * 10.0);
                -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
            }
            Self::EaseOutElastic => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let c4 = (2.0 * PI) / (ELASTIC_PERIOD * 10.0);
                2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
            }
            Self::EaseInOutElastic => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let c5 = (2.0 * PI) / 4.5;
                if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
                } else {
                    2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin() / 2.0 + 1.0
                }
            }
        }
    }

    /// Whether the curve can leave `[0, 1]` between its endpoints.
    pub const fn overshoots(self) -> bool {
        matches!(
            self,
            Self::EaseInBack
                | Self::EaseOutBack
                | Self::EaseInOutBack
                | Self::EaseInElastic
                | Self::EaseOutElastic
                | Self::EaseInOutElastic
        )
    }
}

fn bounce_out(t: f32) -> f32 {
    if t < 1.0 / BOUNCE_D {
        BOUNCE_N * t * t
    } else if t < 2.0 / BOUNCE_D {
        let t = t - 1.5 / BOUNCE_D;
        BOUNCE_N * t * t + 0.75
    } else if t < 2.5 / BOUNCE_D {
        let t = t - 2.25 / BOUNCE_D;
        BOUNCE_N * t * t + 0.9375
    } else {
        let t = t - 2.625 / BOUNCE_D;
        BOUNCE_N * t * t + 0.984375
    }
}

/// Interpolates between `from` and `to` with an eased factor.
pub fn interpolate(from: f32, to: f32, t: f32, easing: Easing) -> f32 {
    from + (to - from) * easing.apply(t)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in Easing::iter() {
            assert!(easing.apply(0.0).abs() < EPS, "{easing} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < EPS, "{easing} at 1");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-3.0), 0.0);
        assert_eq!(Easing::Linear.apply(7.0), 1.0);
        assert_eq!(Easing::EaseIn.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_non_overshooting_curves_stay_in_unit_range() {
        for easing in Easing::iter().filter(|e| !e.overshoots()) {
            for step in 0..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!((-EPS..=1.0 + EPS).contains(&value), "{easing} gave {value}");
            }
        }
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (0..=100)
            .map(|step| Easing::EaseOutBack.apply(step as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.05);
    }

    #[test]
    fn test_quadratic_values() {
        assert!((Easing::EaseIn.apply(0.5) - 0.25).abs() < EPS);
        assert!((Easing::EaseOut.apply(0.5) - 0.75).abs() < EPS);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_parses_wire_names() {
        assert_eq!("easeOutBounce".parse::<Easing>().ok(), Some(Easing::EaseOutBounce));
        assert_eq!(Easing::EaseInOutElastic.to_string(), "easeInOutElastic");
    }

    #[test]
    fn test_interpolate() {
        assert!((interpolate(10.0, 20.0, 0.5, Easing::Linear) - 15.0).abs() < EPS);
    }
}
