//! Leveling curve engine.
//!
//! Pure experience <-> level conversions per character class. Each class
//! category picks a curve exponent for the `base * (level - 1)^power` cost
//! shape; `base` is back-solved so the level just below the cap sits at
//! exactly [`CALIBRATION_EXP`] cumulative experience, whatever the cap is.
//!
//! All math is plain f64 with truncation toward zero when converting to
//! integer experience, so results are deterministic across platforms.

use serde::{Deserialize, Serialize};

/// Cumulative experience required at `max_level - 1`, for every class.
pub const CALIBRATION_EXP: i64 = 200_000_000;

/// Sentinel for levels above the cap; larger than any real requirement.
pub const INFINITE_EXP: i64 = i64::MAX;

/// Coarse curve knob: each category maps to a fixed exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassCategory {
    Melee,
    Ranged,
    Caster,
    Support,
}

impl ClassCategory {
    /// Exponent for the per-level cost shape `base * (level - 1)^power`.
    pub fn curve_power(&self) -> f64 {
        match self {
            ClassCategory::Melee => 2.2,
            ClassCategory::Ranged => 2.4,
            ClassCategory::Caster => 2.6,
            ClassCategory::Support => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCategory::Melee => "melee",
            ClassCategory::Ranged => "ranged",
            ClassCategory::Caster => "caster",
            ClassCategory::Support => "support",
        }
    }
}

/// Read-only description of a character class, as far as leveling cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassProfile {
    pub name: String,
    /// Level cap, at least 2.
    pub max_level: i32,
    pub category: ClassCategory,
}

impl ClassProfile {
    pub fn new(name: &str, max_level: i32, category: ClassCategory) -> Self {
        Self {
            name: name.to_string(),
            max_level: max_level.max(2),
            category,
        }
    }
}

/// Precomputed cumulative thresholds for one class.
///
/// Construction is O(max_level); every query afterwards is O(1) or a
/// binary search. Curves are immutable and safe to share read-only.
#[derive(Debug, Clone)]
pub struct LevelCurve {
    max_level: i32,
    /// `totals[l]` = cumulative experience required for level `l`.
    totals: Vec<i64>,
}

impl LevelCurve {
    /// Build the prefix table for a class.
    ///
    /// Thresholds are `trunc(CALIBRATION_EXP * S(l) / S(max_level - 1))`
    /// where `S` is the raw prefix sum of `(l - 1)^power`; the ratio is
    /// exactly 1.0 at the calibration level, so that threshold is exact.
    /// The cap itself costs [`CALIBRATION_EXP`] again on top.
    pub fn for_class(profile: &ClassProfile) -> Self {
        let max_level = profile.max_level.max(2);
        let power = profile.category.curve_power();
        let calib_level = max_level - 1;

        let mut raw = vec![0.0f64; (max_level + 1) as usize];
        for l in 2..=calib_level {
            raw[l as usize] = raw[(l - 1) as usize] + f64::from(l - 1).powf(power);
        }
        let denom = raw[calib_level as usize];

        let mut totals = vec![0i64; (max_level + 1) as usize];
        if denom > 0.0 {
            for l in 2..=calib_level {
                let scaled = CALIBRATION_EXP as f64 * (raw[l as usize] / denom);
                totals[l as usize] = scaled.trunc() as i64;
            }
        }
        totals[max_level as usize] = totals[calib_level as usize] + CALIBRATION_EXP;

        Self { max_level, totals }
    }

    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// Cumulative experience required to hold `level`.
    ///
    /// 0 for `level <= 1`; [`INFINITE_EXP`] above the cap (unreachable).
    pub fn total_exp_for_level(&self, level: i32) -> i64 {
        if level <= 1 {
            0
        } else if level > self.max_level {
            INFINITE_EXP
        } else {
            self.totals[level as usize]
        }
    }

    /// Experience required to go from `level - 1` to `level`.
    ///
    /// 0 for `level <= 1`; exactly [`CALIBRATION_EXP`] at the cap;
    /// [`INFINITE_EXP`] above it.
    pub fn exp_for_level(&self, level: i32) -> i64 {
        if level <= 1 {
            0
        } else if level > self.max_level {
            INFINITE_EXP
        } else {
            self.totals[level as usize] - self.totals[(level - 1) as usize]
        }
    }

    /// Largest level whose threshold is within `total_exp`.
    pub fn level_from_exp(&self, total_exp: i64) -> i32 {
        let mut low = 1;
        let mut high = self.max_level;
        while low < high {
            let mid = (low + high + 1) / 2;
            if self.total_exp_for_level(mid) <= total_exp {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low
    }

    /// Fraction of the way from the current level's threshold to the next,
    /// in [0, 1]. 1.0 once at the cap.
    pub fn level_progress(&self, total_exp: i64) -> f64 {
        let level = self.level_from_exp(total_exp);
        if level >= self.max_level {
            return 1.0;
        }
        let floor = self.total_exp_for_level(level);
        let ceiling = self.total_exp_for_level(level + 1);
        let span = ceiling - floor;
        if span <= 0 {
            return 1.0;
        }
        (((total_exp - floor) as f64) / (span as f64)).clamp(0.0, 1.0)
    }

    /// Remaining experience to the next level; 0 at the cap.
    pub fn exp_to_next_level(&self, total_exp: i64) -> i64 {
        let level = self.level_from_exp(total_exp);
        if level >= self.max_level {
            return 0;
        }
        self.total_exp_for_level(level + 1) - total_exp.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<ClassProfile> {
        vec![
            ClassProfile::new("warrior", 100, ClassCategory::Melee),
            ClassProfile::new("archer", 80, ClassCategory::Ranged),
            ClassProfile::new("wizard", 60, ClassCategory::Caster),
            ClassProfile::new("cleric", 120, ClassCategory::Support),
        ]
    }

    #[test]
    fn test_calibration_point_exact() {
        for profile in profiles() {
            let curve = LevelCurve::for_class(&profile);
            assert_eq!(
                curve.total_exp_for_level(profile.max_level - 1),
                CALIBRATION_EXP,
                "class {}",
                profile.name
            );
        }
    }

    #[test]
    fn test_totals_monotonic() {
        for profile in profiles() {
            let curve = LevelCurve::for_class(&profile);
            for level in 2..=profile.max_level {
                assert!(
                    curve.total_exp_for_level(level) >= curve.total_exp_for_level(level - 1),
                    "class {} level {}",
                    profile.name,
                    level
                );
            }
        }
    }

    #[test]
    fn test_level_one_is_free() {
        let curve = LevelCurve::for_class(&profiles()[0]);
        assert_eq!(curve.total_exp_for_level(1), 0);
        assert_eq!(curve.total_exp_for_level(0), 0);
        assert_eq!(curve.exp_for_level(1), 0);
    }

    #[test]
    fn test_cap_step_and_sentinel() {
        for profile in profiles() {
            let curve = LevelCurve::for_class(&profile);
            assert_eq!(curve.exp_for_level(profile.max_level), CALIBRATION_EXP);
            assert_eq!(curve.exp_for_level(profile.max_level + 1), INFINITE_EXP);
            assert_eq!(curve.total_exp_for_level(profile.max_level + 5), INFINITE_EXP);
        }
    }

    #[test]
    fn test_level_from_exp_round_trip() {
        for profile in profiles() {
            let curve = LevelCurve::for_class(&profile);
            for level in 1..=profile.max_level {
                let exp = curve.total_exp_for_level(level);
                assert_eq!(curve.level_from_exp(exp), level, "class {}", profile.name);
            }
        }
    }

    #[test]
    fn test_level_from_exp_exclusive_lower_boundary() {
        for profile in profiles() {
            let curve = LevelCurve::for_class(&profile);
            for level in 2..=profile.max_level {
                let exp = curve.total_exp_for_level(level);
                if exp > curve.total_exp_for_level(level - 1) {
                    assert_eq!(
                        curve.level_from_exp(exp - 1),
                        level - 1,
                        "class {} level {}",
                        profile.name,
                        level
                    );
                }
            }
        }
    }

    #[test]
    fn test_level_from_exp_extremes() {
        let curve = LevelCurve::for_class(&profiles()[0]);
        assert_eq!(curve.level_from_exp(0), 1);
        assert_eq!(curve.level_from_exp(-50), 1);
        assert_eq!(curve.level_from_exp(i64::MAX - 1), curve.max_level());
    }

    #[test]
    fn test_level_progress_bounds() {
        let profile = profiles()[2].clone();
        let curve = LevelCurve::for_class(&profile);

        assert_eq!(curve.level_progress(0), 0.0);

        let halfway = curve.total_exp_for_level(10)
            + (curve.total_exp_for_level(11) - curve.total_exp_for_level(10)) / 2;
        let p = curve.level_progress(halfway);
        assert!(p > 0.0 && p < 1.0);

        let at_cap = curve.total_exp_for_level(profile.max_level);
        assert_eq!(curve.level_progress(at_cap), 1.0);
    }

    #[test]
    fn test_exp_to_next_level() {
        let profile = profiles()[0].clone();
        let curve = LevelCurve::for_class(&profile);

        let threshold = curve.total_exp_for_level(5);
        let next = curve.total_exp_for_level(6);
        assert_eq!(curve.exp_to_next_level(threshold), next - threshold);

        let at_cap = curve.total_exp_for_level(profile.max_level);
        assert_eq!(curve.exp_to_next_level(at_cap), 0);
    }

    #[test]
    fn test_minimum_cap_class() {
        // A degenerate two-level class: the cap is the calibration step.
        let profile = ClassProfile::new("novice", 2, ClassCategory::Melee);
        let curve = LevelCurve::for_class(&profile);
        assert_eq!(curve.total_exp_for_level(1), 0);
        assert_eq!(curve.total_exp_for_level(2), CALIBRATION_EXP);
        assert_eq!(curve.level_from_exp(CALIBRATION_EXP), 2);
        assert_eq!(curve.level_from_exp(CALIBRATION_EXP - 1), 1);
    }
}
