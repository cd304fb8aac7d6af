//! Daily goal derivation.
//!
//! Pure functions turning a profile and the ambient temperature into water
//! and calorie targets. Results are rounded half away from zero.

use crate::{Goals, Profile};

/// Water per kilogram of body weight
pub const WATER_ML_PER_KG: f64 = 30.0;
/// Extra water per 30 minutes of daily activity
pub const WATER_ML_PER_30_ACTIVE_MIN: f64 = 500.0;
/// Flat daily baseline
pub const WATER_BASE_ML: f64 = 500.0;
/// Adjustment applied above the hot-weather threshold
pub const WATER_HOT_WEATHER_ADJUSTMENT_ML: f64 = 1000.0;
/// Temperatures strictly above this trigger the adjustment
pub const HOT_WEATHER_THRESHOLD_C: f64 = 25.0;
/// Activity multiplier on the resting energy estimate
pub const CALORIE_ACTIVITY_FACTOR: f64 = 1.5;

/// Daily water target in millilitres
pub fn water_goal_ml(weight_kg: f64, daily_activity_minutes: u32, temperature_c: f64) -> i64 {
    let mut goal = weight_kg * WATER_ML_PER_KG
        + (f64::from(daily_activity_minutes) / 30.0) * WATER_ML_PER_30_ACTIVE_MIN
        + WATER_BASE_ML;
    if temperature_c > HOT_WEATHER_THRESHOLD_C {
        goal -= WATER_HOT_WEATHER_ADJUSTMENT_ML;
    }
    goal.round() as i64
}

/// Daily calorie target in kilocalories
pub fn calorie_goal_kcal(weight_kg: f64, height_cm: f64, age_years: u32) -> i64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years) + 5.0;
    (base * CALORIE_ACTIVITY_FACTOR).round() as i64
}

/// Derive both goals for a profile at the given temperature
pub fn derive_goals(profile: &Profile, temperature_c: f64) -> Goals {
    Goals {
        water_goal_ml: water_goal_ml(
            profile.weight_kg,
            profile.daily_activity_minutes,
            temperature_c,
        ),
        calorie_goal_kcal: calorie_goal_kcal(
            profile.weight_kg,
            profile.height_cm,
            profile.age_years,
        ),
    }
}
