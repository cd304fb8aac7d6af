//! Ledger operations: logging water, food and workouts against daily goals.

use crate::catalog::WorkoutCatalog;
use crate::command::usage;
use crate::{Error, Goals, Ledger, PendingFoodEntry, Profile, Progress, Result, WorkoutResult};

/// Water goal bonus for each full 30 minutes of a workout
pub const WORKOUT_WATER_BONUS_ML: i64 = 200;

impl Ledger {
    /// Fresh ledger with zeroed totals
    pub fn new(profile: Profile, goals: Goals) -> Self {
        Self {
            profile,
            goals,
            logged_water_ml: 0.0,
            logged_calories_kcal: 0.0,
            burned_calories_kcal: 0.0,
        }
    }

    /// Add consumed water and return what is left of the goal (never negative)
    pub fn log_water(&mut self, amount_ml: f64) -> Result<f64> {
        if !(amount_ml.is_finite() && amount_ml > 0.0) {
            return Err(Error::InvalidArgument {
                usage: usage::LOG_WATER,
            });
        }
        self.logged_water_ml += amount_ml;
        Ok(self.water_remaining_ml())
    }

    /// Consume a pending food entry for the given grams; returns kcal added, one decimal
    pub fn add_food(&mut self, entry: &PendingFoodEntry, grams: f64) -> Result<f64> {
        if !(grams.is_finite() && grams > 0.0) {
            return Err(Error::InvalidArgument {
                usage: usage::GRAMS,
            });
        }
        let calories = entry.kcal_per_100g * grams / 100.0;
        self.logged_calories_kcal += calories;
        Ok(round_one_decimal(calories))
    }

    /// Record a workout: burned calories go to the ledger, the water goal grows
    pub fn log_workout(
        &mut self,
        catalog: &WorkoutCatalog,
        workout_type: &str,
        duration_minutes: u32,
    ) -> Result<WorkoutResult> {
        let workout_type = workout_type.trim();
        if workout_type.is_empty() || duration_minutes == 0 {
            return Err(Error::InvalidArgument {
                usage: usage::LOG_WORKOUT,
            });
        }

        let met = catalog.met_for(workout_type);
        let calories_burned = met * self.profile.weight_kg * f64::from(duration_minutes) / 60.0;
        let water_bonus = i64::from(duration_minutes / 30) * WORKOUT_WATER_BONUS_ML;

        self.burned_calories_kcal += calories_burned;
        self.goals.water_goal_ml += water_bonus;

        Ok(WorkoutResult {
            workout_type: workout_type.to_lowercase(),
            duration_minutes,
            met,
            calories_burned_kcal: calories_burned,
            water_bonus_ml: water_bonus,
        })
    }

    /// Replace the derived calorie goal
    pub fn override_calorie_goal(&mut self, calorie_goal_kcal: i64) {
        self.goals.calorie_goal_kcal = calorie_goal_kcal;
    }

    pub fn water_remaining_ml(&self) -> f64 {
        (self.goals.water_goal_ml as f64 - self.logged_water_ml).max(0.0)
    }

    pub fn calories_remaining_kcal(&self) -> f64 {
        self.goals.calorie_goal_kcal as f64 - self.logged_calories_kcal
            + self.burned_calories_kcal
    }

    pub fn progress(&self) -> Progress {
        Progress {
            water_goal_ml: self.goals.water_goal_ml,
            logged_water_ml: self.logged_water_ml,
            water_remaining_ml: self.water_remaining_ml(),
            calorie_goal_kcal: self.goals.calorie_goal_kcal,
            logged_calories_kcal: self.logged_calories_kcal,
            burned_calories_kcal: self.burned_calories_kcal,
            calories_remaining_kcal: self.calories_remaining_kcal(),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::derive_goals;

    fn ledger() -> Ledger {
        let profile = Profile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age_years: 30,
            daily_activity_minutes: 30,
            city: "Berlin".into(),
        };
        let goals = derive_goals(&profile, 20.0);
        Ledger::new(profile, goals)
    }

    #[test]
    fn test_new_ledger_is_zeroed() {
        let ledger = ledger();
        assert_eq!(ledger.logged_water_ml, 0.0);
        assert_eq!(ledger.logged_calories_kcal, 0.0);
        assert_eq!(ledger.burned_calories_kcal, 0.0);
        assert_eq!(ledger.goals.water_goal_ml, 3100);
    }

    #[test]
    fn test_log_water_accumulates() {
        let mut ledger = ledger();
        assert_eq!(ledger.log_water(500.0).unwrap(), 2600.0);
        assert_eq!(ledger.log_water(500.0).unwrap(), 2100.0);
        assert_eq!(ledger.logged_water_ml, 1000.0);
    }

    #[test]
    fn test_water_remaining_clamps_at_zero() {
        let mut ledger = ledger();
        assert_eq!(ledger.log_water(5000.0).unwrap(), 0.0);
        assert_eq!(ledger.progress().water_remaining_ml, 0.0);
        assert_eq!(ledger.logged_water_ml, 5000.0);
    }

    #[test]
    fn test_log_water_rejects_non_positive() {
        let mut ledger = ledger();
        for bad in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ledger.log_water(bad),
                Err(Error::InvalidArgument { .. })
            ));
        }
        assert_eq!(ledger.logged_water_ml, 0.0);
    }

    #[test]
    fn test_add_food_rounds_to_one_decimal() {
        let mut ledger = ledger();
        let entry = PendingFoodEntry {
            food_name: "banana".into(),
            kcal_per_100g: 89.0,
        };
        assert_eq!(ledger.add_food(&entry, 150.0).unwrap(), 133.5);
        let added = ledger.add_food(&entry, 33.0).unwrap();
        assert_eq!(added, 29.4);
        assert!((ledger.logged_calories_kcal - (133.5 + 29.37)).abs() < 1e-9);
    }

    #[test]
    fn test_running_workout() {
        let mut ledger = ledger();
        let result = ledger
            .log_workout(&build_default_catalog(), "Running", 30)
            .unwrap();
        assert_eq!(result.calories_burned_kcal, 280.0);
        assert_eq!(result.water_bonus_ml, 200);
        assert_eq!(ledger.goals.water_goal_ml, 3300);
        assert_eq!(ledger.burned_calories_kcal, 280.0);
        // Bonus raises the goal, it is not credited as consumed water
        assert_eq!(ledger.logged_water_ml, 0.0);
    }

    #[test]
    fn test_unknown_workout_uses_default_met_and_bonus() {
        let mut ledger = ledger();
        let catalog = build_default_catalog();

        let result = ledger.log_workout(&catalog, "yoga", 45).unwrap();
        assert_eq!(result.met, 3.0);
        assert_eq!(result.calories_burned_kcal, 3.0 * 70.0 * 45.0 / 60.0);
        assert_eq!(result.water_bonus_ml, 200);

        let result = ledger.log_workout(&catalog, "yoga", 65).unwrap();
        assert_eq!(result.water_bonus_ml, 400);
        assert_eq!(ledger.goals.water_goal_ml, 3100 + 600);
    }

    #[test]
    fn test_short_workout_has_no_bonus() {
        let mut ledger = ledger();
        let result = ledger
            .log_workout(&build_default_catalog(), "walking", 29)
            .unwrap();
        assert_eq!(result.water_bonus_ml, 0);
        assert_eq!(ledger.goals.water_goal_ml, 3100);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut ledger = ledger();
        assert!(ledger
            .log_workout(&build_default_catalog(), "running", 0)
            .is_err());
        assert_eq!(ledger.burned_calories_kcal, 0.0);
    }

    #[test]
    fn test_calorie_balance_not_clamped() {
        let mut ledger = ledger();
        let entry = PendingFoodEntry {
            food_name: "cake".into(),
            kcal_per_100g: 400.0,
        };
        ledger.add_food(&entry, 1000.0).unwrap();
        let progress = ledger.progress();
        assert_eq!(progress.calories_remaining_kcal, 2473.0 - 4000.0);
    }
}
