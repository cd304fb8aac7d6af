//! Default catalog of workout types and their MET coefficients.
//!
//! This module provides the built-in workouts used to estimate calorie burn.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// MET used for any workout type the catalog does not know
pub const DEFAULT_MET: f64 = 3.0;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<WorkoutCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static WorkoutCatalog {
    &DEFAULT_CATALOG
}

/// Mapping from normalized workout name to MET coefficient
#[derive(Clone, Debug, Default)]
pub struct WorkoutCatalog {
    mets: HashMap<String, f64>,
}

impl WorkoutCatalog {
    /// Register a workout type (and its aliases) under one MET value
    pub fn insert(&mut self, names: &[&str], met: f64) {
        for name in names {
            self.mets.insert(normalize(name), met);
        }
    }

    /// Look up a workout type, `None` if unknown
    pub fn get(&self, workout_type: &str) -> Option<f64> {
        self.mets.get(&normalize(workout_type)).copied()
    }

    /// Look up a workout type, falling back to [`DEFAULT_MET`]
    pub fn met_for(&self, workout_type: &str) -> f64 {
        match self.get(workout_type) {
            Some(met) => met,
            None => {
                tracing::debug!(
                    "Unknown workout type {:?}, using default MET {}",
                    workout_type,
                    DEFAULT_MET
                );
                DEFAULT_MET
            }
        }
    }
}

/// Lowercase and collapse internal whitespace so "Gym" and " gym " match
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build a fresh catalog of the built-in workout types
pub fn build_default_catalog() -> WorkoutCatalog {
    let mut catalog = WorkoutCatalog::default();

    catalog.insert(&["running", "run", "бег"], 8.0);
    catalog.insert(&["walking", "walk", "ходьба"], 3.0);
    catalog.insert(&["swimming", "swim", "плавание"], 6.0);
    catalog.insert(&["cycling", "bike", "велосипед"], 7.0);
    catalog.insert(&["gym", "тренажерный зал"], 5.0);

    catalog
}
