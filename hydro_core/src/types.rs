//! Core domain types for the Hydro tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - User identity
//! - Physiological profile and derived goals
//! - The per-user ledger of logged and burned quantities
//! - Dialogue progress while a profile is being collected
//! - Transient food entries awaiting a gram quantity

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// Opaque per-session user identifier supplied by the transport
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// Profile and Goals
// ============================================================================

/// Physiological profile collected by the dialogue
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
    pub daily_activity_minutes: u32,
    pub city: String,
}

/// Daily targets derived from a profile
///
/// `water_goal_ml` is stored exactly as computed and may be negative for
/// pathological inputs; displays clamp at zero.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goals {
    pub water_goal_ml: i64,
    pub calorie_goal_kcal: i64,
}

// ============================================================================
// Ledger
// ============================================================================

/// Running totals for one user against their goals
///
/// Created when the dialogue derives goals; replaced by a new `set_profile` run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    pub profile: Profile,
    pub goals: Goals,
    pub logged_water_ml: f64,
    pub logged_calories_kcal: f64,
    pub burned_calories_kcal: f64,
}

/// Snapshot of what is left for the day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub water_goal_ml: i64,
    pub logged_water_ml: f64,
    /// Never below zero
    pub water_remaining_ml: f64,
    pub calorie_goal_kcal: i64,
    pub logged_calories_kcal: f64,
    pub burned_calories_kcal: f64,
    /// Goal minus consumed plus burned; negative means surplus
    pub calories_remaining_kcal: f64,
}

/// Outcome of logging a workout
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutResult {
    pub workout_type: String,
    pub duration_minutes: u32,
    pub met: f64,
    pub calories_burned_kcal: f64,
    pub water_bonus_ml: i64,
}

// ============================================================================
// Dialogue
// ============================================================================

/// Position in the profile-collection dialogue
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStage {
    #[default]
    NotStarted,
    AwaitingWeight,
    AwaitingHeight,
    AwaitingAge,
    AwaitingActivity,
    AwaitingCity,
    AwaitingCalorieOverride,
    Completed,
}

impl DialogueStage {
    /// Whether free text should be routed to the dialogue
    pub fn is_active(self) -> bool {
        !matches!(self, DialogueStage::NotStarted | DialogueStage::Completed)
    }
}

/// Profile fields gathered so far
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileDraft {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age_years: Option<u32>,
    pub daily_activity_minutes: Option<u32>,
    pub city: Option<String>,
}

// ============================================================================
// Pending food
// ============================================================================

/// A named food whose energy density is known, waiting for a gram quantity
#[derive(Clone, Debug, PartialEq)]
pub struct PendingFoodEntry {
    pub food_name: String,
    pub kcal_per_100g: f64,
}
