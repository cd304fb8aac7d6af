#![forbid(unsafe_code)]

//! Core domain model and business logic for the Hydro tracker.
//!
//! This crate provides:
//! - Domain types (profile, goals, ledger, dialogue progress)
//! - Goal derivation from profile and ambient temperature
//! - The profile-collection dialogue
//! - Workout catalog (MET coefficients)
//! - Per-user session store and command routing
//! - Weather and nutrition lookups with fallbacks
//! - Snapshot persistence

pub mod types;
pub mod error;
pub mod goals;
pub mod catalog;
pub mod dialogue;
pub mod ledger;
pub mod lookup;
pub mod command;
pub mod reply;
pub mod session;
pub mod config;
pub mod logging;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use types::*;
pub use goals::{calorie_goal_kcal, derive_goals, water_goal_ml};
pub use catalog::{get_default_catalog, WorkoutCatalog, DEFAULT_MET};
pub use dialogue::{ProfileDialogue, Transition};
pub use lookup::{FoodService, Lookups, WeatherService};
pub use command::Command;
pub use reply::Reply;
pub use session::SessionStore;
pub use config::Config;
pub use state::StoreSnapshot;
