//! Per-user session store.
//!
//! Each user owns one [`UserSession`] behind its own mutex. The outer map is
//! only write-locked to insert a new user, so work for different users never
//! contends beyond that, while every mutation for one user is serialized.

use crate::catalog::{get_default_catalog, WorkoutCatalog};
use crate::command::{parse_number, usage};
use crate::dialogue::{ProfileDialogue, Transition};
use crate::lookup::Lookups;
use crate::state::{StoreSnapshot, UserRecord};
use crate::{
    Command, DialogueStage, Error, Ledger, PendingFoodEntry, Progress, Reply, Result, UserId,
    WorkoutResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Everything the store keeps for one user
#[derive(Debug, Default)]
pub struct UserSession {
    pub dialogue: ProfileDialogue,
    pub ledger: Option<Ledger>,
    pub pending_food: Option<PendingFoodEntry>,
}

impl UserSession {
    fn ledger_mut(&mut self) -> Result<&mut Ledger> {
        self.ledger.as_mut().ok_or(Error::ProfileNotSet)
    }

    pub fn log_water(&mut self, amount_ml: f64) -> Result<f64> {
        self.ledger_mut()?.log_water(amount_ml)
    }

    /// Resolve a food's energy density and remember it until grams arrive
    pub fn begin_food_log(&mut self, food_name: &str, lookups: &Lookups) -> Result<f64> {
        self.ledger_mut()?;
        let food_name = food_name.trim();
        if food_name.is_empty() {
            return Err(Error::InvalidArgument {
                usage: usage::LOG_FOOD,
            });
        }

        let kcal_per_100g = lookups.calories_or_zero(food_name);
        if kcal_per_100g <= 0.0 {
            return Err(Error::NotFound(food_name.to_string()));
        }

        if let Some(previous) = self.pending_food.as_ref() {
            tracing::debug!("Replacing unconsumed food entry {:?}", previous.food_name);
        }
        self.pending_food = Some(PendingFoodEntry {
            food_name: food_name.to_string(),
            kcal_per_100g,
        });
        Ok(kcal_per_100g)
    }

    /// Add the pending food for the given grams and clear it
    pub fn commit_food_log(&mut self, grams: f64) -> Result<(String, f64)> {
        let ledger = self.ledger.as_mut().ok_or(Error::ProfileNotSet)?;
        let entry = self.pending_food.as_ref().ok_or(Error::NoPendingEntry)?;
        let added = ledger.add_food(entry, grams)?;
        let food_name = entry.food_name.clone();
        self.pending_food = None;
        Ok((food_name, added))
    }

    pub fn log_workout(
        &mut self,
        catalog: &WorkoutCatalog,
        workout_type: &str,
        duration_minutes: u32,
    ) -> Result<WorkoutResult> {
        self.ledger_mut()?
            .log_workout(catalog, workout_type, duration_minutes)
    }

    pub fn progress(&self) -> Result<Progress> {
        self.ledger
            .as_ref()
            .map(Ledger::progress)
            .ok_or(Error::ProfileNotSet)
    }

    /// Route one parsed command
    fn apply(
        &mut self,
        command: Command,
        lookups: &Lookups,
        catalog: &WorkoutCatalog,
    ) -> Result<Reply> {
        let reply = match command {
            Command::Start => Reply::Greeting,
            Command::Help | Command::Unknown(_) => Reply::Help,
            Command::SetProfile => {
                let transition = self.dialogue.start();
                self.apply_transition(transition)
            }
            Command::Skip => {
                let transition = self.dialogue.skip()?;
                self.apply_transition(transition)
            }
            Command::Reset => {
                *self = UserSession::default();
                Reply::Reset
            }
            Command::LogWater(amount_ml) => {
                let remaining_ml = self.log_water(amount_ml)?;
                Reply::WaterLogged {
                    amount_ml,
                    remaining_ml,
                }
            }
            Command::LogFood(food_name) => {
                let kcal_per_100g = self.begin_food_log(&food_name, lookups)?;
                Reply::FoodFound {
                    food_name,
                    kcal_per_100g,
                }
            }
            Command::LogWorkout {
                workout_type,
                duration_minutes,
            } => Reply::WorkoutLogged(self.log_workout(catalog, &workout_type, duration_minutes)?),
            Command::CheckProgress => Reply::Progress(self.progress()?),
            Command::Malformed { usage } => {
                self.ledger_mut()?;
                return Err(Error::InvalidArgument { usage });
            }
            Command::Text(text) if self.dialogue.is_active() => {
                match self.dialogue.advance(&text, lookups) {
                    Ok(transition) => self.apply_transition(transition),
                    Err(Error::Validation(reason)) => Reply::Reprompt {
                        stage: self.dialogue.stage,
                        reason,
                    },
                    Err(e) => return Err(e),
                }
            }
            Command::Text(text) => match parse_number(&text) {
                Some(grams) => {
                    let (food_name, calories_kcal) = self.commit_food_log(grams)?;
                    Reply::FoodLogged {
                        food_name,
                        calories_kcal,
                    }
                }
                None if self.pending_food.is_some() => {
                    return Err(Error::InvalidArgument {
                        usage: usage::GRAMS,
                    })
                }
                None => Reply::Help,
            },
        };
        Ok(reply)
    }

    fn apply_transition(&mut self, transition: Transition) -> Reply {
        match transition {
            Transition::Ask(stage) => Reply::Ask(stage),
            Transition::GoalsDerived {
                profile,
                goals,
                temperature_c,
            } => {
                // A new profile run replaces the previous ledger wholesale
                self.ledger = Some(Ledger::new(profile, goals));
                self.pending_food = None;
                Reply::GoalsDerived {
                    goals,
                    temperature_c,
                }
            }
            Transition::CalorieGoalOverridden(goal) => {
                match self.ledger.as_mut() {
                    Some(ledger) => ledger.override_calorie_goal(goal),
                    None => tracing::error!("Calorie override without a ledger"),
                }
                Reply::CalorieGoalOverridden(goal)
            }
            Transition::CalorieGoalKept => Reply::CalorieGoalKept(
                self.ledger
                    .as_ref()
                    .map(|l| l.goals.calorie_goal_kcal)
                    .unwrap_or_default(),
            ),
        }
    }
}

type SessionSlot = Arc<Mutex<UserSession>>;

/// Mapping from user identifier to that user's session
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, SessionSlot>>,
    lookups: Lookups,
    catalog: &'static WorkoutCatalog,
}

impl SessionStore {
    pub fn new(lookups: Lookups) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lookups,
            catalog: get_default_catalog(),
        }
    }

    /// Rebuild a store from a persisted snapshot
    pub fn restore(lookups: Lookups, snapshot: StoreSnapshot) -> Self {
        let sessions = snapshot
            .users
            .into_iter()
            .map(|(user, record)| {
                let session = UserSession {
                    dialogue: record.dialogue,
                    ledger: record.ledger,
                    pending_food: None,
                };
                (user, Arc::new(Mutex::new(session)))
            })
            .collect::<HashMap<_, _>>();
        tracing::info!("Restored {} user sessions", sessions.len());

        Self {
            sessions: RwLock::new(sessions),
            lookups,
            catalog: get_default_catalog(),
        }
    }

    /// Handle one inbound line for a user. Never fails; errors become replies.
    pub fn handle(&self, user: &UserId, line: &str) -> Reply {
        self.dispatch(user, Command::parse(line))
    }

    /// Handle an already-parsed command
    pub fn dispatch(&self, user: &UserId, command: Command) -> Reply {
        tracing::debug!("User {}: {:?}", user, command);
        let result = self.with_session(user, |session| {
            session.apply(command, &self.lookups, self.catalog)
        });
        match result {
            Ok(reply) => reply,
            Err(e) => self.failure(user, e),
        }
    }

    fn failure(&self, user: &UserId, error: Error) -> Reply {
        if error.is_domain() {
            tracing::debug!("User {}: {}", user, error);
        } else {
            tracing::error!("User {}: {}", user, error);
        }
        Reply::Failure(error)
    }

    pub fn log_water(&self, user: &UserId, amount_ml: f64) -> Result<f64> {
        self.with_session(user, |s| s.log_water(amount_ml))
    }

    pub fn begin_food_log(&self, user: &UserId, food_name: &str) -> Result<f64> {
        self.with_session(user, |s| s.begin_food_log(food_name, &self.lookups))
    }

    pub fn commit_food_log(&self, user: &UserId, grams: f64) -> Result<f64> {
        self.with_session(user, |s| s.commit_food_log(grams).map(|(_, kcal)| kcal))
    }

    pub fn log_workout(
        &self,
        user: &UserId,
        workout_type: &str,
        duration_minutes: u32,
    ) -> Result<WorkoutResult> {
        self.with_session(user, |s| {
            s.log_workout(self.catalog, workout_type, duration_minutes)
        })
    }

    pub fn progress(&self, user: &UserId) -> Result<Progress> {
        self.with_session(user, |s| s.progress())
    }

    /// Copy of the user's ledger, if their profile is set
    pub fn ledger(&self, user: &UserId) -> Option<Ledger> {
        let slot = self.existing(user)?;
        let ledger = lock(&slot).ledger.clone();
        ledger
    }

    pub fn stage(&self, user: &UserId) -> DialogueStage {
        match self.existing(user) {
            Some(slot) => {
                let stage = lock(&slot).dialogue.stage;
                stage
            }
            None => DialogueStage::NotStarted,
        }
    }

    /// Drop everything held for the user
    pub fn reset(&self, user: &UserId) {
        self.with_session(user, |s| *s = UserSession::default());
    }

    pub fn user_count(&self) -> usize {
        self.read_map().len()
    }

    /// Consistent per-user copy of every session's persistable state
    pub fn snapshot(&self) -> StoreSnapshot {
        let slots: Vec<(UserId, SessionSlot)> = self
            .read_map()
            .iter()
            .map(|(user, slot)| (user.clone(), Arc::clone(slot)))
            .collect();

        let users = slots
            .into_iter()
            .map(|(user, slot)| {
                let session = lock(&slot);
                let record = UserRecord {
                    dialogue: session.dialogue.clone(),
                    ledger: session.ledger.clone(),
                };
                (user, record)
            })
            .collect();

        StoreSnapshot { users }
    }

    /// Run `f` with exclusive access to the user's session
    fn with_session<T>(&self, user: &UserId, f: impl FnOnce(&mut UserSession) -> T) -> T {
        let slot = self.slot(user);
        let mut session = lock(&slot);
        f(&mut *session)
    }

    fn existing(&self, user: &UserId) -> Option<SessionSlot> {
        self.read_map().get(user).cloned()
    }

    fn slot(&self, user: &UserId) -> SessionSlot {
        if let Some(slot) = self.existing(user) {
            return slot;
        }
        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = Arc::clone(map.entry(user.clone()).or_default());
        tracing::debug!("New session for user {}", user);
        slot
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<UserId, SessionSlot>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Every operation validates before mutating, so a poisoned session is still consistent
fn lock(slot: &Mutex<UserSession>) -> MutexGuard<'_, UserSession> {
    slot.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Recovering poisoned session lock");
        poisoned.into_inner()
    })
}
