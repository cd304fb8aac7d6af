//! Profile-collection dialogue.
//!
//! A linear state machine with one stage per profile field:
//!
//! ```text
//! NotStarted -> AwaitingWeight -> AwaitingHeight -> AwaitingAge
//!   -> AwaitingActivity -> AwaitingCity -> AwaitingCalorieOverride -> Completed
//! ```
//!
//! Input is validated before anything changes. A rejected answer leaves the
//! stage and the draft exactly as they were, so the caller simply re-asks.

use crate::command::parse_number;
use crate::lookup::Lookups;
use crate::{
    derive_goals, DialogueStage, Error, Goals, Profile, ProfileDraft, Result, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Dialogue progress for one user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileDialogue {
    pub stage: DialogueStage,
    pub draft: ProfileDraft,
}

/// What the caller should do after a successful step
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Ask for the field belonging to this stage
    Ask(DialogueStage),
    /// The city was given; install a fresh ledger for these goals
    GoalsDerived {
        profile: Profile,
        goals: Goals,
        temperature_c: f64,
    },
    /// Dialogue finished with a user-chosen calorie goal
    CalorieGoalOverridden(i64),
    /// Dialogue finished keeping the derived calorie goal
    CalorieGoalKept,
}

impl ProfileDialogue {
    pub fn is_active(&self) -> bool {
        self.stage.is_active()
    }

    /// Begin (or restart) the dialogue, discarding any partial answers
    pub fn start(&mut self) -> Transition {
        self.draft = ProfileDraft::default();
        self.stage = DialogueStage::AwaitingWeight;
        tracing::debug!("Profile dialogue started");
        Transition::Ask(self.stage)
    }

    /// Feed one free-text answer into the current stage
    pub fn advance(&mut self, input: &str, lookups: &Lookups) -> Result<Transition> {
        let input = input.trim();
        let transition = match self.stage {
            DialogueStage::AwaitingWeight => {
                self.draft.weight_kg = Some(positive_decimal(input, "weight")?);
                self.ask(DialogueStage::AwaitingHeight)
            }
            DialogueStage::AwaitingHeight => {
                self.draft.height_cm = Some(positive_decimal(input, "height")?);
                self.ask(DialogueStage::AwaitingAge)
            }
            DialogueStage::AwaitingAge => {
                let age = whole_number(input)?;
                if age <= 0 || age > i64::from(u32::MAX) {
                    return Err(out_of_range("age", "a positive whole number"));
                }
                self.draft.age_years = Some(age as u32);
                self.ask(DialogueStage::AwaitingActivity)
            }
            DialogueStage::AwaitingActivity => {
                let minutes = whole_number(input)?;
                if minutes < 0 || minutes > i64::from(u32::MAX) {
                    return Err(out_of_range("activity", "zero or more minutes"));
                }
                self.draft.daily_activity_minutes = Some(minutes as u32);
                self.ask(DialogueStage::AwaitingCity)
            }
            DialogueStage::AwaitingCity => self.finish_profile(input, lookups)?,
            DialogueStage::AwaitingCalorieOverride => {
                let goal = whole_number(input)?;
                if goal <= 0 {
                    return Err(out_of_range("calorie goal", "a positive whole number"));
                }
                self.complete();
                Transition::CalorieGoalOverridden(goal)
            }
            DialogueStage::NotStarted | DialogueStage::Completed => {
                return Err(Error::State("no profile dialogue in progress".into()));
            }
        };
        Ok(transition)
    }

    /// Accept the derived calorie goal; only valid while awaiting the override
    pub fn skip(&mut self) -> Result<Transition> {
        if self.stage != DialogueStage::AwaitingCalorieOverride {
            return Err(ValidationError::UnexpectedSkip.into());
        }
        self.complete();
        Ok(Transition::CalorieGoalKept)
    }

    fn ask(&mut self, next: DialogueStage) -> Transition {
        tracing::debug!("Profile dialogue {:?} -> {:?}", self.stage, next);
        self.stage = next;
        Transition::Ask(next)
    }

    fn finish_profile(&mut self, city: &str, lookups: &Lookups) -> Result<Transition> {
        if city.is_empty() {
            return Err(ValidationError::Empty.into());
        }

        let missing = || Error::State("profile draft is incomplete".into());
        let profile = Profile {
            weight_kg: self.draft.weight_kg.ok_or_else(missing)?,
            height_cm: self.draft.height_cm.ok_or_else(missing)?,
            age_years: self.draft.age_years.ok_or_else(missing)?,
            daily_activity_minutes: self.draft.daily_activity_minutes.ok_or_else(missing)?,
            city: city.to_string(),
        };

        let temperature_c = lookups.temperature_or_fallback(city);
        let goals = derive_goals(&profile, temperature_c);
        tracing::info!(
            "Derived goals for {:?} at {} C: {} ml water, {} kcal",
            profile.city,
            temperature_c,
            goals.water_goal_ml,
            goals.calorie_goal_kcal
        );

        self.draft.city = Some(profile.city.clone());
        self.stage = DialogueStage::AwaitingCalorieOverride;
        Ok(Transition::GoalsDerived {
            profile,
            goals,
            temperature_c,
        })
    }

    fn complete(&mut self) {
        self.stage = DialogueStage::Completed;
        self.draft = ProfileDraft::default();
        tracing::debug!("Profile dialogue completed");
    }
}

fn positive_decimal(input: &str, field: &'static str) -> Result<f64> {
    let value = parse_number(input).ok_or_else(|| ValidationError::NotANumber(input.into()))?;
    if value <= 0.0 {
        return Err(out_of_range(field, "greater than zero"));
    }
    Ok(value)
}

fn whole_number(input: &str) -> Result<i64> {
    match input.parse::<i64>() {
        Ok(n) => Ok(n),
        Err(_) if parse_number(input).is_some() => {
            Err(ValidationError::NotAnInteger(input.into()).into())
        }
        Err(_) => Err(ValidationError::NotANumber(input.into()).into()),
    }
}

fn out_of_range(field: &'static str, constraint: &'static str) -> Error {
    ValidationError::OutOfRange { field, constraint }.into()
}
