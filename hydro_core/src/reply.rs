//! User-facing replies.
//!
//! Every inbound line produces exactly one [`Reply`]. Its `Display` impl is
//! the text a transport sends back; the variants stay structured so callers
//! (and tests) can match on outcomes instead of parsing text.

use crate::{DialogueStage, Error, Goals, Progress, ValidationError, WorkoutResult};
use std::fmt;

#[derive(Debug)]
pub enum Reply {
    Greeting,
    Help,
    /// Ask for the field of this stage
    Ask(DialogueStage),
    /// Answer rejected; the same stage is asked again
    Reprompt {
        stage: DialogueStage,
        reason: ValidationError,
    },
    GoalsDerived {
        goals: Goals,
        temperature_c: f64,
    },
    CalorieGoalOverridden(i64),
    CalorieGoalKept(i64),
    WaterLogged {
        amount_ml: f64,
        remaining_ml: f64,
    },
    FoodFound {
        food_name: String,
        kcal_per_100g: f64,
    },
    FoodLogged {
        food_name: String,
        calories_kcal: f64,
    },
    WorkoutLogged(WorkoutResult),
    Progress(Progress),
    Reset,
    /// Any failure, explained to the user
    Failure(Error),
}

impl Reply {
    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failure(_) | Reply::Reprompt { .. })
    }
}

/// Question asked at each dialogue stage
pub fn question(stage: DialogueStage) -> &'static str {
    match stage {
        DialogueStage::AwaitingWeight => "Enter your weight (kg):",
        DialogueStage::AwaitingHeight => "Enter your height (cm):",
        DialogueStage::AwaitingAge => "Enter your age:",
        DialogueStage::AwaitingActivity => "How many minutes of activity do you get per day?",
        DialogueStage::AwaitingCity => "Which city are you in?",
        DialogueStage::AwaitingCalorieOverride => {
            "Send a new calorie goal or /skip to keep the computed one:"
        }
        DialogueStage::NotStarted | DialogueStage::Completed => {
            "Run /set_profile to set up your profile."
        }
    }
}

const HELP: &str = "Commands:\n\
/set_profile - set up your profile and daily goals\n\
/log_water <ml> - log water you drank\n\
/log_food <food name> - log food, then send the grams eaten\n\
/log_workout <type> <minutes> - log a workout\n\
/check_progress - show today's progress\n\
/reset - forget your profile and totals";

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Greeting => write!(
                f,
                "Hi! I track your water, calories and workouts.\n\
                 Start with /set_profile to set up your profile."
            ),
            Reply::Help => f.write_str(HELP),
            Reply::Ask(stage) => f.write_str(question(*stage)),
            Reply::Reprompt { stage, reason } => {
                write!(f, "Sorry, {}.\n{}", reason, question(*stage))
            }
            Reply::GoalsDerived {
                goals,
                temperature_c,
            } => write!(
                f,
                "Profile saved! (current temperature {:.1} C)\n\
                 Water goal: {} ml/day\n\
                 Calorie goal: {} kcal/day\n\
                 You can change the calorie goal now or skip (/skip):",
                temperature_c, goals.water_goal_ml, goals.calorie_goal_kcal
            ),
            Reply::CalorieGoalOverridden(goal) => {
                write!(f, "Calorie goal updated to {} kcal/day!", goal)
            }
            Reply::CalorieGoalKept(goal) => {
                write!(f, "Keeping the calorie goal of {} kcal/day.", goal)
            }
            Reply::WaterLogged {
                amount_ml,
                remaining_ml,
            } => write!(
                f,
                "Logged {} ml of water. Remaining: {} ml",
                amount_ml,
                remaining_ml.round()
            ),
            Reply::FoodFound {
                food_name,
                kcal_per_100g,
            } => write!(
                f,
                "{} - {} kcal/100g. How many grams did you eat?",
                food_name, kcal_per_100g
            ),
            Reply::FoodLogged {
                food_name,
                calories_kcal,
            } => write!(f, "Logged {}: {:.1} kcal", food_name, calories_kcal),
            Reply::WorkoutLogged(workout) => write!(
                f,
                "{} {} min - {} kcal burned.\nDrink an extra {} ml of water.",
                capitalize(&workout.workout_type),
                workout.duration_minutes,
                workout.calories_burned_kcal.round(),
                workout.water_bonus_ml
            ),
            Reply::Progress(p) => write!(
                f,
                "Progress:\n\
                 Water:\n\
                 - Drunk: {} ml of {} ml\n\
                 - Remaining: {} ml\n\n\
                 Calories:\n\
                 - Consumed: {} kcal of {} kcal\n\
                 - Burned: {} kcal\n\
                 - Balance: {} kcal",
                p.logged_water_ml,
                p.water_goal_ml,
                p.water_remaining_ml.round(),
                p.logged_calories_kcal.round(),
                p.calorie_goal_kcal,
                p.burned_calories_kcal.round(),
                p.calories_remaining_kcal.round()
            ),
            Reply::Reset => f.write_str("Your profile and totals were cleared. Run /set_profile to start again."),
            Reply::Failure(err) => write_failure(f, err),
        }
    }
}

fn write_failure(f: &mut fmt::Formatter<'_>, err: &Error) -> fmt::Result {
    match err {
        Error::ProfileNotSet => f.write_str("Set up your profile first with /set_profile"),
        Error::NotFound(food) => write!(f, "Food not found: {}", food),
        Error::NoPendingEntry => {
            f.write_str("Nothing to add grams to. Use /log_food <food name> first.")
        }
        Error::InvalidArgument { usage } => write!(f, "Usage: {}", usage),
        Error::Validation(ValidationError::UnexpectedSkip) => {
            f.write_str("There is nothing to skip right now.")
        }
        Error::Validation(reason) => write!(f, "Sorry, {}.", reason),
        _ => f.write_str("Something went wrong. Please try again."),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
