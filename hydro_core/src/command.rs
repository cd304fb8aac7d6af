//! Parsing of inbound transport lines into commands.
//!
//! A line is either a command (`log_water 250`, optionally written `/log_water`
//! or `/log_water@SomeBot` as chat clients send them) or free text.

/// Usage hints attached to [`crate::Error::InvalidArgument`]
pub mod usage {
    pub const LOG_WATER: &str = "/log_water <amount_ml>";
    pub const LOG_FOOD: &str = "/log_food <food name>";
    pub const LOG_WORKOUT: &str = "/log_workout <type> <minutes>";
    pub const GRAMS: &str = "<grams> after /log_food, e.g. 150";
}

/// A parsed inbound line
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start,
    Help,
    SetProfile,
    Skip,
    Reset,
    LogWater(f64),
    LogFood(String),
    LogWorkout {
        workout_type: String,
        duration_minutes: u32,
    },
    CheckProgress,
    /// A known command whose arguments did not parse; reported only once the
    /// user has a profile
    Malformed { usage: &'static str },
    /// A `/command` we do not know
    Unknown(String),
    /// Anything that is not a command
    Text(String),
}

impl Command {
    /// Parse one line. Never fails: bad arguments become [`Command::Malformed`]
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let slashed = head.starts_with('/');
        let name = head.trim_start_matches('/');
        // Chat clients address commands as /cmd@BotName in groups
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "set_profile" => Command::SetProfile,
            "skip" => Command::Skip,
            "reset" => Command::Reset,
            "check_progress" => Command::CheckProgress,
            "log_water" => match rest.split_whitespace().next().and_then(parse_number) {
                Some(amount) => Command::LogWater(amount),
                None => Command::Malformed {
                    usage: usage::LOG_WATER,
                },
            },
            "log_food" => {
                let food = rest.split_whitespace().collect::<Vec<_>>().join(" ");
                if food.is_empty() {
                    Command::Malformed {
                        usage: usage::LOG_FOOD,
                    }
                } else {
                    Command::LogFood(food)
                }
            }
            "log_workout" => parse_workout(rest).unwrap_or(Command::Malformed {
                usage: usage::LOG_WORKOUT,
            }),
            _ if slashed => Command::Unknown(head.to_string()),
            _ => Command::Text(line.to_string()),
        }
    }

    /// Whether this command can change session state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Start
                | Command::Help
                | Command::CheckProgress
                | Command::Malformed { .. }
                | Command::Unknown(_)
        )
    }
}

/// `<type...> <minutes>`: the last token is the duration
fn parse_workout(rest: &str) -> Option<Command> {
    let mut tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let duration_minutes = tokens
        .pop()
        .and_then(|t| t.parse::<u32>().ok())
        .filter(|m| *m > 0)?;

    Some(Command::LogWorkout {
        workout_type: tokens.join(" "),
        duration_minutes,
    })
}

/// Parse a decimal number, accepting `,` as the decimal separator
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .or_else(|_| text.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("set_profile"), Command::SetProfile);
        assert_eq!(Command::parse("/skip"), Command::Skip);
        assert_eq!(
            Command::parse("/check_progress@HydroBot"),
            Command::CheckProgress
        );
    }

    #[test]
    fn test_parse_log_water() {
        assert_eq!(Command::parse("/log_water 250"), Command::LogWater(250.0));
        assert_eq!(Command::parse("log_water 0,5"), Command::LogWater(0.5));
        assert_eq!(
            Command::parse("/log_water"),
            Command::Malformed {
                usage: usage::LOG_WATER
            }
        );
        assert_eq!(
            Command::parse("/log_water lots"),
            Command::Malformed {
                usage: usage::LOG_WATER
            }
        );
    }

    #[test]
    fn test_parse_log_food_joins_words() {
        assert_eq!(
            Command::parse("/log_food  peanut   butter "),
            Command::LogFood("peanut butter".into())
        );
        assert_eq!(
            Command::parse("/log_food"),
            Command::Malformed {
                usage: usage::LOG_FOOD
            }
        );
    }

    #[test]
    fn test_parse_log_workout() {
        assert_eq!(
            Command::parse("/log_workout running 30"),
            Command::LogWorkout {
                workout_type: "running".into(),
                duration_minutes: 30
            }
        );
        assert_eq!(
            Command::parse("/log_workout тренажерный зал 45"),
            Command::LogWorkout {
                workout_type: "тренажерный зал".into(),
                duration_minutes: 45
            }
        );
        for line in [
            "/log_workout running",
            "/log_workout running -5",
            "/log_workout running 0",
        ] {
            assert_eq!(
                Command::parse(line),
                Command::Malformed {
                    usage: usage::LOG_WORKOUT
                },
                "{}",
                line
            );
        }
        assert!(!Command::parse("/log_workout yoga").is_mutating());
    }

    #[test]
    fn test_free_text_and_unknown() {
        assert_eq!(Command::parse("70.5"), Command::Text("70.5".into()));
        assert_eq!(
            Command::parse("New York"),
            Command::Text("New York".into())
        );
        assert_eq!(
            Command::parse("/dance now"),
            Command::Unknown("/dance".into())
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("70,5"), Some(70.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
