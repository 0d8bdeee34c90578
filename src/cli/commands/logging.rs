use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("CARDBASE_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_level_accepts_names_and_numbers() {
        let command = with_args(Command::new("t"));
        for (value, expected) in [("error", 0u8), ("WARN", 1), ("info", 2), ("3", 3), ("trace", 4)] {
            let parsed = temp_env::with_var("CARDBASE_LOG_LEVEL", Some(value), || {
                command
                    .clone()
                    .try_get_matches_from(vec!["t"])
                    .ok()
                    .and_then(|m| m.get_one::<u8>(ARG_VERBOSITY).copied())
            });
            assert_eq!(parsed, Some(expected), "level {value}");
        }
    }

    #[test]
    fn env_level_rejects_unknown_value() {
        let command = with_args(Command::new("t"));
        let result = temp_env::with_var("CARDBASE_LOG_LEVEL", Some("loud"), || {
            command.try_get_matches_from(vec!["t"]).map(|_| ())
        });
        assert!(result.is_err());
    }
}
