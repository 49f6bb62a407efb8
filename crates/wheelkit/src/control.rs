//! Line protocol spoken over the control socket.

use crate::roll::PresetId;
use crate::store::View;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Hide,
    /// Roll the given preset, or the configured default.
    Roll(Option<PresetId>),
    Replay(u64),
    /// Stop a spin in progress where it is.
    Cancel,
    SetDuration(f64),
    SetSpeed(f64),
    View(View),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error("Invalid argument '{0}'")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?;
        let arg = words.next();

        let number = |name: &'static str, arg: Option<&str>| -> Result<f64, ParseCommandError> {
            let raw = arg.ok_or(ParseCommandError::MissingArgument(name))?;
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseCommandError::InvalidArgument(raw.to_string()))
        };

        match verb {
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "cancel" => Ok(Self::Cancel),
            "roll" => Ok(Self::Roll(arg.map(PresetId::from))),
            "replay" => {
                let raw = arg.ok_or(ParseCommandError::MissingArgument("replay"))?;
                raw.parse()
                    .map(Self::Replay)
                    .map_err(|_| ParseCommandError::InvalidArgument(raw.to_string()))
            }
            "set" => match arg {
                Some("duration") => Ok(Self::SetDuration(number("duration", words.next())?)),
                Some("speed") => Ok(Self::SetSpeed(number("speed", words.next())?)),
                Some(other) => Err(ParseCommandError::InvalidArgument(other.to_string())),
                None => Err(ParseCommandError::MissingArgument("set")),
            },
            "view" => {
                let raw = arg.ok_or(ParseCommandError::MissingArgument("view"))?;
                raw.parse()
                    .map(Self::View)
                    .map_err(|_| ParseCommandError::InvalidArgument(raw.to_string()))
            }
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => write!(f, "show"),
            Self::Hide => write!(f, "hide"),
            Self::Cancel => write!(f, "cancel"),
            Self::Roll(Some(preset)) => write!(f, "roll {preset}"),
            Self::Roll(None) => write!(f, "roll"),
            Self::Replay(id) => write!(f, "replay {id}"),
            Self::SetDuration(secs) => write!(f, "set duration {secs}"),
            Self::SetSpeed(mult) => write!(f, "set speed {mult}"),
            Self::View(view) => write!(f, "view {view}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cases = vec![
            ("show", Command::Show),
            ("  hide ", Command::Hide),
            ("roll", Command::Roll(None)),
            ("roll movies", Command::Roll(Some(PresetId::from("movies")))),
            ("replay 12", Command::Replay(12)),
            ("set duration 6.5", Command::SetDuration(6.5)),
            ("set speed 2", Command::SetSpeed(2.0)),
            ("view History", Command::View(View::History)),
            ("cancel", Command::Cancel),
        ];

        for (line, expected) in cases {
            assert_eq!(line.parse::<Command>().unwrap(), expected);
        }
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "spin".parse::<Command>(),
            Err(ParseCommandError::Unknown("spin".into()))
        );
        assert_eq!(
            "replay".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("replay"))
        );
        assert_eq!(
            "set speed fast".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument("fast".into()))
        );
        assert_eq!(
            "set duration NaN".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument("NaN".into()))
        );
    }

    #[test]
    fn test_display_parses_back() {
        for cmd in [
            Command::Roll(Some(PresetId::from("anime"))),
            Command::SetSpeed(1.5),
            Command::View(View::Settings),
        ] {
            assert_eq!(cmd.to_string().parse::<Command>().unwrap(), cmd);
        }
    }
}
