//! The step language on the `scrollback` command line.
//!
//! | Step            | Meaning                                      |
//! |-----------------|----------------------------------------------|
//! | `refresh`       | Cold refresh                                 |
//! | `refresh@<id>`  | Refresh anchored at item `<id>`              |
//! | `append`        | Load older items                             |
//! | `prepend`       | Load newer items                             |
//! | `window[@<id>]` | Print the window for `<id>`, or the newest   |
//! | `publish@<n>`   | Add `n` new items to the head of the feed    |

use std::fmt;
use std::str::FromStr;

use scrollback_core::{ItemId, LoadRequest};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Load(LoadRequest),
    Window(Option<ItemId>),
    Publish(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepParseError {
    #[error("unknown step `{0}`")]
    Unknown(String),

    #[error("`{0}` needs an argument after `@`")]
    MissingArgument(String),

    #[error("`{0}` takes no argument")]
    UnexpectedArgument(String),

    #[error("`{0}` is not a count")]
    BadCount(String),
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('@') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        if arg.is_some_and(str::is_empty) {
            return Err(StepParseError::MissingArgument(name.to_string()));
        }

        match (name, arg) {
            ("refresh", anchor) => Ok(Step::Load(LoadRequest::Refresh {
                anchor: anchor.map(ItemId::from),
            })),
            ("append", None) => Ok(Step::Load(LoadRequest::Append)),
            ("prepend", None) => Ok(Step::Load(LoadRequest::Prepend)),
            ("append" | "prepend", Some(_)) => {
                Err(StepParseError::UnexpectedArgument(name.to_string()))
            }
            ("window", key) => Ok(Step::Window(key.map(ItemId::from))),
            ("publish", Some(count)) => count
                .parse()
                .map(Step::Publish)
                .map_err(|_| StepParseError::BadCount(count.to_string())),
            ("publish", None) => Err(StepParseError::MissingArgument(name.to_string())),
            _ => Err(StepParseError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Load(LoadRequest::Refresh { anchor: None }) => write!(f, "refresh"),
            Step::Load(LoadRequest::Refresh { anchor: Some(id) }) => write!(f, "refresh@{id}"),
            Step::Load(LoadRequest::Append) => write!(f, "append"),
            Step::Load(LoadRequest::Prepend) => write!(f, "prepend"),
            Step::Window(None) => write!(f, "window"),
            Step::Window(Some(id)) => write!(f, "window@{id}"),
            Step::Publish(n) => write!(f, "publish@{n}"),
        }
    }
}
