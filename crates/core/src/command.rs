//! Graph mutation commands.
//!
//! Commands are emitted by the tutoring proxy and replayed once, in order,
//! against the graphing surface. On the wire they are JSON objects tagged by
//! the `command` key, e.g. `{"command":"setValue","object":"a","value":-0.5}`.

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

/// Target coordinates for `setPoint`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One instruction to mutate a named object on the graphing surface.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// Set a numeric object (`a`, `b`, `c`, `A`, ...).
    SetValue { object: String, value: f64 },
    /// Show or hide an object.
    SetVisible { object: String, value: bool },
    /// Move a point.
    SetPoint { object: String, value: Point },
    /// Run a free-form command in the applet's input bar.
    EvalCommand { value: String },
    /// A tag this build does not know. Kept so the applier can log and skip it.
    #[serde(untagged)]
    Unknown { command: String },
}

impl Command {
    pub fn set_value(object: impl Into<String>, value: f64) -> Self {
        Command::SetValue {
            object: object.into(),
            value,
        }
    }

    /// The wire tag of this command.
    pub fn kind(&self) -> &str {
        match self {
            Command::SetValue { .. } => "setValue",
            Command::SetVisible { .. } => "setVisible",
            Command::SetPoint { .. } => "setPoint",
            Command::EvalCommand { .. } => "evalCommand",
            Command::Unknown { command } => command,
        }
    }

    /// The named object this command targets, if any.
    pub fn object(&self) -> Option<&str> {
        match self {
            Command::SetValue { object, .. }
            | Command::SetVisible { object, .. }
            | Command::SetPoint { object, .. } => Some(object),
            Command::EvalCommand { .. } | Command::Unknown { .. } => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
enum KnownCommand {
    SetValue {
        object: String,
        value: f64,
    },
    SetVisible {
        object: String,
        #[serde(default, deserialize_with = "truthy")]
        value: bool,
    },
    SetPoint {
        object: String,
        value: Point,
    },
    EvalCommand {
        value: String,
    },
}

impl From<KnownCommand> for Command {
    fn from(known: KnownCommand) -> Self {
        match known {
            KnownCommand::SetValue { object, value } => Command::SetValue { object, value },
            KnownCommand::SetVisible { object, value } => Command::SetVisible { object, value },
            KnownCommand::SetPoint { object, value } => Command::SetPoint { object, value },
            KnownCommand::EvalCommand { value } => Command::EvalCommand { value },
        }
    }
}

const KNOWN_TAGS: [&str; 4] = ["setValue", "setVisible", "setPoint", "evalCommand"];

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let tag = raw
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("command"))?;

        if KNOWN_TAGS.contains(&tag) {
            serde_json::from_value::<KnownCommand>(raw)
                .map(Command::from)
                .map_err(D::Error::custom)
        } else {
            Ok(Command::Unknown {
                command: tag.to_string(),
            })
        }
    }
}

/// Loose boolean coercion for `setVisible` values produced by a language model.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !(s.is_empty() || s.eq_ignore_ascii_case("false") || s == "0"),
        Value::Array(_) | Value::Object(_) => true,
    })
}
