use serde_json::Value;

use crate::types::{ControlCommand, Direction};

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    Control { command: ControlCommand },
    Ping { t: f64 },
}

// Anything malformed parses to `None` and is dropped by the caller
// without closing the connection.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "control" => {
            let command = ControlCommand::parse(object.get("command")?.as_str()?)?;
            Some(ParsedClientMessage::Control { command })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}
