//! Wire contract between the LLM and the loop.
//!
//! The model must return exactly one `<press>{json}</press>` block; we lock
//! that contract down here and translate it into a typed button press.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::emulator::Button;

pub const PRESS_START: &str = "<press>";
pub const PRESS_END: &str = "</press>";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PressWire {
    pub button: String,
    #[serde(default)]
    pub thought: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressParseError {
    MissingPressBlock,
    MultiplePressBlocks,
    InvalidJson,
    UnknownButton(String),
}

impl std::fmt::Display for PressParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PressParseError::MissingPressBlock => write!(f, "missing <press> block"),
            PressParseError::MultiplePressBlocks => write!(f, "multiple <press> blocks"),
            PressParseError::InvalidJson => write!(f, "invalid press json"),
            PressParseError::UnknownButton(name) => write!(f, "unknown button: {name}"),
        }
    }
}

impl std::error::Error for PressParseError {}

/// A validated press request from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressCall {
    pub button: Button,
    pub thought: String,
}

impl TryFrom<PressWire> for PressCall {
    type Error = PressParseError;

    fn try_from(wire: PressWire) -> Result<Self, Self::Error> {
        let button =
            Button::from_name(&wire.button).ok_or(PressParseError::UnknownButton(wire.button))?;
        Ok(Self {
            button,
            thought: wire.thought,
        })
    }
}

/// Extracts the JSON inside the single `<press>...</press>` block.
pub fn extract_press_json(script: &str) -> Result<String, PressParseError> {
    let start =
        script.find(PRESS_START).ok_or(PressParseError::MissingPressBlock)? + PRESS_START.len();
    let rest = &script[start..];
    let end_rel = rest.find(PRESS_END).ok_or(PressParseError::MissingPressBlock)?;
    let end = start + end_rel;

    // Reject multiple press blocks to keep the contract simple.
    let after_end = &script[end + PRESS_END.len()..];
    if after_end.contains(PRESS_START) {
        return Err(PressParseError::MultiplePressBlocks);
    }

    Ok(script[start..end].trim().to_string())
}

/// Parses a full LLM response into a validated [`PressCall`].
///
/// Contract:
/// - Exactly one `<press>...</press>` block
/// - The JSON is an object `{ "button": "...", "thought": "..." }`
pub fn parse_press(script: &str) -> anyhow::Result<PressCall> {
    let json_str = extract_press_json(script)?;

    let wire: PressWire = serde_json::from_str(&json_str)
        .map_err(|_| PressParseError::InvalidJson)
        .with_context(|| format!("press_json={json_str}"))?;

    let call = PressCall::try_from(wire)?;
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_ok() {
        let s = "x\n<press>\n{\"button\":\"UP\",\"thought\":\"explore\"}\n</press>\n";
        let got = extract_press_json(s).unwrap();
        assert_eq!(got, "{\"button\":\"UP\",\"thought\":\"explore\"}");
    }

    #[test]
    fn extract_rejects_multiple() {
        let s = "<press>{\"button\":\"UP\"}</press>\n<press>{\"button\":\"DOWN\"}</press>";
        assert_eq!(
            extract_press_json(s),
            Err(PressParseError::MultiplePressBlocks)
        );
    }

    #[test]
    fn extract_missing_block() {
        assert_eq!(
            extract_press_json("just text"),
            Err(PressParseError::MissingPressBlock)
        );
    }

    #[test]
    fn parse_button_is_case_insensitive() {
        let s = "<press>{\"button\":\"down\"}</press>";
        let call = parse_press(s).unwrap();
        assert_eq!(call.button, Button::Down);
        assert_eq!(call.thought, "");
    }

    #[test]
    fn parse_rejects_unknown_button() {
        let s = "<press>{\"button\":\"JUMP\"}</press>";
        let err = parse_press(s).unwrap_err();
        assert!(format!("{err}").contains("unknown button"));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let s = "<press>press UP please</press>";
        let err = parse_press(s).unwrap_err();
        assert!(format!("{err:#}").contains("invalid press json"));
    }
}
