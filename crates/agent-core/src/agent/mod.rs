//! Agent framework primitives: the polling control loop and its seams.
//!
//! The loop itself is deliberately small; the interesting contracts are the
//! pluggable decision policy (scripted today, LLM-backed tomorrow, same slot)
//! and the step sink the loop reports to.

pub mod controller;
pub mod observation;
pub mod policy;
pub mod prompt;
pub mod step;
pub mod wire;

pub use controller::{AgentController, StepTiming};
pub use observation::format_observation;
pub use policy::{Decision, DecisionPolicy, LlmPolicy, RandomWalk};
pub use step::{AgentStep, StepLog, StepSink};
pub use wire::{extract_press_json, parse_press, PressCall, PressParseError, PressWire};
