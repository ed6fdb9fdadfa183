//! Shared agent core primitives: emulator boundary, RAM state mapper, and control loop.
//!
//! The emulator itself (CPU/PPU emulation, ROM loading, input injection) and the
//! model server are external collaborators; this crate consumes them through the
//! `emulator` traits and the `llm` client and builds the observe -> decide -> act
//! cycle on top.

pub mod agent;
pub mod emulator;
pub mod llm;
pub mod mapper;
pub mod state;
