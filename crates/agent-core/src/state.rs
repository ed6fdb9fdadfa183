//! Typed snapshot of the observable game state.
//!
//! Every poll of the mapper produces a brand-new value; nothing here is
//! patched in place.

use std::time::SystemTime;

/// Overworld tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    /// Decoded trainer name, at most 7 glyphs.
    pub name: String,
    pub trainer_id: u16,
    /// 0 = male, 1 = female.
    pub gender: u8,
    /// `None` while the save-block pointer is still a sentinel (title screen,
    /// mid-load); a placeholder zero would be indistinguishable from real
    /// (0, 0) coordinates.
    pub position: Option<Position>,
    pub map_bank: u8,
    pub map_id: u8,
    pub money: u32,
}

/// One party member. The 100-byte in-RAM record is not decoded yet, so
/// `GameState::party` is always empty; this type reserves the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyPokemon {}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub player: PlayerInfo,
    /// `None` when the raw byte is outside 0..=6, which means we caught the
    /// RAM mid-write or read garbage; such a value must not be trusted.
    pub party_count: Option<u8>,
    pub party: Vec<PartyPokemon>,
    pub in_battle: bool,
    /// Capture time of this snapshot.
    pub timestamp: SystemTime,
}
