//! Interprets raw emulated RAM as typed game state.
//!
//! Fixed offsets come from an [`AddressTable`]; the only pointer indirection
//! is the save block holding the player coordinates. Decoding is pure and
//! deterministic given the byte values, so nearly all of this file is
//! exercised by unit tests against synthetic memory.

pub mod charset;
pub mod offsets;

use std::time::SystemTime;

use anyhow::Context;

use crate::emulator::MemoryRead;
use crate::state::{GameState, PlayerInfo, Position};
use self::offsets::AddressTable;

/// Save-block pointer value before the game writes it.
const PTR_UNINIT: u32 = 0;
/// Save-block pointer value while the game tears it down.
const PTR_INVALID: u32 = 0xFFFF_FFFF;
/// Largest believable party size; anything above is a misread.
const PARTY_MAX: u8 = 6;

/// RAM-to-state mapper for one ROM revision.
pub struct RamMapper<M: MemoryRead> {
    mem: M,
    table: AddressTable,
}

impl<M: MemoryRead> RamMapper<M> {
    pub fn new(mem: M, table: AddressTable) -> Self {
        Self { mem, table }
    }

    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    /// Takes a fresh snapshot of the observable game state.
    ///
    /// Errors only when the underlying memory interface is unavailable
    /// (emulator not attached, no ROM loaded) -- that must fail loudly
    /// instead of silently reporting zeros. Pointer sentinels and
    /// out-of-range values degrade to the snapshot's unknown markers.
    pub fn game_state(&self) -> anyhow::Result<GameState> {
        Ok(GameState {
            player: self.player_info()?,
            party_count: self.party_count()?,
            party: Vec::new(),
            in_battle: self.in_battle()?,
            timestamp: SystemTime::now(),
        })
    }

    fn player_info(&self) -> anyhow::Result<PlayerInfo> {
        let name = self.player_name()?;
        let trainer_id = self
            .mem
            .load_u16(self.table.player_id)
            .context("read trainer id")?;
        let gender = self
            .mem
            .load_u8(self.table.player_gender)
            .context("read gender")?;
        let money = self.mem.load_u32(self.table.money).context("read money")?;
        let position = self.player_position()?;
        let map_bank = self
            .mem
            .load_u8(self.table.map_bank)
            .context("read map bank")?;
        let map_id = self.mem.load_u8(self.table.map_id).context("read map id")?;

        Ok(PlayerInfo {
            name,
            trainer_id,
            gender,
            position,
            map_bank,
            map_id,
            money,
        })
    }

    /// Coordinates live behind the save-block pointer, which must be
    /// validated against its two sentinels before dereferencing.
    fn player_position(&self) -> anyhow::Result<Option<Position>> {
        let ptr = self
            .mem
            .load_u32(self.table.save_block_ptr)
            .context("read save block pointer")?;
        if ptr == PTR_UNINIT || ptr == PTR_INVALID {
            return Ok(None);
        }
        let x = self.mem.load_u16(ptr).context("read player x")? as i16;
        let y = self
            .mem
            .load_u16(ptr.wrapping_add(2))
            .context("read player y")? as i16;
        Ok(Some(Position { x, y }))
    }

    fn player_name(&self) -> anyhow::Result<String> {
        let mut bytes = [0u8; charset::PLAYER_NAME_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self
                .mem
                .load_u8(self.table.player_name + i as u32)
                .context("read player name")?;
        }
        Ok(charset::decode_name(&bytes))
    }

    fn party_count(&self) -> anyhow::Result<Option<u8>> {
        let raw = self
            .mem
            .load_u8(self.table.party_count)
            .context("read party count")?;
        Ok((raw <= PARTY_MAX).then_some(raw))
    }

    fn in_battle(&self) -> anyhow::Result<bool> {
        let flag = self
            .mem
            .load_u8(self.table.in_battle)
            .context("read battle flag")?;
        Ok(flag != 0)
    }
}
