/// Reverse-engineered RAM addresses for one ROM revision.
///
/// These are empirical and version-specific. The mapper takes a table at
/// construction so further revisions can be supported without touching the
/// decode logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTable {
    /// Number of Pokémon in the party (1 byte).
    pub party_count: u32,
    /// Current map bank (1 byte).
    pub map_bank: u32,
    /// Current map number (1 byte).
    pub map_id: u32,
    /// Player name (7 bytes, Gen 3 charset).
    pub player_name: u32,
    /// Trainer ID (2 bytes).
    pub player_id: u32,
    /// 0 = male, 1 = female (1 byte).
    pub player_gender: u32,
    /// Money (4 bytes).
    pub money: u32,
    /// Non-zero while a battle is active (1 byte).
    pub in_battle: u32,
    /// Pointer to the save block holding the player x/y coordinates.
    /// Reads 0 or 0xFFFF_FFFF until the game initializes its save state.
    pub save_block_ptr: u32,
}

/// Pokémon FireRed (USA), ROM code BPRE.
pub const FIRERED_USA: AddressTable = AddressTable {
    party_count: 0x0202_4029,
    map_bank: 0x0203_1DBC,
    map_id: 0x0203_1DBD,
    player_name: 0x0202_4734,
    player_id: 0x0202_473C,
    player_gender: 0x0202_4808,
    money: 0x0202_57BC,
    in_battle: 0x0202_2B4C,
    save_block_ptr: 0x0300_5008,
};
