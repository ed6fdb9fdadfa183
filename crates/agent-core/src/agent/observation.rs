use std::fmt::Write;

use crate::state::GameState;

/// Renders a snapshot as one compact human-readable line for prompts and logs.
pub fn format_observation(state: &GameState) -> String {
    let mut out = String::new();

    match state.player.position {
        Some(pos) => write!(out, "Player at ({}, {})", pos.x, pos.y).unwrap(),
        None => write!(out, "Player at (?, ?)").unwrap(),
    }
    write!(
        out,
        " in Map {}.{}.",
        state.player.map_bank, state.player.map_id
    )
    .unwrap();

    match state.party_count {
        Some(n) => write!(out, " Party size: {n}.").unwrap(),
        None => write!(out, " Party size: ?.").unwrap(),
    }

    if state.in_battle {
        out.push_str(" In battle!");
    }

    out
}
