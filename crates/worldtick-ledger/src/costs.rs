//! Fixed prices charged by the economy.

/// Balance debited for every applied move.
pub const MOVE_COST_MON: u64 = 1;

/// Whether a balance covers one move.
pub const fn can_afford_move(balance_mon: u64) -> bool {
    balance_mon >= MOVE_COST_MON
}
