//! Workshop capacity: a renewable per-tick resource.
//!
//! Invariant outside of a running step: `0 <= capacity_left <= capacity_per_tick`
//! and `capacity_per_tick >= 1`.

use worldtick_types::Economy;

use crate::LedgerError;

/// Refill capacity for a new tick step. Returns the refilled amount.
///
/// A corrupt `capacity_per_tick` of zero is repaired to 1 first. Whatever
/// was left from the previous step is discarded.
pub fn reset_capacity(economy: &mut Economy) -> u32 {
    economy.capacity_per_tick = economy.capacity_per_tick.max(1);
    economy.capacity_left = economy.capacity_per_tick;
    economy.capacity_left
}

/// Take one unit of capacity. Returns what is left.
///
/// # Errors
///
/// Returns [`LedgerError::CapacityExhausted`] when nothing is left.
pub fn try_consume_capacity(economy: &mut Economy) -> Result<u32, LedgerError> {
    let left = economy
        .capacity_left
        .checked_sub(1)
        .ok_or(LedgerError::CapacityExhausted)?;
    economy.capacity_left = left;
    Ok(left)
}

/// Bring an economy loaded from outside back within its invariant.
pub fn clamp_capacity(economy: &mut Economy) {
    economy.capacity_per_tick = economy.capacity_per_tick.max(1);
    economy.capacity_left = economy.capacity_left.min(economy.capacity_per_tick);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn consume_until_exhausted() {
        let mut economy = Economy::new(2);
        assert_eq!(try_consume_capacity(&mut economy).unwrap(), 1);
        assert_eq!(try_consume_capacity(&mut economy).unwrap(), 0);
        assert_eq!(
            try_consume_capacity(&mut economy).unwrap_err(),
            LedgerError::CapacityExhausted
        );
        assert_eq!(economy.capacity_left, 0);
    }

    #[test]
    fn reset_discards_leftovers_and_refills() {
        let mut economy = Economy {
            capacity_per_tick: 3,
            capacity_left: 1,
        };
        assert_eq!(reset_capacity(&mut economy), 3);
        assert_eq!(economy.capacity_left, 3);
    }

    #[test]
    fn reset_repairs_zero_per_tick() {
        let mut economy = Economy {
            capacity_per_tick: 0,
            capacity_left: 0,
        };
        assert_eq!(reset_capacity(&mut economy), 1);
    }

    #[test]
    fn clamp_caps_left_at_per_tick() {
        let mut economy = Economy {
            capacity_per_tick: 2,
            capacity_left: 9,
        };
        clamp_capacity(&mut economy);
        assert_eq!(economy.capacity_left, 2);
    }
}
