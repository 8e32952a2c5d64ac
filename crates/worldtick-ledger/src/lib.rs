//! Balances, cost sinks, and workshop capacity for the worldtick simulation.
//!
//! The economy has two halves:
//!
//! - [`balance`] -- the balance ledger. Debits, credits, and agent-to-agent
//!   transfers, all with checked arithmetic. A balance never goes negative
//!   and a credit never wraps.
//! - [`capacity`] -- the renewable workshop capacity. Refilled at the start
//!   of every tick step, consumed by each successful earn, never banked.
//!
//! [`costs`] holds the fixed prices, currently just the move cost.
//!
//! Nothing here logs to the audit log or decides policy. The tick processor
//! calls these rules and turns every [`LedgerError`] into a denial event.

pub mod balance;
pub mod capacity;
pub mod costs;

pub use balance::{TransferReceipt, credit, debit, transfer};
pub use capacity::{clamp_capacity, reset_capacity, try_consume_capacity};
pub use costs::{MOVE_COST_MON, can_afford_move};

use worldtick_types::AgentId;

/// Errors raised by economy rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The debit exceeds the balance.
    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        needed: u64,
        /// Balance held.
        available: u64,
    },

    /// The workshop has no capacity left this tick.
    #[error("workshop capacity exhausted for this tick")]
    CapacityExhausted,

    /// The amount is zero.
    #[error("amount must be positive")]
    ZeroAmount,

    /// An account named in a transfer does not exist.
    #[error("unknown account: agent {0}")]
    UnknownAccount(AgentId),

    /// Sender and receiver are the same agent.
    #[error("agent {0} cannot transfer to itself")]
    SelfTransfer(AgentId),

    /// A credit would overflow the balance.
    #[error("balance overflow for agent {0}")]
    BalanceOverflow(AgentId),
}
