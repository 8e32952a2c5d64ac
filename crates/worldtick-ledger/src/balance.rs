//! The balance ledger.
//!
//! Every rule checks before it mutates, so a failed call leaves all
//! balances untouched. Transfers are all-or-nothing across both agents.

use tracing::debug;
use worldtick_types::{Agent, AgentId};

use crate::LedgerError;

/// Balances after a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Sender.
    pub from: AgentId,
    /// Receiver.
    pub to: AgentId,
    /// Amount moved.
    pub amount: u64,
    /// Sender balance after the transfer.
    pub from_balance: u64,
    /// Receiver balance after the transfer.
    pub to_balance: u64,
}

/// Debit `amount` from an agent. Returns the new balance.
///
/// # Errors
///
/// Returns [`LedgerError::InsufficientFunds`] if the balance is below
/// `amount`. The balance is unchanged on error.
pub fn debit(agent: &mut Agent, amount: u64) -> Result<u64, LedgerError> {
    let remaining =
        agent
            .balance_mon
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                needed: amount,
                available: agent.balance_mon,
            })?;
    agent.balance_mon = remaining;
    Ok(remaining)
}

/// Credit `amount` to an agent. Returns the new balance.
///
/// # Errors
///
/// Returns [`LedgerError::BalanceOverflow`] if the balance would exceed
/// `u64::MAX`.
pub fn credit(agent: &mut Agent, amount: u64) -> Result<u64, LedgerError> {
    let total = agent
        .balance_mon
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow(agent.id))?;
    agent.balance_mon = total;
    Ok(total)
}

/// Move `amount` from one agent to another.
///
/// # Errors
///
/// - [`LedgerError::ZeroAmount`] if `amount` is zero.
/// - [`LedgerError::SelfTransfer`] if `from == to`.
/// - [`LedgerError::UnknownAccount`] if either agent is missing.
/// - [`LedgerError::InsufficientFunds`] if the sender cannot cover it.
/// - [`LedgerError::BalanceOverflow`] if the receiver would overflow.
pub fn transfer(
    agents: &mut [Agent],
    from: AgentId,
    to: AgentId,
    amount: u64,
) -> Result<TransferReceipt, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    if from == to {
        return Err(LedgerError::SelfTransfer(from));
    }

    let from_idx = agents
        .iter()
        .position(|a| a.id == from)
        .ok_or(LedgerError::UnknownAccount(from))?;
    let to_idx = agents
        .iter()
        .position(|a| a.id == to)
        .ok_or(LedgerError::UnknownAccount(to))?;

    let from_balance = agents
        .get(from_idx)
        .map(|a| a.balance_mon)
        .ok_or(LedgerError::UnknownAccount(from))?;
    let to_balance = agents
        .get(to_idx)
        .map(|a| a.balance_mon)
        .ok_or(LedgerError::UnknownAccount(to))?;

    let new_from = from_balance
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientFunds {
            needed: amount,
            available: from_balance,
        })?;
    let new_to = to_balance
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow(to))?;

    if let Some(sender) = agents.get_mut(from_idx) {
        sender.balance_mon = new_from;
    }
    if let Some(receiver) = agents.get_mut(to_idx) {
        receiver.balance_mon = new_to;
    }

    debug!(%from, %to, amount, "Balance transferred");

    Ok(TransferReceipt {
        from,
        to,
        amount,
        from_balance: new_from,
        to_balance: new_to,
    })
}
