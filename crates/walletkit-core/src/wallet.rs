//! Wallet and ledger entry model.
//!
//! A wallet tracks two balance buckets for one user: `credits` (prepaid
//! value purchased or granted through plans) and `on_chain_balance`
//! (settled value, including distributed revenue awaiting withdrawal).
//! History is an append-only sequence of [`LedgerEntry`] records; balances
//! are the running effect of those entries. Entries are never mutated or
//! deleted; corrections are new offsetting entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, UserId, WalletId};

/// How a wallet's keys are managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum WalletKind {
    /// Keys held by the platform on the user's behalf.
    SelfCustodied = 0,
    /// An external wallet process linked to the account.
    ExternallyLinked = 1,
}

/// A user's wallet record. At most one wallet of a given kind per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Identifier, derived from `(owner, kind)`.
    pub id: WalletId,
    /// The owning user.
    pub owner: UserId,
    /// Custody kind.
    pub kind: WalletKind,
    /// Settled, spendable value in the base asset.
    pub on_chain_balance: Decimal,
    /// Prepaid balance, spendable on platform operations only.
    pub credits: Decimal,
    /// Wallets are never deleted, only deactivated.
    pub active: bool,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Last balance-affecting operation (Unix ms).
    pub last_activity_at: i64,
}

impl Wallet {
    /// Create a fresh wallet with zero balances.
    pub fn new(owner: UserId, kind: WalletKind, now: i64) -> Self {
        Self {
            id: WalletId::derive(&owner, kind),
            owner,
            kind,
            on_chain_balance: Decimal::ZERO,
            credits: Decimal::ZERO,
            active: true,
            created_at: now,
            last_activity_at: now,
        }
    }
}

/// Which balance bucket an entry affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceBucket {
    /// The prepaid `credits` balance.
    Credits,
    /// The settled `on_chain_balance`.
    OnChain,
}

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum EntryKind {
    /// Credits added (purchase, plan grant).
    Credit = 0,
    /// Credits spent on a platform operation.
    Debit = 1,
    /// Direct revenue settled on-chain.
    Revenue = 2,
    /// A stakeholder payout from a revenue distribution.
    Distribution = 3,
}

impl EntryKind {
    /// The balance bucket this entry kind affects.
    pub fn bucket(&self) -> BalanceBucket {
        match self {
            EntryKind::Credit | EntryKind::Debit => BalanceBucket::Credits,
            EntryKind::Revenue | EntryKind::Distribution => BalanceBucket::OnChain,
        }
    }

    /// Whether the entry subtracts from its bucket.
    pub fn is_deduction(&self) -> bool {
        matches!(self, EntryKind::Debit)
    }

    /// Decode from the stored discriminant.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(EntryKind::Credit),
            1 => Some(EntryKind::Debit),
            2 => Some(EntryKind::Revenue),
            3 => Some(EntryKind::Distribution),
            _ => None,
        }
    }
}

/// An immutable ledger record. `amount` is always positive; the entry kind
/// determines the sign of its balance effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: EntryId,
    /// The wallet this entry belongs to.
    pub wallet_id: WalletId,
    /// Entry kind.
    pub kind: EntryKind,
    /// Positive amount in the base asset.
    pub amount: Decimal,
    /// Human-readable description for display.
    pub description: String,
    /// Free-form reference to the originating asset or payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Append time (Unix ms).
    pub timestamp: i64,
}

impl LedgerEntry {
    /// Build an entry with a fresh random id.
    pub fn new(
        wallet_id: WalletId,
        kind: EntryKind,
        amount: Decimal,
        description: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: EntryId::random(),
            wallet_id,
            kind,
            amount,
            description: description.into(),
            metadata: None,
            timestamp: now,
        }
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
