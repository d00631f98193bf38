//! Asset ledger adapter for the Mistvale world server.
//!
//! External tokens — items and currency — are owned by wallets on an
//! external ledger. This crate defines the adapter trait the core calls
//! ([`AssetLedger`]), the transient/permanent failure split that drives
//! the compensation discipline, a deadline wrapper, an in-memory
//! implementation, and the append-only [`AuditLog`] the runtime keeps of
//! every call it issues.
//!
//! # Modules
//!
//! - [`adapter`] — the [`AssetLedger`] trait, [`TxHandle`], [`LedgerError`]
//! - [`memory`] — [`InMemoryLedger`] with test hooks
//! - [`audit`] — the append-only [`AuditLog`]

pub mod adapter;
pub mod audit;
pub mod memory;

pub use adapter::{AssetLedger, LedgerError, TxHandle, currency_token, with_deadline};
pub use audit::{AuditEntry, AuditLog, AuditOp, AuditOutcome, SharedAuditLog, shared_audit_log};
pub use memory::InMemoryLedger;
