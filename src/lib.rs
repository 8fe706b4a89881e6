//! MirrorChain - an append-only hash-linked ledger with read-only replication
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Core
//! - [`ledger`] - Blocks, transactions, chain linking and hashing rules
//!
//! ## Wire Protocol
//! - [`codec`] - Framed wire encoding/decoding with integrity checks
//! - [`replication`] - Holder-side server and follower-side client
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! The holder process builds a [`ledger::HashChain`] and serves it through a
//! [`replication::ReplicationServer`]; followers reconstruct an equivalent
//! chain with a [`replication::ReplicationClient`]. Both ends share one
//! [`codec`] implementation, so the wire schema is symmetric by construction.

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Core
// ============================================================================
pub mod ledger;

// ============================================================================
// Wire Protocol & Replication
// ============================================================================
pub mod codec;
pub mod replication;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
