//! Repository layer: the persistence context behind the lead data provider.
//!
//! # Responsibility
//! - Define find/insert/update contracts over users, addresses and reports.
//! - Isolate SQLite query details from provider orchestration.
//!
//! # Invariants
//! - Every write is committed when the call returns.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod lead_repo;
