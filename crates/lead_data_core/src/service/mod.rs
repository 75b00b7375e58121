//! Lead use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into lead/valuation use cases.
//! - Keep hosting layers decoupled from storage details.

pub mod lead_data_provider;
