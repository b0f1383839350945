//! # cwrkit - CWR registration and royalty processing
//!
//! cwrkit generates Common Works Registration (CWR) files for a
//! publishing catalog, imports the acknowledgement files societies send
//! back, and splits royalty statements across controlled writers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────▶│  CWR Export │────▶│  .V21/.V22  │
//! │  (works +   │     │ (validate + │     │  .V30/.V31  │
//! │   writers)  │     │  serialize) │     │   files     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       │
//!        │            ┌─────────────┐            ▼
//!        └────────────│  ACK Import │◀──── society reply
//!                     │ (status +   │
//!                     │  ISWCs)     │
//!                     └─────────────┘
//!
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Statement  │────▶│   Royalty   │────▶│ Statement + │
//! │    (CSV)    │     │   Engine    │     │ split rows  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cwrkit::{Catalog, Config, CwrExport, CwrVersion, TransactionType};
//!
//! let catalog = Catalog::from_file("catalog.json".as_ref())?;
//! let config = Config::default();
//! let mut export = CwrExport::new(
//!     1, CwrVersion::V21, TransactionType::Nwr,
//!     catalog.works().map(|w| w.id).collect(),
//!     None, 1, chrono::Utc::now().date_naive(),
//! );
//! let body = export.render(&catalog, &config, chrono::Utc::now().naive_utc())?;
//! std::fs::write(export.filename(&config), body)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Work, Writer, WriterInWork) and rules
//! - [`validation`] - Field validators with checksum verification
//! - [`cwr`] - Fixed-width record templates, export and ACK import
//! - [`royalty`] - Royalty statement splitting
//! - [`store`] - In-memory catalog with JSON snapshots
//! - [`config`] - Publisher profile, retained shares, enforcement flags

// Core modules
pub mod error;
pub mod models;

// Field validation
pub mod validation;

// CWR serialization and parsing
pub mod cwr;

// Royalty processing
pub mod royalty;

// Catalog
pub mod store;

// Configuration
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{AckError, ExportError, FieldError, RoyaltyError, StoreError, WorkError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AckStatus, AlternateTitle, Capacity, IpiIdentity, PersonName, Recording, TitleType, Work,
    WorkAcknowledgement, Writer, WriterInWork,
};

pub use models::rules::validate_work;

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    validate_ean, validate_ipi_base, validate_ipi_name, validate_isni, validate_isrc,
    validate_iswc, validate_name, validate_title,
};

// =============================================================================
// Re-exports - CWR
// =============================================================================

pub use cwr::ack::{import as import_ack, import_file as import_ack_file, AckImportOptions, AckImportReport};
pub use cwr::export::CwrExport;
pub use cwr::{CwrVersion, TransactionType};

// =============================================================================
// Re-exports - Royalty
// =============================================================================

pub use royalty::{
    process_file as process_royalties, Algorithm, RightColumn, RightType, RoyaltyConfig,
    RoyaltyReport, WorkIdSource,
};

// =============================================================================
// Re-exports - Catalog and configuration
// =============================================================================

pub use config::{Config, EnforcementPolicy, PublisherProfile, RetainedShares};
pub use store::Catalog;
