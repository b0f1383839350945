//! Error types for the cwrkit registration and royalty pipelines.
//!
//! This module defines a hierarchy of error types, one enum per concern:
//!
//! - [`FieldError`] - field format and checksum failures
//! - [`WorkError`] - aggregate business-rule failures on one work
//! - [`StoreError`] - catalog lookup/save conflicts
//! - [`ExportError`] - CWR export serialization errors
//! - [`AckError`] - acknowledgement import errors
//! - [`RoyaltyError`] - royalty statement processing errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! The taxonomy distinguishes four failure policies:
//!
//! 1. Format errors are deterministic and field-scoped, never silently
//!    corrected beyond the documented normalizations.
//! 2. Aggregate errors name the offending work and block its serialization.
//! 3. Conflict errors (ISWC mismatch on import, IPI mismatch on writer
//!    lookup) are fatal to the enclosing batch, which is rolled back wholly.
//! 4. Unmatched royalty rows are recoverable and surface inline in the
//!    generated output, not as errors.

use thiserror::Error;

// =============================================================================
// Field Format Errors
// =============================================================================

/// Format or checksum failure for a single field value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    /// Value contains a character outside the CWR character set.
    #[error("{field}: invalid character '{ch}'")]
    BadCharacter { field: &'static str, ch: char },

    /// Value does not match the expected shape for the field kind.
    #[error("{field}: '{value}' does not match the expected format")]
    BadFormat { field: &'static str, value: String },

    /// Value is well-formed but its check digit(s) do not verify.
    #[error("{field}: '{value}' fails its checksum")]
    BadChecksum { field: &'static str, value: String },
}

// =============================================================================
// Aggregate Work Errors
// =============================================================================

/// Business-rule failure on one work's writer rows or titles.
///
/// These block serialization of the work and are attached to the
/// offending row where one exists.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkError {
    /// Relative shares of all writer rows must sum to 100% (tolerance 0.02).
    #[error("work {work_id}: writer shares sum to {sum:.2}%, expected 100.00%")]
    ShareSum { work_id: u64, sum: f64 },

    /// Every work needs at least one controlled writer row.
    #[error("work {work_id}: at least one controlled writer is required")]
    NoControlledWriter { work_id: u64 },

    /// At least one controlled row must carry a composing capacity.
    #[error("work {work_id}: at least one controlled writer must be a composer")]
    NoComposer { work_id: u64 },

    /// Modified works need a controlled adaptation capacity.
    #[error(
        "work {work_id}: since this work is a modification, \
         capacity in at least one controlled row must be Arranger, Adaptor or Translator"
    )]
    NoAdaptationCapacity { work_id: u64 },

    /// Controlled rows must have a capacity; blank is only for unknown writers.
    #[error("work {work_id}, row {row}: controlled writers must have a capacity")]
    MissingCapacity { work_id: u64, row: usize },

    /// A writer appearing in both a controlled and an uncontrolled row
    /// must use the same capacity in both.
    #[error(
        "work {work_id}: writer {writer_id} appears in controlled and \
         uncontrolled rows with different capacities"
    )]
    CapacityMismatch { work_id: u64, writer_id: u64 },

    /// A share outside the 0-100 range.
    #[error("work {work_id}, row {row}: relative share {share} is out of range")]
    ShareOutOfRange { work_id: u64, row: usize, share: f64 },

    /// Agreement data is only meaningful on controlled rows.
    #[error(
        "work {work_id}, row {row}: society-assigned agreement numbers and \
         publisher fees are only allowed for controlled writers"
    )]
    AgreementNotControlled { work_id: u64, row: usize },

    /// Enforcement flags can require agreement data on controlled rows.
    #[error("work {work_id}, row {row}: {what} is required for controlled writers")]
    MissingAgreementData {
        work_id: u64,
        row: usize,
        what: &'static str,
    },

    /// A controlled row references a writer missing from the catalog.
    #[error("work {work_id}, row {row}: unknown writer {writer_id}")]
    UnknownWriter { work_id: u64, row: usize, writer_id: u64 },

    /// Controlled rows must name their writer.
    #[error("work {work_id}, row {row}: controlled rows must reference a writer")]
    AnonymousControlledWriter { work_id: u64, row: usize },

    /// Generally-controlled writers need enough identification to register.
    #[error("writer {writer_id}: generally controlled writers must be identified with {needed}")]
    InsufficientIdentification { writer_id: u64, needed: &'static str },

    /// A suffix alternate title that no longer fits the title field.
    #[error(
        "work {work_id}: suffix '{suffix}' makes the combined title longer \
         than {width} characters"
    )]
    SuffixTooLong {
        work_id: u64,
        suffix: String,
        width: usize,
    },

    /// A field on the work or one of its rows failed format validation.
    #[error("work {work_id}: {source}")]
    Field {
        work_id: u64,
        #[source]
        source: FieldError,
    },
}

// =============================================================================
// Catalog / Store Errors
// =============================================================================

/// Errors from the in-memory catalog, the persistence collaborator stand-in.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup-or-create found a writer with the same natural key but a
    /// different IPI or society affiliation. Fatal to the enclosing batch.
    #[error("writer '{name}': {field} '{given}' conflicts with stored '{existing}'")]
    WriterConflict {
        name: String,
        field: &'static str,
        given: String,
        existing: String,
    },

    /// Unknown work id.
    #[error("work {0} not found in catalog")]
    WorkNotFound(u64),

    /// Snapshot IO error.
    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// CWR Export Errors
// =============================================================================

/// Errors during CWR export serialization.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export references no works.
    #[error("export contains no works")]
    Empty,

    /// The requested transaction type does not exist in the target version.
    #[error("transaction type {transaction_type} is not valid for CWR {version}")]
    BadTransactionType {
        transaction_type: &'static str,
        version: &'static str,
    },

    /// A referenced work is missing from the catalog.
    #[error("work {0} not found in catalog")]
    WorkNotFound(u64),

    /// A work failed aggregate validation; its transaction cannot be emitted.
    #[error("work '{title}' cannot be serialized: {source}")]
    InvalidWork {
        title: String,
        #[source]
        source: WorkError,
    },

    /// A field on the publisher profile failed validation.
    #[error("publisher profile: {0}")]
    Publisher(#[from] FieldError),
}

// =============================================================================
// Acknowledgement Import Errors
// =============================================================================

/// Errors during acknowledgement file import.
#[derive(Debug, Error)]
pub enum AckError {
    /// The file does not start with a well-formed CWR header.
    #[error("incorrect header: not a CWR acknowledgement file")]
    IncorrectHeader,

    /// A record line is too short or malformed for its record type.
    #[error("line {line}: malformed {record_type} record")]
    MalformedRecord { line: usize, record_type: String },

    /// The society reported an ISWC different from the one already stored.
    /// Fatal to the whole import; nothing is applied.
    #[error(
        "work {work_id} ('{title}'): acknowledged ISWC {incoming} conflicts \
         with existing ISWC {existing}"
    )]
    IswcConflict {
        work_id: u64,
        title: String,
        incoming: String,
        existing: String,
    },

    /// An echoed field failed format validation.
    #[error("line {line}: {source}")]
    Field {
        line: usize,
        #[source]
        source: FieldError,
    },

    /// IO error while reading the file.
    #[error("acknowledgement IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Royalty Processing Errors
// =============================================================================

/// Errors during royalty statement processing.
///
/// Unmatched work ids are deliberately not represented here; they are
/// flagged inline in the output stream and processing continues.
#[derive(Debug, Error)]
pub enum RoyaltyError {
    /// The statement could not be parsed as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error on the input or output stream.
    #[error("royalty IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured column index does not exist in the statement.
    #[error("column {0} is out of range for this statement")]
    ColumnOutOfRange(usize),

    /// An amount cell could not be parsed as a decimal number.
    #[error("line {line}: cannot parse amount '{value}'")]
    BadAmount { line: usize, value: String },

    /// A right-type cell could not be mapped to performance/mechanical/sync.
    #[error("line {line}: unknown right type '{value}'")]
    BadRightType { line: usize, value: String },

    /// The statement is missing its header row.
    #[error("royalty statement has no header row")]
    NoHeaders,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for field validation.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for aggregate work validation.
pub type WorkResult<T> = Result<T, WorkError>;

/// Result type for catalog operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for CWR export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for acknowledgement imports.
pub type AckResult<T> = Result<T, AckError>;

/// Result type for royalty processing.
pub type RoyaltyResult<T> = Result<T, RoyaltyError>;
