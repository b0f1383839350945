//! CWR (Common Works Registration) file generation and parsing.
//!
//! CWR files are fixed-format, line-oriented EDI: each line is one
//! record, the record type is the first three characters, and every
//! field lives at an exact column offset. A single misaligned column
//! corrupts every downstream parser, so the formatting layer is split
//! into small, unit-tested pieces:
//!
//! - [`fields`] - padding, share encoding, date/time/duration formatting
//! - [`records`] - one pure formatting function per record type
//! - [`export`] - the per-work transaction serializer and file envelope
//! - [`ack`] - the acknowledgement file parser and importer
//!
//! Four protocol versions are supported (2.1, 2.2, 3.0, 3.1). They share
//! the line-layout algorithm; the differences are limited to
//! transaction-type codes, a handful of extra fields and the header
//! version string, expressed through [`CwrVersion`].

use serde::{Deserialize, Serialize};

pub mod ack;
pub mod export;
pub mod fields;
pub mod records;

// =============================================================================
// Protocol version
// =============================================================================

/// A CWR protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CwrVersion {
    V21,
    V22,
    V30,
    V31,
}

impl CwrVersion {
    /// Parse from the conventional dotted label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "2.1" | "21" => Some(Self::V21),
            "2.2" | "22" => Some(Self::V22),
            "3.0" | "30" => Some(Self::V30),
            "3.1" | "31" => Some(Self::V31),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::V21 => "2.1",
            Self::V22 => "2.2",
            Self::V30 => "3.0",
            Self::V31 => "3.1",
        }
    }

    /// Version string carried in the GRH record.
    pub fn grh_version(&self) -> &'static str {
        match self {
            Self::V21 => "02.10",
            Self::V22 => "02.20",
            Self::V30 => "03.00",
            Self::V31 => "03.10",
        }
    }

    /// CWR 3.x carries an explicit file-level version in the HDR record;
    /// 2.x does not.
    pub fn hdr_version(&self) -> Option<&'static str> {
        match self {
            Self::V21 | Self::V22 => None,
            Self::V30 => Some("3.0000"),
            Self::V31 => Some("3.1000"),
        }
    }

    /// Two-digit version used in delivery file names (`.V21` etc.).
    pub fn filename_version(&self) -> &'static str {
        match self {
            Self::V21 => "21",
            Self::V22 => "22",
            Self::V30 => "30",
            Self::V31 => "31",
        }
    }

    pub fn is_v3(&self) -> bool {
        matches!(self, Self::V30 | Self::V31)
    }
}

// =============================================================================
// Transaction type
// =============================================================================

/// Registration transaction types across versions.
///
/// CWR 2.x registers with NWR (new work) or REV (revised registration);
/// CWR 3.x replaces both with WRK and adds ISR for ISWC requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Nwr,
    Rev,
    Wrk,
    Isr,
}

impl TransactionType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "NWR" => Some(Self::Nwr),
            "REV" => Some(Self::Rev),
            "WRK" => Some(Self::Wrk),
            "ISR" => Some(Self::Isr),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Nwr => "NWR",
            Self::Rev => "REV",
            Self::Wrk => "WRK",
            Self::Isr => "ISR",
        }
    }

    /// Whether this transaction type exists in the given version.
    pub fn valid_for(&self, version: CwrVersion) -> bool {
        match self {
            Self::Nwr | Self::Rev => !version.is_v3(),
            Self::Wrk | Self::Isr => version.is_v3(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_labels() {
        assert_eq!(CwrVersion::from_label("2.1"), Some(CwrVersion::V21));
        assert_eq!(CwrVersion::from_label("31"), Some(CwrVersion::V31));
        assert_eq!(CwrVersion::from_label("4.0"), None);
        assert_eq!(CwrVersion::V22.grh_version(), "02.20");
        assert_eq!(CwrVersion::V21.hdr_version(), None);
        assert_eq!(CwrVersion::V30.hdr_version(), Some("3.0000"));
    }

    #[test]
    fn test_transaction_type_validity() {
        assert!(TransactionType::Nwr.valid_for(CwrVersion::V21));
        assert!(TransactionType::Rev.valid_for(CwrVersion::V22));
        assert!(!TransactionType::Nwr.valid_for(CwrVersion::V30));
        assert!(TransactionType::Wrk.valid_for(CwrVersion::V31));
        assert!(!TransactionType::Wrk.valid_for(CwrVersion::V21));
    }
}
