//! Domain models for the publishing catalog.
//!
//! This module contains the core data structures shared by the CWR
//! serializer, the acknowledgement importer and the royalty engine:
//!
//! - [`Work`] - a musical work with writer rows, titles and recordings
//! - [`Writer`] - a person (or agency) referenced by works
//! - [`WriterInWork`] - the work/writer link carrying share and capacity
//! - [`PersonName`] / [`IpiIdentity`] - embedded value structs shared by
//!   writers, performers and publisher profiles
//! - [`Capacity`] - CISAC writer role codes
//! - [`WorkAcknowledgement`] / [`AckStatus`] - society registration status
//!
//! Shared field groups are composed by value rather than inherited, so
//! validation functions operate on the struct types directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod rules;

// =============================================================================
// Embedded value structs
// =============================================================================

/// A person's name as registered with societies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    /// Last name, or the full name for agencies.
    pub last_name: String,
    /// First name; absent for agencies.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub first_name: Option<String>,
}

impl PersonName {
    pub fn new(last: impl Into<String>, first: Option<&str>) -> Self {
        Self {
            last_name: last.into(),
            first_name: first.map(String::from),
        }
    }
}

/// Interested-party identification shared by writers and publishers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpiIdentity {
    /// 11-digit IPI name number, checksum-validated, sentinel stripped.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipi_name: Option<String>,
    /// IPI base number in `I-NNNNNNNNN-C` form.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipi_base: Option<String>,
    /// Performing-rights society code, e.g. `"052"` for PRS.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pr_society: Option<String>,
}

// =============================================================================
// Capacity (writer role)
// =============================================================================

/// Role of a writer in a work, based on CISAC capacity codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacity {
    /// Composer (CWR code `C`)
    Composer,
    /// Author / lyricist (`A`)
    Lyricist,
    /// Composer and author (`CA`)
    ComposerLyricist,
    /// Arranger (`AR`)
    Arranger,
    /// Adaptor (`AD`)
    Adaptor,
    /// Translator (`TR`)
    Translator,
}

impl Capacity {
    /// Parse a capacity from its CWR code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "C" => Some(Self::Composer),
            "A" => Some(Self::Lyricist),
            "CA" => Some(Self::ComposerLyricist),
            "AR" => Some(Self::Arranger),
            "AD" => Some(Self::Adaptor),
            "TR" => Some(Self::Translator),
            _ => None,
        }
    }

    /// Two-character CWR code, space-padded.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Composer => "C ",
            Self::Lyricist => "A ",
            Self::ComposerLyricist => "CA",
            Self::Arranger => "AR",
            Self::Adaptor => "AD",
            Self::Translator => "TR",
        }
    }

    /// Capacities that create music: required on at least one controlled row.
    pub fn is_composing(&self) -> bool {
        matches!(self, Self::Composer | Self::ComposerLyricist)
    }

    /// Capacities that modify an existing work.
    pub fn is_adaptation(&self) -> bool {
        matches!(self, Self::Arranger | Self::Adaptor | Self::Translator)
    }

    /// The three capacities of an original (unmodified) work.
    pub fn is_original(&self) -> bool {
        !self.is_adaptation()
    }
}

// =============================================================================
// Writer
// =============================================================================

/// A writer: person or agency referenced (not owned) by works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Writer {
    pub id: u64,
    pub name: PersonName,
    #[serde(default)]
    pub ipi: IpiIdentity,
    /// ISNI, validated, optional.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub isni: Option<String>,
    /// Blanket agreement: every controlled row for this writer inherits
    /// the writer-level SAAN and publisher fee.
    #[serde(default)]
    pub generally_controlled: bool,
    /// Society-assigned agreement number for the blanket agreement.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub saan: Option<String>,
    /// Publisher fee percentage (0-100) under the blanket agreement.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publisher_fee: Option<f64>,
}

// =============================================================================
// Writer in work
// =============================================================================

/// Link between a work and a writer, carrying the fractional ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterInWork {
    /// Referenced writer; `None` for an unknown (uncontrolled) writer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub writer_id: Option<u64>,
    /// Role in this work; `None` only for unknown writers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub capacity: Option<Capacity>,
    /// Relative share percentage, two decimals, 0-100.
    pub relative_share: f64,
    /// Whether this publisher controls (collects for) the row.
    #[serde(default)]
    pub controlled: bool,
    /// Society-assigned agreement number for this specific work.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub saan: Option<String>,
    /// Publisher fee percentage (0-100) for this specific work.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publisher_fee: Option<f64>,
}

// =============================================================================
// Titles and recordings
// =============================================================================

/// Type of an alternate title, per the CWR title-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleType {
    /// Alternative title (`AT`)
    Alternative,
    /// Formal title (`FT`)
    Formal,
    /// Original title in a translated work (`OL`)
    OriginalTranslated,
    /// Incorrect title seen on statements (`IT`)
    Incorrect,
}

impl TitleType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Alternative => "AT",
            Self::Formal => "FT",
            Self::OriginalTranslated => "OL",
            Self::Incorrect => "IT",
        }
    }
}

/// An alternate title of a work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateTitle {
    pub title: String,
    #[serde(default = "AlternateTitle::default_type")]
    pub title_type: TitleType,
    /// When set, `title` is a suffix appended to the work's main title
    /// rather than a standalone title.
    #[serde(default)]
    pub suffix: bool,
}

impl AlternateTitle {
    fn default_type() -> TitleType {
        TitleType::Alternative
    }

    /// The full title this alternate expands to for a given main title.
    pub fn full_title(&self, main_title: &str) -> String {
        if self.suffix {
            format!("{} {}", main_title, self.title)
        } else {
            self.title.clone()
        }
    }
}

/// A recording of a work (first or subsequent).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub isrc: Option<String>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub catalog_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recording_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version_title: Option<String>,
}

// =============================================================================
// Acknowledgements
// =============================================================================

/// Registration status reported by a society in an ACK record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckStatus {
    /// `CO` - conflict with another registration
    Conflict,
    /// `DU` - duplicate transaction
    Duplicate,
    /// `RA` - transaction accepted, registration pending
    TransactionAccepted,
    /// `AS` - registration accepted
    RegistrationAccepted,
    /// `AC` - registration accepted with changes
    AcceptedWithChanges,
    /// `RJ` - rejected
    Rejected,
    /// `NP` - no participation
    NoParticipation,
    /// `RC` - claim rejected
    ClaimRejected,
}

impl AckStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "CO" => Some(Self::Conflict),
            "DU" => Some(Self::Duplicate),
            "RA" => Some(Self::TransactionAccepted),
            "AS" => Some(Self::RegistrationAccepted),
            "AC" => Some(Self::AcceptedWithChanges),
            "RJ" => Some(Self::Rejected),
            "NP" => Some(Self::NoParticipation),
            "RC" => Some(Self::ClaimRejected),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Conflict => "CO",
            Self::Duplicate => "DU",
            Self::TransactionAccepted => "RA",
            Self::RegistrationAccepted => "AS",
            Self::AcceptedWithChanges => "AC",
            Self::Rejected => "RJ",
            Self::NoParticipation => "NP",
            Self::ClaimRejected => "RC",
        }
    }
}

/// A society's acknowledgement of one work registration.
///
/// Unique per (society_code, remote_work_id) so re-importing the same
/// acknowledgement file is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkAcknowledgement {
    pub society_code: String,
    /// The society's own id for the work, echoed in the ACK record.
    pub remote_work_id: String,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<NaiveDate>,
}

// =============================================================================
// Work
// =============================================================================

/// A musical work and everything it owns: writer rows, alternate titles,
/// recordings and acknowledgements (cascade semantics). Writers and
/// libraries are referenced, not owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    /// Sequential per-publisher work id.
    pub id: u64,
    pub title: String,
    /// Canonical once acknowledged by a society; conflicting reassignment
    /// is a hard failure during ACK import.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iswc: Option<String>,
    /// Title of the work this one modifies. Non-null means this work is
    /// a modification; null means it is an original.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_title: Option<String>,
    /// Production library this work belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub library: Option<String>,
    /// Library CD identifier for ORN records.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cd_identifier: Option<String>,
    #[serde(default)]
    pub writers: Vec<WriterInWork>,
    #[serde(default)]
    pub alternate_titles: Vec<AlternateTitle>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
    #[serde(default)]
    pub acknowledgements: Vec<WorkAcknowledgement>,
}

impl Work {
    /// A work with an original title set is a modification.
    pub fn is_modification(&self) -> bool {
        self.original_title.is_some()
    }

    /// The submitter work id embedded in registrations: publisher code
    /// followed by the zero-padded sequential id.
    pub fn submitter_id(&self, publisher_code: &str) -> String {
        format!("{}{:06}", publisher_code, self.id)
    }

    /// Find an acknowledgement by its uniqueness key.
    pub fn acknowledgement(&self, society: &str, remote_id: &str) -> Option<&WorkAcknowledgement> {
        self.acknowledgements
            .iter()
            .find(|a| a.society_code == society && a.remote_work_id == remote_id)
    }
}

// =============================================================================
// Society table
// =============================================================================

/// Common CISAC society codes, used for affiliation display and for
/// resolving royalty statements keyed on a society's remote work ids.
pub const SOCIETIES: &[(&str, &str)] = &[
    ("010", "ASCAP"),
    ("021", "BMI"),
    ("023", "BUMA"),
    ("034", "HFA"),
    ("035", "GEMA"),
    ("040", "KODA"),
    ("044", "MCPS"),
    ("052", "PRS"),
    ("055", "SABAM"),
    ("058", "SACEM"),
    ("071", "SESAC"),
    ("074", "SIAE"),
    ("079", "STIM"),
    ("088", "CMRRA"),
    ("101", "SOCAN"),
];

/// Look up a society name by its zero-padded code.
pub fn society_name(code: &str) -> Option<&'static str> {
    let normalized = format!("{:0>3}", code.trim());
    SOCIETIES
        .iter()
        .find(|(c, _)| *c == normalized)
        .map(|(_, n)| *n)
}
