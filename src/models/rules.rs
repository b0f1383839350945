//! Aggregate business rules across the writer rows of one work.
//!
//! These rules operate on the whole set of [`WriterInWork`] rows rather
//! than on single fields, and they block CWR serialization of the work
//! when violated:
//!
//! - relative shares must sum to 100% within a 0.02 tolerance
//! - at least one row must be controlled
//! - at least one controlled row needs a composing capacity
//! - modifications need a controlled adaptation capacity (arranger,
//!   adaptor or translator), unless every row uses only the three
//!   original capacities
//! - a writer in both a controlled and an uncontrolled row must use the
//!   same capacity in both
//! - agreement data (SAAN, publisher fee) is only valid on controlled rows
//! - generally-controlled writers must be identifiable

use std::collections::HashMap;

use crate::config::EnforcementPolicy;
use crate::cwr::records::TITLE_WIDTH;
use crate::error::{WorkError, WorkResult};
use crate::models::{Work, Writer, WriterInWork};

/// Share sums are accepted within this tolerance of 100%.
pub const SHARE_TOLERANCE: f64 = 0.02;

/// Resolves writer references while validating. The catalog implements
/// this; tests can use a plain map.
pub trait WriterLookup {
    fn writer(&self, id: u64) -> Option<&Writer>;
}

impl WriterLookup for HashMap<u64, Writer> {
    fn writer(&self, id: u64) -> Option<&Writer> {
        self.get(&id)
    }
}

/// Validate every aggregate rule for one work.
///
/// Returns the first violation found; row indexes in errors are 0-based
/// positions within `work.writers`.
pub fn validate_work(
    work: &Work,
    writers: &impl WriterLookup,
    policy: &EnforcementPolicy,
) -> WorkResult<()> {
    validate_rows(work, writers, policy)?;
    validate_share_sum(work)?;
    validate_controlled_presence(work)?;
    validate_capacity_consistency(work)?;
    validate_modification_capacities(work)?;
    validate_suffix_titles(work)?;
    Ok(())
}

fn validate_rows(
    work: &Work,
    writers: &impl WriterLookup,
    policy: &EnforcementPolicy,
) -> WorkResult<()> {
    for (row, wiw) in work.writers.iter().enumerate() {
        if !(0.0..=100.0).contains(&wiw.relative_share) {
            return Err(WorkError::ShareOutOfRange {
                work_id: work.id,
                row,
                share: wiw.relative_share,
            });
        }
        if wiw.controlled {
            validate_controlled_row(work, row, wiw, writers, policy)?;
        } else if wiw.saan.is_some() || wiw.publisher_fee.is_some() {
            return Err(WorkError::AgreementNotControlled {
                work_id: work.id,
                row,
            });
        }
    }
    Ok(())
}

fn validate_controlled_row(
    work: &Work,
    row: usize,
    wiw: &WriterInWork,
    writers: &impl WriterLookup,
    policy: &EnforcementPolicy,
) -> WorkResult<()> {
    let writer_id = wiw.writer_id.ok_or(WorkError::AnonymousControlledWriter {
        work_id: work.id,
        row,
    })?;
    if wiw.capacity.is_none() {
        return Err(WorkError::MissingCapacity {
            work_id: work.id,
            row,
        });
    }
    let writer = writers.writer(writer_id).ok_or(WorkError::UnknownWriter {
        work_id: work.id,
        row,
        writer_id,
    })?;
    validate_identification(writer, policy)?;

    if policy.require_saan && wiw.saan.is_none() && effective_saan(wiw, writer).is_none() {
        return Err(WorkError::MissingAgreementData {
            work_id: work.id,
            row,
            what: "a society-assigned agreement number",
        });
    }
    if policy.require_publisher_fee
        && wiw.publisher_fee.is_none()
        && effective_fee(wiw, writer).is_none()
    {
        return Err(WorkError::MissingAgreementData {
            work_id: work.id,
            row,
            what: "a publisher fee",
        });
    }
    Ok(())
}

/// Generally-controlled writers need at least a last name; under strict
/// identification also a society affiliation and IPI name number.
fn validate_identification(writer: &Writer, policy: &EnforcementPolicy) -> WorkResult<()> {
    if !writer.generally_controlled {
        return Ok(());
    }
    if writer.name.last_name.trim().is_empty() {
        return Err(WorkError::InsufficientIdentification {
            writer_id: writer.id,
            needed: "a last name",
        });
    }
    if policy.strict_writer_identification
        && (writer.ipi.pr_society.is_none() || writer.ipi.ipi_name.is_none())
    {
        return Err(WorkError::InsufficientIdentification {
            writer_id: writer.id,
            needed: "a last name, a society affiliation and an IPI name number",
        });
    }
    Ok(())
}

fn validate_share_sum(work: &Work) -> WorkResult<()> {
    if work.writers.is_empty() {
        return Err(WorkError::NoControlledWriter { work_id: work.id });
    }
    let sum: f64 = work.writers.iter().map(|w| w.relative_share).sum();
    if (sum - 100.0).abs() > SHARE_TOLERANCE {
        return Err(WorkError::ShareSum {
            work_id: work.id,
            sum,
        });
    }
    Ok(())
}

fn validate_controlled_presence(work: &Work) -> WorkResult<()> {
    if !work.writers.iter().any(|w| w.controlled) {
        return Err(WorkError::NoControlledWriter { work_id: work.id });
    }
    let has_composer = work
        .writers
        .iter()
        .any(|w| w.controlled && w.capacity.is_some_and(|c| c.is_composing()));
    if !has_composer {
        return Err(WorkError::NoComposer { work_id: work.id });
    }
    Ok(())
}

fn validate_capacity_consistency(work: &Work) -> WorkResult<()> {
    let mut seen: HashMap<u64, &WriterInWork> = HashMap::new();
    for wiw in &work.writers {
        let Some(writer_id) = wiw.writer_id else {
            continue;
        };
        if let Some(other) = seen.get(&writer_id) {
            if other.controlled != wiw.controlled && other.capacity != wiw.capacity {
                return Err(WorkError::CapacityMismatch {
                    work_id: work.id,
                    writer_id,
                });
            }
        } else {
            seen.insert(writer_id, wiw);
        }
    }
    Ok(())
}

fn validate_modification_capacities(work: &Work) -> WorkResult<()> {
    if !work.is_modification() {
        return Ok(());
    }
    // Waived when the whole work sticks to the three original capacities.
    let all_original = work
        .writers
        .iter()
        .all(|w| w.capacity.map_or(true, |c| c.is_original()));
    if all_original {
        return Ok(());
    }
    let has_controlled_adaptation = work
        .writers
        .iter()
        .any(|w| w.controlled && w.capacity.is_some_and(|c| c.is_adaptation()));
    if !has_controlled_adaptation {
        return Err(WorkError::NoAdaptationCapacity { work_id: work.id });
    }
    Ok(())
}

fn validate_suffix_titles(work: &Work) -> WorkResult<()> {
    for alt in &work.alternate_titles {
        if alt.suffix && alt.full_title(&work.title).chars().count() > TITLE_WIDTH {
            return Err(WorkError::SuffixTooLong {
                work_id: work.id,
                suffix: alt.title.clone(),
                width: TITLE_WIDTH,
            });
        }
    }
    Ok(())
}

/// The SAAN that applies to a controlled row: the row's own, else the
/// writer's blanket agreement number.
pub fn effective_saan<'a>(wiw: &'a WriterInWork, writer: &'a Writer) -> Option<&'a str> {
    wiw.saan
        .as_deref()
        .or_else(|| writer.generally_controlled.then_some(writer.saan.as_deref()).flatten())
}

/// The publisher fee that applies to a controlled row.
pub fn effective_fee(wiw: &WriterInWork, writer: &Writer) -> Option<f64> {
    wiw.publisher_fee
        .or_else(|| writer.generally_controlled.then_some(writer.publisher_fee).flatten())
}
