//! Acknowledgement file import.
//!
//! Societies answer a registration file with an acknowledgement file:
//! the same envelope, one ACK record per original transaction carrying
//! the registration status and the society's own work id, followed by an
//! echo of the original transaction records. The echoed work header may
//! carry the ISWC the society assigned or matched.
//!
//! The importer parses the file, matches each ACK back to a catalog work
//! through the submitter work id, and applies the results in two phases:
//! everything is parsed and checked first, then the catalog is mutated.
//! An ISWC that conflicts with one already stored aborts the whole
//! import with nothing applied. Re-importing the same file is a no-op:
//! acknowledgements are unique per (society, remote work id).
//!
//! Rows whose submitter id does not resolve to a catalog work are
//! collected for reporting, not fatal; societies routinely acknowledge
//! works that were since renumbered or removed.

use std::path::Path;

use chrono::NaiveDate;

use crate::error::{AckError, AckResult};
use crate::models::{AckStatus, WorkAcknowledgement};
use crate::store::Catalog;
use crate::validation::validate_iswc;

// Column offsets shared with the record templates in `cwr::records`.
const HDR_VERSION_RANGE: std::ops::Range<usize> = 59..64;
const HDR_SENDER_RANGE: std::ops::Range<usize> = 5..14;
const ACK_TITLE_RANGE: std::ops::Range<usize> = 44..104;
const ACK_SUBMITTER_RANGE: std::ops::Range<usize> = 104..118;
const ACK_RECIPIENT_RANGE: std::ops::Range<usize> = 118..132;
const ACK_DATE_RANGE: std::ops::Range<usize> = 132..140;
const ACK_STATUS_RANGE: std::ops::Range<usize> = 140..142;
const DETAIL_ISWC_RANGE: std::ops::Range<usize> = 95..106;

/// Import behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct AckImportOptions {
    /// Reconcile ISWCs from the echoed work headers into the catalog.
    pub import_iswcs: bool,
    /// Publisher code stripped from submitter work ids. Without it the
    /// id is taken from the digits after the leading non-digit prefix,
    /// which misreads codes that themselves contain a digit.
    pub publisher_code: Option<String>,
}

/// Outcome of one acknowledgement import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AckImportReport {
    /// Acknowledgements applied to catalog works.
    pub imported: usize,
    /// Acknowledgements already present and skipped.
    pub skipped_duplicates: usize,
    /// Submitter work ids that resolved to no catalog work.
    pub unmatched: Vec<String>,
    /// Works whose ISWC was set from the echoed detail records.
    pub iswcs_set: usize,
}

/// One parsed ACK transaction, held until the whole file has validated.
struct PendingAck {
    work_id: u64,
    ack: WorkAcknowledgement,
    iswc: Option<(usize, String)>,
}

/// Import an acknowledgement file from disk.
pub fn import_file(
    path: &Path,
    catalog: &mut Catalog,
    options: &AckImportOptions,
) -> AckResult<AckImportReport> {
    let text = std::fs::read_to_string(path)?;
    import(&text, catalog, options)
}

/// Import an acknowledgement file body. Atomic: either every parsed
/// acknowledgement is applied or the catalog is left untouched.
pub fn import(
    text: &str,
    catalog: &mut Catalog,
    options: &AckImportOptions,
) -> AckResult<AckImportReport> {
    let mut lines = text.lines().enumerate();
    let society = parse_header(lines.next().map(|(_, l)| l))?;

    let mut report = AckImportReport::default();
    let mut pending: Vec<PendingAck> = Vec::new();
    // The ACK a following echoed detail record belongs to. `None` when
    // the ACK was unmatched or when its work echo was already consumed.
    let mut current: Option<usize> = None;

    for (index, line) in lines {
        let line_no = index + 1;
        match line.get(..3) {
            Some("ACK") => {
                current = None;
                if let Some(entry) =
                    parse_ack(line, line_no, &society, catalog, options, &mut report)?
                {
                    pending.push(entry);
                    current = Some(pending.len() - 1);
                }
            }
            Some("NWR") | Some("REV") | Some("WRK") if options.import_iswcs => {
                if let Some(slot) = current.take() {
                    let iswc = line
                        .get(DETAIL_ISWC_RANGE)
                        .map(str::trim)
                        .filter(|v| !v.is_empty());
                    if let Some(value) = iswc {
                        pending[slot].iswc = Some((line_no, value.to_string()));
                    }
                }
            }
            _ => {}
        }
    }

    // Phase 1: every ISWC must be well-formed and compatible with what
    // the catalog already holds.
    for entry in &mut pending {
        let Some((line_no, raw)) = entry.iswc.take() else {
            continue;
        };
        let normalized = validate_iswc(&raw).map_err(|source| AckError::Field {
            line: line_no,
            source,
        })?;
        let work = catalog.work(entry.work_id);
        let existing = work.and_then(|w| w.iswc.as_deref());
        match existing {
            Some(current_iswc) if current_iswc != normalized => {
                return Err(AckError::IswcConflict {
                    work_id: entry.work_id,
                    title: work.map(|w| w.title.clone()).unwrap_or_default(),
                    incoming: normalized,
                    existing: current_iswc.to_string(),
                });
            }
            Some(_) => {}
            None => entry.iswc = Some((line_no, normalized)),
        }
    }

    // Phase 2: apply. Only infallible mutations remain.
    for entry in pending {
        if let Some((_, iswc)) = entry.iswc {
            if let Some(work) = catalog.work_mut(entry.work_id) {
                work.iswc = Some(iswc);
                report.iswcs_set += 1;
            }
        }
        let work_id = entry.work_id;
        // A file can repeat a transaction; only the first lands.
        if catalog.has_acknowledgement(&entry.ack.society_code, &entry.ack.remote_work_id) {
            report.skipped_duplicates += 1;
        } else if catalog.add_acknowledgement(work_id, entry.ack).is_ok() {
            report.imported += 1;
        }
    }
    Ok(report)
}

/// Check the HDR line and extract the sending society's code.
fn parse_header(first_line: Option<&str>) -> AckResult<String> {
    let line = first_line.ok_or(AckError::IncorrectHeader)?;
    if !line.starts_with("HDR") || line.get(HDR_VERSION_RANGE) != Some("01.10") {
        return Err(AckError::IncorrectHeader);
    }
    let sender = line
        .get(HDR_SENDER_RANGE)
        .ok_or(AckError::IncorrectHeader)?
        .trim();
    let code: u64 = sender
        .trim_start_matches('0')
        .parse()
        .map_err(|_| AckError::IncorrectHeader)?;
    Ok(format!("{:03}", code))
}

/// Parse one ACK record. Returns `None` (after recording it as
/// unmatched or duplicate) when there is nothing to apply.
fn parse_ack(
    line: &str,
    line_no: usize,
    society: &str,
    catalog: &Catalog,
    options: &AckImportOptions,
    report: &mut AckImportReport,
) -> AckResult<Option<PendingAck>> {
    let malformed = || AckError::MalformedRecord {
        line: line_no,
        record_type: "ACK".into(),
    };
    let submitter = line.get(ACK_SUBMITTER_RANGE).ok_or_else(malformed)?.trim();
    let recipient = line.get(ACK_RECIPIENT_RANGE).ok_or_else(malformed)?.trim();
    let status_code = line.get(ACK_STATUS_RANGE).ok_or_else(malformed)?;
    let status = AckStatus::from_code(status_code).ok_or_else(malformed)?;
    let date = line
        .get(ACK_DATE_RANGE)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok());

    // The submitter id is our publisher code followed by the work id.
    // Strip the configured code; the prefix heuristic alone cannot tell
    // a digit in the code apart from the id.
    let id_part = match options.publisher_code.as_deref() {
        Some(code) if submitter.starts_with(code) => &submitter[code.len()..],
        _ => submitter.trim_start_matches(|c: char| !c.is_ascii_digit()),
    };
    let digits: String = id_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let work_id = match digits.parse::<u64>() {
        Ok(id) if catalog.work(id).is_some() => id,
        _ => {
            let title = line
                .get(ACK_TITLE_RANGE)
                .map(str::trim)
                .unwrap_or_default();
            report.unmatched.push(format!("{} ('{}')", submitter, title));
            return Ok(None);
        }
    };

    // Societies occasionally omit their own id on rejections; fall back
    // to the submitter id so the uniqueness key stays stable.
    let remote_id = if recipient.is_empty() {
        submitter.to_string()
    } else {
        recipient.to_string()
    };
    if catalog.has_acknowledgement(society, &remote_id) {
        report.skipped_duplicates += 1;
        return Ok(None);
    }

    Ok(Some(PendingAck {
        work_id,
        ack: WorkAcknowledgement {
            society_code: society.to_string(),
            remote_work_id: remote_id,
            status,
            date,
        },
        iswc: None,
    }))
}
