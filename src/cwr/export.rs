//! CWR export serialization: works to registration files.
//!
//! A [`CwrExport`] is a batch of works bound to a protocol version and a
//! transaction type. Rendering walks each work in order and emits its
//! transaction: the work header, the publisher records, one record group
//! per controlled writer, the uncontrolled writers and the detail
//! records, then wraps everything in the HDR/GRH .. GRT/TRL envelope
//! with the running counts.
//!
//! Rendering is idempotent: the first call computes and caches the file
//! body, and later calls return the cached bytes unchanged even if the
//! catalog or the clock has moved on. An export that was delivered to a
//! society must re-read byte-identically.
//!
//! Every work is validated against the aggregate rules before any line
//! is emitted; one invalid work fails the whole export.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ExportError, ExportResult, WorkError};
use crate::models::rules::{effective_saan, validate_work};
use crate::models::{Work, WriterInWork};
use crate::validation::validate_iswc;
use crate::cwr::{records, CwrVersion, TransactionType};
use crate::store::Catalog;

// =============================================================================
// Export batch
// =============================================================================

/// A registration batch: which works, which CWR dialect, and the cached
/// rendered body once the file has been produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CwrExport {
    pub id: u64,
    pub version: CwrVersion,
    pub transaction_type: TransactionType,
    pub work_ids: Vec<u64>,
    /// Destination society, selecting a publisher override profile and
    /// the receiver part of the delivery file name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub receiver_society: Option<String>,
    /// Delivery sequence within the creation year.
    pub sequence: u32,
    pub created: NaiveDate,
    /// Rendered file body; set on first render and never recomputed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<String>,
}

impl CwrExport {
    pub fn new(
        id: u64,
        version: CwrVersion,
        transaction_type: TransactionType,
        work_ids: Vec<u64>,
        receiver_society: Option<String>,
        sequence: u32,
        created: NaiveDate,
    ) -> Self {
        Self {
            id,
            version,
            transaction_type,
            work_ids,
            receiver_society,
            sequence,
            created,
            body: None,
        }
    }

    /// Delivery file name: `CW` + two-digit year + four-digit sequence +
    /// sender and receiver codes + the version extension.
    pub fn filename(&self, config: &Config) -> String {
        let publisher = self.publisher(config);
        let receiver = match &self.receiver_society {
            Some(code) => format!("{:0>3}", code.trim()),
            None => "000".into(),
        };
        format!(
            "CW{:02}{:04}{}_{}.V{}",
            self.created.year() % 100,
            self.sequence,
            publisher.code,
            receiver,
            self.version.filename_version(),
        )
    }

    fn publisher<'a>(&self, config: &'a Config) -> &'a crate::config::PublisherProfile {
        match &self.receiver_society {
            Some(code) => config.publisher_for_society(code),
            None => &config.publisher,
        }
    }

    /// Render the export to its CWR file body, caching the result.
    pub fn render(
        &mut self,
        catalog: &Catalog,
        config: &Config,
        now: NaiveDateTime,
    ) -> ExportResult<&str> {
        if self.body.is_none() {
            self.body = Some(self.build(catalog, config, now)?);
        }
        Ok(self.body.as_deref().unwrap_or_default())
    }

    fn build(
        &self,
        catalog: &Catalog,
        config: &Config,
        now: NaiveDateTime,
    ) -> ExportResult<String> {
        if self.work_ids.is_empty() {
            return Err(ExportError::Empty);
        }
        if !self.transaction_type.valid_for(self.version) {
            return Err(ExportError::BadTransactionType {
                transaction_type: self.transaction_type.code(),
                version: self.version.label(),
            });
        }
        let publisher = self.publisher(config);

        let mut lines: Vec<String> = Vec::new();
        lines.push(records::hdr(publisher, now, self.version));
        lines.push(records::grh(self.transaction_type, self.version));

        for (tx_seq, &work_id) in self.work_ids.iter().enumerate() {
            let work = catalog
                .work(work_id)
                .ok_or(ExportError::WorkNotFound(work_id))?;
            validate_work(work, catalog, &config.enforcement).map_err(|source| {
                ExportError::InvalidWork {
                    title: work.title.clone(),
                    source,
                }
            })?;
            // Normalize the ISWC before it meets the fixed-width field;
            // a separator form would otherwise be truncated in place.
            let iswc = work
                .iswc
                .as_deref()
                .map(validate_iswc)
                .transpose()
                .map_err(|source| ExportError::InvalidWork {
                    title: work.title.clone(),
                    source: WorkError::Field { work_id, source },
                })?;
            self.push_transaction(
                &mut lines,
                tx_seq as u32,
                work,
                iswc.as_deref(),
                catalog,
                config,
                publisher,
            );
        }

        let transaction_count = self.work_ids.len() as u32;
        // The group count includes its own GRH and GRT lines; the file
        // count additionally includes HDR and TRL.
        let group_records = (lines.len() - 1) as u32 + 1;
        lines.push(records::grt(transaction_count, group_records));
        let total_records = lines.len() as u32 + 1;
        lines.push(records::trl(1, transaction_count, total_records));

        let mut body = lines.join("\r\n");
        body.push_str("\r\n");
        Ok(body)
    }

    /// Emit one work transaction. The work has already passed aggregate
    /// validation, so controlled rows are known to resolve.
    #[allow(clippy::too_many_arguments)]
    fn push_transaction(
        &self,
        lines: &mut Vec<String>,
        tx_seq: u32,
        work: &Work,
        iswc: Option<&str>,
        catalog: &Catalog,
        config: &Config,
        publisher: &crate::config::PublisherProfile,
    ) {
        let version = self.version;
        // CWR 2.x distinguishes new registrations from revisions; a
        // modification work always goes out as a revision.
        let header_type = if version.is_v3() {
            self.transaction_type
        } else if self.transaction_type == TransactionType::Rev || work.is_modification() {
            TransactionType::Rev
        } else {
            TransactionType::Nwr
        };

        let first_recording = work.recordings.first();
        lines.push(records::work_header(
            version,
            header_type,
            tx_seq,
            &work.title,
            &work.submitter_id(&publisher.code),
            iswc,
            first_recording.and_then(|r| r.duration),
            first_recording.is_some(),
            work.is_modification(),
        ));
        let mut rec_seq: u32 = 0;
        let mut next = || {
            rec_seq += 1;
            rec_seq
        };

        // Publisher block: the collected fraction of each right is the
        // controlled total scaled by the retained share.
        let controlled_fraction: f64 = work
            .writers
            .iter()
            .filter(|w| w.controlled)
            .map(|w| w.relative_share / 100.0)
            .sum();
        let pub_pr = controlled_fraction * config.retained.pr;
        let pub_mr = controlled_fraction * config.retained.mr;
        let pub_sr = controlled_fraction * config.retained.sr;
        lines.push(records::spu(
            tx_seq,
            next(),
            1,
            publisher,
            None,
            pub_pr,
            pub_mr,
            pub_sr,
        ));
        lines.push(records::spt(
            tx_seq,
            next(),
            &publisher.code,
            pub_pr,
            pub_mr,
            pub_sr,
            1,
        ));

        // Controlled writers: one SWR/SWT/PWR group per distinct writer,
        // in row order, with duplicate rows merged.
        for (writer_id, row) in grouped_controlled(work) {
            let Some(writer) = catalog.get_writer(writer_id) else {
                continue;
            };
            let fraction = row.relative_share / 100.0;
            let pr = fraction * (1.0 - config.retained.pr);
            let mr = fraction * (1.0 - config.retained.mr);
            let sr = fraction * (1.0 - config.retained.sr);
            let capacity = row.capacity.map(|c| c.code()).unwrap_or("  ");
            lines.push(records::swr(tx_seq, next(), writer, capacity, pr, mr, sr));
            lines.push(records::swt(tx_seq, next(), writer_id, pr, mr, sr, 1));
            lines.push(records::pwr(
                version,
                tx_seq,
                next(),
                publisher,
                effective_saan(&row, writer),
                writer_id,
            ));
        }

        // Uncontrolled writers keep their whole share.
        for row in work.writers.iter().filter(|w| !w.controlled) {
            let writer = row.writer_id.and_then(|id| catalog.get_writer(id));
            let fraction = row.relative_share / 100.0;
            let capacity = row.capacity.map(|c| c.code()).unwrap_or("  ");
            lines.push(records::owr(
                tx_seq,
                next(),
                writer,
                capacity,
                fraction,
                fraction,
                fraction,
            ));
        }

        if let Some(original_title) = &work.original_title {
            lines.push(records::ver(tx_seq, next(), original_title, None));
        }
        for alt in &work.alternate_titles {
            lines.push(records::alt(
                tx_seq,
                next(),
                &alt.full_title(&work.title),
                alt.title_type.code(),
            ));
        }
        if let Some(recording) = first_recording {
            // Societies expect a performer with recorded works; the first
            // controlled composing writer stands in when none is known.
            if let Some(performer) = work
                .writers
                .iter()
                .filter(|w| w.controlled && w.capacity.is_some_and(|c| c.is_composing()))
                .find_map(|w| w.writer_id.and_then(|id| catalog.get_writer(id)))
            {
                lines.push(records::per(tx_seq, next(), &performer.name, &performer.ipi));
            }
            lines.push(records::rec(version, tx_seq, next(), recording));
        }
        if let Some(library) = &work.library {
            lines.push(records::orn(
                tx_seq,
                next(),
                library,
                work.cd_identifier.as_deref(),
            ));
        }
    }
}

/// Controlled rows grouped by writer in order of first appearance, with
/// duplicate rows for the same writer merged into one share.
fn grouped_controlled(work: &Work) -> Vec<(u64, WriterInWork)> {
    let mut grouped: Vec<(u64, WriterInWork)> = Vec::new();
    for row in work.writers.iter().filter(|w| w.controlled) {
        let Some(id) = row.writer_id else {
            continue;
        };
        if let Some((_, existing)) = grouped.iter_mut().find(|(gid, _)| *gid == id) {
            existing.relative_share += row.relative_share;
        } else {
            grouped.push((id, row.clone()));
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AlternateTitle, Capacity, IpiIdentity, PersonName, Recording, TitleType, Writer,
    };

    fn writer(id: u64, last: &str) -> Writer {
        Writer {
            id,
            name: PersonName::new(last, Some("JANE")),
            ipi: IpiIdentity {
                ipi_name: Some("19999999999".into()),
                ipi_base: None,
                pr_society: Some("052".into()),
            },
            isni: None,
            generally_controlled: false,
            saan: None,
            publisher_fee: None,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_writer(writer(1, "DOE"));
        catalog.add_writer(writer(2, "ROE"));
        catalog.add_work(Work {
            id: 42,
            title: "MY SONG".into(),
            iswc: Some("T1234567894".into()),
            original_title: None,
            library: None,
            cd_identifier: None,
            writers: vec![
                WriterInWork {
                    writer_id: Some(1),
                    capacity: Some(Capacity::ComposerLyricist),
                    relative_share: 60.0,
                    controlled: true,
                    saan: Some("SA-42".into()),
                    publisher_fee: None,
                },
                WriterInWork {
                    writer_id: Some(2),
                    capacity: Some(Capacity::Lyricist),
                    relative_share: 40.0,
                    controlled: false,
                    saan: None,
                    publisher_fee: None,
                },
            ],
            alternate_titles: vec![AlternateTitle {
                title: "(LIVE)".into(),
                title_type: TitleType::Alternative,
                suffix: true,
            }],
            recordings: vec![Recording {
                isrc: Some("USS1Z9900001".into()),
                duration: Some(185),
                release_date: None,
                catalog_number: None,
                ean: None,
                recording_title: None,
                version_title: None,
            }],
            acknowledgements: vec![],
        });
        catalog
    }

    fn export() -> CwrExport {
        CwrExport::new(
            1,
            CwrVersion::V21,
            TransactionType::Nwr,
            vec![42],
            None,
            7,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn record_types(body: &str) -> Vec<&str> {
        body.lines().map(|l| &l[..3]).collect()
    }

    #[test]
    fn test_render_record_order() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();

        assert_eq!(
            record_types(&body),
            vec![
                "HDR", "GRH", "NWR", "SPU", "SPT", "SWR", "SWT", "PWR", "OWR", "ALT", "PER",
                "REC", "GRT", "TRL"
            ]
        );
        assert!(body.ends_with("\r\n"));
    }

    #[test]
    fn test_render_counts_and_envelope() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let lines: Vec<&str> = body.lines().collect();

        // GRT: group 1, one transaction, 12 group records (GRH..GRT)
        assert_eq!(lines[lines.len() - 2], "GRT000010000000100000012");
        // TRL: 1 group, 1 transaction, 14 file records
        assert_eq!(lines[lines.len() - 1], "TRL000010000000100000014");
    }

    #[test]
    fn test_render_shares_and_saan() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let lines: Vec<&str> = body.lines().collect();

        // Publisher collects 60% x 0.5 of performance: 03000
        let spu = lines[3];
        assert_eq!(&spu[115..120], "03000");
        // Writer keeps 60% x 0.5: 03000
        let swr = lines[5];
        assert_eq!(&swr[109..114], "03000");
        // PWR carries the row SAAN
        let pwr = lines[7];
        assert!(pwr.contains("SA-42"));
        // Suffix alternate title is expanded against the main title
        let alt = lines[9];
        assert!(alt.contains("MY SONG (LIVE)"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        let first = export.render(&catalog, &config, now()).unwrap().to_string();

        let later = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let second = export.render(&catalog, &config, later).unwrap().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_modification_goes_out_as_revision() {
        let mut catalog = catalog();
        {
            let work = catalog.work_mut(42).unwrap();
            work.original_title = Some("OLD SONG".into());
            work.writers[0].capacity = Some(Capacity::Arranger);
            work.writers.push(WriterInWork {
                writer_id: Some(1),
                capacity: Some(Capacity::Arranger),
                relative_share: 0.0,
                controlled: true,
                saan: None,
                publisher_fee: None,
            });
        }
        // Need a controlled composer alongside the arranger.
        catalog.add_writer(writer(3, "BACH"));
        {
            let work = catalog.work_mut(42).unwrap();
            work.writers[1] = WriterInWork {
                writer_id: Some(3),
                capacity: Some(Capacity::Composer),
                relative_share: 40.0,
                controlled: true,
                saan: None,
                publisher_fee: None,
            };
        }
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let types = record_types(&body);
        assert!(types.contains(&"REV"));
        assert!(!types.contains(&"NWR"));
        assert!(types.contains(&"VER"));
    }

    #[test]
    fn test_empty_export_rejected() {
        let catalog = Catalog::new();
        let config = Config::default();
        let mut export = export();
        export.work_ids.clear();
        assert!(matches!(
            export.render(&catalog, &config, now()),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn test_transaction_type_version_mismatch() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        export.version = CwrVersion::V30;
        assert!(matches!(
            export.render(&catalog, &config, now()),
            Err(ExportError::BadTransactionType { .. })
        ));
    }

    #[test]
    fn test_invalid_work_blocks_export() {
        let mut catalog = catalog();
        catalog.work_mut(42).unwrap().writers[0].relative_share = 10.0;
        let config = Config::default();
        let mut export = export();
        let err = export.render(&catalog, &config, now()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidWork { .. }));
        // Nothing was cached for the failed render.
        assert!(export.body.is_none());
    }

    #[test]
    fn test_v30_uses_wrk_and_hdr_version() {
        let catalog = catalog();
        let config = Config::default();
        let mut export = export();
        export.version = CwrVersion::V30;
        export.transaction_type = TransactionType::Wrk;
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let lines: Vec<&str> = body.lines().collect();
        assert!(lines[0].ends_with("3.0000"));
        assert!(lines[1].starts_with("GRHWRK"));
        assert!(lines[2].starts_with("WRK"));
    }

    #[test]
    fn test_separator_iswc_normalized_in_work_header() {
        let mut catalog = catalog();
        catalog.work_mut(42).unwrap().iswc = Some("T-123.456.789-4".into());
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let nwr = body.lines().find(|l| l.starts_with("NWR")).unwrap();
        // The 11-character field carries the canonical form, not a
        // truncated separator form.
        assert_eq!(&nwr[95..106], "T1234567894");
    }

    #[test]
    fn test_bad_iswc_blocks_export() {
        let mut catalog = catalog();
        catalog.work_mut(42).unwrap().iswc = Some("T1234567893".into());
        let config = Config::default();
        let mut export = export();
        let err = export.render(&catalog, &config, now()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidWork { .. }));
    }

    #[test]
    fn test_duplicate_controlled_rows_merge() {
        let mut catalog = catalog();
        {
            let work = catalog.work_mut(42).unwrap();
            work.writers[0].relative_share = 30.0;
            work.writers.push(WriterInWork {
                writer_id: Some(1),
                capacity: Some(Capacity::ComposerLyricist),
                relative_share: 30.0,
                controlled: true,
                saan: None,
                publisher_fee: None,
            });
        }
        let config = Config::default();
        let mut export = export();
        let body = export.render(&catalog, &config, now()).unwrap().to_string();
        let swr_lines: Vec<&str> = body.lines().filter(|l| l.starts_with("SWR")).collect();
        assert_eq!(swr_lines.len(), 1);
        // Merged 60% x 0.5 performance share
        assert_eq!(&swr_lines[0][109..114], "03000");
    }

    #[test]
    fn test_filename_convention() {
        let config = Config::default();
        let mut export = export();
        assert_eq!(export.filename(&config), "CW240007MUS_000.V21");
        export.receiver_society = Some("52".into());
        export.version = CwrVersion::V22;
        assert_eq!(export.filename(&config), "CW240007MUS_052.V22");
    }
}
