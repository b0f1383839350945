//! Royalty statement processing.
//!
//! Takes a society or DSP statement as CSV, matches each row to a work
//! in the catalog, splits the row's amount across the controlled writers
//! and the publisher, and writes the statement back out with the
//! computed columns appended. The original columns pass through
//! untouched, so the output diffs cleanly against the input.
//!
//! Two algorithms are supported:
//!
//! - **Share**: the publisher keeps its retained fraction of the amount
//!   for the row's right type; the remainder is distributed over the
//!   controlled writers in proportion to their relative shares.
//! - **Fee**: each controlled writer receives the full amount scaled by
//!   their share of the controlled total, minus a publisher fee
//!   percentage resolved per row.
//!
//! Processing is two-pass: the first pass collects the distinct work
//! identifiers so the catalog is queried in bulk, the second streams
//! rows through the calculation. Rows whose identifier resolves to no
//! work are not errors; they pass through flagged `WORK NOT FOUND`.
//!
//! Statements arrive in whatever encoding the sender's export tool
//! produced. UTF-8 files are streamed straight from disk, re-opened
//! once per pass so memory use stays flat however many rows the
//! statement has; anything else is decoded through charset detection
//! before parsing.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{RoyaltyError, RoyaltyResult};
use crate::models::rules::effective_fee;
use crate::store::Catalog;

// =============================================================================
// Right type
// =============================================================================

/// The right a royalty amount was collected under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RightType {
    Performance,
    Mechanical,
    Synchronization,
}

impl RightType {
    /// Parse a right type from a statement cell or CLI flag.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "P" | "PR" | "PER" | "PERF" | "PERFORMANCE" | "PERFORMING" => Some(Self::Performance),
            "M" | "MR" | "MEC" | "MECH" | "MECHANICAL" => Some(Self::Mechanical),
            "S" | "SR" | "SY" | "SYN" | "SYNC" | "SYNCHRONIZATION" | "SYNCHRONISATION" => {
                Some(Self::Synchronization)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Performance => "PERFORMANCE",
            Self::Mechanical => "MECHANICAL",
            Self::Synchronization => "SYNCHRONIZATION",
        }
    }
}

// =============================================================================
// Statement configuration
// =============================================================================

/// Which catalog index the statement's work identifier column refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkIdSource {
    /// Submitter work ids (`MUS000042`), with or without the publisher
    /// code prefix.
    WorkId { publisher_code: String },
    /// ISWCs, normalized before lookup.
    Iswc,
    /// The named society's remote work ids, as learned from previous
    /// acknowledgement imports.
    SocietyWorkId { society_code: String },
}

/// Where the row's right type comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RightColumn {
    /// Every row in the statement concerns the same right.
    Fixed(RightType),
    /// The right type is read from this 0-based column.
    Column(usize),
}

/// The split algorithm to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Share,
    Fee,
}

/// Per-statement processing configuration, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoyaltyConfig {
    /// 0-based column holding the work identifier.
    pub id_column: usize,
    pub id_source: WorkIdSource,
    /// 0-based column holding the gross amount.
    pub amount_column: usize,
    pub right: RightColumn,
    pub algorithm: Algorithm,
    /// Fee percentage (0-100) used when no row or writer fee applies.
    pub default_fee: f64,
    /// Optional 0-based column holding a per-row fee percentage, taking
    /// precedence over writer-level fees.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fee_column: Option<usize>,
}

/// Summary of one processing run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoyaltyReport {
    /// Input rows read (excluding the header).
    pub rows: usize,
    /// Rows that resolved to a catalog work.
    pub matched: usize,
    /// Rows flagged `WORK NOT FOUND` in the output.
    pub unmatched: usize,
    /// Sum of all net amounts paid out to writers.
    pub writer_net_total: f64,
    /// Sum of all amounts kept by the publisher.
    pub publisher_total: f64,
}

// =============================================================================
// Processing
// =============================================================================

/// Process a royalty statement file, writing the augmented CSV to `output`.
///
/// UTF-8 statements are streamed from disk, one open per pass; legacy
/// encodings are decoded into memory first.
pub fn process_file(
    input: &Path,
    output: &Path,
    catalog: &Catalog,
    config: &Config,
    options: &RoyaltyConfig,
) -> RoyaltyResult<RoyaltyReport> {
    let format = sniff_file(input)?;
    let out = std::fs::File::create(output)?;
    let mut writer = csv::Writer::from_writer(out);
    if format.utf8 {
        process_passes(
            || {
                let file = std::fs::File::open(input)?;
                Ok(csv::ReaderBuilder::new()
                    .delimiter(format.delimiter)
                    .flexible(true)
                    .from_reader(std::io::BufReader::new(file)))
            },
            &mut writer,
            catalog,
            config,
            options,
        )
    } else {
        let text = decode_legacy(input)?;
        process(&text, &mut writer, catalog, config, options)
    }
}

/// Process a decoded statement held in memory, writing augmented rows
/// to `writer`.
pub fn process<W: std::io::Write>(
    statement: &str,
    writer: &mut csv::Writer<W>,
    catalog: &Catalog,
    config: &Config,
    options: &RoyaltyConfig,
) -> RoyaltyResult<RoyaltyReport> {
    let delimiter = sniff_delimiter(statement);
    process_passes(
        || Ok(csv_reader(statement, delimiter)),
        writer,
        catalog,
        config,
        options,
    )
}

/// The two-pass core. `open` is called once per pass, so each pass
/// reads the statement from its source afresh.
fn process_passes<R, F, W>(
    mut open: F,
    writer: &mut csv::Writer<W>,
    catalog: &Catalog,
    config: &Config,
    options: &RoyaltyConfig,
) -> RoyaltyResult<RoyaltyReport>
where
    R: std::io::Read,
    F: FnMut() -> RoyaltyResult<csv::Reader<R>>,
    W: std::io::Write,
{
    // Pass 1: headers, column bounds, and the distinct identifier set.
    let mut reader = open()?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(RoyaltyError::NoHeaders);
    }
    check_columns(&headers, options)?;

    let mut ids: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(options.id_column) {
            let id = id.trim().to_string();
            if !id.is_empty() && seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }
    drop(reader);

    let resolved = catalog.resolve_works(&ids, &options.id_source);
    let work_ids: Vec<u64> = resolved.values().copied().collect();
    let controlled = catalog.controlled_rows(&work_ids);

    // Pass 2: stream rows through the split calculation.
    let mut out_headers = headers.clone();
    for extra in [
        "Status", "Party", "Role", "Right", "Share", "Fee %", "Fee", "Net",
    ] {
        out_headers.push_field(extra);
    }
    writer.write_record(&out_headers)?;

    let mut report = RoyaltyReport::default();
    let mut reader = open()?;
    reader.headers()?;
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = index + 2; // 1-based, after the header
        report.rows += 1;

        let key = record
            .get(options.id_column)
            .unwrap_or("")
            .trim()
            .to_string();
        let Some(rows) = resolved.get(&key).and_then(|id| controlled.get(id)) else {
            report.unmatched += 1;
            write_row(writer, &record, &["WORK NOT FOUND", "", "", "", "", "", "", ""])?;
            continue;
        };
        report.matched += 1;

        let amount = parse_amount(record.get(options.amount_column).unwrap_or(""), line)?;
        let right = row_right(&record, options, line)?;

        let controlled_fraction: f64 = rows.iter().map(|(wiw, _)| wiw.relative_share / 100.0).sum();
        if rows.is_empty() || controlled_fraction <= 0.0 {
            write_row(writer, &record, &["NO CONTROLLED SHARE", "", "", "", "", "", "", ""])?;
            continue;
        }

        match options.algorithm {
            Algorithm::Share => split_by_share(
                writer,
                &record,
                amount,
                right,
                controlled_fraction,
                rows,
                config,
                &mut report,
            )?,
            Algorithm::Fee => split_by_fee(
                writer,
                &record,
                line,
                amount,
                right,
                controlled_fraction,
                rows,
                options,
                &mut report,
            )?,
        }
    }
    writer.flush()?;
    Ok(report)
}

/// Publisher keeps its retained fraction of the right; writers split the
/// rest in proportion to their relative shares.
#[allow(clippy::too_many_arguments)]
fn split_by_share<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    record: &csv::StringRecord,
    amount: f64,
    right: RightType,
    controlled_fraction: f64,
    rows: &[(crate::models::WriterInWork, crate::models::Writer)],
    config: &Config,
    report: &mut RoyaltyReport,
) -> RoyaltyResult<()> {
    let retained = config.retained.for_right(right);

    if retained > 0.0 {
        let kept = round2(amount * retained);
        report.publisher_total += kept;
        write_row(
            writer,
            record,
            &[
                "OK",
                &config.publisher.name,
                "PUBLISHER",
                right.label(),
                &format!("{:.6}", retained),
                "",
                "",
                &format!("{:.2}", kept),
            ],
        )?;
    }
    // When the publisher retains everything the writer rows would all be
    // zero; the publisher row above is the whole story for this right.
    if retained >= 1.0 {
        return Ok(());
    }

    for (wiw, w) in rows {
        let ratio = (wiw.relative_share / 100.0) * (1.0 - retained) / controlled_fraction;
        let net = round2(amount * ratio);
        report.writer_net_total += net;
        write_row(
            writer,
            record,
            &[
                "OK",
                &party_name(w),
                "WRITER",
                right.label(),
                &format!("{:.6}", ratio),
                "",
                "",
                &format!("{:.2}", net),
            ],
        )?;
    }
    Ok(())
}

/// Writers receive the amount scaled by their share of the controlled
/// total, minus a publisher fee resolved per row.
#[allow(clippy::too_many_arguments)]
fn split_by_fee<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    record: &csv::StringRecord,
    line: usize,
    amount: f64,
    right: RightType,
    controlled_fraction: f64,
    rows: &[(crate::models::WriterInWork, crate::models::Writer)],
    options: &RoyaltyConfig,
    report: &mut RoyaltyReport,
) -> RoyaltyResult<()> {
    let row_fee = options
        .fee_column
        .and_then(|col| record.get(col))
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(|cell| parse_amount(cell, line))
        .transpose()?;

    for (wiw, w) in rows {
        let ratio = (wiw.relative_share / 100.0) / controlled_fraction;
        let before = amount * ratio;
        let fee_rate = row_fee
            .or_else(|| effective_fee(wiw, w))
            .unwrap_or(options.default_fee)
            / 100.0;
        let fee = round2(before * fee_rate);
        let net = round2(before - fee);
        report.publisher_total += fee;
        report.writer_net_total += net;
        write_row(
            writer,
            record,
            &[
                "OK",
                &party_name(w),
                "WRITER",
                right.label(),
                &format!("{:.6}", ratio),
                &format!("{:.2}", fee_rate * 100.0),
                &format!("{:.2}", fee),
                &format!("{:.2}", net),
            ],
        )?;
    }
    Ok(())
}

// =============================================================================
// Cell parsing
// =============================================================================

/// Parse a money cell, accepting both `1,234.56` and `1.234,56` styles.
fn parse_amount(raw: &str, line: usize) -> RoyaltyResult<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // The rightmost separator is the decimal mark.
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    normalized
        .parse::<f64>()
        .map_err(|_| RoyaltyError::BadAmount {
            line,
            value: raw.to_string(),
        })
}

fn row_right(
    record: &csv::StringRecord,
    options: &RoyaltyConfig,
    line: usize,
) -> RoyaltyResult<RightType> {
    match options.right {
        RightColumn::Fixed(right) => Ok(right),
        RightColumn::Column(col) => {
            let cell = record.get(col).unwrap_or("");
            RightType::from_code(cell).ok_or_else(|| RoyaltyError::BadRightType {
                line,
                value: cell.to_string(),
            })
        }
    }
}

fn check_columns(headers: &csv::StringRecord, options: &RoyaltyConfig) -> RoyaltyResult<()> {
    let width = headers.len();
    let mut required = vec![options.id_column, options.amount_column];
    if let RightColumn::Column(col) = options.right {
        required.push(col);
    }
    if let Some(col) = options.fee_column {
        required.push(col);
    }
    for col in required {
        if col >= width {
            return Err(RoyaltyError::ColumnOutOfRange(col));
        }
    }
    Ok(())
}

fn party_name(writer: &crate::models::Writer) -> String {
    match &writer.name.first_name {
        Some(first) => format!("{}, {}", writer.name.last_name, first),
        None => writer.name.last_name.clone(),
    }
}

fn write_row<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    record: &csv::StringRecord,
    extra: &[&str],
) -> RoyaltyResult<()> {
    let mut out = record.clone();
    for cell in extra {
        out.push_field(cell);
    }
    writer.write_record(&out)?;
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Input decoding
// =============================================================================

/// Statement shape sniffed from the first few kilobytes of the file.
struct StatementFormat {
    delimiter: u8,
    utf8: bool,
}

fn sniff_file(path: &Path) -> RoyaltyResult<StatementFormat> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut prefix = vec![0u8; 8192];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = file.read(&mut prefix[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    prefix.truncate(filled);
    let utf8 = match std::str::from_utf8(&prefix) {
        Ok(_) => true,
        // A character cut at the buffer edge is still UTF-8.
        Err(err) => err.error_len().is_none(),
    };
    let head = String::from_utf8_lossy(&prefix);
    Ok(StatementFormat {
        delimiter: sniff_delimiter(&head),
        utf8,
    })
}

/// Decode a non-UTF-8 statement through charset detection.
fn decode_legacy(path: &Path) -> RoyaltyResult<String> {
    let bytes = std::fs::read(path)?;
    let (charset, _, _) = chardet::detect(&bytes);
    let decoded = match charset.to_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(&bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(&bytes).0.to_string(),
        _ => String::from_utf8_lossy(&bytes).to_string(),
    };
    Ok(decoded)
}

/// Pick the delimiter by counting candidates in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|&d| first_line.matches(d as char).count())
        .filter(|&d| first_line.contains(d as char))
        .unwrap_or(b',')
}

fn csv_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capacity, IpiIdentity, PersonName, Work, Writer, WriterInWork};

    fn catalog_with_split(shares: &[(u64, &str, f64, Option<f64>)]) -> Catalog {
        let mut catalog = Catalog::new();
        let mut rows = Vec::new();
        for &(id, last, share, fee) in shares {
            catalog.add_writer(Writer {
                id,
                name: PersonName::new(last, Some("JANE")),
                ipi: IpiIdentity::default(),
                isni: None,
                generally_controlled: false,
                saan: None,
                publisher_fee: None,
            });
            rows.push(WriterInWork {
                writer_id: Some(id),
                capacity: Some(Capacity::ComposerLyricist),
                relative_share: share,
                controlled: true,
                saan: None,
                publisher_fee: fee,
            });
        }
        catalog.add_work(Work {
            id: 42,
            title: "SPLIT ME".into(),
            iswc: None,
            original_title: None,
            library: None,
            cd_identifier: None,
            writers: rows,
            alternate_titles: vec![],
            recordings: vec![],
            acknowledgements: vec![],
        });
        catalog
    }

    fn options(algorithm: Algorithm) -> RoyaltyConfig {
        RoyaltyConfig {
            id_column: 0,
            id_source: WorkIdSource::WorkId {
                publisher_code: "MUS".into(),
            },
            amount_column: 1,
            right: RightColumn::Fixed(RightType::Performance),
            algorithm,
            default_fee: 0.0,
            fee_column: None,
        }
    }

    fn run(
        statement: &str,
        catalog: &Catalog,
        config: &Config,
        opts: &RoyaltyConfig,
    ) -> (RoyaltyReport, Vec<Vec<String>>) {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let report = process(statement, &mut writer, catalog, config, opts).unwrap();
        let bytes = writer.into_inner().unwrap();
        let rows = csv::Reader::from_reader(bytes.as_slice())
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (report, rows)
    }

    #[test]
    fn test_share_algorithm_splits_with_retained() {
        // 60/40 controlled split, performance retained 0.5, $100:
        // publisher 50.00, writers 30.00 and 20.00.
        let catalog = catalog_with_split(&[(1, "DOE", 60.0, None), (2, "ROE", 40.0, None)]);
        let config = Config::default();
        let (report, rows) = run(
            "Work,Amount\nMUS000042,100.00\n",
            &catalog,
            &config,
            &options(Algorithm::Share),
        );

        assert_eq!(report.matched, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][4], "PUBLISHER");
        assert_eq!(rows[0][9], "50.00");
        assert_eq!(rows[1][3], "DOE, JANE");
        assert_eq!(rows[1][9], "30.00");
        assert_eq!(rows[2][9], "20.00");
        assert_eq!(report.publisher_total, 50.0);
        assert_eq!(report.writer_net_total, 50.0);
    }

    #[test]
    fn test_share_fully_retained_right_is_publisher_only() {
        // Mechanical is retained at 1.0 by default: one publisher row,
        // no zero-amount writer rows.
        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let mut opts = options(Algorithm::Share);
        opts.right = RightColumn::Fixed(RightType::Mechanical);
        let (_, rows) = run("Work,Amount\nMUS000042,80.00\n", &catalog, &config, &opts);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][4], "PUBLISHER");
        assert_eq!(rows[0][9], "80.00");
    }

    #[test]
    fn test_fee_algorithm_per_writer_fees() {
        // 60/40 with fees 10%/20% on $100: nets 54.00 and 32.00.
        let catalog =
            catalog_with_split(&[(1, "DOE", 60.0, Some(10.0)), (2, "ROE", 40.0, Some(20.0))]);
        let config = Config::default();
        let (report, rows) = run(
            "Work,Amount\nMUS000042,100.00\n",
            &catalog,
            &config,
            &options(Algorithm::Fee),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][8], "6.00");
        assert_eq!(rows[0][9], "54.00");
        assert_eq!(rows[1][8], "8.00");
        assert_eq!(rows[1][9], "32.00");
        assert_eq!(report.writer_net_total, 86.0);
        assert_eq!(report.publisher_total, 14.0);
    }

    #[test]
    fn test_partial_control_scales_up() {
        // Only 60% controlled: that writer takes the full controlled pot.
        let catalog = catalog_with_split(&[(1, "DOE", 60.0, Some(10.0))]);
        let config = Config::default();
        let (_, rows) = run(
            "Work,Amount\nMUS000042,100.00\n",
            &catalog,
            &config,
            &options(Algorithm::Fee),
        );

        assert_eq!(rows.len(), 1);
        // ratio 1.0, fee 10.00, net 90.00
        assert_eq!(rows[0][6], "1.000000");
        assert_eq!(rows[0][9], "90.00");
    }

    #[test]
    fn test_unmatched_rows_pass_through() {
        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let (report, rows) = run(
            "Work,Amount\nNOPE,100.00\nMUS000042,10.00\n",
            &catalog,
            &config,
            &options(Algorithm::Share),
        );

        assert_eq!(report.unmatched, 1);
        assert_eq!(report.matched, 1);
        assert_eq!(rows[0][2], "WORK NOT FOUND");
        assert_eq!(rows[0][0], "NOPE");
    }

    #[test]
    fn test_right_column_and_semicolon_delimiter() {
        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let mut opts = options(Algorithm::Share);
        opts.right = RightColumn::Column(2);
        let (_, rows) = run(
            "Work;Amount;Right\nMUS000042;100,00;MECH\n",
            &catalog,
            &config,
            &opts,
        );

        // Three input columns, so the appended block starts at index 3.
        assert_eq!(rows[0][6], "MECHANICAL");
        assert_eq!(rows[0][10], "100.00");
    }

    #[test]
    fn test_bad_amount_is_fatal() {
        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let mut writer = csv::Writer::from_writer(Vec::new());
        let err = process(
            "Work,Amount\nMUS000042,not-money\n",
            &mut writer,
            &catalog,
            &config,
            &options(Algorithm::Share),
        )
        .unwrap_err();
        assert!(matches!(err, RoyaltyError::BadAmount { line: 2, .. }));
    }

    #[test]
    fn test_column_out_of_range() {
        let catalog = Catalog::new();
        let config = Config::default();
        let mut opts = options(Algorithm::Share);
        opts.amount_column = 9;
        let mut writer = csv::Writer::from_writer(Vec::new());
        let err = process("Work,Amount\n", &mut writer, &catalog, &config, &opts).unwrap_err();
        assert!(matches!(err, RoyaltyError::ColumnOutOfRange(9)));
    }

    #[test]
    fn test_process_file_streams_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        let output = dir.path().join("split.csv");
        std::fs::write(&input, "Work,Amount\nMUS000042,100.00\nMUS000042,10.00\n").unwrap();

        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let report =
            process_file(&input, &output, &catalog, &config, &options(Algorithm::Share)).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.matched, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        let rows: Vec<Vec<String>> = csv::Reader::from_reader(text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        // Publisher + writer row per input row.
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][9], "50.00");
        assert_eq!(rows[1][9], "50.00");
        assert_eq!(rows[2][9], "5.00");
        assert_eq!(rows[3][9], "5.00");
    }

    #[test]
    fn test_process_file_decodes_legacy_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        let output = dir.path().join("split.csv");
        // 0xC9 is latin-1 'É', invalid as UTF-8.
        let mut bytes = b"Work;Amount;Title\n".to_vec();
        bytes.extend_from_slice(b"MUS000042;100,00;CAF\xC9\n");
        std::fs::write(&input, &bytes).unwrap();

        let catalog = catalog_with_split(&[(1, "DOE", 100.0, None)]);
        let config = Config::default();
        let report =
            process_file(&input, &output, &catalog, &config, &options(Algorithm::Share)).unwrap();

        assert_eq!(report.matched, 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("50.00"));
    }

    #[test]
    fn test_amount_formats() {
        assert_eq!(parse_amount("1,234.56", 1).unwrap(), 1234.56);
        assert_eq!(parse_amount("1.234,56", 1).unwrap(), 1234.56);
        assert_eq!(parse_amount("123,45", 1).unwrap(), 123.45);
        assert_eq!(parse_amount(" 99.9 ", 1).unwrap(), 99.9);
        assert!(parse_amount("", 1).is_err());
    }

    #[test]
    fn test_right_codes() {
        assert_eq!(RightType::from_code("perf"), Some(RightType::Performance));
        assert_eq!(RightType::from_code("MR"), Some(RightType::Mechanical));
        assert_eq!(RightType::from_code("Sync"), Some(RightType::Synchronization));
        assert_eq!(RightType::from_code("??"), None);
    }
}
