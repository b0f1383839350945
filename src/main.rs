//! cwrkit CLI - CWR registration files, ACK imports and royalty splits
//!
//! # Main Commands
//!
//! ```bash
//! cwrkit export catalog.json --cwr-version 2.1      # Generate a CWR file
//! cwrkit ack-import catalog.json reply.V21 --save   # Import a society reply
//! cwrkit royalties catalog.json statement.csv out.csv
//! cwrkit validate catalog.json                      # Check every work
//! ```

use clap::{Parser, Subcommand};
use cwrkit::{
    import_ack_file, process_royalties, validate_work, AckImportOptions, Algorithm, Catalog,
    Config, CwrExport, CwrVersion, RightColumn, RightType, RoyaltyConfig, TransactionType,
    WorkIdSource,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cwrkit")]
#[command(about = "CWR registration files, ACK imports and royalty splits", long_about = None)]
struct Cli {
    /// Configuration file (publisher profile, retained shares)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a CWR registration file from the catalog
    Export {
        /// Catalog snapshot (JSON)
        catalog: PathBuf,

        /// CWR version: 2.1, 2.2, 3.0 or 3.1
        #[arg(long, default_value = "2.1")]
        cwr_version: String,

        /// Transaction type: NWR, REV, WRK or ISR
        #[arg(short, long, default_value = "NWR")]
        transaction: String,

        /// Work ids to include (default: every work in the catalog)
        #[arg(short, long, value_delimiter = ',')]
        works: Vec<u64>,

        /// Destination society code (selects publisher override)
        #[arg(short, long)]
        society: Option<String>,

        /// Delivery sequence number within the year
        #[arg(long, default_value = "1")]
        sequence: u32,

        /// Output file (default: the conventional delivery file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a society acknowledgement file
    AckImport {
        /// Catalog snapshot (JSON)
        catalog: PathBuf,

        /// Acknowledgement file received from the society
        input: PathBuf,

        /// Reconcile ISWCs from the echoed work records
        #[arg(long)]
        import_iswcs: bool,

        /// Write the updated catalog back to disk
        #[arg(long)]
        save: bool,
    },

    /// Split a royalty statement across controlled writers
    Royalties {
        /// Catalog snapshot (JSON)
        catalog: PathBuf,

        /// Statement CSV
        input: PathBuf,

        /// Output CSV with the computed columns appended
        output: PathBuf,

        /// 0-based column holding the work identifier
        #[arg(long, default_value = "0")]
        id_column: usize,

        /// Identifier kind: work-id, iswc, or society:<code>
        #[arg(long, default_value = "work-id")]
        id_source: String,

        /// 0-based column holding the gross amount
        #[arg(long, default_value = "1")]
        amount_column: usize,

        /// Right type (P, M, S) or col:<n> to read it per row
        #[arg(long, default_value = "P")]
        right: String,

        /// Split algorithm: share or fee
        #[arg(long, default_value = "share")]
        algorithm: String,

        /// Fee percentage when no row or writer fee applies
        #[arg(long, default_value = "0")]
        default_fee: f64,

        /// 0-based column holding a per-row fee percentage
        #[arg(long)]
        fee_column: Option<usize>,
    },

    /// Validate every work in the catalog against the aggregate rules
    Validate {
        /// Catalog snapshot (JSON)
        catalog: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Export {
            catalog,
            cwr_version,
            transaction,
            works,
            society,
            sequence,
            output,
        } => cmd_export(
            &config,
            &catalog,
            &cwr_version,
            &transaction,
            works,
            society,
            sequence,
            output.as_deref(),
        ),

        Commands::AckImport {
            catalog,
            input,
            import_iswcs,
            save,
        } => cmd_ack_import(&config, &catalog, &input, import_iswcs, save),

        Commands::Royalties {
            catalog,
            input,
            output,
            id_column,
            id_source,
            amount_column,
            right,
            algorithm,
            default_fee,
            fee_column,
        } => cmd_royalties(
            &config,
            &catalog,
            &input,
            &output,
            id_column,
            &id_source,
            amount_column,
            &right,
            &algorithm,
            default_fee,
            fee_column,
        ),

        Commands::Validate { catalog } => cmd_validate(&config, &catalog),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Config::from_file(p)?),
        None => Ok(Config::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_export(
    config: &Config,
    catalog_path: &Path,
    version: &str,
    transaction: &str,
    works: Vec<u64>,
    society: Option<String>,
    sequence: u32,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::from_file(catalog_path)?;
    eprintln!("📄 Catalog: {} works", catalog.work_count());

    let version = CwrVersion::from_label(version)
        .ok_or_else(|| format!("unknown CWR version: {}", version))?;
    let transaction_type = TransactionType::from_code(transaction)
        .ok_or_else(|| format!("unknown transaction type: {}", transaction))?;

    let work_ids = if works.is_empty() {
        catalog.works().map(|w| w.id).collect()
    } else {
        works
    };
    eprintln!("   Version: CWR {}", version.label());
    eprintln!("   Works: {}", work_ids.len());

    let now = chrono::Local::now().naive_local();
    let mut export = CwrExport::new(
        1,
        version,
        transaction_type,
        work_ids,
        society,
        sequence,
        now.date(),
    );
    let body = export.render(&catalog, config, now)?.to_string();
    let lines = body.lines().count();

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(export.filename(config)));
    fs::write(&path, &body)?;
    eprintln!("✅ Wrote {} records to {}", lines, path.display());
    Ok(())
}

fn cmd_ack_import(
    config: &Config,
    catalog_path: &Path,
    input: &Path,
    import_iswcs: bool,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = Catalog::from_file(catalog_path)?;
    eprintln!("📥 Importing acknowledgements: {}", input.display());

    let options = AckImportOptions {
        import_iswcs,
        publisher_code: Some(config.publisher.code.clone()),
    };
    let report = import_ack_file(input, &mut catalog, &options)?;

    eprintln!("   ✅ Imported: {}", report.imported);
    if report.skipped_duplicates > 0 {
        eprintln!("   Skipped duplicates: {}", report.skipped_duplicates);
    }
    if import_iswcs {
        eprintln!("   ISWCs set: {}", report.iswcs_set);
    }
    if !report.unmatched.is_empty() {
        eprintln!("   ⚠️  Unmatched: {}", report.unmatched.len());
        for entry in report.unmatched.iter().take(5) {
            eprintln!("      - {}", entry);
        }
    }

    if save {
        catalog.save(catalog_path)?;
        eprintln!("💾 Catalog saved to: {}", catalog_path.display());
    } else {
        eprintln!("   (dry run; pass --save to persist)");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_royalties(
    config: &Config,
    catalog_path: &Path,
    input: &Path,
    output: &Path,
    id_column: usize,
    id_source: &str,
    amount_column: usize,
    right: &str,
    algorithm: &str,
    default_fee: f64,
    fee_column: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::from_file(catalog_path)?;
    eprintln!("📄 Processing statement: {}", input.display());

    let id_source = parse_id_source(id_source, config)?;
    let right = parse_right(right)?;
    let algorithm = match algorithm.to_lowercase().as_str() {
        "share" => Algorithm::Share,
        "fee" => Algorithm::Fee,
        other => return Err(format!("unknown algorithm: {}", other).into()),
    };

    let options = RoyaltyConfig {
        id_column,
        id_source,
        amount_column,
        right,
        algorithm,
        default_fee,
        fee_column,
    };
    let report = process_royalties(input, output, &catalog, config, &options)?;

    eprintln!("   Rows: {}", report.rows);
    eprintln!("   ✅ Matched: {}", report.matched);
    if report.unmatched > 0 {
        eprintln!("   ⚠️  Unmatched: {}", report.unmatched);
    }
    eprintln!("   Writers net: {:.2}", report.writer_net_total);
    eprintln!("   Publisher: {:.2}", report.publisher_total);
    eprintln!("💾 Output written to: {}", output.display());
    Ok(())
}

fn parse_id_source(raw: &str, config: &Config) -> Result<WorkIdSource, String> {
    let lowered = raw.to_lowercase();
    if lowered == "work-id" || lowered == "workid" {
        return Ok(WorkIdSource::WorkId {
            publisher_code: config.publisher.code.clone(),
        });
    }
    if lowered == "iswc" {
        return Ok(WorkIdSource::Iswc);
    }
    if let Some(code) = lowered.strip_prefix("society:") {
        return Ok(WorkIdSource::SocietyWorkId {
            society_code: code.to_string(),
        });
    }
    Err(format!("unknown id source: {}", raw))
}

fn parse_right(raw: &str) -> Result<RightColumn, String> {
    let lowered = raw.to_lowercase();
    if let Some(col) = lowered.strip_prefix("col:") {
        let col: usize = col
            .parse()
            .map_err(|_| format!("bad right column: {}", raw))?;
        return Ok(RightColumn::Column(col));
    }
    RightType::from_code(raw)
        .map(RightColumn::Fixed)
        .ok_or_else(|| format!("unknown right type: {}", raw))
}

fn cmd_validate(config: &Config, catalog_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::from_file(catalog_path)?;
    eprintln!("✔️  Validating: {} works", catalog.work_count());

    let mut valid = 0;
    let mut invalid = 0;
    for work in catalog.works() {
        match validate_work(work, &catalog, &config.enforcement) {
            Ok(()) => valid += 1,
            Err(e) => {
                invalid += 1;
                if invalid <= 10 {
                    eprintln!("   ❌ {}", e);
                }
            }
        }
    }

    eprintln!("\n📊 Results: {} valid, {} invalid", valid, invalid);
    if invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}
