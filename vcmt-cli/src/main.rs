use anyhow::Result;
use clap::Parser;
use std::path::Path;

use vcmt_cli::EntriesFile;
use vcmt_core::{ExtractionConfig, Session, VcmtProcessor};

#[derive(Parser)]
#[command(name = "vcmt")]
#[command(about = "Fill VCMT competency-mapping templates from an entries file")]
struct Args {
    /// Path to the DOCX template to fill
    #[arg(short, long)]
    input: String,

    /// Path to the entries file (YAML or JSON) with per-unit evidence
    #[arg(short, long)]
    entries: Option<String>,

    /// Comma-separated unit codes to map (defaults to the entries file's codes)
    #[arg(long, default_value = "")]
    codes: String,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated from codes and date)
    #[arg(short, long)]
    output: Option<String>,

    /// Surname appended to the generated filename
    #[arg(long)]
    surname: Option<String>,

    /// Inspect the template (tables, role mapping, detected units) and exit
    #[arg(long)]
    inspect: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🗂️  VCMT Template Filler");

    // Check if input file exists
    if !Path::new(&args.input).exists() {
        println!("⚠️  Input template not found at: {}", args.input);
        println!("   Please check the file path.");
        return Ok(());
    }

    let config = ExtractionConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    println!("📄 Loading template: {}", args.input);
    let bytes = std::fs::read(&args.input)?;
    let processor = VcmtProcessor::new(config.clone());

    if args.inspect {
        return inspect(&processor, &bytes);
    }

    let mut session = match Session::load(bytes, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ Could not read the template: {e}");
            eprintln!("   The document may be corrupt; please re-export it and try again.");
            std::process::exit(1);
        }
    };
    println!(
        "🔍 Detected units: {}",
        if session.discovered_codes().is_empty() {
            "(none)".to_string()
        } else {
            session.discovered_codes().join(", ")
        }
    );

    // Entries file drives which codes get mapped and what goes in the rows
    let mut chosen: Vec<String> = Vec::new();
    let mut surname = args.surname.clone();
    if let Some(entries_path) = &args.entries {
        let entries = EntriesFile::load(entries_path)?;
        println!("📥 Applying entries from: {}", entries_path);
        chosen = entries.codes();
        if surname.is_none() {
            surname = entries.surname.clone();
        }
        for warning in entries.apply(&mut session)? {
            println!("⚠️  {warning}");
        }
    }

    let codes = session.select_codes(&chosen, &args.codes);
    if codes.is_empty() {
        println!("⚠️  None of the requested codes appear in the document; nothing to fill.");
        return Ok(());
    }
    println!("🎯 Selected codes: {}", codes.join(", "));

    // QA preview: blocked rows will be skipped by the export
    let report = session.qa_report();
    let blocked = report.iter().filter(|r| r.is_blocked()).count();
    for row in &report {
        if row.is_blocked() {
            println!("⛔ {} [{}] {}", row.unit_code, row.part.label(), row.label);
        } else if row.pending_evidence {
            println!("⏳ {} [{}] {}", row.unit_code, row.part.label(), row.label);
        }
    }
    if blocked > 0 {
        println!("⚠️  {blocked} row(s) have missing titles or invalid years and will be skipped");
    }
    let drafts = session.unconfirmed(&codes);
    if !drafts.is_empty() {
        println!("⚠️  Units not signed off (exported anyway): {}", drafts.join(", "));
    }

    match processor.export(&session, &codes, surname.as_deref()) {
        Ok((bytes, report)) => {
            let output_path = args.output.clone().unwrap_or(report.filename.clone());
            std::fs::write(&output_path, &bytes)?;
            println!("💾 Saved to: {}", output_path);
            println!("📊 Fill summary:");
            println!("   - Rows written: {}", report.rows_written);
            println!("   - Rows skipped: {}", report.rows_skipped);
            if report.fallback_tables_created > 0 {
                println!("   - Fallback tables created: {}", report.fallback_tables_created);
            }
        }
        Err(e) => {
            eprintln!("❌ Export failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn inspect(processor: &VcmtProcessor, bytes: &[u8]) -> Result<()> {
    println!("\n🔬 Template inspection");
    let inspection = processor.inspect(bytes)?;

    println!("\n📊 Tables:");
    if inspection.tables.is_empty() {
        println!("   (none)");
    }
    for table in &inspection.tables {
        println!("   {}", table.describe());
    }

    println!("\n🧭 Role mapping:");
    println!("   - Qualification: {:?}", inspection.mapping.qualification);
    println!("   - Experience: {:?}", inspection.mapping.experience);
    println!(
        "   - Professional development: {:?}",
        inspection.mapping.professional_development
    );

    println!("\n📚 Detected units:");
    println!("{}", serde_json::to_string_pretty(&inspection.units)?);
    Ok(())
}
