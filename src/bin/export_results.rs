//! Convert a persisted results JSON file into TXT, Markdown, and CSV exports

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use casegen::export;

#[derive(Parser, Debug)]
#[command(
    name = "export_results",
    about = "Convert test case generation results to TXT/MD/CSV"
)]
struct Args {
    /// Persisted results JSON file (array of result rows)
    #[arg(default_value = "output/batch_requirements.json")]
    input: PathBuf,

    /// Directory to place the converted output under
    #[arg(short, long, default_value = "converted")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let results = export::load_results(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    println!(
        "Loaded {} test cases from {}",
        results.len(),
        args.input.display()
    );

    let base_name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let output_base = args.output.join(format!("{}_{}", base_name, timestamp));

    let txt_dir = output_base.join("txt");
    let md_dir = output_base.join("md");
    let csv_dir = output_base.join("csv");
    std::fs::create_dir_all(&txt_dir)?;
    std::fs::create_dir_all(&md_dir)?;
    std::fs::create_dir_all(&csv_dir)?;

    println!("Output directory: {}", output_base.display());

    for result in &results {
        export::write_txt_file(result, &txt_dir)?;
    }
    println!("Created {} TXT files in {}", results.len(), txt_dir.display());

    for result in &results {
        export::write_md_file(result, &md_dir)?;
    }
    println!("Created {} MD files in {}", results.len(), md_dir.display());

    let csv_path = csv_dir.join(format!("{}.csv", base_name));
    let csv_file = File::create(&csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;
    export::write_csv(&results, csv_file)?;
    println!(
        "Created CSV file: {} ({} rows including header)",
        csv_path.display(),
        results.len() + 1
    );

    Ok(())
}
