//! Sheetjson CLI - Convert spreadsheet workbooks to JSON
//!
//! # Main Commands
//!
//! ```bash
//! sheetjson convert clientes.xlsx -o resultado.json   # Workbook to JSON (standard modifications)
//! sheetjson convert clientes.xlsx -m mods.json        # Custom modifications
//! sheetjson recommend "¿Cómo normalizo fechas?"        # Ask the assistant
//! sheetjson serve                                     # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! sheetjson sheets clientes.xlsx         # List sheets, fields and record counts
//! sheetjson rules                        # Describe the modification rules
//! sheetjson example-modifications        # Print an example configuration
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use sheetjson::{
    config, convert_file, example_modifications, read_workbook_file, rules_description,
    Config, ModificationSpec, RecommendationClient,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetjson")]
#[command(about = "Convert spreadsheet workbooks to structured JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a workbook to JSON, one array of records per sheet
    Convert {
        /// Input workbook (xlsx, xlsm, xlsb, xls, ods)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Modifications JSON file (default: standard modifications)
        #[arg(short, long, conflicts_with = "plain")]
        modifications: Option<PathBuf>,

        /// Apply no modifications
        #[arg(long)]
        plain: bool,

        /// Value for the standard `createdAt` field (default: now)
        #[arg(long, conflicts_with_all = ["plain", "modifications"])]
        created_at: Option<String>,
    },

    /// List sheets, their fields and record counts
    Sheets {
        /// Input workbook
        input: PathBuf,
    },

    /// Send a prompt to the recommendation service
    Recommend {
        /// Prompt text
        prompt: String,
    },

    /// Describe the available modification rules
    Rules,

    /// Show an example modifications file
    ExampleModifications,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env and freeze the process configuration
    config::init(Config::from_env());

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            modifications,
            plain,
            created_at,
        } => cmd_convert(
            &input,
            output.as_deref(),
            modifications.as_deref(),
            plain,
            created_at,
        ),

        Commands::Sheets { input } => cmd_sheets(&input),

        Commands::Recommend { prompt } => cmd_recommend(&prompt).await,

        Commands::Rules => cmd_rules(),

        Commands::ExampleModifications => cmd_example_modifications(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    modifications: Option<&Path>,
    plain: bool,
    created_at: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let spec = resolve_spec(modifications, plain, created_at)?;
    if let Some(ref add) = spec.add_field {
        eprintln!("   add_field: {} = {}", add.field_name, add.value);
    }
    if let Some(ref combine) = spec.combine_fields {
        eprintln!(
            "   combine_fields: {} + {} → {}",
            combine.field1, combine.field2, combine.new_field
        );
    }

    let conversion = convert_file(input, &spec).map_err(|e| {
        eprintln!("   Failed step: {}", e.step());
        e
    })?;

    for sheet in &conversion.sheets {
        eprintln!("   {}: {} records", sheet.name, sheet.record_count);
    }

    write_output(&conversion.json, output)?;
    eprintln!("\n✨ Done!");
    Ok(())
}

/// Pick the modifications for a conversion. The timestamp is taken once here.
fn resolve_spec(
    modifications: Option<&Path>,
    plain: bool,
    created_at: Option<String>,
) -> Result<ModificationSpec, Box<dyn std::error::Error>> {
    if plain {
        return Ok(ModificationSpec::none());
    }

    if let Some(path) = modifications {
        let content = fs::read_to_string(path)?;
        return Ok(ModificationSpec::from_json(&content)?);
    }

    let mut spec = ModificationSpec::standard_now();
    if let (Some(value), Some(add)) = (created_at, spec.add_field.as_mut()) {
        add.value = Value::String(value);
    }
    Ok(spec)
}

fn cmd_sheets(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());

    let workbook = read_workbook_file(input)?;
    eprintln!("   {} sheet(s)\n", workbook.sheets.len());

    for sheet in &workbook.sheets {
        println!("  📄 {}", sheet.name);
        println!("     Fields: {}", sheet.headers.join(", "));
        println!("     Records: {}", sheet.records.len());
        println!();
    }
    Ok(())
}

async fn cmd_recommend(prompt: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = RecommendationClient::from_config(config::global())?;

    eprintln!("🤖 Sending prompt ({})...", client.model());
    let text = client.recommend(prompt).await?;
    eprintln!("✅ Reply received\n");

    println!("{}", text);
    Ok(())
}

fn cmd_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", rules_description());
    Ok(())
}

fn cmd_example_modifications() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", example_modifications().to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    sheetjson::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
