//! # Invoicer CLI
//!
//! Usage:
//!   invoicer --answers answers.json -o invoice.pdf
//!   cat answers.json | invoicer --schema flow.json
//!   invoicer --answers answers.json --dump-layout
//!   invoicer --example-schema > flow.json
//!   invoicer --example-answers > answers.json

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use invoicer::schema::DEFAULT_SCHEMA_JSON;
use invoicer::{Answers, InvoiceSession, LayoutConfig, Schema};

#[derive(Parser)]
#[command(name = "invoicer")]
#[command(about = "Walk an invoice schema with recorded answers and render the result as PDF")]
#[command(version)]
struct Cli {
    /// Schema JSON; the built-in invoice flow when omitted
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Answer sheet JSON; read from stdin when omitted
    #[arg(long)]
    answers: Option<PathBuf>,

    /// Layout config JSON; missing keys keep their defaults
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Output path; defaults to Invoice-<number>.pdf
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the laid-out pages as JSON instead of writing a PDF
    #[arg(long)]
    dump_layout: bool,

    /// Print the built-in schema and exit
    #[arg(long)]
    example_schema: bool,

    /// Print a sample answer sheet and exit
    #[arg(long)]
    example_answers: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    invoicer::logging::init(&cli.log_level);

    if cli.example_schema {
        print!("{}", DEFAULT_SCHEMA_JSON);
        return Ok(());
    }
    if cli.example_answers {
        print!("{}", EXAMPLE_ANSWERS_JSON);
        return Ok(());
    }

    let schema = match &cli.schema {
        Some(path) => Schema::from_json(&read_file(path)?)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => Schema::default_invoice(),
    };

    let config = match &cli.layout {
        Some(path) => LayoutConfig::from_json(&read_file(path)?)
            .with_context(|| format!("loading layout config {}", path.display()))?,
        None => LayoutConfig::default(),
    };

    let answers_json = match &cli.answers {
        Some(path) => read_file(path)?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading answers from stdin")?;
            buf
        }
    };
    let answers = Answers::from_json(&answers_json).context("loading answers")?;

    let mut session = InvoiceSession::with_layout(schema, config);
    session.apply_answers(&answers);
    let document = session
        .submit()
        .context("wizard did not reach completion")?;

    if cli.dump_layout {
        let json = serde_json::to_string_pretty(&document).context("serializing layout")?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json).context("writing layout to stdout")?;
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.pdf", document.filename)));
    let bytes = invoicer::render_pdf(&document);
    fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(
        path = %output.display(),
        bytes = bytes.len(),
        pages = document.page_count(),
        "invoice written"
    );
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

const EXAMPLE_ANSWERS_JSON: &str = r##"{
  "fields": {
    "invoiceNumber": "INV-2026-001",
    "issueDate": "2026-03-01",
    "dueDate": "2026-03-31",
    "currency": "$",
    "sellerCompanyName": "Northwind Supplies",
    "sellerStreet": "12 Harbour Road",
    "sellerCity": "Portland",
    "sellerState": "OR",
    "sellerZipCode": "97201",
    "sellerCountry": "USA",
    "sellerPhone": "+1 503 555 0100",
    "sellerEmail": "billing@northwind.example",
    "buyerName": "Contoso Ltd",
    "buyerStreet": "400 Market Street",
    "buyerCity": "Seattle",
    "buyerState": "WA",
    "buyerZipCode": "98101",
    "buyerCountry": "USA",
    "buyerPhone": "+1 206 555 0199",
    "buyerEmail": "ap@contoso.example",
    "discount": 0,
    "taxes": 0,
    "notes": "Thank you for your business.",
    "termsAndConditions": "Payment due within 30 days."
  },
  "items": [
    { "description": "Widget", "quantity": 2, "unitPrice": 10 },
    { "kind": "service", "description": "Installation", "quantity": 1, "unitPrice": 80, "lineDiscount": 5 }
  ]
}
"##;
