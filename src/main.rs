//! # Folio CLI
//!
//! Usage:
//!   folio request.json -o layout.json
//!   echo '{ ... }' | folio --ops
//!   folio --example > request.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use folio::error::ExportError;
use folio::sink::{emit, Recorder};
use folio::ExportRequest;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Paginate a documentation tree with a resolved table of contents", long_about = None)]
struct Cli {
    /// Export request (JSON). Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Export config (JSON) replacing the request's `config`
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the render sink calls instead of the page layout
    #[arg(long)]
    ops: bool,

    /// Print an example request and exit
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_request_json());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(summary) => {
            eprintln!("✓ {summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut request = ExportRequest::from_json(&input)?;
    if let Some(path) = &cli.config {
        request.config = folio::config::ExportConfig::from_json(&fs::read_to_string(path)?)?;
    }

    let document = request.document()?;
    let resolved = folio::export(&document, &request.config)?;

    let json = if cli.ops {
        let mut recorder = Recorder::new();
        emit(&resolved, &mut recorder)?;
        serde_json::to_string_pretty(&recorder.ops).map_err(ExportError::from)?
    } else {
        serde_json::to_string_pretty(&resolved).map_err(ExportError::from)?
    };

    match &cli.output {
        Some(path) => fs::write(path, json.as_bytes())?,
        None => println!("{json}"),
    }

    Ok(format!(
        "{} page(s), {} section anchor(s)",
        resolved.total_pages(),
        resolved.anchors.len()
    ))
}

fn example_request_json() -> &'static str {
    r##"{
  "title": "Widget Handbook",
  "records": [
    {
      "id": "getting-started",
      "title": "Getting Started",
      "depth": 1,
      "description": "Install the widget and run it for the first time.",
      "body": [
        {
          "type": "Paragraph",
          "runs": [
            { "text": "Widgets ship as a single binary. " },
            { "text": "No runtime is required.", "bold": true }
          ]
        },
        {
          "type": "CodeBlock",
          "language": "sh",
          "lines": ["curl -fsSL https://example.com/install.sh | sh", "widget --version"]
        }
      ]
    },
    {
      "id": "configuration",
      "parentId": "getting-started",
      "title": "Configuration",
      "depth": 2,
      "body": [
        {
          "type": "Table",
          "headerRow": ["Key", "Default", "Meaning"],
          "rows": [
            ["port", "8080", "Listening port"],
            ["workers", "4", "Worker threads"],
            ["log", "info", "Log level"]
          ]
        },
        {
          "type": "ListBlock",
          "ordered": true,
          "items": [
            { "runs": [{ "text": "Copy the sample config." }] },
            {
              "runs": [{ "text": "Edit the keys you need:" }],
              "sublist": {
                "ordered": false,
                "items": [
                  { "runs": [{ "text": "port", "code": true }] },
                  { "runs": [{ "text": "workers", "code": true }] }
                ]
              }
            },
            { "runs": [{ "text": "Restart the widget." }] }
          ]
        }
      ]
    },
    {
      "id": "internals",
      "title": "Internals",
      "depth": 1,
      "hidden": true,
      "body": [{ "type": "Paragraph", "runs": [{ "text": "Not exported by default." }] }]
    },
    {
      "id": "faq",
      "title": "FAQ",
      "depth": 1,
      "body": [
        { "type": "Heading", "level": 3, "text": "Does it run on ARM?" },
        { "type": "Quote", "runs": [{ "text": "Yes, every release ships ARM builds." }] },
        { "type": "Rule" },
        { "type": "ImagePlaceholder", "caption": "Architecture overview" }
      ]
    }
  ],
  "config": {
    "pageSize": "Letter",
    "includeCover": true,
    "tocMaxDepth": 2,
    "headerText": "{title} / {section}"
  }
}
"##
}
