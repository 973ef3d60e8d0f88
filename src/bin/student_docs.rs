//! Render student documents from a JSON record file.
//!
//! Usage:
//!   student_docs card   --records students.json --student S-... [--out card.pdf]
//!   student_docs roster --records students.json [--search TEXT] [--course NAME] [--year N] [--out students.pdf]
//!   student_docs csv    --records students.json [--out students.csv]
//!
//! Common options:
//!   --config FILE   RenderConfig as JSON (absent keys take defaults)
//!   --compress      Flate-compress page content streams
//!
//! Set RUST_LOG=debug for progress output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use student_docs::export::{csv_attachment, write_csv};
use student_docs::{
    render_card, render_roster, Error, FsAssets, RenderConfig, Result, RosterFilter,
    StudentRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Card,
    Roster,
    Csv,
}

struct CliArgs {
    command: Command,
    records: PathBuf,
    student: Option<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    compress: bool,
    filter: RosterFilter,
}

impl CliArgs {
    fn from_args() -> std::result::Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let command = match args.get(1).map(String::as_str) {
            Some("card") => Command::Card,
            Some("roster") => Command::Roster,
            Some("csv") => Command::Csv,
            Some(other) => return Err(format!("Unknown command: {}", other)),
            None => return Err("Missing command".to_string()),
        };

        let mut records = None;
        let mut student = None;
        let mut config = None;
        let mut out = None;
        let mut compress = false;
        let mut filter = RosterFilter::new();

        let mut i = 2;
        while i < args.len() {
            let flag = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| format!("Missing value for {}", flag))
            };
            match flag {
                "--records" => records = Some(PathBuf::from(value()?)),
                "--student" => student = Some(value()?),
                "--config" => config = Some(PathBuf::from(value()?)),
                "--out" | "-o" => out = Some(PathBuf::from(value()?)),
                "--search" => filter = filter.search(value()?),
                "--course" => filter = filter.course(value()?),
                "--year" => {
                    let raw = value()?;
                    let year = raw
                        .parse()
                        .map_err(|_| format!("Invalid year level: {}", raw))?;
                    filter = filter.year_level(year);
                },
                "--compress" => compress = true,
                other => return Err(format!("Unknown option: {}", other)),
            }
            i += 1;
        }

        Ok(Self {
            command,
            records: records.ok_or("Missing --records")?,
            student,
            config,
            out,
            compress,
            filter,
        })
    }
}

fn usage() {
    eprintln!("Usage: student_docs <card|roster|csv> --records FILE [options]");
    eprintln!("  card:   --student NUMBER");
    eprintln!("  roster: [--search TEXT] [--course NAME] [--year N]");
    eprintln!("  common: [--config FILE] [--out FILE] [--compress]");
}

fn load_records(path: &PathBuf) -> Result<Vec<StudentRecord>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_output(path: PathBuf, bytes: &[u8]) -> Result<()> {
    let mut out = BufWriter::new(File::create(&path)?);
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}

fn run(args: CliArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)?,
        None => RenderConfig::default(),
    };
    if args.compress {
        config = config.with_compress(true);
    }
    let assets = FsAssets::new(&config.asset_root);
    let records = load_records(&args.records)?;
    log::info!("Loaded {} records from {}", records.len(), args.records.display());

    let start = Instant::now();
    let (bytes, attachment) = match args.command {
        Command::Card => {
            let number = args
                .student
                .as_deref()
                .ok_or_else(|| Error::InvalidRecord("card requires --student".to_string()))?;
            let record = records
                .iter()
                .find(|r| r.student_number == number)
                .ok_or_else(|| Error::InvalidRecord(format!("Student not found: {}", number)))?;
            render_card(record, &config, &assets)?
        },
        Command::Roster => {
            let selected = args.filter.apply(&records);
            let filter = (!args.filter.is_empty()).then(|| args.filter.clone());
            render_roster(selected, filter, &config, &assets)?
        },
        Command::Csv => {
            let selected = args.filter.apply(&records);
            let mut bytes = Vec::new();
            write_csv(selected, &mut bytes)?;
            (bytes, csv_attachment())
        },
    };

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(&attachment.filename));
    write_output(path.clone(), &bytes)?;
    println!(
        "{} ({}, {} bytes) in {:.1}ms",
        path.display(),
        attachment.content_type,
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            usage();
            return ExitCode::from(2);
        },
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
