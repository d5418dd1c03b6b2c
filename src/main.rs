use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use olc::{
    aligner::AlignerCommand,
    assembly::{assemble, AssemblyConfig},
    optfields::OptField,
    parser::ParserTolerance,
    store::SequenceStore,
};

#[derive(Parser, Debug)]
#[command(name = "olc")]
#[command(
    about = "Assemble overlapping fragments into contigs from their pairwise alignments",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// FASTA or FASTQ file with the fragments to assemble
    #[arg(value_name = "FRAGMENTS")]
    fragments: PathBuf,

    /// Read all-vs-all alignments from this SAM file ("-" for stdin)
    /// instead of running the aligner
    #[arg(short = 'a', long, value_name = "SAM")]
    alignments: Option<PathBuf>,

    /// Aligner program
    #[arg(long, value_name = "PROG", default_value = "minimap2")]
    aligner: String,

    /// Argument passed to the aligner before the fragment file; may be
    /// repeated
    #[arg(long = "aligner-arg", value_name = "ARG", allow_hyphen_values = true)]
    aligner_args: Vec<String>,

    /// Longest clip still considered to reach the end of a fragment
    #[arg(short = 't', long, value_name = "INT", default_value = "20")]
    term_ignore_length: u32,

    /// SAM optional field holding the alignment score
    #[arg(long, value_name = "TAG", default_value = "AS", value_parser = parse_score_tag)]
    score_tag: [u8; 2],

    /// How to treat malformed SAM lines: safe, ignore-all or pedantic
    #[arg(long, value_name = "LEVEL", default_value = "safe", value_parser = parse_tolerance)]
    tolerance: ParserTolerance,

    /// Write contigs here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Contig name prefix
    #[arg(long, value_name = "PREFIX", default_value = "contig")]
    prefix: String,

    /// Write a JSON report of the run
    #[cfg(feature = "serde1")]
    #[arg(long, value_name = "JSON")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_score_tag(s: &str) -> Result<[u8; 2], String> {
    OptField::tag(s.as_bytes())
        .ok_or_else(|| format!("`{}` is not a two-character SAM tag", s))
}

fn parse_tolerance(s: &str) -> Result<ParserTolerance, String> {
    match s {
        "safe" => Ok(ParserTolerance::Safe),
        "ignore-all" => Ok(ParserTolerance::IgnoreAll),
        "pedantic" => Ok(ParserTolerance::Pedantic),
        _ => Err(format!("unknown tolerance level `{}`", s)),
    }
}

fn aligner_command(cli: &Cli) -> AlignerCommand {
    if cli.aligner == "minimap2" && cli.aligner_args.is_empty() {
        AlignerCommand::minimap2(&cli.fragments)
    } else {
        AlignerCommand::new(&cli.aligner)
            .args(&cli.aligner_args)
            .arg(&cli.fragments)
            .arg(&cli.fragments)
    }
}

fn alignment_input(cli: &Cli) -> Result<Box<dyn BufRead>> {
    match &cli.alignments {
        Some(path) if path.as_os_str() == "-" => {
            Ok(Box::new(BufReader::new(io::stdin())))
        }
        Some(path) => {
            let file = File::open(path).with_context(|| {
                format!("Failed to open alignments {}", path.display())
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            let sam = aligner_command(cli).run()?;
            Ok(Box::new(io::Cursor::new(sam)))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if !cli.fragments.exists() {
        bail!("Fragment file {} does not exist", cli.fragments.display());
    }

    let store = SequenceStore::from_path(&cli.fragments).with_context(|| {
        format!("Failed to load fragments from {}", cli.fragments.display())
    })?;
    log::info!(
        "Loaded {} fragments from {}",
        store.len(),
        cli.fragments.display()
    );

    let config = AssemblyConfig::default()
        .with_term_ignore_length(cli.term_ignore_length)
        .with_score_tag(cli.score_tag)
        .with_tolerance(cli.tolerance)
        .with_contig_prefix(cli.prefix.as_str());

    let alignments = alignment_input(&cli)?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| {
                format!("Failed to create output {}", path.display())
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let report = assemble(alignments, &store, &config, &mut out)
        .context("Assembly failed")?;
    out.flush()?;

    #[cfg(feature = "serde1")]
    {
        if let Some(path) = &cli.report {
            report.save_json(path).with_context(|| {
                format!("Failed to write report to {}", path.display())
            })?;
        }
    }

    log::info!(
        "Wrote {} contigs ({} bases)",
        report.contigs.len(),
        report.total_length()
    );

    Ok(())
}
