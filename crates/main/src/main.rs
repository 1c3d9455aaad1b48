use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::debug;
use spire_deck::pipeline::{CompletedRun, HistogramStatus, RunError};
use spire_deck::{AnalyzerConfig, RandomDeckId, RunOptions, RunOutcome};

/// Analyzes the energy costs of a Slay the Spire deck listing and writes a PDF report.
///
/// Each line of the listing is `<card name>:<energy cost>`. Without a DECK argument the
/// program asks for the file name on standard input.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Deck listing to analyze.
    deck: Option<PathBuf>,

    /// TOML file overriding the allow-list, cost range, caps or output names.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving the histogram and the report.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Directory containing the TrueType fonts used in the report.
    #[arg(long, env = "SPIRE_DECK_FONTS_DIR")]
    fonts_dir: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        report_error(&mut io::stderr(), "Error", err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    debug!("using configuration {:?}", config);
    let deck = match cli.deck {
        Some(path) => path,
        None => prompt_for_deck()?,
    };

    let options = RunOptions::new(deck)
        .with_output_dir(cli.output_dir)
        .with_fonts_dir(cli.fonts_dir);

    match spire_deck::run(&options, &config, &mut RandomDeckId) {
        Ok(RunOutcome::NoValidData { .. }) => println!("No valid data found in the file."),
        Ok(RunOutcome::Completed(completed)) => print_completed(&completed),
        Err(RunError::Deck(err)) => {
            report_error(&mut io::stdout(), "Error", &err);
            println!("No valid data found in the file.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn prompt_for_deck() -> io::Result<PathBuf> {
    print!("Enter the deck file name: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim_end_matches(['\r', '\n'])))
}

fn print_completed(completed: &CompletedRun) {
    println!("Deck ID: {}", completed.deck_id);
    println!(
        "Accepted {} card(s), rejected {} line(s); total energy cost {}",
        completed.summary.card_count,
        completed.invalid_entries.len(),
        completed.summary.total_cost
    );
    if let Some(average) = completed.summary.average_cost() {
        println!("Average energy cost per card: {:.2}", average);
    }
    if completed.is_void {
        println!("Deck exceeds the card or invalid-entry limit; generating a void report.");
    }
    let mut stdout = io::stdout();
    if let HistogramStatus::Failed(err) = &completed.histogram {
        report_error(&mut stdout, "Error creating histogram", err);
    }
    match &completed.report {
        Ok(path) => println!("PDF Report generated: {}", path.display()),
        Err(err) => {
            report_error(&mut stdout, "Error generating PDF", err);
        }
    }
}

/// Writes `error` and its source chain to one stream.
fn report_error(out: &mut dyn Write, headline: &str, error: &(dyn Error + 'static)) {
    let _ = write_error_chain(out, headline, error);
}

fn write_error_chain(
    out: &mut dyn Write,
    headline: &str,
    mut error: &(dyn Error + 'static),
) -> io::Result<()> {
    writeln!(out, "{}: {}", headline, error)?;
    while let Some(source) = error.source() {
        writeln!(out, "  caused by: {}", source)?;
        error = source;
    }
    out.flush()
}
