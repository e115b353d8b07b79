use clap::Parser;
use std::io::{stdin, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use vocab_core::{
    ConsolePrompter, EngineConfig, ReviewSampler, RunOptions, RunSummary, ThresholdMode, VocabEngine,
};

const DEFAULT_HISTORY_PATH: &str = "history.tsv";

#[derive(Parser)]
#[command(name = "vocab-tagger")]
#[command(about = "Tag dictionary words that occur in a text corpus, then review a random sample")]
struct Args {
    /// Corpus text files or directories of text files
    #[arg(required = true)]
    corpus: Vec<PathBuf>,

    /// Dictionary TSV file
    #[arg(short, long)]
    dictionary: PathBuf,

    /// Occurrences needed for a word to be tagged
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    required_count: i64,

    /// Number of tagged words to review
    #[arg(short = 'n', long, default_value_t = 5, allow_negative_numbers = true)]
    sample_size: i64,

    /// History TSV file of reviewed words
    #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
    history: PathBuf,

    /// Ignore the history file entirely
    #[arg(long)]
    no_history: bool,

    /// Known words above this confidence are not reviewed again
    #[arg(long, allow_negative_numbers = true)]
    confidence_threshold: Option<i64>,

    /// Sum counts over all sources instead of testing each source alone
    #[arg(long)]
    combined: bool,

    /// Also write the tagged entries to this file
    #[arg(long)]
    tagged_out: Option<PathBuf>,

    /// Rewrite the dictionary with updated tags and confidences
    #[arg(long)]
    write_dictionary: bool,

    /// Seed for the review sample
    #[arg(long)]
    seed: Option<u64>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_options(args: &Args) -> vocab_core::Result<RunOptions> {
    let mut options = RunOptions::new(
        args.corpus.clone(),
        &args.dictionary,
        args.required_count,
        args.sample_size,
    )?;
    if !args.no_history {
        options = options.with_history(&args.history);
    }
    if let Some(threshold) = args.confidence_threshold {
        options = options.with_confidence_threshold(threshold);
    }
    if args.combined {
        options = options.with_threshold_mode(ThresholdMode::Combined);
    }
    if let Some(path) = &args.tagged_out {
        options = options.with_tagged_output(path);
    }
    if args.write_dictionary {
        options = options.with_dictionary_write();
    }
    Ok(options)
}

fn run(args: &Args, config: EngineConfig) -> vocab_core::Result<RunSummary> {
    let options = build_options(args)?;
    let engine = VocabEngine::new(config);
    let mut sampler = match args.seed {
        Some(seed) => ReviewSampler::seeded(seed),
        None => ReviewSampler::from_entropy(),
    };
    let mut prompter = ConsolePrompter::new(stdin().lock(), stdout());
    engine.run(options, &mut sampler, &mut prompter)
}

fn print_summary(summary: &RunSummary, json: bool) -> vocab_core::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("\nEntries loaded:   {} ({} lines skipped)", summary.entries, summary.skipped_lines);
    println!("Corpus sources:   {}", summary.sources);
    println!("Tagged:           {} ({} suppressed by history)", summary.tagged, summary.suppressed);
    println!(
        "Reviewed:         {}/{}{}",
        summary.reviewed,
        summary.sampled,
        if summary.aborted { " (stopped early)" } else { "" }
    );
    println!("History entries:  {}", summary.history_entries);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.debug |= args.debug;
    init_logging(config.debug);

    match run(&args, config).and_then(|summary| print_summary(&summary, args.json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}
