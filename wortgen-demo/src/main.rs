use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use wortgen_core::model::markov_model::MarkovModel;

/// Generate plausible new strings from a corpus of examples.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Corpus file, one entry per line
    corpus: PathBuf,

    /// N-gram window size (3 works well for names, 4 for longer text)
    #[arg(short, long, default_value_t = 3)]
    n: usize,

    /// Number of samples to print
    #[arg(short, long, default_value_t = 20)]
    count: usize,

    /// Abort any sample that grows past this many characters
    #[arg(long)]
    max_len: Option<usize>,

    /// Print one sample per line instead of space-separated
    #[arg(long)]
    one_per_line: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    // Builds on first use, then reloads from the binary cache next to the
    // corpus file
    let model = MarkovModel::new(&args.corpus, args.n)?;

    let mut words = Vec::with_capacity(args.count);
    for _ in 0..args.count {
        words.push(model.generate_bounded(args.max_len)?);
    }

    if args.one_per_line {
        for word in &words {
            println!("{}", word);
        }
    } else {
        println!("{}", words.join(" "));
    }

    Ok(())
}
