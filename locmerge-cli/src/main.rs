mod inspect;
mod merge;
mod path_glob;
mod sources;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use locmerge::{JsonStyle, convert};
use tracing_subscriber::EnvFilter;

use crate::inspect::{run_duplicates_command, run_words_command};
use crate::merge::{MergeArgs, run_conflicts_command, run_merge_command};
use crate::sources::parse_options;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a localization file to another format.
    Convert {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The output file to write the results to
        #[arg(short, long)]
        output: String,
        /// Language of the input when neither its path nor header names one,
        /// and the language to write to single-language outputs
        #[arg(short, long)]
        lang: Option<String>,
        /// Write JSON output as nested objects instead of dotted keys
        #[arg(long)]
        nested: bool,
    },

    /// Merge several copies of a catalog. Earlier inputs win unresolved conflicts.
    Merge {
        /// Input files or glob patterns, in merge order
        #[arg(short, long, required = true, num_args = 1..)]
        inputs: Vec<String>,
        /// The output file to write the merged catalog to
        #[arg(short, long)]
        output: String,
        /// Language of inputs that do not name one; also the language written
        /// to single-language outputs
        #[arg(short, long)]
        lang: Option<String>,
        /// JSON file mapping conflicted keys to the entry to keep
        #[arg(long)]
        resolutions: Option<String>,
        /// Write the merge report as JSON to this file
        #[arg(long)]
        report: Option<String>,
        /// Write JSON output as nested objects instead of dotted keys
        #[arg(long)]
        nested: bool,
    },

    /// Print the conflicts a merge of the inputs would have to decide.
    Conflicts {
        #[arg(short, long, required = true, num_args = 1..)]
        inputs: Vec<String>,
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Print values repeated across keys, languages and files.
    Duplicates {
        #[arg(short, long, required = true, num_args = 1..)]
        inputs: Vec<String>,
        /// Also group values that differ only in case or whitespace
        #[arg(long)]
        loose: bool,
    },

    /// Print translated and pending word counts per file and language.
    Words {
        #[arg(short, long, required = true, num_args = 1..)]
        inputs: Vec<String>,
        #[arg(short, long)]
        lang: Option<String>,
    },
}

fn json_style(nested: bool) -> JsonStyle {
    if nested {
        JsonStyle::Nested
    } else {
        JsonStyle::Flat
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<(), String> {
    match args.commands {
        Commands::Convert {
            input,
            output,
            lang,
            nested,
        } => {
            let parsed = convert(
                &input,
                &output,
                lang.as_deref(),
                &parse_options(lang.as_deref()),
                json_style(nested),
            )
            .map_err(|e| e.to_string())?;
            println!(
                "Converted {} keys from {} to {}",
                parsed.catalog.len(),
                input,
                output
            );
            for issue in &parsed.dropped {
                eprintln!("warning: dropped {}: {}", issue.key, issue.reason);
            }
            Ok(())
        }
        Commands::Merge {
            inputs,
            output,
            lang,
            resolutions,
            report,
            nested,
        } => run_merge_command(MergeArgs {
            inputs,
            output,
            lang,
            resolutions,
            report,
            style: json_style(nested),
        }),
        Commands::Conflicts { inputs, lang } => run_conflicts_command(inputs, lang),
        Commands::Duplicates { inputs, loose } => run_duplicates_command(inputs, loose),
        Commands::Words { inputs, lang } => run_words_command(inputs, lang),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
