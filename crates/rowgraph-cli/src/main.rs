//! rowgraph CLI: run packaged pipelines over JSONL files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rowgraph::algorithms;
use rowgraph::{
    Bindings, EngineConfig, Engine, Graph, JsonlReader, JsonlWriter, Result, Strategy,
};

#[derive(Parser)]
#[command(name = "rowgraph")]
#[command(about = "Data-flow graphs over line-delimited JSON records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count word occurrences across documents
    WordCount {
        /// Input JSONL file of {doc_id, text} records
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSONL file
        #[arg(short, long)]
        output: PathBuf,

        /// Field holding the text
        #[arg(long, default_value = "text")]
        text_column: String,

        /// Field to write counts to
        #[arg(long, default_value = "count")]
        count_column: String,
    },

    /// Build an inverted index ranked by tf-idf
    TfIdf {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "doc_id")]
        doc_column: String,

        #[arg(long, default_value = "text")]
        text_column: String,
    },

    /// Rank words per document by pointwise mutual information
    Pmi {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "doc_id")]
        doc_column: String,

        #[arg(long, default_value = "text")]
        text_column: String,
    },

    /// Stable-sort a file by one or more key fields
    SortFile {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated key fields, most significant first
        #[arg(short, long)]
        key: String,

        /// Sort descending instead of ascending
        #[arg(long)]
        desc: bool,

        /// Spill sort runs to disk above this many buffered records
        #[arg(long)]
        spill_threshold: Option<usize>,
    },

    /// Join two files on a key pair
    JoinFiles {
        #[arg(long)]
        left: PathBuf,

        #[arg(long)]
        right: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Key field, either `name` (both sides) or `left_name,right_name`
        #[arg(short, long)]
        key: String,

        /// inner, left, right, full or cross
        #[arg(short, long, default_value = "inner")]
        strategy: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::WordCount {
            input,
            output,
            text_column,
            count_column,
        } => {
            let graph = algorithms::word_count_graph("input", &text_column, &count_column);
            run_single_input(&graph, &input, &output)
        }
        Commands::TfIdf {
            input,
            output,
            doc_column,
            text_column,
        } => {
            let graph = algorithms::inverted_index_graph("input", &doc_column, &text_column);
            run_single_input(&graph, &input, &output)
        }
        Commands::Pmi {
            input,
            output,
            doc_column,
            text_column,
        } => {
            let graph = algorithms::pmi_graph("input", &doc_column, &text_column);
            run_single_input(&graph, &input, &output)
        }
        Commands::SortFile {
            input,
            output,
            key,
            desc,
            spill_threshold,
        } => run_sort(&input, &output, &key, desc, spill_threshold),
        Commands::JoinFiles {
            left,
            right,
            output,
            key,
            strategy,
        } => run_join(&left, &right, &output, &key, &strategy),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_single_input(graph: &Graph, input: &PathBuf, output: &PathBuf) -> Result<()> {
    let bindings = Bindings::new().iter("input", JsonlReader::from_path(input)?);
    let records = graph.run(bindings)?;
    write_output(&records, output)
}

fn run_sort(
    input: &PathBuf,
    output: &PathBuf,
    key: &str,
    desc: bool,
    spill_threshold: Option<usize>,
) -> Result<()> {
    let fields: Vec<String> = split_fields(key);
    let graph = Graph::from_source("input");
    if desc {
        graph.sort_desc(fields);
    } else {
        graph.sort(fields);
    }

    let mut cfg = EngineConfig::from_env();
    if spill_threshold.is_some() {
        cfg.sort_spill_threshold = spill_threshold;
    }
    let bindings = Bindings::new().iter("input", JsonlReader::from_path(input)?);
    let records = Engine::new(cfg).run(&graph, bindings)?;
    write_output(&records, output)
}

fn run_join(
    left: &PathBuf,
    right: &PathBuf,
    output: &PathBuf,
    key: &str,
    strategy: &str,
) -> Result<()> {
    let strategy: Strategy = strategy.parse()?;
    let right_graph = Graph::from_source("right");
    let graph = Graph::from_source("left");
    match strategy {
        Strategy::Cross => {
            graph.cross_join(&right_graph);
        }
        _ => {
            let fields = split_fields(key);
            let pair = match fields.as_slice() {
                [single] => (single.clone(), single.clone()),
                [l, r] => (l.clone(), r.clone()),
                _ => {
                    return Err(rowgraph::Error::InvalidSpec(
                        "join key must be `name` or `left,right`".to_string(),
                    ))
                }
            };
            graph.join(&right_graph, pair, strategy);
        }
    }

    let bindings = Bindings::new()
        .iter("left", JsonlReader::from_path(left)?)
        .iter("right", JsonlReader::from_path(right)?);
    let records = graph.run(bindings)?;
    write_output(&records, output)
}

fn split_fields(key: &str) -> Vec<String> {
    key.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}

fn write_output(records: &[rowgraph::Record], output: &PathBuf) -> Result<()> {
    let mut writer = JsonlWriter::to_path(output)?;
    writer.write_all(records.iter())?;
    println!("✓ {} records written to {}", records.len(), output.display());
    Ok(())
}
