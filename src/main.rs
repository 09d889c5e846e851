//! Command-line entry point: `beamdep train` and `beamdep test`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{App, Arg, ArgMatches, SubCommand};
use log::LevelFilter;

use beamdep::corpus;
use beamdep::diag::Diagnostic;
use beamdep::error::Result;
use beamdep::features::DefaultFeatureExtractor;
use beamdep::model::{self, Tag};
use beamdep::parser;
use beamdep::perceptron::Perceptron;
use beamdep::projectivity::is_projective;

const MODEL_DIR: &str = "model_dir";
const BEAM_SIZE: &str = "beam_size";
const CORPUS: &str = "CORPUS";
const ITERATIONS: &str = "iterations";
const ITERATION_TAG: &str = "tag";
const VERBOSE: &str = "verbose";
const CHECKPOINT_EVERY: u32 = 10;

fn build_cli() -> App<'static, 'static> {
    App::new("beamdep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A beam-search, easy-first dependency parser")
        .arg(
            Arg::with_name(VERBOSE)
                .short("v")
                .long("verbose")
                .help("Show info-level log messages in addition to warnings and errors")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("train")
                .about("Trains a model from a gold treebank")
                .arg(
                    Arg::with_name(MODEL_DIR)
                        .long("model-dir")
                        .value_name("DIR")
                        .takes_value(true)
                        .required(true)
                        .help("Directory weight checkpoints are written to"),
                )
                .arg(
                    Arg::with_name(BEAM_SIZE)
                        .long("beam-size")
                        .value_name("K")
                        .takes_value(true)
                        .default_value("8")
                        .help("Beam width"),
                )
                .arg(
                    Arg::with_name(ITERATIONS)
                        .long("iterations")
                        .value_name("N")
                        .takes_value(true)
                        .default_value("10")
                        .help("Number of training epochs over the corpus"),
                )
                .arg(
                    Arg::with_name(CORPUS)
                        .help("Gold treebank to train on")
                        .index(1)
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("test")
                .about("Evaluates a trained model against a gold treebank")
                .arg(
                    Arg::with_name(MODEL_DIR)
                        .long("model-dir")
                        .value_name("DIR")
                        .takes_value(true)
                        .required(true)
                        .help("Directory a weight checkpoint is read from"),
                )
                .arg(
                    Arg::with_name(BEAM_SIZE)
                        .long("beam-size")
                        .value_name("K")
                        .takes_value(true)
                        .default_value("8")
                        .help("Beam width"),
                )
                .arg(
                    Arg::with_name(ITERATION_TAG)
                        .long("tag")
                        .value_name("TAG")
                        .takes_value(true)
                        .default_value("FINAL")
                        .help("Checkpoint tag to load: an iteration number, or FINAL"),
                )
                .arg(
                    Arg::with_name(CORPUS)
                        .help("Gold treebank to evaluate against")
                        .index(1)
                        .required(true),
                ),
        )
}

fn parse_beam_size(matches: &ArgMatches) -> std::result::Result<usize, String> {
    let raw = matches.value_of(BEAM_SIZE).unwrap();
    let n: usize = raw.parse().map_err(|_| format!("not a positive integer: {:?}", raw))?;
    if n == 0 {
        return Err("beam size must be at least 1".to_string());
    }
    Ok(n)
}

fn parse_tag(matches: &ArgMatches) -> Tag {
    let raw = matches.value_of(ITERATION_TAG).unwrap();
    if raw.eq_ignore_ascii_case("final") {
        return Tag::Final;
    }
    match raw.parse() {
        Ok(n) => Tag::Iteration(n),
        Err(_) => {
            log::error!("tag must be a non-negative iteration number or FINAL, got {:?}", raw);
            std::process::exit(1);
        }
    }
}

/// Reads a treebank and drops any non-projective sentence, logging why.
fn load_training_corpus(path: &Path) -> Result<Vec<beamdep::token::Sentence>> {
    let sentences = corpus::read_treebank(path)?;
    let total = sentences.len();
    let kept: Vec<_> = sentences
        .into_iter()
        .enumerate()
        .filter(|(idx, sentence)| {
            let ok = is_projective(sentence);
            if !ok {
                Diagnostic::NonProjectiveSentence {
                    sentence_index: *idx,
                    corpus_path: path.display().to_string(),
                }
                .emit();
            }
            ok
        })
        .map(|(_, sentence)| sentence)
        .collect();
    log::info!("loaded {} sentence(s), {} after projectivity filtering", total, kept.len());
    Ok(kept)
}

fn run_train(matches: &ArgMatches) -> Result<()> {
    let model_dir = PathBuf::from(matches.value_of(MODEL_DIR).unwrap());
    let beam_size = parse_beam_size(matches).unwrap_or_else(|msg| {
        log::error!("{}", msg);
        std::process::exit(1);
    });
    let iterations: u32 = matches
        .value_of(ITERATIONS)
        .unwrap()
        .parse()
        .ok()
        .filter(|&n: &u32| n > 0)
        .unwrap_or_else(|| {
            log::error!("iteration count must be a positive integer");
            std::process::exit(1);
        });
    let corpus_path = PathBuf::from(matches.value_of(CORPUS).unwrap());

    let sentences = load_training_corpus(&corpus_path)?;
    let extractor = DefaultFeatureExtractor;
    let mut perceptron = Perceptron::new();

    for iteration in 1..=iterations {
        for sentence in &sentences {
            parser::train_sentence(sentence, &mut perceptron, &extractor, beam_size)?;
        }
        println!("iteration {}/{} complete", iteration, iterations);
        if iteration % CHECKPOINT_EVERY == 0 {
            model::checkpoint(&model_dir, &Tag::Iteration(iteration), &perceptron)?;
        }
    }
    model::checkpoint(&model_dir, &Tag::Final, &perceptron)?;
    Ok(())
}

fn run_test(matches: &ArgMatches) -> Result<()> {
    let model_dir = PathBuf::from(matches.value_of(MODEL_DIR).unwrap());
    let beam_size = parse_beam_size(matches).unwrap_or_else(|msg| {
        log::error!("{}", msg);
        std::process::exit(1);
    });
    let tag = parse_tag(matches);
    let corpus_path = PathBuf::from(matches.value_of(CORPUS).unwrap());

    let perceptron = model::load(&model_dir, &tag)?;
    let extractor = DefaultFeatureExtractor;
    let sentences = corpus::read_treebank(&corpus_path)?;

    let mut correct: usize = 0;
    let mut total: usize = 0;
    for sentence in &sentences {
        let gold: beamdep::deps::DepSet = sentence
            .tokens()
            .iter()
            .skip(1)
            .map(|t| beamdep::deps::Arc::new(t.parent_id, t.id))
            .collect();
        let predicted = parser::decode(sentence, &perceptron, &extractor, beam_size)?;
        correct += predicted.intersection(&gold).len();
        total += gold.len();
    }

    println!("Correct: {}", correct);
    println!("Total: {}", total);
    let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    println!("Accuracy: {:.4}", accuracy);
    Ok(())
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    let verbosity = if matches.is_present(VERBOSE) { LevelFilter::Info } else { LevelFilter::Warn };
    simple_logger::SimpleLogger::new()
        .with_level(verbosity)
        .init()
        .expect("logger can only be initialized once");

    let outcome = match matches.subcommand() {
        ("train", Some(sub)) => run_train(sub),
        ("test", Some(sub)) => run_test(sub),
        _ => {
            eprintln!("expected a subcommand: train or test (see --help)");
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
