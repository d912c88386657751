use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{PrepConfig, SplitConfig, SplitVariant};
use crate::constants::batching::{DEFAULT_MAX_SEQ_LEN, MIN_BATCH_SIZE};
use crate::constants::layout::DEFAULT_DATA_DIR;
use crate::constants::splits::DEFAULT_SPLIT_SEED;
use crate::pipeline::{load_or_prepare, preprocess_dataset};
use crate::splits::SplitLabel;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Session,
    Sequential,
}

impl From<VariantArg> for SplitVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Session => SplitVariant::Session,
            VariantArg::Sequential => SplitVariant::Sequential,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "seqprep",
    disable_help_subcommand = true,
    about = "Split an event log into chronological train/validation/test partitions",
    long_about = "Filter sparse users/items from <data-dir>/<dataset>/<dataset>.tsv, split it by time, and write <dataset>_train_tr.txt, <dataset>_train_valid.txt and <dataset>_test.txt.",
    after_help = "With --encode the partitions are also indexed and written as JSON; an existing <dataset>_train_tr.json is reused."
)]
struct PrepareCli {
    #[arg(help = "Dataset name; input is read from <data-dir>/<dataset>/<dataset>.tsv")]
    dataset: String,
    #[arg(
        long,
        value_enum,
        default_value = "sequential",
        help = "Filter and pivot preset"
    )]
    variant: VariantArg,
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        default_value = DEFAULT_DATA_DIR,
        help = "Root directory holding one sub-directory per dataset"
    )]
    data_dir: PathBuf,
    #[arg(
        long,
        default_value_t = DEFAULT_SPLIT_SEED,
        help = "Seed for the validation/test split"
    )]
    seed: u64,
    #[arg(long, help = "Also build vocabularies and encoded JSON partitions")]
    encode: bool,
    #[arg(
        long = "batch-size",
        default_value_t = 32,
        value_parser = parse_positive_usize,
        help = "Evaluation batch size reported after --encode"
    )]
    batch_size: usize,
    #[arg(
        long = "max-len",
        default_value_t = DEFAULT_MAX_SEQ_LEN,
        value_parser = parse_positive_usize,
        help = "Evaluation row width reported after --encode"
    )]
    max_len: usize,
}

/// Parse `args_iter` (program name excluded) and run the preparation.
pub fn run_prepare<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<PrepareCli, _>(std::iter::once("seqprep".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = PrepConfig {
        data_dir: cli.data_dir,
        split: SplitConfig::for_variant(cli.variant.into()).with_seed(cli.seed),
        ..PrepConfig::default()
    };

    let partitions = preprocess_dataset(&cli.dataset, &config)?;
    for label in SplitLabel::ALL {
        println!("{label} size: {}", partitions.get(label).len());
    }

    if cli.encode {
        let prepared = load_or_prepare(&cli.dataset, &config)?;
        println!("items: {}", prepared.n_items());
        println!("users: {}", prepared.n_users());
        for label in [SplitLabel::Validation, SplitLabel::Test] {
            let batches = prepared.eval_batches(label, cli.batch_size, cli.max_len)?;
            println!(
                "{label} eval batches: {} (batch size {}, width {})",
                batches.len(),
                cli.batch_size.max(MIN_BATCH_SIZE),
                cli.max_len
            );
        }
    }
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<PrepareCli>, Box<dyn Error>> {
        parse_cli::<PrepareCli, _>(
            std::iter::once("seqprep").chain(args.iter().copied()).map(String::from),
        )
    }

    #[test]
    fn defaults_match_documented_usage() {
        let cli = parse(&["gowalla"]).unwrap().unwrap();
        assert_eq!(cli.dataset, "gowalla");
        assert!(matches!(cli.variant, VariantArg::Sequential));
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert_eq!(cli.seed, DEFAULT_SPLIT_SEED);
        assert!(!cli.encode);
        assert_eq!(cli.max_len, 100);
    }

    #[test]
    fn variant_and_flags_parse() {
        let cli = parse(&["yoochoose", "--variant", "session", "--seed", "7", "--encode"])
            .unwrap()
            .unwrap();
        assert!(matches!(cli.variant, VariantArg::Session));
        assert_eq!(cli.seed, 7);
        assert!(cli.encode);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(parse(&["gowalla", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn missing_dataset_is_an_error() {
        assert!(parse(&[]).is_err());
    }
}
