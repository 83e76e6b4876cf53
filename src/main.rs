use std::{
    env, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use trend_topics::{
    merge_fields, persist, Config, Corpus, TopicModel, TopicSummary, VisualizationData, Vocabulary,
};

const VISUALIZATION_FILE: &str = "visualization.json";
const DEFAULT_OUT_DIR: &str = "topic-model";

#[derive(Debug)]
struct Args {
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    load: Option<PathBuf>,
    config: Config,
}

#[derive(Debug)]
enum Command {
    Run(Args),
    Help,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("[error] {msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    let start = Instant::now();
    let result = match &args.load {
        Some(dir) => run_loaded(dir, &args),
        None => run_training(&args),
    };
    match result {
        Ok(()) => {
            log::info!("done in {:.2}s", start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut input = None;
    let mut out = None;
    let mut load = None;
    let mut config = Config::default();

    while let Some(a) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} requires a value"));
        match a.as_str() {
            "--input" => input = Some(PathBuf::from(value("--input")?)),
            "--out" => out = Some(PathBuf::from(value("--out")?)),
            "--load" => load = Some(PathBuf::from(value("--load")?)),
            "--topics" => config.num_topics = parse_num("--topics", &value("--topics")?)?,
            "--passes" => config.max_passes = parse_num("--passes", &value("--passes")?)?,
            "--seed" => config.seed = parse_num("--seed", &value("--seed")?)?,
            "--no-below" => config.no_below = parse_num("--no-below", &value("--no-below")?)?,
            "--no-above" => config.no_above = parse_num("--no-above", &value("--no-above")?)?,
            "--top-n" => config.top_n_summary = parse_num("--top-n", &value("--top-n")?)?,
            "--lambda" => config.relevance_lambda = parse_num("--lambda", &value("--lambda")?)?,
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if input.is_none() && load.is_none() {
        return Err("either --input or --load is required".to_string());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(Command::Run(Args { input, out, load, config }))
}

fn parse_num<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("{flag}: cannot parse `{raw}`"))
}

fn print_usage() {
    eprintln!("Usage: trend-topics --input FILE [--out DIR] [--topics K] [--passes N] [--seed S]");
    eprintln!("                    [--no-below N] [--no-above F] [--top-n N] [--lambda F]");
    eprintln!("       trend-topics --load DIR [--input FILE] [--out DIR] [--top-n N] [--lambda F]");
    eprintln!("Input: one document per line, `title<TAB>abstract`, tokens separated by whitespace.");
    eprintln!("Writes {{out}}/vocabulary.cbor, {{out}}/model.cbor and {{out}}/{VISUALIZATION_FILE}.");
}

/// One token sequence per non-blank line; tab-separated fields are merged in order.
fn read_documents(path: &Path) -> io::Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)?;
    let mut skipped = 0usize;
    let docs: Vec<Vec<String>> = text
        .lines()
        .filter(|line| {
            let keep = !line.trim().is_empty();
            skipped += usize::from(!keep);
            keep
        })
        .map(|line| merge_fields(line.split('\t').map(str::split_whitespace)))
        .collect();
    if skipped > 0 {
        log::debug!("skipped {skipped} blank lines");
    }
    log::info!("read {} documents from {}", docs.len(), path.display());
    Ok(docs)
}

fn run_training(args: &Args) -> trend_topics::Result<()> {
    let Some(input) = &args.input else {
        return Err(trend_topics::TopicError::EmptyInput("no input file"));
    };
    let config = &args.config;
    let docs = read_documents(input)?;

    let t0 = Instant::now();
    let vocabulary = Vocabulary::build(&docs, &config.prune_config())?;
    let corpus = Corpus::encode(&docs, &vocabulary);
    log::info!(
        "vocabulary: {} terms / corpus: {} tokens ({:.2}ms)",
        vocabulary.len(),
        corpus.total_tokens(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    let t1 = Instant::now();
    let model = TopicModel::train(&corpus, &vocabulary, &config.train_config())?;
    log::info!("training took {:.2}s", t1.elapsed().as_secs_f64());

    print_summary(&model, &vocabulary, config)?;

    let out = args.out.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    persist::save(&model, &vocabulary, &out)?;
    write_visualization(&model, &corpus, &vocabulary, config, &out)
}

fn run_loaded(dir: &Path, args: &Args) -> trend_topics::Result<()> {
    let (model, vocabulary) = persist::load(dir)?;
    print_summary(&model, &vocabulary, &args.config)?;

    if let Some(input) = &args.input {
        let docs = read_documents(input)?;
        let corpus = Corpus::encode(&docs, &vocabulary);
        let out = args.out.as_deref().unwrap_or(dir);
        fs::create_dir_all(out)?;
        write_visualization(&model, &corpus, &vocabulary, &args.config, out)?;
    }
    Ok(())
}

fn print_summary(model: &TopicModel, vocabulary: &Vocabulary, config: &Config) -> trend_topics::Result<()> {
    let summary = TopicSummary::summarize(model, vocabulary, config.top_n_summary)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{summary}")?;
    out.flush()?;
    Ok(())
}

fn write_visualization(
    model: &TopicModel,
    corpus: &Corpus,
    vocabulary: &Vocabulary,
    config: &Config,
    out: &Path,
) -> trend_topics::Result<()> {
    let data = VisualizationData::prepare(model, corpus, vocabulary, &config.vis_config())?;
    let path = out.join(VISUALIZATION_FILE);
    let mut writer = BufWriter::new(fs::File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &data).map_err(io::Error::from)?;
    writer.flush()?;
    log::info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags_into_config() {
        let Ok(Command::Run(args)) = parse(&["--input", "docs.tsv", "--topics", "4", "--lambda", "0.3", "--no-above", "0.9"]) else {
            panic!("expected a run command");
        };
        assert_eq!(args.input.as_deref(), Some(Path::new("docs.tsv")));
        assert_eq!(args.config.num_topics, 4);
        assert_eq!(args.config.relevance_lambda, 0.3);
        assert_eq!(args.config.no_above, 0.9);
        assert_eq!(args.config.seed, 42);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--input"]).is_err());
        assert!(parse(&["--input", "a", "--topics", "many"]).is_err());
        assert!(parse(&["--input", "a", "--topics", "0"]).unwrap_err().contains("num_topics"));
        assert!(parse(&["--input", "a", "--bogus"]).is_err());
        assert!(matches!(parse(&["--help"]), Ok(Command::Help)));
    }

    #[test]
    fn reads_tab_separated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.tsv");
        fs::write(&path, "Laser welding\tseam quality laser\n\nbattery cell\tthermal runaway\n").unwrap();
        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], vec!["Laser", "welding", "seam", "quality", "laser"]);
        assert_eq!(docs[1], vec!["battery", "cell", "thermal", "runaway"]);
    }
}
