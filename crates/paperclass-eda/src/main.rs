use clap::Parser;
use paperclass_eda::cli::Cli;
use paperclass_eda::stats::DescribeTable;
use paperclass_eda::{describe, load_records, render_all, value_counts, DatasetSource, Features};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match &cli.file {
        Some(path) => DatasetSource::File(path.clone()),
        None => DatasetSource::hub(&cli.dataset, &cli.subset, &cli.split),
    };

    println!("Loading dataset '{}'...", source.describe());
    let records = load_records(&source, cli.rows)?;
    if records.is_empty() {
        anyhow::bail!("dataset {} yielded no records", source.describe());
    }
    println!("Loaded {} records", records.len());

    let features = Features::from_records(&records);
    let mut columns = Vec::new();
    for (name, values) in features.columns() {
        if let Some(summary) = describe(values) {
            columns.push((name, summary));
        }
    }

    println!("\nDescriptive Statistics:");
    print!("{}", DescribeTable::new(columns));

    println!("\nClass Distribution:");
    println!("label");
    for (label, count) in value_counts(&features.labels) {
        println!("{:<5} {:>6}", label, count);
    }

    println!("\nRendering charts into {}", cli.output_dir.display());
    render_all(&cli.output_dir, &features, |path| {
        let name = path.file_name().unwrap_or(path.as_os_str());
        println!("Saved {}", name.to_string_lossy());
    })?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "paperclass_eda=debug,hf_hub=info"
    } else {
        "paperclass_eda=info,hf_hub=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
