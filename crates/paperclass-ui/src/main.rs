use paperclass_ui::cli::{Cli, Commands};
use paperclass_ui::render::{render, OutcomeKind};
use paperclass_ui::server::run_server;
use paperclass_ui::ClassifierClient;
use clap::Parser;
use std::io::Read;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            address,
            api_url,
            timeout,
            verbose,
        } => {
            init_logging(verbose);

            let client = ClassifierClient::new(&api_url, Duration::from_secs(timeout))?;
            let addr: SocketAddr = format!("{}:{}", address, port).parse()?;

            println!();
            println!("  Academic Abstract Classifier");
            println!();
            println!("  Backend: {}", api_url);
            println!("  Open http://{} in your browser", addr);
            println!();

            run_server(client, addr).await?;
        }

        Commands::Classify {
            text,
            api_url,
            timeout,
            verbose,
        } => {
            init_logging(verbose);

            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let client = ClassifierClient::new(&api_url, Duration::from_secs(timeout))?;
            let rendered = render(&client.submit(&text).await);
            print!("{}", rendered);

            if rendered.kind == OutcomeKind::Error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "paperclass_ui=debug,tower_http=debug"
    } else {
        "paperclass_ui=info,tower_http=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
