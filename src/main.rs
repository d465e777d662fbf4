use anyhow::Context;
use brandmail_rs::brandmail::config::Settings;
use brandmail_rs::brandmail::server;
use brandmail_rs::brandmail::workflow::builder::Builder;
use brandmail_rs::brandmail::workflow::WorkflowState;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the email workflow over HTTP
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate a single email and print it
    Generate {
        #[arg(long)]
        brand_name: String,

        #[arg(long)]
        product_name: String,

        #[arg(long)]
        product_description: String,

        /// Website that best represents the brand
        #[arg(long, default_value = "")]
        brand_url: String,

        /// Print the whole output record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let workflow = Builder::new(settings.clone())
        .build()
        .context("Failed to build email workflow")?;

    match args.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(settings.server.host);
            let port = port.unwrap_or(settings.server.port);
            server::serve(Arc::new(workflow), &host, port).await?;
        }
        Commands::Generate {
            brand_name,
            product_name,
            product_description,
            brand_url,
            json,
        } => {
            let input =
                WorkflowState::new(brand_name, product_name, product_description, brand_url);
            let output = workflow.run(input).await.context("Email generation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.email);
            }
        }
    }

    Ok(())
}
