//! CLI entry point for working with graphs on a Psynth server.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing_subscriber::{fmt, EnvFilter};

use psynth_core::ServerConfig;
use psynth_graph::{create_graph, load_graph, Graph, HttpTransport, Transport};

#[derive(Parser)]
#[command(name = "psynth")]
#[command(about = "Create, inspect, lay out and publish Psynth graphs")]
struct Cli {
    /// Config file prefix (default: psynth).
    #[arg(short, long, default_value = "psynth")]
    config: String,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Create a new, empty graph and print its filename.
    Create {
        /// Display name of the new graph.
        #[arg(short, long)]
        name: String,
    },
    /// Load a graph and print a summary of its contents.
    Load {
        /// Server-assigned filename, e.g. `b8e1241a-....gt`.
        #[arg(short, long)]
        filename: String,
    },
    /// Ask the server to lay out a graph and print the new node positions.
    Draw {
        #[arg(short, long)]
        filename: String,
    },
    /// Publish a graph and print its public URL.
    Publish {
        #[arg(short, long)]
        filename: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    tracing::info!(url = %config.base_url(), user = %config.user, "Using Psynth server");

    match cli.command {
        Action::Create { name } => {
            let graph = create_graph(&config, &name, transport).await?;
            println!("{}", graph.filename());
        }
        Action::Load { filename } => {
            let graph = load_graph(&config, &filename, transport).await?;
            print_summary(&graph);
        }
        Action::Draw { filename } => {
            let graph = load_graph(&config, &filename, transport).await?;
            graph.draw(None);
            graph.settle().await;
            for node in graph.node_list() {
                println!("{}\t{}\t{}\t{}", node.uid, node.x, node.y, node.name);
            }
        }
        Action::Publish { filename } => {
            let graph = load_graph(&config, &filename, transport).await?;
            let (tx, rx) = oneshot::channel();
            graph.publish(Some(Box::new(move |url: serde_json::Value| {
                let _ = tx.send(url);
            })))?;
            graph.settle().await;
            match rx.await {
                Ok(url) => println!("{}", url.as_str().unwrap_or_default()),
                Err(_) => anyhow::bail!("Server rejected publish for {filename}"),
            }
        }
    }

    Ok(())
}

fn print_summary(graph: &Graph) {
    println!("name:       {}", graph.name());
    println!("filename:   {}", graph.filename());
    println!("link types: {}", graph.link_type_list().len());
    println!("nodes:      {}", graph.node_list().len());
    println!("links:      {}", graph.link_list().len());
    println!("details:    {}", graph.detail_list().len());
    if let (Some(width), Some(height)) = (graph.width(), graph.height()) {
        println!("extent:     {width} x {height}");
    }
}
