use anyhow::Result;
use axum::Router;
use clap::{Parser, ValueEnum};
use searchlite_core::tokenizer::Analyzer;
use searchlite_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, ValueEnum)]
enum AnalyzerChoice {
    Plain,
    English,
}

#[derive(Parser)]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8345)]
    port: u16,
    /// Token pipeline applied at ingest and query time
    #[arg(long, value_enum, default_value = "plain")]
    analyzer: AnalyzerChoice,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let analyzer = match args.analyzer {
        AnalyzerChoice::Plain => Analyzer::plain(),
        AnalyzerChoice::English => Analyzer::english(),
    };
    let app: Router = build_app(analyzer);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
