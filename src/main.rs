mod certificate;
mod config;
mod error;
mod routes;
mod samples;
mod state;
mod storage;

use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "certgen", about = "Certificate rendering and file upload service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Render sample certificates into the samples folder
    Sample {
        #[arg(long, default_value = "1.png")]
        template: String,
        /// Render this many certificates from the built-in fixtures
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certgen=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(config::Config::from_env()?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Sample {
            template,
            count,
            name,
            course,
            instructor,
            date,
        } => {
            let renderer = certificate::CertificateRenderer::new(
                &config.templates_folder,
                config.fonts_folder.as_deref(),
            );
            if count > 1 {
                let written =
                    samples::write_samples(&renderer, &config.samples_folder, &template, count);
                if written.is_empty() {
                    return Err("no sample certificates were generated".into());
                }
            } else {
                let overrides = samples::SampleOverrides {
                    name,
                    course,
                    instructor,
                    date,
                };
                let data = samples::default_data(&template, overrides);
                samples::write_sample(&renderer, &config.samples_folder, &template, &data)
                    .map_err(|e| format!("{:#}", e))?;
            }
            Ok(())
        }
    }
}

async fn serve(config: Arc<config::Config>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(state::AppState::new(config.clone()));
    tracing::info!(
        "Templates from {}, uploads to {}",
        state.renderer.templates_dir().display(),
        state.uploads.root().display()
    );

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("certgen listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
