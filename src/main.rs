use anyhow::Context;
use clap::{Parser, Subcommand};
use codetale::api::AnalyzeRequestOptions;
use codetale::config::Config;
use codetale::github::GitHubClient;
use codetale::orchestrator::AnalysisOrchestrator;
use codetale::providers::{OpenAiCompatClient, Provider, ProviderCascade};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "codetale",
    about = "AI-generated structural analysis for GitHub repositories",
    version
)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a repository and print the structured result as JSON
    Analyze {
        /// Public GitHub repository URL
        url: String,
        /// Maximum number of files to read
        #[arg(long)]
        max_files: Option<usize>,
        /// Target audience: developer, manager, investor, or all
        #[arg(long, default_value = "all")]
        audience: String,
        /// Skip the suggested narrative block
        #[arg(long)]
        no_narrative: bool,
        /// Skip the mermaid architecture diagram
        #[arg(long)]
        no_mermaid: bool,
        /// Write the result to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    codetale::logging::init(&cli.log_level)?;

    match cli.command {
        Command::Analyze {
            url,
            max_files,
            audience,
            no_narrative,
            no_mermaid,
            output,
        } => {
            let config = Config::load()?;
            let providers = Provider::cascade_from_keys(&config.api_keys);
            anyhow::ensure!(
                !providers.is_empty(),
                "no AI provider configured; set OPENAI_API_KEY or AI_GATEWAY_API_KEY/AI_GATEWAY_URL"
            );

            let github = Arc::new(GitHubClient::new(&config));
            let cascade = Arc::new(ProviderCascade::new(
                providers,
                Arc::new(OpenAiCompatClient::new()),
                &config.cascade,
            ));
            let orchestrator =
                AnalysisOrchestrator::new(github.clone(), github, cascade, config);

            let options = AnalyzeRequestOptions {
                max_files,
                include_narrative: Some(!no_narrative),
                include_mermaid: Some(!no_mermaid),
                target_audience: Some(audience),
            };

            let pb = spinner(&format!("Analyzing {}...", url));
            let result = orchestrator
                .analyze(&url, max_files, &options.to_analysis_options())
                .await;
            pb.finish_and_clear();

            let outcome = result?;
            let rendered = serde_json::to_string_pretty(&outcome.analysis)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &rendered)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!(
                        "Analyzed {}/{} files with {} in {}ms -> {}",
                        outcome.metadata.files_scanned,
                        outcome.metadata.total_files_in_repo,
                        outcome.metadata.model_used,
                        outcome.metadata.analysis_time_ms,
                        path.display()
                    );
                }
                None => println!("{}", rendered),
            }
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}
