//! Newsbrief CLI - AI-assisted news headline analysis
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments, rendering output and handling top-level errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use newsbrief::agent::{self, Analyst};
use newsbrief::news::{Article, NewsClient};
use newsbrief::record::{AnalysisInput, AnalysisRecord};
use newsbrief::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newsbrief")]
#[command(author, version, about = "AI-assisted news headline analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current top headlines
    Headlines {
        /// Two-letter country code (defaults to the configured country)
        #[arg(long)]
        country: Option<String>,
        /// Narrow to a category (business, technology, sports, ...)
        #[arg(long)]
        category: Option<String>,
    },
    /// Search news by keyword
    Search {
        /// Search query
        query: String,
    },
    /// Analyze an article with the configured model
    Analyze {
        /// Article title
        #[arg(long)]
        title: Option<String>,
        /// Article description
        #[arg(long)]
        description: Option<String>,
        /// Article body text
        #[arg(long)]
        content: Option<String>,
        /// Analyze the Nth current headline instead (1-based)
        #[arg(long, conflicts_with_all = ["title", "description", "content"])]
        pick: Option<usize>,
        /// Country for --pick (defaults to the configured country)
        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Headlines { country, category } => {
            let client = NewsClient::new(config.news_key()?)?;
            let country = country.unwrap_or_else(|| config.news.country.clone());
            let articles = client
                .top_headlines(&country, category.as_deref(), config.news.page_size)
                .await?;
            print_articles(&articles);
        }
        Commands::Search { query } => {
            let client = NewsClient::new(config.news_key()?)?;
            let articles = client.search(&query, config.news.page_size).await?;
            if articles.is_empty() {
                println!("No results found for: {query}");
            } else {
                println!("Search results for '{query}':\n");
                print_articles(&articles);
            }
        }
        Commands::Analyze {
            title,
            description,
            content,
            pick,
            country,
        } => {
            let input = match pick {
                Some(n) => {
                    let client = NewsClient::new(config.news_key()?)?;
                    let country = country.unwrap_or_else(|| config.news.country.clone());
                    let articles = client
                        .top_headlines(&country, None, config.news.page_size)
                        .await?;
                    let article = articles
                        .get(n.saturating_sub(1))
                        .ok_or_else(|| anyhow::anyhow!("no headline at position {n}"))?;
                    println!("Analyzing: {}\n", article.title);
                    AnalysisInput::from(article)
                }
                None => AnalysisInput {
                    title,
                    description,
                    content,
                },
            };

            let analyst = Analyst::new(&config)?;
            match analyst.analyze(&input).await {
                Ok(record) => print_record(&record),
                Err(err) => {
                    let report = agent::classify_error(&err);
                    eprintln!("{}: {}", report.error.red().bold(), report.details);
                    if let Some(hint) = report.hint {
                        eprintln!("{} {}", "hint:".yellow(), hint);
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_articles(articles: &[Article]) {
    for (i, article) in articles.iter().enumerate() {
        let when = article
            .published_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        println!(
            "{:>2}. {} ({}, {})",
            i + 1,
            article.title.bold(),
            article.source.name,
            when
        );
        if let Some(description) = &article.description {
            println!("    {description}");
        }
        println!("    {}\n", article.url.dimmed());
    }
}

fn print_record(record: &AnalysisRecord) {
    println!("💡 Summary:");
    println!("  {}\n", record.summary);

    println!("📌 Key Points:");
    for point in &record.key_points {
        println!("  • {point}");
    }

    let label = match record.sentiment.kind.as_str() {
        "Positive" => record.sentiment.kind.green(),
        "Negative" => record.sentiment.kind.red(),
        _ => record.sentiment.kind.normal(),
    };
    println!("\n🗳️  Sentiment: {} - {}", label, record.sentiment.explanation);

    println!("🎭 Tone: {}", record.tone);
    println!("⚖️  Bias: {}", record.bias_detection);
}
