//! Operations CLI for the notification pipeline
//!
//! Lets an operator probe the configured mail transport, inspect an
//! entity's view counter, and re-arm a threshold alert that has already
//! fired.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mailer::{MailerOptions, MailerService};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use engagement_core::common::{ArticleId, ProductId};
use engagement_core::config::Config;
use engagement_core::domains::content::models::{Article, Product};
use engagement_core::domains::content::ContentRef;
use engagement_core::domains::notifications::{Notification, NotificationDispatcher};
use engagement_core::kernel::{MailerAdapter, TracingAuditLog};

#[derive(Parser)]
#[command(name = "notify_cli")]
#[command(about = "Operations CLI for the engagement notification pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a probe message through the configured SMTP relay
    TestSend {
        /// Recipient; defaults to the configured admin address
        #[arg(long)]
        to: Option<String>,
    },

    /// Show an entity's view counter and notification marker
    Status {
        #[arg(long)]
        article: Option<Uuid>,
        #[arg(long)]
        product: Option<Uuid>,
    },

    /// Clear an entity's notification marker, re-arming the alert
    Reset {
        #[arg(long)]
        article: Option<Uuid>,
        #[arg(long)]
        product: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,engagement_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::TestSend { to } => test_send(&config, to).await,
        Commands::Status { article, product } => status(&config, article, product).await,
        Commands::Reset { article, product } => reset(&config, article, product).await,
    }
}

async fn test_send(config: &Config, to: Option<String>) -> Result<()> {
    let recipient = to.unwrap_or_else(|| config.notify_recipient.clone());

    let service = MailerService::new(MailerOptions {
        host: config.smtp_host.clone(),
        port: config.smtp_port,
        login: config.smtp_login.clone(),
        password: config.smtp_password.clone(),
        sender: config.mail_sender.clone(),
        timeout: Duration::from_secs(config.smtp_timeout_secs),
    })?;
    let dispatcher = NotificationDispatcher::new(
        Arc::new(MailerAdapter::new(Arc::new(service))),
        Arc::new(TracingAuditLog),
        recipient.clone(),
    );

    // A synthetic threshold notification exercises the real template.
    let probe = Notification::ViewsThreshold {
        content: ContentRef::Article(ArticleId::new()),
        title: "Delivery probe".to_string(),
        view_count: config.view_threshold,
        occurred_at: chrono::Utc::now(),
    };

    let result = dispatcher.dispatch(&probe).await;
    if result.delivered {
        println!(
            "delivered to {} in {} attempt(s)",
            recipient, result.attempts
        );
        Ok(())
    } else {
        bail!(
            "delivery failed after {} attempt(s): {}",
            result.attempts,
            result
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".into())
        )
    }
}

async fn status(config: &Config, article: Option<Uuid>, product: Option<Uuid>) -> Result<()> {
    let pool = connect(config).await?;

    match (article, product) {
        (Some(id), None) => {
            let Some(article) = Article::find_by_id(ArticleId::from_uuid(id), &pool).await? else {
                bail!("article {id} not found");
            };
            println!(
                "article {} \"{}\": {} views, notified: {}",
                article.id,
                article.title,
                article.view_count,
                describe_marker(article.notified_at)
            );
        }
        (None, Some(id)) => {
            let Some(product) = Product::find_by_id(ProductId::from_uuid(id), &pool).await? else {
                bail!("product {id} not found");
            };
            println!(
                "product {} \"{}\": {} views, notified: {}",
                product.id,
                product.name,
                product.view_count,
                describe_marker(product.notified_at)
            );
        }
        _ => bail!("pass exactly one of --article or --product"),
    }
    Ok(())
}

async fn reset(config: &Config, article: Option<Uuid>, product: Option<Uuid>) -> Result<()> {
    let pool = connect(config).await?;

    let reset = match (article, product) {
        (Some(id), None) => Article::reset_notification(ArticleId::from_uuid(id), &pool).await?,
        (None, Some(id)) => Product::reset_notification(ProductId::from_uuid(id), &pool).await?,
        _ => bail!("pass exactly one of --article or --product"),
    };

    if reset {
        println!("notification marker cleared");
        Ok(())
    } else {
        bail!("no such entity")
    }
}

async fn connect(config: &Config) -> Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

fn describe_marker(notified_at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    notified_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}
