//! Pressgate - session-gated publishing client core

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pressgate::{
    auth::{AuthGateway, Capability},
    config::{AuthVariant, CacheConfig, Config},
    content::ContentLifecycle,
    models::{Article, ArticleId, ArticleInput, BlobRef, Role},
    remote::{HttpRemote, MemoryRemote, RemoteStore},
    session::SessionStore,
    view::ViewCache,
};

#[derive(Parser)]
#[command(name = "pressgate")]
#[command(version)]
#[command(about = "Publishing client for a remote content service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PRESSGATE_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the remote content service
    Login {
        /// Account username
        username: String,
        /// Account password
        password: String,
    },

    /// Log out, remotely and locally
    Logout,

    /// Show the current access level and session expiry
    Whoami,

    /// Create a draft article
    Create {
        /// Article title
        title: String,
        /// Article body
        body: String,
        /// Cover image URL
        #[arg(long)]
        cover: Option<String>,
    },

    /// Replace an article's title, body and cover image
    Update {
        /// Article id
        id: String,
        /// New title
        title: String,
        /// New body
        body: String,
        /// New cover image URL
        #[arg(long)]
        cover: Option<String>,
    },

    /// Publish an article
    Publish {
        /// Article id
        id: String,
    },

    /// Revert an article to draft
    Unpublish {
        /// Article id
        id: String,
    },

    /// Show one article
    Show {
        /// Article id
        id: String,
    },

    /// List published articles
    List,

    /// List every article regardless of status (admin)
    ListAll,

    /// Run a publish walkthrough against a seeded in-memory service
    Demo,
}

/// Wired-up client stack for one invocation.
struct App {
    sessions: Arc<SessionStore>,
    gateway: Arc<AuthGateway>,
    lifecycle: ContentLifecycle,
    capability: Capability,
}

fn build_app(config: &Config) -> Result<App> {
    let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemote::new(&config.remote)?);
    let sessions = Arc::new(SessionStore::open(config.session.path.clone())?);
    let gateway = Arc::new(AuthGateway::new(
        remote,
        sessions.clone(),
        chrono::Duration::seconds(config.session.ttl_seconds as i64),
    ));
    let views = Arc::new(ViewCache::new(&config.cache));
    let lifecycle = ContentLifecycle::new(gateway.clone(), views);

    let capability = match config.auth.variant {
        AuthVariant::Token => Capability::token(sessions.clone()),
        AuthVariant::Identity => config
            .auth
            .principal
            .clone()
            .map(Capability::identity)
            .unwrap_or_else(Capability::anonymous),
    };

    Ok(App {
        sessions,
        gateway,
        lifecycle,
        capability,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pressgate={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Commands::Demo = cli.command {
        return run_demo().await;
    }

    let config = Config::load_with_env(&cli.config)?;
    let app = build_app(&config)?;

    match cli.command {
        Commands::Login { username, password } => {
            let session = app.gateway.login(&username, &password).await?;
            println!("Logged in; session valid until {}", session.expires_at);
        }
        Commands::Logout => {
            app.gateway.logout().await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let role = app.gateway.access_level(&app.capability).await?;
            println!("Access level: {}", role);
            if let Some(session) = app.sessions.current()? {
                println!("Session valid until {}", session.expires_at);
            }
        }
        Commands::Create { title, body, cover } => {
            let article = app
                .lifecycle
                .create(&app.capability, &article_input(title, body, cover))
                .await?;
            print_article(&article);
        }
        Commands::Update {
            id,
            title,
            body,
            cover,
        } => {
            let article = app
                .lifecycle
                .update(
                    &app.capability,
                    &ArticleId::from(id),
                    &article_input(title, body, cover),
                )
                .await?;
            print_article(&article);
        }
        Commands::Publish { id } => {
            let article = app
                .lifecycle
                .publish(&app.capability, &ArticleId::from(id))
                .await?;
            print_article(&article);
        }
        Commands::Unpublish { id } => {
            let article = app
                .lifecycle
                .unpublish(&app.capability, &ArticleId::from(id))
                .await?;
            print_article(&article);
        }
        Commands::Show { id } => {
            match app
                .lifecycle
                .read(&app.capability, &ArticleId::from(id))
                .await?
            {
                Some(article) => {
                    print_article(&article);
                    println!();
                    println!("{}", article.body);
                }
                None => println!("Article not found"),
            }
        }
        Commands::List => {
            print_listing(&app.lifecycle.list_published().await?);
        }
        Commands::ListAll => {
            print_listing(&app.lifecycle.list_all(&app.capability).await?);
        }
        Commands::Demo => unreachable!("handled above"),
    }

    Ok(())
}

fn article_input(title: String, body: String, cover: Option<String>) -> ArticleInput {
    let input = ArticleInput::new(title, body);
    match cover {
        Some(url) => input.with_cover_image(BlobRef::from_url(url)),
        None => input,
    }
}

fn print_article(article: &Article) {
    println!("{}  [{}]  {}", article.id, article.status, article.title);
    println!(
        "    created {}  updated {}",
        article.created_at.to_rfc3339(),
        article.updated_at.to_rfc3339()
    );
    if let Some(cover) = &article.cover_image {
        println!("    cover {}", cover);
    }
}

fn print_listing(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles");
        return;
    }
    for article in articles {
        print_article(article);
    }
}

/// Walk through the whole lifecycle against an in-memory service seeded with
/// an `admin`/`admin123` account.
async fn run_demo() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let sessions = Arc::new(SessionStore::open(dir.path().join("session.json"))?);
    let remote: Arc<dyn RemoteStore> =
        Arc::new(MemoryRemote::new().with_user("admin", "admin123", Role::Admin)?);
    let gateway = Arc::new(AuthGateway::new(
        remote,
        sessions.clone(),
        chrono::Duration::hours(8),
    ));
    let lifecycle = ContentLifecycle::new(
        gateway.clone(),
        Arc::new(ViewCache::new(&CacheConfig::default())),
    );
    let cap = Capability::token(sessions);

    println!("Logging in as admin...");
    gateway.login("admin", "admin123").await?;

    println!("Creating a draft...");
    let article = lifecycle
        .create(&cap, &ArticleInput::new("Hello", "World"))
        .await?;
    print_article(&article);

    println!(
        "Published listing before publish: {} article(s)",
        lifecycle.list_published().await?.len()
    );

    println!("Publishing...");
    let published = lifecycle.publish(&cap, &article.id).await?;
    print_article(&published);
    println!(
        "Published listing after publish: {} article(s)",
        lifecycle.list_published().await?.len()
    );

    println!("Logging out...");
    gateway.logout().await?;

    match lifecycle.read(&Capability::anonymous(), &article.id).await? {
        Some(a) => println!("Anonymous read still sees \"{}\"", a.title),
        None => println!("Anonymous read sees nothing"),
    }

    match lifecycle.unpublish(&cap, &article.id).await {
        Ok(_) => println!("Unpublish after logout unexpectedly succeeded"),
        Err(e) => println!("Unpublish after logout rejected: {}", e),
    }

    Ok(())
}
