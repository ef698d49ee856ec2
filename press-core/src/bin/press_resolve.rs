//! Press Resolve CLI - Show how a URL is routed
//!
//! Loads a site fixture (settings, registrations, and content in one JSON
//! file), resolves a permalink against it, and prints the state, the
//! candidate views, and the view that would render.
//!
//! Usage:
//!     press-resolve --site site.json /2024/03/hello-world/
//!     press-resolve --site site.json --theme ./theme /category/news/
//!     press-resolve --site site.json --view index --view single -p lang=fr /hello/
//!     press-resolve --site site.json --json /about/team/

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use press_core::{
    Dispatcher, DirectoryViews, InMemoryRepository, RegistryBuilder, RenderOutcome, Session,
    SiteFixture, StaticViews, ViewOracle,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "press-resolve")]
#[command(about = "Resolve a URL to its content state and view")]
#[command(version)]
struct Args {
    /// Request path, optionally with a query string
    path: String,

    /// Site fixture JSON file
    #[arg(short, long)]
    site: PathBuf,

    /// Theme directory to scan for views
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// File extension of views in the theme directory
    #[arg(long, default_value = "html")]
    extension: String,

    /// Available view name (repeatable); ignored with --theme
    #[arg(long = "view")]
    views: Vec<String>,

    /// Extra query parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,

    /// Logged-in user id
    #[arg(long)]
    user: Option<u64>,

    /// Role of the logged-in user (repeatable)
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "press_core=debug" } else { "press_core=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let site = SiteFixture::from_file(&args.site)?;
    let registry = RegistryBuilder::new().manifest(site.registry.clone()).build()?;
    let repo = InMemoryRepository::from_fixture(&site)?;

    let views: Arc<dyn ViewOracle> = match &args.theme {
        Some(dir) => Arc::new(DirectoryViews::scan(dir, &args.extension)?),
        None if args.views.is_empty() => {
            Arc::new([site.config.default_view.clone()].into_iter().collect::<StaticViews>())
        }
        None => Arc::new(args.views.iter().cloned().collect::<StaticViews>()),
    };

    tracing::info!(
        "press-resolve v{}: {} entities, default view '{}'",
        press_core::VERSION,
        repo.entity_count(),
        site.config.default_view
    );

    let dispatcher = Dispatcher::new(Arc::new(site.config), Arc::new(registry), Arc::new(repo), views);

    let pairs = parse_params(&args.params)?;
    let request = dispatcher.parse(&args.path, pairs.as_slice())?;

    let mut session = args.user.map(Session::user).unwrap_or_default();
    for role in args.roles {
        session = session.with_role(role);
    }

    let outcome = dispatcher.respond(&request, &session);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.status() < 400 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn parse_params(params: &[String]) -> Result<Vec<(String, String)>, String> {
    params
        .iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("parameter '{}' must look like key=value", p))
        })
        .collect()
}

fn print_outcome(outcome: &RenderOutcome) {
    match outcome {
        RenderOutcome::Render(r) => {
            println!("State:      {}", r.state);
            if let Some(entity) = &r.entity {
                println!("Entity:     {} ({} '{}')", entity.id, entity.post_type, entity.slug);
            }
            if let Some(revision) = r.revision_id {
                println!("Revision:   {}", revision);
            }
            if !r.breadcrumbs.is_empty() {
                let trail: Vec<&str> = r.breadcrumbs.iter().map(|b| b.slug.as_str()).collect();
                println!("Ancestors:  {}", trail.join(" > "));
            }
            println!("Candidates:");
            for candidate in &r.candidates {
                let marker = if *candidate == r.view { "→" } else { " " };
                println!("  {} {}", marker, candidate);
            }
            if r.used_default {
                println!("View:       {} (default)", r.view);
            } else {
                println!("View:       {}", r.view);
            }
        }
        RenderOutcome::Redirect(r) => {
            println!("Redirect {} → {} (locale {})", r.status, r.location, r.locale);
        }
        RenderOutcome::Message(m) => {
            println!("{} {}: {}", m.status, m.code, m.message);
            if let Some(redirect) = &m.redirect {
                println!("Redirect to {}", redirect);
            }
        }
    }
}
