use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use portal_client::analytics::{self, Dashboard, PanelState, TextSurface};
use portal_client::core::session::FileStore;
use portal_client::jobs::{self, ForMeFeed, JobActions, JobFilters, JobsBrowser};
use portal_client::types::response::JobSummary;
use portal_client::notifications::{self, NotificationCenter, OpenOutcome};
use portal_client::profile::load_profile;
use portal_client::render::{render_resume, render_wizard_step, ProfileView};
use portal_client::{auth, ApiClient, ConfigManager, LoggingNavigator, SessionStore};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Command-line client for the job portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file with `local` and `production` sections
    #[arg(long, default_value = "portal.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Google sign-in URL for a role
    LoginUrl {
        #[arg(long, default_value = "student")]
        role: String,
    },
    /// Finish sign-in with the code from the OAuth redirect
    Callback {
        #[arg(long)]
        code: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Student profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Browse job listings
    Jobs {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "type")]
        job_type: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Show one job, optionally acting on it
    Job {
        id: String,
        #[arg(long)]
        apply: bool,
        #[arg(long, conflicts_with = "unbookmark")]
        bookmark: bool,
        #[arg(long)]
        unbookmark: bool,
    },
    /// Skill-matched job suggestions
    Recommended {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Personalised matches above a similarity floor
    ForMe {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Minimum match score in percent
        #[arg(long, default_value_t = jobs::DEFAULT_MIN_SCORE)]
        min_score: u8,
    },
    /// Best matching jobs for the signed-in student
    TopMatches {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Jobs applied to, optionally narrowed by status
    Applications {
        #[arg(long)]
        status: Option<String>,
    },
    /// Bookmarked jobs
    Bookmarks,
    /// Application and bookmark totals
    JobStats,
    /// Recent notifications
    Notifications {
        #[arg(long)]
        mark_all: bool,
        /// Show totals by type and priority
        #[arg(long)]
        stats: bool,
        /// Open a notification by id
        #[arg(long)]
        open: Option<String>,
        #[arg(long)]
        delete: Option<String>,
    },
    /// Follow the unread badge until interrupted
    Watch,
    /// Ask the analytics assistant a question
    Ask {
        query: String,
        /// Write the result rows to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Predefined analytics overview and query suggestions
    Overview,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Render the profile as a resume, or the first wizard step if empty
    Show,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::load_from(&cli.config)?;
    init_logging(config.client.log_file.as_ref())?;
    config.ensure_directories().await?;

    info!("Environment: {}", config.environment);
    info!("API: {}", config.client.api_base_url);

    let store = FileStore::open(&config.client.session_path)?;
    let session = SessionStore::new(Arc::new(store));
    let navigator = Arc::new(LoggingNavigator::new());
    let api = ApiClient::new(
        &config.client.api_base_url,
        config.client.timeout_seconds,
        session.clone(),
        navigator.clone(),
    )?;

    match cli.command {
        Command::LoginUrl { role } => {
            println!("{}", auth::login_url(&api, &role).await?);
        }
        Command::Callback { code } => {
            let mut center = NotificationCenter::new(api.clone(), navigator.clone());
            let route = auth::sign_in(&api, &code, &mut center).await?;
            println!("Signed in, continue at {}", route.path());
            if let Some(badge) = center.badge() {
                println!("Unread notifications: {}", badge);
            }
        }
        Command::Logout => {
            auth::logout(&session, navigator.as_ref())?;
            println!("Signed out");
        }
        Command::Whoami => match session.get_user() {
            Some(user) => println!(
                "{} ({}), profile {}",
                user.email,
                user.role,
                if user.profile_completed { "complete" } else { "incomplete" }
            ),
            None => println!("Not signed in"),
        },
        command => {
            if !auth::require_login(&session, navigator.as_ref()) {
                println!("Not signed in; run `portal login-url` first");
                return Ok(());
            }
            run_authenticated(command, api, &config, navigator).await?;
        }
    }

    Ok(())
}

async fn run_authenticated(
    command: Command,
    api: ApiClient,
    config: &ConfigManager,
    navigator: Arc<LoggingNavigator>,
) -> Result<()> {
    match command {
        Command::Profile {
            action: ProfileCommand::Show,
        } => {
            let Some(page) = load_profile(&api).await? else {
                return session_ended();
            };
            match page.view {
                ProfileView::Resume => println!("{}", render_resume(&page.draft)),
                ProfileView::Wizard => {
                    let mut wizard = page.wizard();
                    println!("{}", render_wizard_step(&mut wizard));
                }
            }
        }
        Command::Jobs {
            page,
            job_type,
            source,
            location,
        } => {
            let filters = JobFilters::new(
                job_type.as_deref().unwrap_or_default(),
                source.as_deref().unwrap_or_default(),
                location.as_deref().unwrap_or_default(),
            );
            if let Some(total) = api.job_count().await? {
                println!("{} jobs available\n", total);
            }
            let mut browser = JobsBrowser::with_filters(api, filters);
            if !browser.goto_page(page).await? {
                return session_ended();
            }
            for card in browser.render_cards() {
                println!("{}\n", card);
            }
            println!("{}", browser.render_pagination());
        }
        Command::Job {
            id,
            apply,
            bookmark,
            unbookmark,
        } => {
            let Some(job) = api.job_details(&id).await? else {
                return session_ended();
            };
            println!("{}", jobs::render_card(&job));
            if let Some(url) = &job.apply_url {
                println!("  apply at: {}", url);
            }

            let actions = JobActions {
                apply,
                bookmark,
                unbookmark,
            };
            let Some(status) = api.act_on_job(&id, actions).await? else {
                return session_ended();
            };
            if apply {
                println!("Application submitted");
            }
            if bookmark {
                println!("Bookmarked");
            }
            if unbookmark {
                println!("Bookmark removed");
            }
            println!(
                "  applied: {}  bookmarked: {}",
                status
                    .application_status
                    .as_deref()
                    .unwrap_or(if status.has_applied { "yes" } else { "no" }),
                if status.is_bookmarked { "yes" } else { "no" }
            );
        }
        Command::Recommended { limit } => {
            let Some(list) = api.recommended_jobs(limit).await? else {
                return session_ended();
            };
            print_job_list(&list.jobs, list.message.as_deref());
        }
        Command::ForMe { page, min_score } => {
            let mut browser = JobsBrowser::new(ForMeFeed::new(api, min_score));
            if !browser.goto_page(page).await? {
                return session_ended();
            }
            let cards = browser.render_cards();
            if cards.is_empty() {
                println!("No matches at {}% or above", min_score);
            }
            for card in cards {
                println!("{}\n", card);
            }
            println!("{}", browser.render_pagination());
        }
        Command::TopMatches { limit } => {
            let Some(list) = api.top_matches(limit).await? else {
                return session_ended();
            };
            print_job_list(&list.jobs, list.message.as_deref());
        }
        Command::Applications { status } => {
            let Some(list) = api.my_applications(status.as_deref()).await? else {
                return session_ended();
            };
            if list.applications.is_empty() {
                println!("No applications yet");
            }
            for application in &list.applications {
                println!("{}\n", jobs::render_application(application));
            }
            println!("{} applications", list.total);
        }
        Command::Bookmarks => {
            let Some(list) = api.bookmarked_jobs().await? else {
                return session_ended();
            };
            print_job_list(&list.jobs, None);
        }
        Command::JobStats => {
            let Some(stats) = api.student_job_stats().await? else {
                return session_ended();
            };
            for line in jobs::render_job_stats(&stats) {
                println!("{}", line);
            }
        }
        Command::Notifications {
            mark_all,
            stats,
            open,
            delete,
        } => {
            if stats {
                let Some(stats) = api.notification_stats().await? else {
                    return session_ended();
                };
                for line in notifications::render_stats(&stats) {
                    println!("{}", line);
                }
                println!();
            }
            let mut center = NotificationCenter::new(api, navigator.clone());
            if !center.refresh_count().await? || !center.load_recent().await? {
                return session_ended();
            }

            if let Some(id) = open {
                let target = center.recent().iter().find(|n| n.id == id).cloned();
                match target {
                    Some(notification) => match center.open(&notification).await? {
                        OpenOutcome::Redirected => return session_ended(),
                        outcome => println!("{:?}", outcome),
                    },
                    None => println!("No recent notification with id {}", id),
                }
            }
            if let Some(id) = delete {
                if !center.delete(&id).await? {
                    return session_ended();
                }
            }
            if mark_all && !center.mark_all_read().await? {
                return session_ended();
            }

            println!("Unread: {}", center.badge().unwrap_or_default());
            for line in center.render_dropdown(chrono::Utc::now()) {
                println!("{}", line);
            }
        }
        Command::Watch => {
            let period = Duration::from_secs(config.client.poll_interval_seconds.max(1));
            let (handle, mut badge) = notifications::spawn_unread_poller(Arc::new(api), period);
            loop {
                tokio::select! {
                    changed = badge.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let count = *badge.borrow();
                        println!("Unread: {}", notifications::badge_text(count).unwrap_or_default());
                    }
                    _ = tokio::signal::ctrl_c() => {
                        handle.abort();
                        break;
                    }
                }
            }
        }
        Command::Ask { query, csv } => {
            let mut dashboard = Dashboard::new(api, TextSurface::new());
            if !dashboard.submit_query(&query).await? {
                return session_ended();
            }
            match dashboard.state() {
                PanelState::Loaded(result) => {
                    println!("{}\n", result.answer);
                    let chart = dashboard.surface().output();
                    if !chart.is_empty() {
                        println!("{}\n", chart);
                    }
                    println!("{}", result.table.render());
                }
                PanelState::Error { message, .. } => println!("Query failed: {}", message),
                PanelState::Idle => {}
            }
            if let Some(path) = csv {
                let rows = analytics::export_csv(dashboard.last_rows(), &path).await?;
                println!("Wrote {} rows to {}", rows, path.display());
            }
        }
        Command::Overview => {
            let mut dashboard = Dashboard::new(api, TextSurface::new());
            let Some(overview) = dashboard.load_overview().await? else {
                return session_ended();
            };
            for line in analytics::render_overview(&overview) {
                println!("{}", line);
            }
            if dashboard.load_suggestions().await? && !dashboard.suggestions().is_empty() {
                println!("\nTry asking:");
                for suggestion in dashboard.suggestions() {
                    println!("  - {}", suggestion);
                }
            }
        }
        Command::LoginUrl { .. } | Command::Callback { .. } | Command::Logout | Command::Whoami => {}
    }

    if let Some(route) = navigator.last() {
        info!("Last navigation: {}", route.path());
    }
    Ok(())
}

fn print_job_list(listing: &[JobSummary], message: Option<&str>) {
    if listing.is_empty() {
        println!("{}", message.unwrap_or("No jobs found"));
        return;
    }
    for job in listing {
        println!("{}\n", jobs::render_card(job));
    }
}

fn session_ended() -> Result<()> {
    println!("Session expired; sign in again with `portal login-url`");
    Ok(())
}
