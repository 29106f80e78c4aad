//! services/client/src/cli.rs
//!
//! Command definitions and handlers for the `newscheck` binary. Every
//! protected command passes the route guard before touching the network.

use clap::{Parser, Subcommand};
use futures::{future, StreamExt};
use newscheck_core::derive::clamp_window;
use newscheck_core::domain::{
    FilterState, LoginRequest, PageWindow, Record, RegisterRequest, SessionState, SortOrder,
    StatusFilter, ViewSnapshot,
};
use newscheck_core::guard::{GuardDecision, Route};
use newscheck_core::ports::Navigator;
use newscheck_core::{submit_check, HistoryView};
use std::sync::Mutex;
use tracing::info;

use crate::error::ClientError;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "newscheck")]
#[command(about = "Check news text for signs of fake news and browse your history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session credential
    Login {
        email: String,
        #[arg(long)]
        password: String,
        /// Log in again even if a valid session exists
        #[arg(long)]
        force: bool,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored credential
    Logout,
    /// Show whether the stored credential is still usable
    Status,
    /// Submit text for classification
    Check {
        text: String,
        /// Platform the text was found on (e.g. twitter, reddit)
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// List past classifications
    History {
        /// Case-insensitive text or URL filter
        #[arg(long)]
        search: Option<String>,
        /// Label to keep (e.g. fake, real) or "all"
        #[arg(long)]
        status: Option<String>,
        /// newest or oldest
        #[arg(long)]
        sort: Option<SortOrder>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show one classification in full
    Show { id: String },
    /// Delete a classification from the history
    Delete { id: String },
}

/// Remembers where the guard asked to go instead.
#[derive(Default)]
pub struct CliNavigator {
    redirect: Mutex<Option<Route>>,
}

impl CliNavigator {
    pub fn redirect(&self) -> Option<Route> {
        self.redirect.lock().ok().and_then(|r| r.clone())
    }
}

impl Navigator for CliNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut redirect) = self.redirect.lock() {
            *redirect = Some(route);
        }
    }
}

/// Passes the route guard or fails with `NotAuthenticated`.
pub fn enter(state: &AppState, route: &Route) -> Result<(), ClientError> {
    let navigator = CliNavigator::default();
    match state.guard.can_activate(route, &navigator) {
        GuardDecision::Allow => Ok(()),
        GuardDecision::Deny => {
            if let Some(to) = navigator.redirect() {
                info!("Redirected from {} to {}", route, to);
            }
            Err(ClientError::NotAuthenticated)
        }
    }
}

pub async fn run(cli: Cli, state: &AppState) -> Result<(), ClientError> {
    match cli.command {
        Commands::Login {
            email,
            password,
            force,
        } => {
            enter(state, &Route::Login)?;
            if !force && state.guard.entry_route() == Route::Check {
                println!("Already logged in. Use --force to log in again.");
                return Ok(());
            }
            state.auth.login(&LoginRequest { email, password }).await?;
            println!("Logged in.");
        }
        Commands::Register { email, password } => {
            enter(state, &Route::Register)?;
            state
                .auth
                .register(&RegisterRequest {
                    email: email.clone(),
                    password,
                })
                .await?;
            println!("Account {} created. Log in to continue.", email);
        }
        Commands::Logout => {
            state.auth.logout()?;
            println!("Logged out.");
        }
        Commands::Status => {
            let message = match state.session.state() {
                SessionState::Valid => "Logged in.",
                SessionState::Expired => "Session expired; the stored credential was removed.",
                SessionState::Absent => "Not logged in.",
            };
            println!("{}", message);
        }
        Commands::Check {
            text,
            platform,
            url,
        } => {
            enter(state, &Route::Check)?;
            let record = submit_check(state.source.as_ref(), &text, platform, url).await?;
            print!("{}", render_detail(&record));
        }
        Commands::History {
            search,
            status,
            sort,
            page,
            page_size,
        } => {
            enter(state, &Route::History)?;
            let filters = FilterState {
                search: search.unwrap_or_default(),
                status: status.as_deref().map(StatusFilter::parse).unwrap_or_default(),
                sort: sort.unwrap_or_default(),
            };
            let size = page_size.unwrap_or(state.config.page_size);
            let snapshot = load_history(state, filters, page.saturating_sub(1), size).await?;
            print!("{}", render_page(&snapshot));
        }
        Commands::Show { id } => {
            let route = Route::HistoryDetail(id.clone());
            enter(state, &route)?;
            let record = state.source.get_by_id(&id).await?;
            print!("{}", render_detail(&record));
        }
        Commands::Delete { id } => {
            enter(state, &Route::History)?;
            let remaining = delete_record(state, &id).await?;
            println!("Deleted {}. {} records remain.", id, remaining);
        }
    }
    Ok(())
}

/// Opens the history view, applies the filters and page, and returns the
/// first settled snapshot.
pub async fn load_history(
    state: &AppState,
    filters: FilterState,
    page_index: usize,
    page_size: usize,
) -> Result<ViewSnapshot, ClientError> {
    let view = HistoryView::open(state.source.clone(), page_size);
    view.set_search(filters.search.clone());
    view.set_status(filters.status.clone());
    view.set_sort(filters.sort);

    let settled = first_settled(&view, |s| s.filters == filters).await?;
    let snapshot = if page_index > 0 {
        view.set_page(page_index);
        let expected = clamp_window(settled.total(), PageWindow::new(page_index, page_size)).index;
        first_settled(&view, |s| s.filters == filters && s.page.index == expected).await?
    } else {
        settled
    };
    view.close().await;

    match &snapshot.error {
        Some(e) => Err(ClientError::Internal(format!("Failed to load history: {}", e))),
        None => Ok(snapshot),
    }
}

/// Deletes through the history view and waits for the refreshed list.
pub async fn delete_record(state: &AppState, id: &str) -> Result<usize, ClientError> {
    let view = HistoryView::open(state.source.clone(), state.config.page_size);
    let before = first_settled(&view, |_| true).await?;
    if let Some(e) = &before.error {
        return Err(ClientError::Internal(format!("Failed to load history: {}", e)));
    }
    view.delete(id).await?;
    let after = first_settled(&view, |s| s.generation > before.generation).await?;
    view.close().await;
    match after.error {
        Some(e) => Err(ClientError::Internal(format!("Deleted, but reloading failed: {}", e))),
        None => Ok(after.total()),
    }
}

async fn first_settled<F>(view: &HistoryView, mut accept: F) -> Result<ViewSnapshot, ClientError>
where
    F: FnMut(&ViewSnapshot) -> bool,
{
    let updates = view.updates();
    futures::pin_mut!(updates);
    updates
        .filter(|s| future::ready(!s.loading && (s.error.is_some() || accept(s))))
        .next()
        .await
        .ok_or_else(|| ClientError::Internal("history view closed unexpectedly".to_string()))
}

//=========================================================================================
// Rendering
//=========================================================================================

fn short(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn render_date(record: &Record) -> String {
    record
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_page(snapshot: &ViewSnapshot) -> String {
    if snapshot.records.is_empty() {
        return "No records match.\n".to_string();
    }
    let mut out = String::new();
    for record in &snapshot.visible {
        out.push_str(&format!(
            "{:<26} {:<16} {:<6} {:>5.1}%  {}\n",
            record.id.as_deref().unwrap_or("-"),
            render_date(record),
            record.output.label.to_uppercase(),
            record.output.confidence_percent(),
            short(&record.request.input_text, 60),
        ));
    }
    out.push_str(&format!(
        "Page {} of {} ({} records)\n",
        snapshot.page.index + 1,
        snapshot.page_count(),
        snapshot.total()
    ));
    out
}

pub fn render_detail(record: &Record) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({:.1}% confidence)\n",
        record.output.label.to_uppercase(),
        record.output.confidence_percent()
    ));
    if let Some(id) = &record.id {
        out.push_str(&format!("id:       {}\n", id));
    }
    out.push_str(&format!("date:     {}\n", render_date(record)));
    if let Some(platform) = &record.request.source_platform {
        out.push_str(&format!("platform: {}\n", platform));
    }
    if let Some(url) = &record.request.url {
        out.push_str(&format!("url:      {}\n", url));
    }
    if let Some(model) = &record.model {
        out.push_str(&format!("model:    {} {}\n", model.name, model.version));
    }
    out.push_str(&format!("text:     {}\n", short(&record.request.input_text, 200)));

    let explanation = &record.explanation;
    if !explanation.summary.is_empty() {
        out.push_str(&format!("\n{} [{}]\n", explanation.summary, explanation.method));
    }
    for highlight in &explanation.highlights {
        out.push_str(&format!("  {:>5.2}  {}\n", highlight.score, highlight.span));
    }
    if !record.social_context.is_empty() {
        out.push_str("\nRelated posts:\n");
        for post in &record.social_context {
            out.push_str(&format!(
                "  [{}] {}{}\n",
                post.source.as_deref().unwrap_or("web"),
                short(&post.text, 80),
                post.url.as_deref().map(|u| format!(" <{}>", u)).unwrap_or_default()
            ));
        }
    }
    out
}
