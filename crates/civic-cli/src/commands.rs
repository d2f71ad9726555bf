//! CLI command implementations

use anyhow::{Result, anyhow, bail};
use civic_core::{
    Badge, Config, Eligibility, HttpGateway, IssueCoordinator, IssueDraft, IssuePatch, IssueRecord,
    ListParams, Outcome, Pagination, User, eligibility, priority_badge, status_badge,
};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Everything a command needs: config plus a coordinator wired to the service
pub struct Context {
    config: Config,
    config_path: PathBuf,
    json: bool,
    coordinator: IssueCoordinator<HttpGateway>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let config = Config::load(&config_path)?.with_env();
        tracing::debug!(path = %config_path.display(), api_url = %config.api_url, "config loaded");
        if !config.display.colors {
            colored::control::set_override(false);
        }

        let gateway = HttpGateway::from_config(&config)?;
        let coordinator = IssueCoordinator::new(Arc::new(gateway))
            .with_stale_discard(config.discard_stale_responses);

        Ok(Self {
            config,
            config_path,
            json,
            coordinator,
        })
    }

    fn user(&self) -> Option<User> {
        self.config.user_id.clone().map(User::new)
    }

    /// Turn a failed outcome into an error carrying the store's message
    fn settle(&self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Applied => Ok(()),
            Outcome::Failed => {
                let message = self
                    .coordinator
                    .read(|store| store.error().map(str::to_owned))
                    .unwrap_or_else(|| "Request failed".to_string());
                Err(anyhow!(message))
            }
            Outcome::Discarded => bail!("Response superseded by a newer request"),
        }
    }

    fn with_limit(&self, mut params: ListParams) -> ListParams {
        params.limit = params.limit.or(Some(self.config.page_limit));
        params
    }

    fn current(&self, id: &str) -> Result<IssueRecord> {
        self.coordinator
            .read(|store| store.current_issue().filter(|i| i.id == id).cloned())
            .ok_or_else(|| anyhow!("Issue not found: {}", id))
    }

    fn truncate(&self, title: &str) -> String {
        let max = self.config.display.max_title_length;
        if title.chars().count() <= max {
            title.to_string()
        } else {
            let cut: String = title.chars().take(max.saturating_sub(1)).collect();
            format!("{cut}…")
        }
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Verified")]
    verified: u32,
    #[tabled(rename = "Title")]
    title: String,
}

fn paint(text: String, badge: Badge) -> ColoredString {
    match hex_rgb(badge.color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn print_issues(ctx: &Context, issues: &[IssueRecord], pagination: &Pagination) -> Result<()> {
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({
                "issues": issues,
                "pagination": pagination,
            }))?
        );
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues found");
        return Ok(());
    }

    let rows = issues.iter().map(|issue| IssueRow {
        id: issue.id.clone(),
        status: paint(issue.status.to_string(), status_badge(issue.status)).to_string(),
        priority: paint(issue.priority.to_string(), priority_badge(issue.priority)).to_string(),
        category: issue.category.to_string(),
        district: issue.location.district.clone(),
        verified: issue.verification_count,
        title: ctx.truncate(&issue.title),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "Page {}/{} ({} total)",
        pagination.page,
        pagination.pages.max(1),
        pagination.total
    );
    Ok(())
}

fn print_issue(ctx: &Context, issue: &IssueRecord) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(issue)?);
        return Ok(());
    }

    let date_format = ctx.config.display.date_format.as_str();
    println!("{} {}", issue.id.cyan().bold(), issue.title.bold());
    if issue.is_crisis {
        println!("{}", "CRISIS".red().bold());
    }
    println!();
    println!(
        "Status:    {}",
        paint(issue.status.to_string(), status_badge(issue.status))
    );
    println!(
        "Priority:  {}",
        paint(issue.priority.to_string(), priority_badge(issue.priority))
    );
    println!("Category:  {}", issue.category);
    println!(
        "Location:  {}, {}",
        issue.location.address, issue.location.district
    );
    match &issue.reporter {
        Some(reporter) => println!(
            "Reporter:  {}",
            reporter.full_name.as_deref().unwrap_or(&reporter.id)
        ),
        None => println!("Reporter:  {}", issue.owner_id),
    }
    println!("Created:   {}", issue.created_at.format(date_format));
    if let Some(updated) = issue.updated_at {
        println!("Updated:   {}", updated.format(date_format));
    }
    println!("Verified:  {} time(s)", issue.verification_count);
    if let Some(at) = issue.verified_at {
        println!("           last at {}", at.format(date_format));
    }

    if !issue.description.is_empty() {
        println!();
        println!("{}", "Description:".bold());
        println!("{}", issue.description);
    }

    if !issue.tagged_ministries.is_empty() {
        println!();
        println!("{}", "Tagged ministries:".bold());
        for ministry in &issue.tagged_ministries {
            println!("  {}", ministry);
        }
    }

    if let Some(response) = &issue.government_response {
        println!();
        println!("{}", "Government response:".bold());
        println!("{}", serde_json::to_string_pretty(response)?);
    }

    if let Some(claim) = &issue.ngo_claim {
        println!();
        println!("{}", "NGO claim:".bold());
        println!("{}", serde_json::to_string_pretty(claim)?);
    }

    Ok(())
}

pub async fn list(ctx: &Context, params: ListParams) -> Result<()> {
    let outcome = ctx.coordinator.fetch_issues(&ctx.with_limit(params)).await;
    ctx.settle(outcome)?;
    let store = ctx.coordinator.snapshot();
    print_issues(ctx, store.issues(), store.pagination())
}

pub async fn mine(ctx: &Context, params: ListParams) -> Result<()> {
    let outcome = ctx.coordinator.fetch_my_issues(&ctx.with_limit(params)).await;
    ctx.settle(outcome)?;
    let store = ctx.coordinator.snapshot();
    print_issues(ctx, store.my_issues(), store.pagination())
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    ctx.settle(ctx.coordinator.fetch_issue_by_id(id).await)?;
    let issue = ctx.current(id)?;
    print_issue(ctx, &issue)?;

    if !ctx.json
        && let Some(user) = ctx.user()
    {
        println!();
        match eligibility(&user, &issue) {
            Eligibility::Eligible => println!("You can verify this issue: civic verify {}", id),
            Eligibility::AlreadyVerified => println!("{} You verified this issue", "✓".green()),
            Eligibility::Owner => println!("You reported this issue"),
        }
    }
    Ok(())
}

pub async fn create(ctx: &Context, draft: IssueDraft) -> Result<()> {
    ctx.settle(ctx.coordinator.create_issue(&draft).await)?;
    let issue = ctx
        .coordinator
        .read(|store| store.issues().first().cloned())
        .ok_or_else(|| anyhow!("Service returned no issue"))?;

    if ctx.json {
        println!("{}", serde_json::to_string(&issue)?);
    } else {
        println!("{} Reported issue: {}", "✓".green(), issue.id);
        println!("  Title: {}", issue.title);
        println!("  Status: {}", issue.status);
    }
    Ok(())
}

pub async fn update(ctx: &Context, id: &str, patch: IssuePatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update; pass --title or --description");
    }
    ctx.settle(ctx.coordinator.fetch_issue_by_id(id).await)?;
    ctx.settle(ctx.coordinator.update_issue(id, &patch).await)?;
    let issue = ctx.current(id)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&issue)?);
    } else {
        println!("{} Updated {}", "✓".green(), id);
    }
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    ctx.settle(ctx.coordinator.delete_issue(id).await)?;

    if ctx.json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("{} Deleted {}", "✓".green(), id);
    }
    Ok(())
}

pub async fn verify(ctx: &Context, id: &str, force: bool) -> Result<()> {
    ctx.settle(ctx.coordinator.fetch_issue_by_id(id).await)?;

    if !force {
        let user = ctx.user().ok_or_else(|| {
            anyhow!(
                "Set user_id in the config (or CIVIC_USER_ID) to verify issues, or pass --force"
            )
        })?;
        match eligibility(&user, &ctx.current(id)?) {
            Eligibility::Owner => {
                bail!("You reported {}; owners cannot verify their own issue", id)
            }
            Eligibility::AlreadyVerified => bail!("You already verified {}", id),
            Eligibility::Eligible => {}
        }
    }

    ctx.settle(ctx.coordinator.verify_issue(id).await)?;
    let issue = ctx.current(id)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&issue)?);
    } else {
        println!(
            "{} Verified {} ({} verification(s), status {})",
            "✓".green(),
            id,
            issue.verification_count,
            issue.status
        );
    }
    Ok(())
}

pub async fn close(ctx: &Context, id: &str) -> Result<()> {
    ctx.settle(ctx.coordinator.fetch_issue_by_id(id).await)?;
    ctx.settle(ctx.coordinator.close_issue(id).await)?;
    let issue = ctx.current(id)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&issue)?);
    } else {
        println!("{} Closed {} as {}", "✓".green(), id, issue.status);
    }
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<()> {
    let categories = ctx.coordinator.gateway().categories().await?;

    if ctx.json {
        println!("{}", serde_json::to_string(&categories)?);
    } else {
        for category in categories {
            println!("{:<12} {}", category.id.cyan(), category.name_en);
        }
    }
    Ok(())
}

pub async fn districts(ctx: &Context) -> Result<()> {
    let districts = ctx.coordinator.gateway().districts().await?;

    if ctx.json {
        println!("{}", serde_json::to_string(&districts)?);
    } else {
        for district in districts {
            println!("{}", district);
        }
    }
    Ok(())
}

pub fn config_show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    if ctx.json {
        let mut redacted = config.clone();
        redacted.token = redacted.token.map(|_| "(set)".to_string());
        println!("{}", serde_json::to_string_pretty(&redacted)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("api_url = \"{}\"", config.api_url);
        println!(
            "token = {}",
            if config.token.is_some() { "(set)" } else { "(not set)" }
        );
        match &config.user_id {
            Some(id) => println!("user_id = \"{}\"", id),
            None => println!("user_id = (not set)"),
        }
        println!("page_limit = {}", config.page_limit);
        println!("request_timeout_secs = {}", config.request_timeout_secs);
        println!("discard_stale_responses = {}", config.discard_stale_responses);
        println!();
        println!("[display]");
        println!("colors = {}", config.display.colors);
        println!("date_format = \"{}\"", config.display.date_format);
        println!("max_title_length = {}", config.display.max_title_length);
    }
    Ok(())
}

pub fn config_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config_path.display());
    Ok(())
}

pub fn config_init(ctx: &Context, force: bool) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        bail!("Config already exists at {} (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default_with_comments())?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_rgb() {
        assert_eq!(hex_rgb("#F59E0B"), Some((0xF5, 0x9E, 0x0B)));
        assert_eq!(hex_rgb("#6B7280"), Some((0x6B, 0x72, 0x80)));
        assert_eq!(hex_rgb("gray"), None);
        assert_eq!(hex_rgb("#FFF"), None);
    }
}
