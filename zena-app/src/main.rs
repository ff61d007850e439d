use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use zena_app::{bootstrap, logging, Config};
use zena_notify::{Notification, RealtimeMessage};

const DEFAULT_USER: &str = "local";

const USAGE: &str = "Usage:
  zena tools                                  List registered capabilities
  zena resolve <phrase>                       Show how a name resolves
  zena run <phrase> [json-params] [--user id] Run a capability as a job
  zena jobs [--user id]                       List known jobs";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = Config::load()?;
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration in {}: {}", Config::path().display(), e);
        return Err(e);
    }
    logging::init(&config.log_level);

    let services = bootstrap::build(config).await?;

    match args.first().map(String::as_str) {
        Some("tools") => list_tools(&services),
        Some("resolve") => {
            let phrase = positional(&args, 1).context("resolve needs a phrase")?;
            resolve(&services, &phrase)
        }
        Some("run") => {
            let phrase = positional(&args, 1).context("run needs a phrase")?;
            let params = match positional(&args, 2) {
                Some(raw) => serde_json::from_str(&raw).context("params must be JSON")?,
                None => Value::Object(Default::default()),
            };
            let user = flag(&args, "--user").unwrap_or_else(|| DEFAULT_USER.to_string());
            run(&services, &phrase, params, &user).await
        }
        Some("jobs") => list_jobs(&services, flag(&args, "--user")).await,
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn list_tools(services: &bootstrap::Services) -> Result<()> {
    for tool in services.registry.get_all_tools() {
        let approval = if tool.requires_approval() { " [approval]" } else { "" };
        println!("{:<24} {:<16} {}{}", tool.name(), tool.label(), tool.description(), approval);
    }
    Ok(())
}

fn resolve(services: &bootstrap::Services, phrase: &str) -> Result<()> {
    let entry = services.orchestrator.resolver().resolve_detailed(phrase);
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

async fn run(services: &bootstrap::Services, phrase: &str, params: Value, user: &str) -> Result<()> {
    let mut rx = services.hub.connect(user);
    let ctx = services.operator_context(user);
    let wait = Duration::from_millis(services.config.tool_timeout_ms) + Duration::from_secs(1);

    let job = services.orchestrator.submit(ctx, phrase, params).await?;
    println!("Job {} running {}", job.id, job.tool_name);

    loop {
        let message: RealtimeMessage = tokio::time::timeout(wait, rx.recv())
            .await
            .context("Timed out waiting for the job to finish")?
            .context("Notification channel closed")?;
        let notification: Notification = serde_json::from_value(message.payload)?;
        if notification.job_id != job.id {
            continue;
        }
        println!("{}", notification.message);
        println!("{}", serde_json::to_string_pretty(&notification)?);
        return Ok(());
    }
}

async fn list_jobs(services: &bootstrap::Services, user: Option<String>) -> Result<()> {
    let jobs = match user {
        Some(user) => services.jobs.jobs_for_user(&user).await,
        None => services.jobs.list_jobs().await,
    };
    for job in jobs {
        println!(
            "{}  {:<10} {:<24} {}",
            job.id,
            job.status.as_str(),
            job.tool_name,
            job.error.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Positional argument `index`, skipping `--flag value` pairs.
fn positional(args: &[String], index: usize) -> Option<String> {
    let mut positionals = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            positionals.push(arg.clone());
        }
    }
    positionals.into_iter().nth(index)
}

fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
