use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use job_notifications::{
    utils,
    watcher::RunOptions,
    JobFilter, JobSubscription, JobWatcher, JobsApiClient,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Watch funding jobs and print their status", long_about = None)]
struct Args {
    /// Base URL of the jobs API
    #[arg(short, long, env = "JOBS_API_URL")]
    api_url: String,

    /// Bearer key for the jobs API
    #[arg(long, env = "JOBS_API_KEY")]
    api_key: Option<String>,

    /// Watch the latest job for this specification
    #[arg(short, long)]
    specification_id: Option<String>,

    /// Restrict the specification watch to these job types
    #[arg(short = 't', long = "job-type")]
    job_types: Vec<String>,

    /// Watch these job ids
    #[arg(short, long = "job-id")]
    job_ids: Vec<String>,

    /// Seconds between polls
    #[arg(short, long, default_value_t = 5)]
    interval_secs: u64,

    /// Stop after this many polls (0 = no limit)
    #[arg(short, long, default_value_t = 0)]
    max_polls: usize,

    /// Stop once every watched job has completed
    #[arg(short, long)]
    until_complete: bool,

    /// Number of concurrent requests
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Write the final notifications to this JSON file
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) .env, then logging
    dotenv().ok();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2) Parse arguments and turn them into subscriptions
    let args = Args::parse();

    let mut subscriptions = Vec::new();
    if let Some(specification_id) = &args.specification_id {
        subscriptions.push(JobSubscription::new(JobFilter::for_specification(
            specification_id.clone(),
            args.job_types.clone(),
        )));
    }
    for job_id in &args.job_ids {
        subscriptions.push(JobSubscription::new(JobFilter::for_job(job_id.clone())));
    }
    if subscriptions.is_empty() {
        eprintln!("Nothing to watch: pass --specification-id or --job-id");
        return Ok(());
    }

    // 3) Point the watcher at the jobs API
    let client = JobsApiClient::new(&args.api_url, args.api_key.clone())?;
    let mut watcher = JobWatcher::new(client).with_concurrency(args.concurrency);
    watcher.replace_subscriptions(subscriptions);

    let options = RunOptions {
        interval: Duration::from_secs(args.interval_secs.max(1)),
        max_polls: (args.max_polls > 0).then_some(args.max_polls),
        until_complete: args.until_complete,
    };

    // 4) Poll, printing banners and current errors whenever either changes
    watcher
        .run(&options, |store, errors| {
            for notification in store.notifications() {
                println!("{}", utils::banner_line(notification));
            }
            for error in errors.messages() {
                eprintln!("{}", error.message);
            }
        })
        .await;

    // 5) Optional snapshot of the final state
    if let Some(output) = &args.output {
        utils::save_json(watcher.store().notifications(), output)?;
        utils::save_text(
            &utils::report(watcher.store().notifications(), watcher.errors()),
            format!("{}.txt", output.trim_end_matches(".json")),
        )?;
    }

    Ok(())
}
