//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `goalboard_core` linkage.
//! - Walk one create and swipe-complete cycle against an in-memory store.
//!
//! Set `GOALBOARD_LOG_DIR` to an absolute path to capture core logs.

use goalboard_core::db::open_db_in_memory;
use goalboard_core::{
    default_log_level, init_logging, BoardConfig, GoalSession, NewGoal, Point, SqliteGoalRemote,
};
use log::{error, info};
use std::process::ExitCode;

const DEMO_SPACE_ID: &str = "demo-space";

fn main() -> ExitCode {
    println!("goalboard_core ping={}", goalboard_core::ping());
    println!("goalboard_core version={}", goalboard_core::core_version());

    if let Ok(log_dir) = std::env::var("GOALBOARD_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_demo()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_demo module=cli status=error");
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let session = GoalSession::new(
        DEMO_SPACE_ID,
        SqliteGoalRemote::new(&conn),
        BoardConfig::default(),
    );
    session.refresh().await?;

    let drafts = [
        NewGoal::new("Draft agenda", "aki", "2024-02-01"),
        NewGoal::new("Book room", "mika", "2024-01-20"),
    ];
    let mut created = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        created.push(session.request_create(draft).await?);
    }

    let target = &created[0].id;
    session.handle_contact_start(target, Point::new(0.0, 0.0));
    session.handle_contact_move(target, Point::new(70.0, 2.0));
    let toggled = session.handle_contact_end(target).await?;
    info!(
        "event=cli_demo module=cli status=ok toggled={}",
        toggled.is_some()
    );

    let stats = session.refresh().await?;
    for goal in session.goals() {
        println!("goal {} [{}] {}", goal.id, goal.status.as_str(), goal.title);
    }
    println!(
        "stats total={} done={} completion_rate={}%",
        stats.total_count, stats.done_count, stats.completion_rate
    );
    Ok(())
}
