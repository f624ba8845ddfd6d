use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use insight_core::Statement;
use insight_extract::{spawn_intake_watcher, GeminiClient, Session, StatementPipeline};
use insight_report::{aggregate, compare, compare_with_comments, summarize, ComparisonReport};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::render;

#[derive(Serialize)]
struct StatementReport<'a> {
    statement: &'a Statement,
    stats: insight_report::StatementStats,
    categories: insight_report::CategorySummary,
}

fn client(cfg: &Config) -> Result<GeminiClient> {
    GeminiClient::from_config(&cfg.provider).context("configure extraction provider")
}

fn pipeline(cfg: &Config) -> Result<StatementPipeline<GeminiClient>> {
    Ok(StatementPipeline::new(client(cfg)?, cfg.classifier()?))
}

pub async fn cmd_analyze(cfg: &Config, files: &[PathBuf], json: bool) -> Result<()> {
    let statements = pipeline(cfg)?.process_batch(files).await?;
    let mut session = Session::new();
    session.commit_batch(statements);

    if json {
        let reports: Vec<StatementReport> = session
            .statements()
            .iter()
            .map(|s| StatementReport {
                statement: s,
                stats: aggregate(&s.transactions),
                categories: summarize(&s.transactions),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for s in session.statements() {
        println!(
            "{}",
            render::statement(s, &aggregate(&s.transactions), &summarize(&s.transactions))
        );
    }
    Ok(())
}

pub async fn cmd_compare(cfg: &Config, files: &[PathBuf], json: bool, no_comments: bool) -> Result<()> {
    if files.len() < 2 {
        bail!("compare needs at least two statements");
    }
    let client = client(cfg)?;
    let statements = StatementPipeline::new(client.clone(), cfg.classifier()?)
        .process_batch(files)
        .await?;

    let report = if no_comments {
        ComparisonReport {
            matrix: compare(&statements),
            comments: Default::default(),
        }
    } else {
        compare_with_comments(&statements, &client).await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::comparison(&report));
    }
    Ok(())
}

pub fn cmd_rules(cfg: &Config) -> Result<()> {
    let classifier = cfg.classifier()?;
    for rule in classifier.rules() {
        println!("{:<12} {}", rule.tag, rule.keywords.join(", "));
    }
    let r = classifier.recurring_charge();
    println!("{:<12} {} withdrawal of exactly {} (first only)", r.tag, r.token, r.amount);
    Ok(())
}

pub fn cmd_init_config(path: &Path) -> Result<()> {
    if config::init_config(path)? {
        println!("Wrote {}", path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

/// Processes PDFs dropped into the intake folder until interrupted. Each new
/// statement is summarized; once two or more are loaded the comparison is
/// refreshed.
pub async fn cmd_watch(cfg: &Config, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(d) => d,
        None => cfg.intake_dir()?,
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let client = client(cfg)?;
    let pipeline = StatementPipeline::new(client.clone(), cfg.classifier()?);

    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    // Dropping the watcher stops the notifications.
    let _watcher = spawn_intake_watcher(&dir, tx).context("start intake folder watcher")?;
    info!("Watching intake folder: {}", dir.display());

    let mut session = Session::new();
    loop {
        let path = tokio::select! {
            received = rx.recv() => match received {
                Some(path) => path,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ticket = session.begin(name);
        match pipeline.process_file(&path).await {
            Ok(statement) => {
                if !session.complete(ticket, statement) {
                    continue;
                }
                if let Some(s) = session.statements().last() {
                    println!(
                        "{}",
                        render::statement(s, &aggregate(&s.transactions), &summarize(&s.transactions))
                    );
                }
            }
            Err(e) => {
                session.discard(ticket);
                warn!(file = %e.file_name(), "{e}");
                continue;
            }
        }

        if session.len() >= 2 {
            let report = compare_with_comments(session.statements(), &client).await;
            print!("{}", render::comparison(&report));
        }
    }

    info!(statements = session.len(), "Intake watcher stopped");
    Ok(())
}
