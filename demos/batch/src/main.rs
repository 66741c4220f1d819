//! batch: run bridge-tagging groups against a scene file.
//!
//! Loads a JSON scene into a `MemoryDataset`, runs every coordinate group
//! (from a batch file, from planned bridge sites, or both) through an
//! `EditSession`, and prints the resulting command journal.
//!
//! ```text
//! batch --scene data/scene.json --groups data/groups.json --report outcome.csv --output edited.json
//! batch --scene data/scene.json --sites data/sites.csv --chain-rule endpoints --dry-run
//! ```
//!
//! `RUST_LOG` controls verbosity (default `info`).

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use bt_core::WayId;
use bt_dataset::{CommandJournal, load_scene, save_scene};
use bt_edit::{
    BatchConfig, ChainRule, CoordinateGroup, CsvReport, EditError, EditSession, GroupPoint, GroupReport,
    LogObserver, SessionObserver, SessionReport, SplitOutcome, SplitPlanner, load_batch,
    load_sites_csv,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scene file with the nodes and ways to edit
    #[arg(long)]
    scene: PathBuf,

    /// Batch file: coordinate groups plus optional session settings
    #[arg(long)]
    groups: Option<PathBuf>,

    /// Bridge-site CSV; each site is planned into a simple group
    #[arg(long)]
    sites: Option<PathBuf>,

    /// Override the batch file's chain rule
    #[arg(long, value_parser = parse_rule)]
    chain_rule: Option<ChainRule>,

    /// Write one CSV row per outcome here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Save the edited scene here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Undo the whole session before saving
    #[arg(long, env = "BT_DRY_RUN")]
    dry_run: bool,
}

fn parse_rule(s: &str) -> Result<ChainRule, String> {
    match s {
        "literal"   => Ok(ChainRule::Literal),
        "endpoints" => Ok(ChainRule::Endpoints),
        other       => Err(format!("unknown chain rule `{other}` (literal | endpoints)")),
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs every event and, when asked, mirrors it into a CSV report.
struct BatchObserver {
    log:    LogObserver,
    report: Option<CsvReport<File>>,
}

impl SessionObserver for BatchObserver {
    fn on_group_start(&mut self, group: usize, spec: &CoordinateGroup) {
        self.log.on_group_start(group, spec);
    }

    fn on_point_split(&mut self, group: usize, point: usize, way: WayId, outcome: &SplitOutcome) {
        self.log.on_point_split(group, point, way, outcome);
        if let Some(r) = &mut self.report {
            r.on_point_split(group, point, way, outcome);
        }
    }

    fn on_point_failed(&mut self, group: usize, point: usize, spec: &GroupPoint, error: &EditError) {
        self.log.on_point_failed(group, point, spec, error);
        if let Some(r) = &mut self.report {
            r.on_point_failed(group, point, spec, error);
        }
    }

    fn on_bridge_tagged(&mut self, group: usize, way: WayId) {
        self.log.on_bridge_tagged(group, way);
        if let Some(r) = &mut self.report {
            r.on_bridge_tagged(group, way);
        }
    }

    fn on_tagging_failed(&mut self, group: usize, error: &EditError) {
        self.log.on_tagging_failed(group, error);
        if let Some(r) = &mut self.report {
            r.on_tagging_failed(group, error);
        }
    }

    fn on_group_end(&mut self, group: usize, report: &GroupReport) {
        self.log.on_group_end(group, report);
    }

    fn on_session_end(&mut self, report: &SessionReport) {
        self.log.on_session_end(report);
        if let Some(r) = &mut self.report {
            r.on_session_end(report);
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if cli.groups.is_none() && cli.sites.is_none() {
        bail!("nothing to do: pass --groups and/or --sites");
    }

    let mut dataset = load_scene(&cli.scene)
        .with_context(|| format!("loading scene {}", cli.scene.display()))?;
    log::info!(
        "scene: {} nodes, {} ways",
        dataset.node_count(),
        dataset.way_count()
    );

    let mut batch = match &cli.groups {
        Some(path) => load_batch(path).with_context(|| format!("loading {}", path.display()))?,
        None => BatchConfig::default(),
    };
    if let Some(rule) = cli.chain_rule {
        batch.session.chain_rule = rule;
    }

    if let Some(path) = &cli.sites {
        let sites = load_sites_csv(path).with_context(|| format!("loading {}", path.display()))?;
        let planner = SplitPlanner::new();
        let planned = planner.plan_sites(&dataset, &sites);
        let before = batch.groups.len();
        batch
            .groups
            .extend(planned.iter().filter_map(|p| p.as_ref().ok()).map(|p| p.to_group()));
        log::info!(
            "planned {} of {} bridge sites",
            batch.groups.len() - before,
            sites.len()
        );
    }

    let report = match &cli.report {
        Some(path) => Some(
            CsvReport::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => None,
    };
    let mut observer = BatchObserver { log: LogObserver, report };
    let mut journal = CommandJournal::new();

    let session = EditSession::new(batch.session.clone());
    let summary = session.run(&mut dataset, &mut journal, &batch.groups, &mut observer);

    if let Some(e) = observer.report.as_mut().and_then(|r| r.take_error()) {
        return Err(e).context("writing report");
    }

    println!("journal ({} mutations):", journal.len());
    for (i, mutation) in journal.entries().iter().enumerate() {
        println!("  {i:>4}  {mutation}");
    }
    println!(
        "groups: {} done, {} failed; bridge ways: {:?}",
        summary.done_count(),
        summary.failed_count(),
        summary.bridges().map(|w| w.0).collect::<Vec<_>>()
    );

    if cli.dry_run {
        let undone = journal.undo_all(&mut dataset)?;
        log::info!("dry run: undid {undone} mutations");
    }

    if let Some(path) = &cli.output {
        save_scene(&dataset, path).with_context(|| format!("saving {}", path.display()))?;
        log::info!("saved {}", path.display());
    }
    Ok(())
}
