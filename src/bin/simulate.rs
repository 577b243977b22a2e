use clap::Parser;
use maze_chase_server::constants::{INITIAL_LIVES, TICK_MS};
use maze_chase_server::engine::{GameEngine, GameEngineOptions};
use maze_chase_server::rng::Rng;
use maze_chase_server::types::{
    ControlCommand, Direction, EndReason, RuntimeEvent, Snapshot,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    pursue_bias: Option<f32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    ticks: u64,
    #[serde(rename = "pursueBias")]
    pursue_bias: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    #[serde(rename = "ticksRun")]
    ticks_run: u64,
    reason: String,
    score: i32,
    #[serde(rename = "livesLeft")]
    lives_left: i32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: i32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: i32,
    #[serde(rename = "ghostsCaptured")]
    ghosts_captured: i32,
    #[serde(rename = "timesCaught")]
    times_caught: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in &scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "ticks": scenario.ticks,
                "pursueBias": scenario.pursue_bias,
            }),
        );

        let scenario_run = run_scenario(scenario);
        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "error",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }
        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *reason_counts
            .entry(scenario_run.result.reason.clone())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "ticksRun": scenario_run.result.ticks_run,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = RunSummary {
        match_id: match_id.clone(),
        started_at_ms: run_started_at_ms,
        finished_at_ms: now_ms(),
        scenario_count: scenario_results.len(),
        anomaly_count: total_anomalies,
        reason_counts,
        scenarios: scenario_results,
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::with_default_maze(
        scenario.seed,
        GameEngineOptions {
            pursue_bias_override: scenario.pursue_bias,
        },
    );
    engine.apply_control(ControlCommand::Start);

    // The synthetic pilot: a separate seeded stream, so the same CLI
    // arguments replay the same run end to end.
    let mut pilot = Rng::new(scenario.seed.wrapping_mul(31).wrapping_add(17));
    let dirs = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    let mut dots_eaten = 0;
    let mut pellets_eaten = 0;
    let mut ghosts_captured = 0;
    let mut times_caught = 0;
    let mut last_score = 0;
    let mut last_dots = engine.dots_remaining();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut ticks_run = 0u64;

    for tick in 0..scenario.ticks {
        if tick % 10 == 0 {
            engine.set_direction(dirs[pilot.pick_index(dirs.len())]);
        }
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        ticks_run = snapshot.tick;

        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        if snapshot.score < last_score {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                format!("score regressed: {} -> {}", last_score, snapshot.score),
            );
        }
        if snapshot.dots_remaining > last_dots {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                format!(
                    "collectible count grew: {} -> {}",
                    last_dots, snapshot.dots_remaining
                ),
            );
        }
        last_score = snapshot.score;
        last_dots = snapshot.dots_remaining;

        for event in &snapshot.events {
            match event {
                RuntimeEvent::DotEaten { .. } => dots_eaten += 1,
                RuntimeEvent::PowerPelletEaten { .. } => pellets_eaten += 1,
                RuntimeEvent::GhostCaptured { .. } => ghosts_captured += 1,
                RuntimeEvent::RunnerCaught { .. } => times_caught += 1,
                RuntimeEvent::GameWon | RuntimeEvent::GameLost => {}
            }
        }

        if engine.is_ended() {
            break;
        }
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            ticks_run,
            reason: reason_key(engine.end_reason()),
            score: engine.score(),
            lives_left: engine.lives(),
            dots_eaten,
            pellets_eaten,
            ghosts_captured,
            times_caught,
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();

    let tile_collectibles: i32 = snapshot
        .tiles
        .iter()
        .map(|row| row.chars().filter(|ch| *ch == '.' || *ch == 'o').count() as i32)
        .sum();
    if tile_collectibles != snapshot.dots_remaining {
        anomalies.push(format!(
            "ledger drift: counter says {} but the grid holds {}",
            snapshot.dots_remaining, tile_collectibles
        ));
    }

    if snapshot.score < 0 {
        anomalies.push(format!("negative score: {}", snapshot.score));
    }
    if snapshot.lives < 0 || snapshot.lives > INITIAL_LIVES {
        anomalies.push(format!("lives out of range: {}", snapshot.lives));
    }

    if tile_at(snapshot, snapshot.runner.x, snapshot.runner.y) == Some('#') {
        anomalies.push(format!(
            "runner inside a wall at ({}, {})",
            snapshot.runner.x, snapshot.runner.y
        ));
    }
    for ghost in &snapshot.ghosts {
        if tile_at(snapshot, ghost.x, ghost.y) == Some('#') {
            anomalies.push(format!(
                "ghost {} inside a wall at ({}, {})",
                ghost.id, ghost.x, ghost.y
            ));
        }
    }

    anomalies
}

fn tile_at(snapshot: &Snapshot, x: i32, y: i32) -> Option<char> {
    if x < 0 || y < 0 {
        return None;
    }
    snapshot
        .tiles
        .get(y as usize)
        .and_then(|row| row.chars().nth(x as usize))
}

fn reason_key(reason: Option<EndReason>) -> String {
    match reason {
        Some(EndReason::Win) => "win".to_string(),
        Some(EndReason::Loss) => "loss".to_string(),
        None => "unfinished".to_string(),
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));

    if cli.single || cli.ticks.is_some() || cli.pursue_bias.is_some() {
        return vec![Scenario {
            name: "custom".to_string(),
            seed,
            ticks: cli.ticks.unwrap_or(2_400),
            pursue_bias: cli.pursue_bias,
        }];
    }

    vec![
        Scenario {
            name: "quick-run".to_string(),
            seed,
            ticks: 2_400,
            pursue_bias: None,
        },
        Scenario {
            name: "long-run".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            ticks: 7_200,
            pursue_bias: None,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text =
        serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}
