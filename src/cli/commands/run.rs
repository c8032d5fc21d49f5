//! The `run` subcommand: play one attack simulation end to end.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::args::RunArgs;
use crate::clock::{MonotonicClock, RunClock};
use crate::error::{ExitCode, Result};
use crate::scenario::{Scenario, ScenarioLibrary};
use crate::scoring::{Difficulty, JsonFileStore, ScoreCard, ScoreStore, ScoringAccumulator};
use crate::sim::{AttackState, AttackStateMachine, DecisionGate, DecisionOutcome, EventSink, Pacing};

/// Runs the simulation described by `args`.
///
/// # Errors
///
/// Returns a content error for unknown or invalid scenarios, an I/O
/// error if the event log cannot be created, and a simulation error if
/// the run is interrupted. A scorecard save failure is only a warning.
pub async fn execute(args: RunArgs) -> Result<()> {
    let library = match &args.content_dir {
        Some(dir) => ScenarioLibrary::from_dir(dir)?,
        None => ScenarioLibrary::builtin(),
    };
    let scenario = library.get(&args.scenario)?;
    scenario.validate()?;

    let difficulty = effective_difficulty(args.difficulty, scenario);
    let clock: Arc<dyn RunClock> = Arc::new(MonotonicClock::new());
    let mut accumulator = ScoringAccumulator::new(&scenario.id, difficulty, clock);
    accumulator.set_mitre_universe(scenario.mitre_universe());

    let mut machine = AttackStateMachine::new(&scenario.id, args.speed);
    if let Some(seed) = args.seed {
        machine = machine.with_seed(seed);
    }
    if args.no_pacing {
        machine = machine.with_pacing(Pacing::Disabled);
    }
    if args.blue_team {
        machine = machine.with_gate(DecisionGate::interactive());
    }
    if let Some(dir) = &args.log_dir {
        let sink = EventSink::for_run(dir, &scenario.id, machine.run().started_at)?;
        if let Some(path) = sink.path() {
            info!(path = %path.display(), "event log created");
        }
        machine = machine.with_sink(sink);
    }

    spawn_signal_watcher(&machine);
    print!("{}", banner(scenario, difficulty, args.speed, args.blue_team));

    let result = machine.run_full_progression().await;

    apply_decisions(&mut accumulator, scenario, machine.decisions());
    result?;

    let card = ScoreCard::calculate(&accumulator.snapshot());
    println!("{}", card.render());

    if !args.no_save {
        let mut store = JsonFileStore::new(&args.scores);
        if let Err(e) = store.save(&card) {
            warn!(error = %e, path = %store.path().display(), "failed to save scorecard");
        }
    }
    Ok(())
}

/// First Ctrl+C/SIGTERM cancels the run so it ends with a proper exit
/// code; a second signal force-exits.
fn spawn_signal_watcher(machine: &AttackStateMachine) {
    let cancel = machine.cancel_token();
    tokio::spawn(async move {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            warn!("failed to register SIGTERM handler");
            return;
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }

        eprintln!("\nInterrupting run... (press Ctrl+C again to force)");
        cancel.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    });
}

/// Explicit `--difficulty` wins; otherwise the scenario's own rating
/// decides the XP multiplier.
fn effective_difficulty(flag: Option<Difficulty>, scenario: &Scenario) -> Difficulty {
    flag.unwrap_or_else(|| Difficulty::from_name(&scenario.difficulty))
}

fn banner(scenario: &Scenario, difficulty: Difficulty, speed: f64, blue_team: bool) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "\n  BREACH SIMULATION: {}", scenario.name);
    let _ = writeln!(
        out,
        "  Severity: {}  Category: {}",
        scenario.severity, scenario.category
    );
    let _ = writeln!(
        out,
        "  Difficulty: {difficulty}  Speed: {speed}x  Blue team: {}",
        if blue_team { "ON" } else { "OFF" }
    );
    let _ = writeln!(
        out,
        "  Timeline: {} fictional minutes  Policies in play: {}",
        scenario.total_duration_minutes(),
        scenario.policy_ids().join(", ")
    );
    if !scenario.description.is_empty() {
        let _ = writeln!(out, "\n  {}", scenario.description);
    }
    out.push('\n');
    out
}

/// Folds blue-team decision outcomes into the scoring accumulator.
///
/// A correct response counts as detection, identifies the stage's MITRE
/// techniques, preserves evidence, and satisfies the stage's policies.
/// A correct response before lateral movement also counts as early
/// containment; a correct response at impact counts as escalation plus
/// recovery.
fn apply_decisions(
    accumulator: &mut ScoringAccumulator,
    scenario: &Scenario,
    decisions: &[DecisionOutcome],
) {
    for outcome in decisions {
        let Some(idx) = outcome.state.progression_index() else {
            continue;
        };
        let stage_num = u32::try_from(idx).map_or(0, |v| v + 1);
        let stage = scenario.stages.get(idx);

        if let Some(selected) = &outcome.selected {
            accumulator.log_action(
                selected,
                &format!("response chosen at {}", outcome.state.label()),
                stage_num,
            );
        }
        if let Some(stage) = stage {
            for policy in &stage.policies {
                accumulator.follow_policy(policy, outcome.correct);
            }
        }
        if outcome.correct {
            accumulator.detect_threat();
            accumulator.preserve_evidence();
            if let Some(stage) = stage {
                for technique in &stage.mitre {
                    accumulator.identify_mitre(technique);
                }
            }
            match outcome.state {
                AttackState::InitialAccess | AttackState::Persistence => {
                    accumulator.contain_before_lateral();
                }
                AttackState::Impact => {
                    accumulator.escalate();
                    accumulator.mark_recovered();
                }
                _ => {}
            }
        }
    }
}
