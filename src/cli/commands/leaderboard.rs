//! The `leaderboard` subcommand: ranked saved runs.

use crate::cli::args::LeaderboardArgs;
use crate::error::Result;
use crate::scoring::{JsonFileStore, ScoreStore, tier_for_xp};

/// Prints the top saved runs by total score, plus accumulated XP and
/// analyst tier.
///
/// # Errors
///
/// Returns an error if the score store cannot be read.
pub fn execute(args: &LeaderboardArgs) -> Result<()> {
    let store = JsonFileStore::new(&args.scores);
    let cards = store.top_n(args.limit, args.scenario.as_deref())?;

    if cards.is_empty() {
        println!("No saved runs yet. Play one with `breachsim run <scenario>`.");
        return Ok(());
    }

    println!(
        "{:<5} {:<28} {:<9} {:<7} {:<6} {:<5} {}",
        "RANK", "SCENARIO", "DIFF", "SCORE", "GRADE", "XP", "TIMESTAMP"
    );
    for (i, card) in cards.iter().enumerate() {
        println!(
            "{:<5} {:<28} {:<9} {:<7} {:<6} {:<5} {}",
            i + 1,
            card.scenario_id,
            card.difficulty,
            format!("{}/{}", card.total_score(), card.max_possible()),
            card.grade(),
            card.xp_earned(),
            card.timestamp,
        );
    }

    let total_xp = store.total_xp()?;
    println!("\nTotal XP: {total_xp}   Tier: {}", tier_for_xp(total_xp));
    Ok(())
}
