//! The `scenarios` subcommand: list available scenario content.

use crate::cli::args::ScenariosArgs;
use crate::error::Result;
use crate::scenario::ScenarioLibrary;

/// Prints the scenario catalog, optionally filtered by severity and
/// category tags.
///
/// # Errors
///
/// Returns a content error if a custom content directory fails to load.
pub fn execute(args: &ScenariosArgs) -> Result<()> {
    let library = match &args.content_dir {
        Some(dir) => ScenarioLibrary::from_dir(dir)?,
        None => ScenarioLibrary::builtin(),
    };

    let matches: Vec<_> = library
        .all()
        .iter()
        .filter(|s| {
            args.severity
                .as_deref()
                .is_none_or(|sev| s.severity.eq_ignore_ascii_case(sev))
        })
        .filter(|s| {
            args.category
                .as_deref()
                .is_none_or(|cat| s.category.eq_ignore_ascii_case(cat))
        })
        .collect();

    if matches.is_empty() {
        println!("No scenarios match the given filters.");
        return Ok(());
    }

    println!(
        "{:<28} {:<42} {:<9} {:<13} {:<8} {}",
        "ID", "NAME", "SEVERITY", "CATEGORY", "STAGES", "DIFFICULTY"
    );
    for scenario in matches {
        println!(
            "{:<28} {:<42} {:<9} {:<13} {:<8} {}",
            scenario.id,
            scenario.name,
            scenario.severity,
            scenario.category,
            scenario.stages.len(),
            scenario.difficulty,
        );
    }
    Ok(())
}
