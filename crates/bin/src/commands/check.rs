//! Integrity commands: check and fix.

use mptree::TreeStore;
use mptree::store::TreeProblems;

use crate::cli::Format;
use crate::output::{print_json, print_table};

fn problem_rows(problems: &TreeProblems) -> Vec<Vec<String>> {
    let groups = [
        ("bad alphabet", &problems.bad_alphabet),
        ("bad length", &problems.bad_length),
        ("orphan", &problems.orphans),
        ("wrong depth", &problems.wrong_depth),
        ("wrong numchild", &problems.wrong_numchild),
    ];
    groups
        .into_iter()
        .flat_map(|(label, ids)| {
            ids.iter()
                .map(move |id| vec![label.to_string(), id.to_string()])
        })
        .collect()
}

/// Run the `check` command. Exits non-zero when problems are found.
pub async fn check(store: &TreeStore, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let problems = store.find_problems().await?;
    match format {
        Format::Human => {
            if problems.is_empty() {
                println!("No problems found.");
            } else {
                print_table(&["PROBLEM", "NODE"], &problem_rows(&problems));
            }
        }
        Format::Json => print_json(&problems)?,
    }
    if !problems.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

/// Run the `fix` command
pub async fn fix(store: &TreeStore, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let report = store.fix_tree().await?;
    match format {
        Format::Human => {
            println!("Depth fixed:     {}", report.depth_fixed);
            println!("Numchild fixed:  {}", report.numchild_fixed);
            if !report.remaining.is_empty() {
                println!();
                println!("Left for manual repair:");
                print_table(&["PROBLEM", "NODE"], &problem_rows(&report.remaining));
            }
        }
        Format::Json => print_json(&report)?,
    }
    Ok(())
}
