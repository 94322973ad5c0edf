use std::path::Path;

use colored::Colorize;
use cyoa_engine::Severity;

pub fn run(path: &Path) -> Result<(), String> {
    let story = super::load_story(path)?;
    let report = story.lint();

    for issue in &report.issues {
        let line = issue.to_string();
        match issue.severity {
            Severity::Error => println!("  {}", line.red()),
            Severity::Warning => println!("  {}", line.yellow()),
        }
    }

    if report.has_errors() {
        let errors = report.error_count();
        return Err(format!(
            "'{}' has {errors} error{}",
            story.id,
            if errors == 1 { "" } else { "s" }
        ));
    }

    println!("  All checks passed for '{}'.", story.title);
    println!(
        "  {} nodes, {} warning{}",
        story.nodes().len(),
        report.warning_count(),
        if report.warning_count() == 1 { "" } else { "s" }
    );
    Ok(())
}
