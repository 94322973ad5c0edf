use colored::Colorize;
use cyoa_mechanics::DiceRoller;

pub fn run(formula: &str, dc: Option<i64>, seed: Option<&str>) -> Result<(), String> {
    let mut roller = match seed {
        Some(seed) => DiceRoller::seeded(seed),
        None => DiceRoller::from_entropy(),
    };
    let result = roller.roll(formula, dc).map_err(|e| e.to_string())?;

    println!("  {result}");
    if result.critical_success {
        println!("  {}", "Critical success!".green().bold());
    } else if result.critical_failure {
        println!("  {}", "Critical failure!".red().bold());
    }
    Ok(())
}
