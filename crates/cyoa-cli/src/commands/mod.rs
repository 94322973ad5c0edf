pub mod check;
pub mod play;
pub mod roll;
pub mod status;

use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde_json::Value as Json;

use cyoa_core::GameState;
use cyoa_engine::{ChoiceView, EngineConfig, Progress, StateTransition, Story, StoryNavigator};
use cyoa_mechanics::stat_modifier;

/// Load a story document, mapping failures to a printable message.
fn load_story(path: &Path) -> Result<Story, String> {
    Story::load(path).map_err(|e| e.to_string())
}

/// Load an engine config, or the defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => {
            let json = read_json(path)?;
            serde_json::from_value(json).map_err(|e| format!("invalid config {}: {e}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn navigator<'a>(story: &'a Story, config: &EngineConfig) -> Result<StoryNavigator<&'a Story>, String> {
    StoryNavigator::with_config(story, config).map_err(|e| e.to_string())
}

/// Restore a save, checking that it belongs to `story`.
fn load_save(nav: &StoryNavigator<&Story>, story: &Story, path: &Path) -> Result<GameState, String> {
    let snapshot = read_json(path)?;
    let state = nav.load_game(&snapshot).map_err(|e| e.to_string())?;
    if state.story_id != story.id {
        return Err(format!(
            "save belongs to story '{}', not '{}'",
            state.story_id, story.id
        ));
    }
    Ok(state)
}

fn read_json(path: &Path) -> Result<Json, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
}

fn write_json(path: &Path, json: &Json) -> Result<(), String> {
    let text = serde_json::to_string_pretty(json).map_err(|e| e.to_string())?;
    std::fs::write(path, text + "\n").map_err(|e| format!("cannot write {}: {e}", path.display()))
}

fn print_node(story: &Story, state: &GameState) {
    let Some(node) = story.node(&state.current_node_id) else {
        return;
    };
    println!();
    println!("  {}", node.key.bold().underline());
    for line in node.text.lines() {
        println!("  {line}");
    }
    if node.is_terminal {
        println!("  {}", "(the end)".dimmed());
    }
    println!();
}

fn print_choices(choices: &[ChoiceView]) {
    for choice in choices {
        let rolls: Vec<String> = choice
            .roll_requirements
            .iter()
            .map(|r| format!("{} DC {}", r.stat, r.difficulty))
            .collect();
        let rolls = if rolls.is_empty() {
            String::new()
        } else {
            format!(" [{}]", rolls.join(", "))
        };
        let line = format!("  {}) {}{rolls}", choice.index, choice.text);
        if choice.available {
            println!("{line}");
        } else {
            println!("{} {}", line.dimmed(), "(locked)".dimmed());
        }
    }
}

fn print_transition(transition: &StateTransition) {
    for roll in &transition.roll_results {
        let line = format!("  roll {roll}");
        if roll.succeeded() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
    for effect in &transition.applied_effects {
        println!("  {}", effect.to_string().dimmed());
    }
}

fn print_state(state: &GameState, progress: &Progress) {
    println!(
        "  {} {} {}",
        "Save".bold(),
        state.save_id,
        format!("(player {}, story {})", state.player_id, state.story_id).dimmed()
    );
    println!("  At: {}", state.current_node_id);
    println!(
        "  Progress: {}/{} nodes ({}%), {} choices made",
        progress.visited_nodes, progress.total_nodes, progress.progress_percentage, progress.choices_made
    );
    println!();

    let mut stats = Table::new();
    stats.set_content_arrangement(ContentArrangement::Dynamic);
    stats.set_header(vec!["Stat", "Value", "Modifier"]);
    for (name, value) in &state.stats {
        let modifier = stat_modifier(*value);
        stats.add_row(vec![name.clone(), value.to_string(), format!("{modifier:+}")]);
    }
    println!("{stats}");

    if !state.wallets.is_empty() || !state.inventory.is_empty() {
        let mut holdings = Table::new();
        holdings.set_content_arrangement(ContentArrangement::Dynamic);
        holdings.set_header(vec!["Kind", "Name", "Amount"]);
        for (currency, balance) in &state.wallets {
            holdings.add_row(vec!["wallet".to_string(), currency.clone(), balance.to_string()]);
        }
        for (item, quantity) in &state.inventory {
            holdings.add_row(vec!["item".to_string(), item.clone(), quantity.to_string()]);
        }
        println!("{holdings}");
    }

    if !state.status_effects.is_empty() {
        let mut effects = Table::new();
        effects.set_content_arrangement(ContentArrangement::Dynamic);
        effects.set_header(vec!["Status", "Value", "Turns left", "Source"]);
        for effect in &state.status_effects {
            effects.add_row(vec![
                effect.kind.clone(),
                effect.value.to_string(),
                effect.duration.map_or_else(|| "-".to_string(), |d| d.to_string()),
                effect.source.clone().unwrap_or_default(),
            ]);
        }
        println!("{effects}");
    }

    if !state.flags.is_empty() {
        let flags: Vec<String> = state.flags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  Flags: {}", flags.join(", "));
    }
}
