use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use cyoa_core::GameState;
use cyoa_engine::{NewGame, Story, StoryNavigator};

/// Command-line options for `cyoa play`.
pub struct PlayOptions {
    pub seed: Option<String>,
    pub stats: Vec<String>,
    pub choices: Option<Vec<usize>>,
    pub save: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub player: Option<String>,
    pub slot: Option<String>,
}

pub fn run(story_path: &Path, opts: &PlayOptions) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let config = super::load_config(opts.config.as_deref())?;
    tracing::debug!("Engine config: {config:?}");
    let nav = super::navigator(&story, &config)?;

    let state = match &opts.load {
        Some(path) => super::load_save(&nav, &story, path)?,
        None => nav.start_game(&new_game(&story, opts)?).map_err(|e| e.to_string())?,
    };

    let state = match &opts.choices {
        Some(choices) => play_scripted(&nav, &story, state, choices)?,
        None => play_interactive(&nav, &story, state)?,
    };

    if let Some(path) = &opts.save {
        let snapshot = nav.save_game(&state).map_err(|e| e.to_string())?;
        super::write_json(path, &snapshot)?;
        println!("  Saved to {}", path.display());
    }
    Ok(())
}

fn new_game(story: &Story, opts: &PlayOptions) -> Result<NewGame, String> {
    let player = opts
        .player
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let slot = opts
        .slot
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut game = NewGame::new(player, story.id.clone()).with_save(slot);
    if let Some(seed) = &opts.seed {
        game = game.with_seed(seed.clone());
    }
    for raw in &opts.stats {
        let (name, value) = parse_stat(raw)?;
        game = game.with_stat(name, value);
    }
    Ok(game)
}

fn parse_stat(raw: &str) -> Result<(String, i64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid stat '{raw}': expected name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid stat '{raw}': missing name"));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid stat '{raw}': '{value}' is not a whole number"))?;
    Ok((name.to_string(), value))
}

fn play_scripted(
    nav: &StoryNavigator<&Story>,
    story: &Story,
    mut state: GameState,
    choices: &[usize],
) -> Result<GameState, String> {
    for &index in choices {
        print_node(nav, story, &state)?;
        let transition = nav
            .make_choice(&state, index)
            .map_err(|e| format!("choice {index} at '{}': {e}", state.current_node_id))?;
        if let Some(choice) = story
            .node(&transition.previous_node_id)
            .and_then(|node| node.choices.get(index))
        {
            println!("  > {}", choice.text.bold());
        }
        super::print_transition(&transition);
        state = transition.updated_state;
    }
    super::print_node(story, &state);
    Ok(state)
}

fn play_interactive(nav: &StoryNavigator<&Story>, story: &Story, mut state: GameState) -> Result<GameState, String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_node(nav, story, &state)?;
        if nav.is_at_ending(&state) {
            break;
        }
        print!("  {} ", ">".bold());
        io::stdout().flush().map_err(|e| e.to_string())?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.map_err(|e| e.to_string())?;
        match line.trim() {
            "q" | "quit" => break,
            "s" | "status" => super::print_state(&state, &nav.get_progress(&state)),
            input => match input.parse::<usize>() {
                Ok(index) => match nav.make_choice(&state, index) {
                    Ok(transition) => {
                        super::print_transition(&transition);
                        state = transition.updated_state;
                    }
                    Err(e) => println!("  {}", e.to_string().red()),
                },
                Err(_) => println!("  Enter a choice number, 's' for status, or 'q' to quit."),
            },
        }
    }
    Ok(state)
}

fn print_node(nav: &StoryNavigator<&Story>, story: &Story, state: &GameState) -> Result<(), String> {
    super::print_node(story, state);
    let choices = nav.get_available_choices(state).map_err(|e| e.to_string())?;
    super::print_choices(&choices);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stat_overrides() {
        assert_eq!(parse_stat("luck=15"), Ok(("luck".to_string(), 15)));
        assert_eq!(parse_stat(" grit = 3 "), Ok(("grit".to_string(), 3)));
        assert!(parse_stat("luck").unwrap_err().contains("expected name=value"));
        assert!(parse_stat("=4").unwrap_err().contains("missing name"));
        assert!(parse_stat("luck=high").unwrap_err().contains("not a whole number"));
    }
}
