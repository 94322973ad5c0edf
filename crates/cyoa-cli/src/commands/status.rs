use std::path::Path;

use cyoa_engine::EngineConfig;

pub fn run(story_path: &Path, save_path: &Path) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let nav = super::navigator(&story, &EngineConfig::default())?;
    let state = super::load_save(&nav, &story, save_path)?;

    super::print_state(&state, &nav.get_progress(&state));
    if nav.is_at_ending(&state) {
        println!("  This save has reached an ending.");
    }
    Ok(())
}
