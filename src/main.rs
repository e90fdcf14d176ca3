/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info};

use config::GameConfig;
use domain::entity::Intent;
use sim::level::load_level;
use sim::step;
use sim::world::{Ending, Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{play_events, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    logging::init();
    let config = GameConfig::load();

    // Level source: command line, then config, then the built-in level.
    let level_path: Option<PathBuf> = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.level_file.clone());

    let level = match load_level(level_path.as_deref()) {
        Ok(level) => level,
        Err(e) => {
            error!("level load failed: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let mut world = WorldState::new(level, config.physics, config.actor.hitbox());

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            // Best effort: raw mode may already be on.
            let _ = renderer.cleanup();
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Koalio!");
    match world.phase {
        Phase::GameOver(Ending::Won) => println!("{}: cleared!", world.level_name),
        Phase::GameOver(Ending::Lost(_)) => println!("{}: not this time.", world.level_name),
        Phase::Playing => {}
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    renderer.fit_camera(world);
    let mut kb = InputState::new(renderer.term_width());
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let max_dt = Duration::from_millis(config.timing.max_dt_ms);
    let mut last_tick = Instant::now();

    info!(
        tick_rate_ms = config.timing.tick_rate_ms,
        gamepad = gp.connected,
        sound = sound.is_some(),
        "game loop started"
    );

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() || gp.quit_pressed() {
            break;
        }
        if kb.restart_pressed() || gp.restart_pressed() {
            step::restart_level(world);
            last_tick = Instant::now();
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            if !world.is_game_over() {
                let dt = elapsed.min(max_dt).as_secs_f32();
                let events = step::step(world, dt, merge_intent(kb.intent(), gp.intent()));
                if let Some(sfx) = sound {
                    play_events(sfx, &events);
                }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Any device asking for an action wins.
fn merge_intent(a: Intent, b: Intent) -> Intent {
    Intent {
        wants_move: a.wants_move || b.wants_move,
        wants_jump: a.wants_jump || b.wants_jump,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_merge_per_flag() {
        let run = Intent { wants_move: true, wants_jump: false };
        let jump = Intent { wants_move: false, wants_jump: true };
        assert_eq!(merge_intent(run, jump), Intent { wants_move: true, wants_jump: true });
        assert_eq!(merge_intent(Intent::default(), Intent::default()), Intent::default());
    }
}
