/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use config::GameConfig;
use sim::control::{handle_input, InputEvent};
use sim::event::GameEvent;
use sim::level::MapSource;
use sim::step;
use sim::world::GameState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, RawInput};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// Longest step the simulation takes after a stall.
const MAX_FRAME: Duration = Duration::from_millis(50);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = GameConfig::load();
    let seed = config.seed.unwrap_or_else(clock_seed);
    log::debug!("maps from {}, seed {seed}", config.maps_dir.display());

    let mut game = GameState::new(
        config.physics.clone(),
        MapSource::new(&config.maps_dir),
        seed,
    );

    // Before the alternate screen, so device warnings stay readable.
    let sound = SoundEngine::new();
    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);

    let mut renderer = Renderer::new();
    let mut keyboard = InputState::new();
    match renderer.init() {
        Ok(enhanced) => keyboard.honor_release = enhanced,
        Err(e) => {
            log::error!("terminal init failed: {e}");
            return;
        }
    }

    let frame = Duration::from_millis(config.frame_ms);
    let result = game_loop(
        &mut game, &mut renderer, &mut keyboard, &mut gamepad, sound.as_ref(), frame,
    );

    if let Err(e) = renderer.cleanup() {
        log::error!("terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game error: {e}");
        std::process::exit(1);
    }

    println!("Thanks for playing Skybird!");
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn game_loop(
    game: &mut GameState,
    renderer: &mut Renderer,
    keyboard: &mut InputState,
    gamepad: &mut GamepadState,
    sound: Option<&SoundEngine>,
    frame: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();

        let mut inputs: Vec<InputEvent> = Vec::new();
        for raw in keyboard.drain_events() {
            match raw {
                RawInput::Interrupt => return Ok(()),
                RawInput::Key(ev) => inputs.push(ev),
                RawInput::Click { column, row } => {
                    if let Some((x, y)) = renderer.pick(column, row) {
                        inputs.push(InputEvent::Click { x, y });
                    }
                }
            }
        }
        inputs.extend(gamepad.poll());
        renderer.gamepad_connected = gamepad.connected;

        let mut events = Vec::new();
        for ev in inputs {
            events.extend(handle_input(game, ev)?);
        }

        let elapsed = frame_start.duration_since(last_frame).min(MAX_FRAME);
        last_frame = frame_start;
        events.extend(step::update(game, elapsed.as_secs_f32() * 1000.0)?);

        process_sound_events(sound, &events);
        if events.contains(&GameEvent::QuitRequested) {
            return Ok(());
        }

        renderer.render(game)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match *event {
            GameEvent::PlayerKilled => sfx.play_caw(),
            GameEvent::CollectiblePicked { index } => sfx.play_boop(index),
            GameEvent::AllCollected => sfx.play_groovey(),
            GameEvent::LeverToggled { pulled } => sfx.play_lever(pulled),
            GameEvent::LevelStarted(level) => log::debug!("level {} running", level.number()),
            GameEvent::GameCompleted | GameEvent::QuitRequested => {}
        }
    }
}
