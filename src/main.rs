/// Entry point: account sign-in, then the fixed-tick game loop.

mod auth;
mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use auth::UserStore;
use config::GameConfig;
use sim::assets::AssetLibrary;
use sim::level::load_level;
use sim::step::{self, FrameInput};
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{Renderer, TextScreen, Tone};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let assets = match AssetLibrary::build() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Broken embedded assets: {e}");
            return;
        }
    };
    let mut world = WorldState::new(assets, config.physics, config.combat);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    // Release events need the kitty keyboard protocol; without it the
    // input layer falls back to hold timeouts.
    let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        let _ = execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
    }

    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut store = UserStore::load(&config.users_file);
    let signed_in = login_flow(&mut renderer, &mut kb, &mut gp, &mut store);

    let result = match signed_in {
        Ok(Some(_user)) => {
            let sound = SoundEngine::new();
            load_level(&mut world, 0, &config);
            game_loop(&mut world, &mut renderer, &mut kb, &mut gp, sound.as_ref(), &config)
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Shadow Dash!");
}

// ── Login screen ──

#[derive(Clone, Copy, PartialEq, Eq)]
enum LoginMode {
    Menu,
    SignIn,
    Register,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
}

/// Small modal state machine in front of the game: pick sign-in or
/// register, type credentials, repeat until the store accepts them.
/// Returns the account name, or None if the player quit at the door.
fn login_flow(
    renderer: &mut Renderer,
    kb: &mut InputState,
    gp: &mut GamepadState,
    store: &mut UserStore,
) -> io::Result<Option<String>> {
    let mut mode = LoginMode::Menu;
    let mut field = Field::Username;
    let mut username = String::new();
    let mut password = String::new();
    let mut error = String::new();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            return Ok(None);
        }

        match mode {
            LoginMode::Menu => {
                if kb.was_pressed(KeyCode::Esc)
                    || kb.was_pressed(KeyCode::Char('q'))
                    || gp.cancel_pressed()
                {
                    return Ok(None);
                }
                let pick = |m: LoginMode| {
                    (m, Field::Username, String::new(), String::new(), String::new())
                };
                if kb.was_pressed(KeyCode::Char('1')) {
                    (mode, field, username, password, error) = pick(LoginMode::SignIn);
                } else if kb.was_pressed(KeyCode::Char('2')) {
                    (mode, field, username, password, error) = pick(LoginMode::Register);
                }
            }
            LoginMode::SignIn | LoginMode::Register => {
                if kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed() {
                    mode = LoginMode::Menu;
                    error.clear();
                } else if kb.was_pressed(KeyCode::Tab) {
                    field = match field {
                        Field::Username => Field::Password,
                        Field::Password => Field::Username,
                    };
                } else if kb.was_pressed(KeyCode::Backspace) {
                    match field {
                        Field::Username => username.pop(),
                        Field::Password => password.pop(),
                    };
                } else if kb.was_pressed(KeyCode::Enter) || gp.confirm_pressed() {
                    if field == Field::Username {
                        field = Field::Password;
                    } else {
                        let outcome = match mode {
                            LoginMode::SignIn => store.login(&username, &password),
                            LoginMode::Register => store.register(&username, &password),
                            LoginMode::Menu => unreachable!(),
                        };
                        match outcome {
                            Ok(()) => return Ok(Some(username)),
                            Err(e) => {
                                error = e.to_string();
                                password.clear();
                                field = Field::Password;
                            }
                        }
                    }
                } else {
                    for c in kb.typed_chars() {
                        match field {
                            Field::Username => username.push(c),
                            Field::Password => password.push(c),
                        }
                    }
                }
            }
        }

        renderer.render_screen(&login_screen(mode, field, &username, &password, &error))?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

fn login_screen(
    mode: LoginMode,
    field: Field,
    username: &str,
    password: &str,
    error: &str,
) -> TextScreen {
    let mut lines = Vec::new();
    let footer;

    match mode {
        LoginMode::Menu => {
            lines.push((Tone::Normal, String::new()));
            lines.push((Tone::Highlight, "  1   Sign in".to_string()));
            lines.push((Tone::Highlight, "  2   Create account".to_string()));
            lines.push((Tone::Dim, "  Q   Quit".to_string()));
            footer = " 1/2: choose   Q or ESC: quit".to_string();
        }
        LoginMode::SignIn | LoginMode::Register => {
            let heading = if mode == LoginMode::SignIn {
                "Sign in"
            } else {
                "Create account"
            };
            let mask: String = password.chars().map(|_| '*').collect();
            let (user_mark, pass_mark) = match field {
                Field::Username => ("▸", " "),
                Field::Password => (" ", "▸"),
            };
            lines.push((Tone::Normal, String::new()));
            lines.push((Tone::Normal, format!("  {heading}")));
            lines.push((Tone::Normal, String::new()));
            lines.push((Tone::Normal, format!("  {user_mark} Username: {username}_")));
            lines.push((Tone::Normal, format!("  {pass_mark} Password: {mask}_")));
            if !error.is_empty() {
                lines.push((Tone::Normal, String::new()));
                lines.push((Tone::Error, format!("  {error}")));
            }
            footer = " ENTER: submit   TAB: switch field   ESC: back".to_string();
        }
    }

    TextScreen {
        title: "SHADOW DASH".to_string(),
        lines,
        footer,
    }
}

// ── Game loop ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[
    KeyCode::Up,
    KeyCode::Char('w'),
    KeyCode::Char('W'),
    KeyCode::Char(' '),
];
const KEYS_DASH: &[KeyCode] = &[KeyCode::Char('x'), KeyCode::Char('X')];
const KEYS_THROW: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z')];
const KEYS_STRIKE: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    gp: &mut GamepadState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // One-shot actions are latched between sim ticks so a press during a
    // render frame is never lost.
    let mut pending = FrameInput::default();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.was_pressed(KeyCode::Esc) || gp.confirm_pressed() {
            world.paused = !world.paused;
            if let Some(sfx) = sound {
                sfx.set_ambience_ducked(world.paused);
            }
        }
        if !world.paused {
            if kb.any_pressed(KEYS_RESTART) {
                let level = world.level;
                load_level(world, level, config);
            }
            if kb.any_pressed(KEYS_JUMP) || gp.jump_pressed() {
                pending.jump = true;
            }
            if kb.any_pressed(KEYS_DASH) || gp.dash_pressed() {
                pending.dash = true;
            }
            if kb.any_pressed(KEYS_THROW) || gp.throw_pressed() {
                pending.throw = true;
            }
            if kb.any_pressed(KEYS_STRIKE) || gp.strike_pressed() {
                pending.strike = true;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            pending.left = kb.any_held(KEYS_LEFT) || gp.left_held();
            pending.right = kb.any_held(KEYS_RIGHT) || gp.right_held();

            let events = step::step(world, std::mem::take(&mut pending), config);
            if let Some(sfx) = sound {
                for event in &events {
                    sfx.play_event(event);
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
