//! Tank Strike entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use tank_strike::audio::{AudioCues, AudioManager};
    use tank_strike::input::KeysHeld;
    use tank_strike::persistence::{LocalStorage, ProfileStore, SavedGame};
    use tank_strike::progression::UserProfile;
    use tank_strike::render::{CanvasPainter, build_frame, canvas_size};
    use tank_strike::sim::MatchOutcome;
    use tank_strike::{MatchConfig, MatchController, Settings};

    /// Name used when nobody is signed in
    const GUEST: &str = "GUEST";

    /// Game instance holding all state
    struct Game {
        controller: MatchController,
        painter: CanvasPainter,
        storage: LocalStorage,
        settings: Settings,
        player_name: String,
        /// Pending animation frame, if any
        frame_handle: Option<i32>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// Run one host frame; returns whether to schedule another
        fn frame(&mut self, keys: &KeysHeld, time: f64) -> bool {
            // Cooldowns compare wall-clock timestamps
            let now = js_sys::Date::now();
            let running = self.controller.frame(keys, now);

            if self.controller.snapshot_due() {
                self.save_game();
            }

            self.painter.paint(&build_frame(self.controller.state()));
            self.track_fps(time);
            self.update_hud();
            running
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            set_text(&document, "#hud-score .hud-value", &self.controller.score().to_string());
            set_text(&document, "#hud-lives .hud-value", &self.controller.lives().to_string());
            set_text(&document, "#hud-level .hud-value", &self.controller.level().to_string());
            if self.settings.show_fps {
                set_text(&document, "#hud-fps .hud-value", &self.fps.to_string());
            }
        }

        /// Save a resumable snapshot
        fn save_game(&mut self) {
            let snapshot = self.controller.snapshot();
            match snapshot.save(&mut self.storage) {
                Ok(()) => log::info!("Game saved (level {})", snapshot.current_level),
                Err(err) => log::warn!("Failed to save game: {}", err),
            }
        }

        /// Throw away the current match and start a fresh one
        fn restart(&mut self) {
            if let Some(handle) = self.frame_handle.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(handle);
                }
            }
            if let Err(err) = SavedGame::clear(&mut self.storage) {
                log::warn!("Failed to clear saved game: {}", err);
            }
            let config = MatchConfig {
                mode: self.controller.config().mode,
                player_name: self.player_name.clone(),
                seed: js_sys::Date::now() as u64,
            };
            let audio = shared_audio();
            self.controller = MatchController::start(
                config,
                &self.settings,
                on_game_over(self.storage.clone(), self.player_name.clone()),
            )
            .with_audio(audio);
            set_class("game-over", "hidden");
            log::info!("Game restarted");
        }
    }

    thread_local! {
        static AUDIO: Rc<RefCell<AudioManager>> = Rc::new(RefCell::new(AudioManager::new()));
    }

    /// Handle to the shared audio backend for a controller
    fn shared_audio() -> Box<dyn AudioCues> {
        AUDIO.with(|audio| Box::new(Rc::clone(audio)) as Box<dyn AudioCues>)
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(id: &str, class: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.set_attribute("class", class);
        }
    }

    /// Record the outcome on the signed-in profile and show the result
    fn on_game_over(storage: LocalStorage, player_name: String) -> impl FnMut(MatchOutcome) + 'static {
        move |outcome: MatchOutcome| {
            let mut profiles = ProfileStore::new(storage.clone());
            match profiles.record_match(&player_name, &outcome, js_sys::Date::now()) {
                Ok((profile, report)) => {
                    log::info!(
                        "{} is now level {} ({}), +{} XP",
                        profile.username,
                        profile.level,
                        profile.rank().title,
                        report.xp_gained
                    );
                }
                Err(err) => log::warn!("Failed to record match: {}", err),
            }

            if let Some(document) = document() {
                set_text(&document, "#final-score", &outcome.final_score.to_string());
                set_text(&document, "#final-levels", &outcome.levels_cleared.to_string());
            }
            set_class("game-over", "");
        }
    }

    /// Signed-in profile name, creating a guest profile on first visit
    fn signed_in_player(storage: &LocalStorage) -> String {
        let mut profiles = ProfileStore::new(storage.clone());
        if let Ok(Some(profile)) = profiles.session() {
            return profile.username;
        }
        let profile = match profiles.get(GUEST) {
            Ok(Some(profile)) => Ok(profile),
            _ => profiles.register(UserProfile::new(GUEST, 0.0), js_sys::Date::now()),
        };
        match profile.and_then(|p| profiles.set_session(&p)) {
            Ok(()) => log::info!("Playing as {}", GUEST),
            Err(err) => log::warn!("Failed to set up guest profile: {}", err),
        }
        GUEST.to_string()
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Tank Strike starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        canvas.set_width(canvas_size());
        canvas.set_height(canvas_size());
        let painter = CanvasPainter::new(&canvas).ok_or("no 2d context")?;

        let mut storage = LocalStorage::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let settings = Settings::load(&storage);
        log::info!("Quality preset: {}", settings.quality.as_str());
        AUDIO.with(|audio| {
            let mut audio = audio.borrow_mut();
            audio.set_master_volume(settings.master_volume);
            audio.set_sfx_volume(settings.sfx_volume);
            audio.set_muted(settings.muted);
        });

        let player_name = signed_in_player(&storage);
        if let Err(err) = ProfileStore::new(storage.clone()).seed_demo_roster(js_sys::Date::now()) {
            log::warn!("Failed to seed demo profiles: {}", err);
        }
        let saved = SavedGame::load(&storage);
        let config = MatchConfig {
            mode: saved.mode,
            player_name: player_name.clone(),
            seed: js_sys::Date::now() as u64,
        };
        let callback = on_game_over(storage.clone(), player_name.clone());
        let controller = if saved.is_resumable() {
            log::info!("Resuming saved game at level {}", saved.current_level);
            MatchController::resume(config, &saved, &settings, callback)
        } else {
            if let Err(err) = SavedGame::clear(&mut storage) {
                log::warn!("Failed to clear saved game: {}", err);
            }
            MatchController::start(config, &settings, callback)
        };
        let controller = controller.with_audio(shared_audio());

        let game = Rc::new(RefCell::new(Game {
            controller,
            painter,
            storage,
            settings,
            player_name,
            frame_handle: None,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));
        let keys = Rc::new(RefCell::new(KeysHeld::new()));

        setup_keyboard(game.clone(), keys.clone());
        setup_touch_buttons(&document, keys.clone());
        setup_restart_button(&document, game.clone(), keys.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game, keys);
        log::info!("Tank Strike running!");
        Ok(())
    }

    fn unlock_audio() {
        AUDIO.with(|audio| audio.borrow_mut().unlock());
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>, keys: Rc<RefCell<KeysHeld>>) {
        let Some(window) = web_sys::window() else { return };
        let bindings = game.borrow().settings.key_bindings.clone();

        {
            let keys = keys.clone();
            let bindings = bindings.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if bindings.is_bound(&code) {
                    event.prevent_default();
                }
                unlock_audio();
                keys.borrow_mut().press(&code);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let keys = keys.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                keys.borrow_mut().release(&event.code());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keys released while unfocused never send keyup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                keys.borrow_mut().clear();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// On-screen buttons carry the key code they emulate in `data-key`
    fn setup_touch_buttons(document: &Document, keys: Rc<RefCell<KeysHeld>>) {
        let Ok(buttons) = document.query_selector_all("[data-key]") else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(button) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(code) = button.get_attribute("data-key") else {
                continue;
            };

            {
                let keys = keys.clone();
                let code = code.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                    event.prevent_default();
                    unlock_audio();
                    keys.borrow_mut().press(&code);
                });
                let _ = button
                    .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            for release in ["pointerup", "pointerleave", "pointercancel"] {
                let keys = keys.clone();
                let code = code.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                    keys.borrow_mut().release(&code);
                });
                let _ =
                    button.add_event_listener_with_callback(release, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_restart_button(
        document: &Document,
        game: Rc<RefCell<Game>>,
        keys: Rc<RefCell<KeysHeld>>,
    ) {
        let Some(btn) = document.get_element_by_id("restart-btn") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            game.borrow_mut().restart();
            keys.borrow_mut().clear();
            request_animation_frame(game.clone(), keys.clone());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, keys: Rc<RefCell<KeysHeld>>) {
        let Some(window) = web_sys::window() else { return };
        let next = game.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(next, keys, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => game.borrow_mut().frame_handle = Some(handle),
            Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
        }
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, keys: Rc<RefCell<KeysHeld>>, time: f64) {
        let running = {
            let mut g = game.borrow_mut();
            g.frame_handle = None;
            let held = keys.borrow();
            g.frame(&held, time)
        };

        if running {
            request_animation_frame(game, keys);
        } else {
            log::info!("Frame loop stopped");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless scripted match: drives the controller with canned input and
/// records the result on an in-memory profile.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tank_strike::audio::{CueLog, SoundEffect};
    use tank_strike::input::KeysHeld;
    use tank_strike::persistence::{MemoryStorage, ProfileStore};
    use tank_strike::progression::UserProfile;
    use tank_strike::sim::MatchOutcome;
    use tank_strike::{MatchConfig, MatchController, Settings, TimestepMode};

    env_logger::init();
    log::info!("Tank Strike (native) starting headless match...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let settings = Settings {
        timestep: TimestepMode::PerFrame,
        ..Settings::default()
    };
    let config = MatchConfig {
        player_name: "HEADLESS".to_string(),
        seed,
        ..MatchConfig::default()
    };

    let outcome: Rc<RefCell<Option<MatchOutcome>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    let audio = Rc::new(RefCell::new(CueLog::default()));
    let mut controller = MatchController::start(config, &settings, move |result| {
        *sink.borrow_mut() = Some(result);
    })
    .with_audio(Box::new(Rc::clone(&audio)));

    // Sweep the arena: fire constantly while cycling through headings
    let script = ["ArrowUp", "ArrowLeft", "ArrowUp", "ArrowRight"];
    let mut keys = KeysHeld::new();
    keys.press("Space");
    let mut frames = 0u64;
    while frames < 36_000 {
        let held = script[(frames / 90) as usize % script.len()];
        for code in script {
            keys.set(code, code == held);
        }
        if !controller.frame(&keys, frames as f64 * 1000.0 / 60.0) {
            break;
        }
        frames += 1;
    }

    println!(
        "Seed {}: {} frames, level {}, score {}, lives {}, {} shots fired",
        seed,
        frames,
        controller.level(),
        controller.score(),
        controller.lives(),
        audio.borrow().count(SoundEffect::Shot)
    );

    let Some(result) = *outcome.borrow() else {
        println!("Match still running after {} frames", frames);
        return;
    };

    let mut profiles = ProfileStore::new(MemoryStorage::new());
    let recorded = profiles
        .register(UserProfile::new("HEADLESS", 0.0), 0.0)
        .and_then(|_| profiles.record_match("HEADLESS", &result, 0.0));
    match recorded {
        Ok((profile, report)) => println!(
            "Profile: level {} ({}), {} XP, +{} VP",
            profile.level,
            profile.rank().title,
            profile.xp,
            report.victory_points_gained
        ),
        Err(err) => log::error!("Failed to record match: {}", err),
    }
}
