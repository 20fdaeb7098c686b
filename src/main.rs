//! Balloon Race entry point
//!
//! In the browser the session is driven by DOM events and
//! `requestAnimationFrame`. Natively a scripted headless session is played
//! from the home menu to the result screen, which is handy for checking
//! tuning changes from the settings file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlImageElement, KeyboardEvent, MouseEvent};

    use balloon_race::platform::assets::{TextureHandle, TextureLoader};
    use balloon_race::platform::headless::HeadlessScene;
    use balloon_race::platform::{CameraRig, Clock, Hud, HudField};
    use balloon_race::results::RaceResult;
    use balloon_race::{Game, Settings};

    /// HUD fields are plain elements looked up by id
    struct DomHud {
        document: web_sys::Document,
    }

    impl DomHud {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Hud for DomHud {
        fn show(&mut self, field: HudField, text: &str) {
            self.set_text(field.element_id(), text);
        }

        fn show_result(&mut self, result: Option<&RaceResult>) {
            let Some(panel) = self.document.get_element_by_id("result") else {
                return;
            };
            match result {
                Some(result) => {
                    panel.set_text_content(Some(&result.headline()));
                    let _ = panel.set_attribute("class", "");
                }
                None => {
                    let _ = panel.set_attribute("class", "hidden");
                }
            }
        }
    }

    struct PerformanceClock {
        performance: Option<web_sys::Performance>,
    }

    impl Clock for PerformanceClock {
        fn now(&mut self) -> f64 {
            self.performance
                .as_ref()
                .map(|p| p.now() / 1000.0)
                .unwrap_or_else(|| js_sys::Date::now() / 1000.0)
        }
    }

    /// Loads textures as images from `assets/`
    struct ImageLoader;

    impl TextureLoader for ImageLoader {
        fn request(&mut self, handle: TextureHandle) {
            let Ok(image) = HtmlImageElement::new() else {
                handle.fail("could not create image element");
                return;
            };

            let loaded = {
                let handle = handle.clone();
                let image = image.clone();
                Closure::once(move |_event: web_sys::Event| {
                    handle.fulfil(image.natural_width(), image.natural_height());
                })
            };
            let failed = {
                let handle = handle.clone();
                Closure::once(move |_event: web_sys::Event| {
                    handle.fail("image failed to load");
                })
            };
            image.set_onload(Some(loaded.as_ref().unchecked_ref()));
            image.set_onerror(Some(failed.as_ref().unchecked_ref()));
            loaded.forget();
            failed.forget();
            image.set_src(&format!("assets/{}", handle.name()));
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Balloon Race starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let mut settings = Settings::load();
        settings.firework_seed = js_sys::Date::now() as u64;

        let game = Game::new(
            settings,
            Box::new(HeadlessScene::new()),
            CameraRig::headless(),
            Box::new(DomHud {
                document: document.clone(),
            }),
            Box::new(PerformanceClock {
                performance: window.performance(),
            }),
            Box::new(ImageLoader),
        );
        let game = Rc::new(RefCell::new(game));
        resize(&window, &game);

        setup_input_handlers(&window, game.clone());
        request_animation_frame(game);

        log::info!("Balloon Race running!");
    }

    fn resize(window: &web_sys::Window, game: &Rc<RefCell<Game>>) {
        let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(1.0);
        let height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(1.0);
        game.borrow_mut().input.on_resize(width as f32, height as f32);
    }

    fn setup_input_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                game.borrow_mut().input.on_key_down(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.on_key_up(&event.key());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut()
                    .input
                    .on_pointer_down(event.client_x() as f32, event.client_y() as f32);
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(window) = web_sys::window() {
                    resize(&window, &game);
                }
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game.borrow_mut().frame();
            request_animation_frame(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use balloon_race::platform::assets::TextureLoader;
    use balloon_race::platform::headless::{
        HeadlessHud, HeadlessScene, HeadlessTextureLoader, StepClock, SystemClock,
    };
    use balloon_race::platform::{CameraRig, Clock};
    use balloon_race::sim::{EntityId, Side};
    use balloon_race::{Game, GameState, Settings};

    /// Frames a demo race may take before giving up (five minutes at 60 fps)
    const MAX_RACE_FRAMES: usize = 60 * 300;
    const FRAME: f64 = 1.0 / 60.0;

    struct Script {
        game: Game,
        realtime: bool,
    }

    impl Script {
        fn frame(&mut self) {
            self.game.frame();
            if self.realtime {
                std::thread::sleep(std::time::Duration::from_secs_f64(FRAME));
            }
        }

        fn press(&mut self, key: &str) {
            self.game.input.on_key_down(key);
            self.frame();
            self.game.input.on_key_up(key);
            self.frame();
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.press(&c.to_string());
            }
        }

        fn click(&mut self, id: EntityId) {
            let Some(at) = self.game.screen_position(id) else {
                log::warn!("{:?} is not on screen", id);
                return;
            };
            self.game.input.on_pointer_down(at.x, at.y);
            self.frame();
        }

        fn vehicle_of(&self, side: Side) -> Option<EntityId> {
            let world = &self.game.world;
            world
                .vehicles
                .iter()
                .copied()
                .find(|id| world.entities.get(*id).is_some_and(|e| e.is_vehicle_of(side)))
        }

        fn expect_state(&self, state: GameState) -> bool {
            if self.game.state() == state {
                true
            } else {
                log::error!("Expected {}, session is in {}", state, self.game.state());
                false
            }
        }
    }

    pub fn run(realtime: bool) {
        let settings = Settings::load();
        let loader = HeadlessTextureLoader::new();
        let clock: Box<dyn Clock> = if realtime {
            Box::new(SystemClock::default())
        } else {
            Box::new(StepClock::new(FRAME))
        };
        let loader_box: Box<dyn TextureLoader> = Box::new(loader.clone());
        let hud = HeadlessHud::new();
        let game = Game::new(
            settings,
            Box::new(HeadlessScene::new()),
            CameraRig::headless(),
            Box::new(hud.clone()),
            clock,
            loader_box,
        );
        log::info!("{} textures loaded", loader.complete_all());

        let mut script = Script { game, realtime };
        script.game.input.on_resize(1280.0, 720.0);
        script.frame();

        script.type_text("pilot");
        script.press("enter");
        if !script.expect_state(GameState::PickBalloonUser) {
            return;
        }

        for side in Side::BOTH {
            if let Some(vehicle) = script.vehicle_of(side) {
                script.click(vehicle);
            }
            script.press("enter");
        }
        if !script.expect_state(GameState::PlayMenu) {
            return;
        }

        let play = script.game.world.buttons.play;
        script.click(play);
        let start = script.game.world.start_points[0];
        script.click(start);
        script.press("enter");
        if !script.expect_state(GameState::Race) {
            return;
        }

        // Climb to the fastest wind layer
        for _ in 0..4 {
            script.press("w");
        }

        let mut frames = 0;
        while script.game.state() != GameState::EndOfRace && frames < MAX_RACE_FRAMES {
            script.frame();
            frames += 1;
        }
        if !script.expect_state(GameState::EndOfRace) {
            return;
        }

        if let Some(result) = hud.result() {
            log::info!("{}", result.headline());
        }
        match serde_json::to_string_pretty(&script.game.results) {
            Ok(json) => println!("{json}"),
            Err(e) => log::warn!("Could not serialize results: {}", e),
        }

        let home = script.game.world.buttons.home;
        script.click(home);
        script.frame();
        script.expect_state(GameState::HomeMenu);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Balloon Race (native) starting...");
    let realtime = std::env::args().any(|arg| arg == "--realtime");
    demo::run(realtime);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
