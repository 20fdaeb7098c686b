//! Edge and hold aware input dispatch
//!
//! Raw key, pointer and resize signals are buffered between frames and turned
//! into discrete events once per tick by [`InputDispatcher::update`]:
//!
//! - `OnDown` fires once, on the first tick a key is held
//! - `WhileHeld` fires on every tick the key is held, including the first
//! - `OnUp` fires once, on the tick after the key was released
//!
//! Only keys in the current whitelist are recorded as pressed. Pointer clicks
//! and viewport resizes arrive as the synthetic one-shot keys [`MOUSE_CLICK`]
//! and [`RESIZE`], which fire their `OnUp` bindings.
//!
//! Bindings are plain `(subscriber, trigger, action)` records. `update` never
//! calls back into the game; it returns what fired and the caller applies it.

use std::collections::HashMap;

use glam::Vec2;

use crate::sim::GameState;

/// Synthetic key queued when the viewport changes size
pub const RESIZE: &str = "resize";
/// Synthetic key queued on pointer down
pub const MOUSE_CLICK: &str = "mouseclick";

/// Keys accepted while typing a name on the home menu
pub const MENU_KEYS: [&str; 39] = [
    "enter", " ", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p",
    "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    "0", "backspace",
];

/// Keys accepted from vehicle picking onwards
pub const GAME_KEYS: [&str; 18] = [
    "w", "s", "t", "f", "g", "h", "shift", " ", "enter", "escape", "1", "3", "0", "arrowup",
    "arrowleft", "arrowright", "arrowdown", "capslock",
];

/// When a binding fires relative to the key's press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    OnDown,
    OnUp,
    WhileHeld,
}

/// A registered interest in a key
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<S, A> {
    pub subscriber: S,
    pub trigger: TriggerKind,
    pub action: A,
}

/// A binding that fired during [`InputDispatcher::update`]
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<S, A> {
    pub subscriber: S,
    pub action: A,
    pub trigger: TriggerKind,
    /// The key that triggered it (lower-cased)
    pub key: String,
}

/// Keyboard/pointer state and the per-key binding registry
#[derive(Debug, Clone)]
pub struct InputDispatcher<S, A> {
    /// Keys currently allowed to be recorded as pressed
    pressable: Vec<String>,
    /// Held keys and the number of ticks each has been held, in press order
    held: Vec<(String, u32)>,
    /// Keys released (and synthetic signals raised) since the last update
    released: Vec<String>,
    bindings: HashMap<String, Vec<Binding<S, A>>>,
    /// Last pointer position, normalized to -1..1 with y up
    pointer: Vec2,
    /// Last known viewport size in pixels
    viewport: Vec2,
}

impl<S, A> Default for InputDispatcher<S, A> {
    fn default() -> Self {
        Self {
            pressable: Vec::new(),
            held: Vec::new(),
            released: Vec::new(),
            bindings: HashMap::new(),
            pointer: Vec2::ZERO,
            viewport: Vec2::ONE,
        }
    }
}

impl<S, A> InputDispatcher<S, A>
where
    S: Clone + PartialEq,
    A: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pressable-key whitelist
    ///
    /// Keys already held stay held and still fire `OnUp` when released.
    pub fn set_mode(&mut self, keys: &[&str]) {
        self.pressable = keys.iter().map(|k| k.to_lowercase()).collect();
    }

    pub fn use_menu_keys(&mut self) {
        self.set_mode(&MENU_KEYS);
    }

    pub fn use_game_keys(&mut self) {
        self.set_mode(&GAME_KEYS);
    }

    /// React to a state change: the home menu types, everything after picks and races
    pub fn update_state(&mut self, state: GameState) {
        match state {
            GameState::SetupHomeMenu => {
                self.use_menu_keys();
                log::debug!("Input whitelist: menu keys");
            }
            GameState::SetupPickBalloonUser => {
                self.use_game_keys();
                log::debug!("Input whitelist: game keys");
            }
            other => log::debug!("Input dispatcher ignores {}", other),
        }
    }

    pub fn on_key_down(&mut self, key: &str) {
        let key = key.to_lowercase();
        if !self.pressable.contains(&key) {
            return;
        }
        if !self.held.iter().any(|(k, _)| *k == key) {
            self.held.push((key, 0));
        }
    }

    pub fn on_key_up(&mut self, key: &str) {
        let key = key.to_lowercase();
        let Some(index) = self.held.iter().position(|(k, _)| *k == key) else {
            return;
        };
        self.held.remove(index);
        self.queue(key);
    }

    /// Record a pointer press at window pixel coordinates
    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        let size = self.viewport.max(Vec2::ONE);
        self.pointer = Vec2::new(x / size.x * 2.0 - 1.0, -(y / size.y) * 2.0 + 1.0);
        self.queue(MOUSE_CLICK.to_string());
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.queue(RESIZE.to_string());
    }

    fn queue(&mut self, key: String) {
        if !self.released.contains(&key) {
            self.released.push(key);
        }
    }

    /// Register a binding; duplicates are kept
    pub fn connect(&mut self, subscriber: S, action: A, key: &str, trigger: TriggerKind) {
        self.bindings
            .entry(key.to_lowercase())
            .or_default()
            .push(Binding {
                subscriber,
                trigger,
                action,
            });
    }

    /// Bind every key of the current whitelist to the same action
    pub fn connect_all_keys(&mut self, subscriber: S, action: A, trigger: TriggerKind) {
        let keys = self.pressable.clone();
        for key in keys {
            self.connect(subscriber.clone(), action.clone(), &key, trigger);
        }
    }

    /// Remove the first binding of `subscriber` on `key`; returns whether one was removed
    pub fn disconnect(&mut self, subscriber: &S, key: &str) -> bool {
        let key = key.to_lowercase();
        let Some(list) = self.bindings.get_mut(&key) else {
            return false;
        };
        let Some(index) = list.iter().position(|b| b.subscriber == *subscriber) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            self.bindings.remove(&key);
        }
        true
    }

    /// Remove one binding of `subscriber` from every key of the current whitelist
    pub fn disconnect_all_keys(&mut self, subscriber: &S) {
        let keys = self.pressable.clone();
        for key in keys {
            self.disconnect(subscriber, &key);
        }
    }

    pub fn bindings_for(&self, key: &str) -> &[Binding<S, A>] {
        self.bindings
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held_frames(key).is_some()
    }

    /// Ticks a key has been held for, if it is held
    pub fn held_frames(&self, key: &str) -> Option<u32> {
        let key = key.to_lowercase();
        self.held.iter().find(|(k, _)| *k == key).map(|(_, n)| *n)
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Classify this tick's input and return the bindings that fired, in order
    ///
    /// Released keys and synthetic signals come first (`OnUp`), then held keys
    /// in press order (`OnDown` on their first tick, `WhileHeld` every tick).
    pub fn update(&mut self) -> Vec<Fired<S, A>> {
        let mut fired = Vec::new();

        for key in self.released.drain(..) {
            if let Some(list) = self.bindings.get(&key) {
                for binding in list.iter().filter(|b| b.trigger == TriggerKind::OnUp) {
                    fired.push(Fired {
                        subscriber: binding.subscriber.clone(),
                        action: binding.action.clone(),
                        trigger: TriggerKind::OnUp,
                        key: key.clone(),
                    });
                }
            }
        }

        for (key, frames) in self.held.iter_mut() {
            if let Some(list) = self.bindings.get(key.as_str()) {
                for binding in list {
                    let fires = match binding.trigger {
                        TriggerKind::OnDown => *frames == 0,
                        TriggerKind::WhileHeld => true,
                        TriggerKind::OnUp => false,
                    };
                    if fires {
                        fired.push(Fired {
                            subscriber: binding.subscriber.clone(),
                            action: binding.action.clone(),
                            trigger: binding.trigger,
                            key: key.clone(),
                        });
                    }
                }
            }
            *frames += 1;
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Who {
        Player,
        Menu,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Act {
        Down,
        Up,
        Hold,
        Type,
    }

    type Dispatcher = InputDispatcher<Who, Act>;

    fn count(fired: &[Fired<Who, Act>], act: Act) -> usize {
        fired.iter().filter(|f| f.action == act).count()
    }

    #[test]
    fn test_menu_and_game_key_sets() {
        assert_eq!(MENU_KEYS.len(), 39);
        assert_eq!(GAME_KEYS.len(), 18);
        assert!(MENU_KEYS.contains(&"backspace"));
        assert!(!MENU_KEYS.contains(&"escape"));
        assert!(GAME_KEYS.contains(&"capslock"));
    }

    #[test]
    fn test_hold_for_five_ticks() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Down, "w", TriggerKind::OnDown);
        input.connect(Who::Player, Act::Hold, "w", TriggerKind::WhileHeld);
        input.connect(Who::Player, Act::Up, "w", TriggerKind::OnUp);

        input.on_key_down("w");
        let mut fired = Vec::new();
        for _ in 0..5 {
            fired.extend(input.update());
        }
        assert_eq!(input.held_frames("w"), Some(5));

        input.on_key_up("w");
        fired.extend(input.update());

        assert_eq!(count(&fired, Act::Down), 1);
        assert_eq!(count(&fired, Act::Hold), 5);
        assert_eq!(count(&fired, Act::Up), 1);
        assert!(!input.is_held("w"));
        assert!(input.update().is_empty());
    }

    #[test]
    fn test_keys_outside_whitelist_are_ignored() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Down, "q", TriggerKind::OnDown);
        input.on_key_down("q");
        assert!(!input.is_held("q"));
        assert!(input.update().is_empty());
    }

    #[test]
    fn test_whitelist_swap_keeps_held_keys() {
        let mut input = Dispatcher::new();
        input.use_menu_keys();
        input.connect(Who::Menu, Act::Up, "a", TriggerKind::OnUp);
        input.on_key_down("a");
        input.update();

        input.use_game_keys();
        assert!(input.is_held("a"));
        input.on_key_up("a");
        let fired = input.update();
        assert_eq!(count(&fired, Act::Up), 1);
    }

    #[test]
    fn test_key_names_are_lowercased() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Down, "Enter", TriggerKind::OnDown);
        input.on_key_down("ENTER");
        assert!(input.is_held("enter"));
        assert_eq!(count(&input.update(), Act::Down), 1);
    }

    #[test]
    fn test_repeated_keydown_does_not_restart_hold() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Down, "s", TriggerKind::OnDown);
        input.on_key_down("s");
        input.update();
        input.on_key_down("s");
        assert_eq!(count(&input.update(), Act::Down), 0);
        assert_eq!(input.held_frames("s"), Some(2));
    }

    #[test]
    fn test_release_of_unheld_key_is_noop() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Up, "w", TriggerKind::OnUp);
        input.on_key_up("w");
        assert!(input.update().is_empty());
    }

    #[test]
    fn test_disconnect_removes_first_match_only() {
        let mut input = Dispatcher::new();
        input.connect(Who::Player, Act::Down, "w", TriggerKind::OnDown);
        input.connect(Who::Menu, Act::Type, "w", TriggerKind::OnDown);
        input.connect(Who::Player, Act::Hold, "w", TriggerKind::WhileHeld);

        assert!(input.disconnect(&Who::Player, "w"));
        let left: Vec<Act> = input.bindings_for("w").iter().map(|b| b.action).collect();
        assert_eq!(left, vec![Act::Type, Act::Hold]);

        assert!(input.disconnect(&Who::Player, "w"));
        assert!(!input.disconnect(&Who::Player, "w"));
        assert!(!input.disconnect(&Who::Player, "missing"));
        assert_eq!(input.bindings_for("w").len(), 1);
    }

    #[test]
    fn test_connect_all_keys_covers_whitelist() {
        let mut input = Dispatcher::new();
        input.use_menu_keys();
        input.connect_all_keys(Who::Menu, Act::Type, TriggerKind::OnDown);
        for key in MENU_KEYS {
            assert_eq!(input.bindings_for(key).len(), 1, "key {key:?}");
        }

        input.on_key_down("h");
        input.on_key_down("i");
        let fired = input.update();
        let keys: Vec<&str> = fired.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["h", "i"]);

        input.disconnect_all_keys(&Who::Menu);
        assert!(MENU_KEYS.iter().all(|k| input.bindings_for(k).is_empty()));
    }

    #[test]
    fn test_pointer_is_normalized() {
        let mut input = Dispatcher::new();
        input.on_resize(800.0, 600.0);
        input.update();

        input.on_pointer_down(200.0, 150.0);
        let p = input.pointer();
        assert!((p.x + 0.5).abs() < 1e-6);
        assert!((p.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_synthetic_signals_fire_once() {
        let mut input = Dispatcher::new();
        input.connect(Who::Player, Act::Up, MOUSE_CLICK, TriggerKind::OnUp);
        input.connect(Who::Menu, Act::Up, RESIZE, TriggerKind::OnUp);

        input.on_pointer_down(10.0, 10.0);
        input.on_pointer_down(20.0, 20.0);
        input.on_resize(640.0, 480.0);
        let fired = input.update();
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].subscriber, Who::Player);
        assert_eq!(fired[1].subscriber, Who::Menu);
        assert!(input.update().is_empty());
        assert_eq!(input.viewport(), Vec2::new(640.0, 480.0));
    }

    #[test]
    fn test_fired_list_is_independent_of_later_changes() {
        let mut input = Dispatcher::new();
        input.use_game_keys();
        input.connect(Who::Player, Act::Down, "enter", TriggerKind::OnDown);
        input.on_key_down("enter");
        let fired = input.update();
        input.disconnect(&Who::Player, "enter");
        input.connect(Who::Menu, Act::Hold, "enter", TriggerKind::WhileHeld);
        assert_eq!(fired.len(), 1);
        assert_eq!(count(&input.update(), Act::Hold), 1);
    }
}
