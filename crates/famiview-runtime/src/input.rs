//! Input Capture actor: translates key events into controller bits.
//!
//! The actor is the only writer of the shared [`ControllerState`]. Each event
//! flips exactly one button bit with an atomic update, so the PPU thread may
//! sample the vector at any time without seeing unrelated bits change.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use famiview_core::{Button, ControllerState};
use tracing::{debug, trace};

use crate::RuntimeError;

const THREAD_NAME: &str = "input-capture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Release,
    /// Auto-repeat while a key is held. Never changes button state.
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: char,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn press(key: char) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    pub fn release(key: char) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }
}

/// Blocking source of key events. `None` means the source is exhausted and
/// the capture thread should exit.
pub trait KeySource: Send {
    fn next_event(&mut self) -> Option<KeyEvent>;
}

impl<I> KeySource for I
where
    I: Iterator<Item = KeyEvent> + Send,
{
    fn next_event(&mut self) -> Option<KeyEvent> {
        self.next()
    }
}

/// Default layout: `p o b n` for A B Select Start, `w s a d` for the pad.
pub const DEFAULT_LAYOUT: [(char, Button); 8] = [
    ('p', Button::A),
    ('o', Button::B),
    ('b', Button::Select),
    ('n', Button::Start),
    ('w', Button::Up),
    ('s', Button::Down),
    ('a', Button::Left),
    ('d', Button::Right),
];

/// Key to button bindings. Lookups ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<char, Button>,
}

impl Default for Keymap {
    fn default() -> Self {
        DEFAULT_LAYOUT.into_iter().collect()
    }
}

impl FromIterator<(char, Button)> for Keymap {
    fn from_iter<T: IntoIterator<Item = (char, Button)>>(iter: T) -> Self {
        let mut keymap = Keymap::empty();
        for (key, button) in iter {
            keymap.bind(key, button);
        }
        keymap
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `key` to `button`, replacing any earlier binding of that key.
    pub fn bind(&mut self, key: char, button: Button) -> &mut Self {
        self.bindings.insert(key.to_ascii_lowercase(), button);
        self
    }

    pub fn button(&self, key: char) -> Option<Button> {
        self.bindings.get(&key.to_ascii_lowercase()).copied()
    }

    /// Applies one event to `state`. Returns the button that changed, if any.
    pub fn apply(&self, state: &ControllerState, event: KeyEvent) -> Option<Button> {
        let pressed = match event.action {
            KeyAction::Press => true,
            KeyAction::Release => false,
            KeyAction::Repeat => return None,
        };
        let button = self.button(event.key)?;
        state.set(button, pressed);
        Some(button)
    }
}

/// Spawner for the capture thread.
pub struct InputCapture;

impl InputCapture {
    /// Starts a thread that feeds events from `source` into `state` until the
    /// source is exhausted or [`InputCaptureHandle::stop`] is observed. The
    /// stop flag is checked between events, so a blocked source delays exit
    /// until its next event.
    pub fn spawn(
        source: impl KeySource + 'static,
        keymap: Keymap,
        state: ControllerState,
    ) -> Result<InputCaptureHandle, RuntimeError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let join = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || capture_loop(source, &keymap, &state, &thread_stop))
            .map_err(|source| RuntimeError::Spawn {
                name: THREAD_NAME,
                source,
            })?;

        Ok(InputCaptureHandle { stop, join })
    }
}

fn capture_loop(
    mut source: impl KeySource,
    keymap: &Keymap,
    state: &ControllerState,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Acquire) {
        let Some(event) = source.next_event() else {
            debug!("key source exhausted");
            break;
        };
        if let Some(button) = keymap.apply(state, event) {
            trace!(?button, action = ?event.action, bits = state.bits(), "controller updated");
        }
    }
}

pub struct InputCaptureHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl InputCaptureHandle {
    /// Requests a cooperative stop.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn join(self) {
        let _ = self.join.join();
    }
}
