use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use famiview_runtime::{KeyAction, KeyEvent, KeySource};
use tracing::{debug, warn};

/// How often the blocking read wakes up to expire held keys and check for
/// shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Key source reading crossterm events from the terminal.
///
/// Most terminals never report key releases, only repeated presses while a key
/// is held. A key that has not been seen for `release_timeout` is therefore
/// reported as released. System keys are handled here: `q`/`Esc` raise the
/// shared quit flag and end the source, `r` requests a reset.
pub struct TerminalKeySource {
    /// Last time each held key was seen pressed.
    pressed_keys: HashMap<char, Instant>,
    release_timeout: Duration,
    pending: VecDeque<KeyEvent>,
    quit: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
}

impl TerminalKeySource {
    pub fn new(release_timeout: Duration, quit: Arc<AtomicBool>, reset: Arc<AtomicBool>) -> Self {
        Self {
            pressed_keys: HashMap::new(),
            release_timeout,
            pending: VecDeque::new(),
            quit,
            reset,
        }
    }

    /// Queues releases for keys whose repeats stopped.
    fn expire(&mut self, now: Instant) {
        let timeout = self.release_timeout;
        let pending = &mut self.pending;
        self.pressed_keys.retain(|&key, last_seen| {
            let held = now.duration_since(*last_seen) <= timeout;
            if !held {
                pending.push_back(KeyEvent::release(key));
            }
            held
        });
    }

    fn translate(&mut self, code: KeyCode, kind: KeyEventKind, now: Instant) -> Option<KeyEvent> {
        if kind != KeyEventKind::Release {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.quit.store(true, Ordering::Release);
                    return None;
                }
                KeyCode::Char('r') => {
                    self.reset.store(true, Ordering::Release);
                    return None;
                }
                _ => {}
            }
        }

        let KeyCode::Char(key) = code else {
            return None;
        };
        let key = key.to_ascii_lowercase();
        let action = match kind {
            KeyEventKind::Release => {
                self.pressed_keys.remove(&key);
                KeyAction::Release
            }
            KeyEventKind::Press | KeyEventKind::Repeat => {
                match self.pressed_keys.insert(key, now) {
                    Some(_) => KeyAction::Repeat,
                    None => KeyAction::Press,
                }
            }
        };
        Some(KeyEvent { key, action })
    }
}

impl KeySource for TerminalKeySource {
    fn next_event(&mut self) -> Option<KeyEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.quit.load(Ordering::Acquire) {
                debug!("key source closing");
                return None;
            }

            self.expire(Instant::now());
            if !self.pending.is_empty() {
                continue;
            }

            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    warn!(%err, "terminal event poll failed");
                    self.quit.store(true, Ordering::Release);
                    return None;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(event) = self.translate(key.code, key.kind, Instant::now()) {
                        return Some(event);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "terminal event read failed");
                    self.quit.store(true, Ordering::Release);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TerminalKeySource {
        TerminalKeySource::new(
            Duration::from_millis(200),
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn repeated_press_becomes_repeat() {
        let mut source = source();
        let now = Instant::now();
        let first = source.translate(KeyCode::Char('P'), KeyEventKind::Press, now);
        let second = source.translate(KeyCode::Char('p'), KeyEventKind::Press, now);
        assert_eq!(first, Some(KeyEvent::press('p')));
        assert_eq!(second.map(|e| e.action), Some(KeyAction::Repeat));
    }

    #[test]
    fn stale_keys_are_released() {
        let mut source = source();
        let start = Instant::now();
        source.translate(KeyCode::Char('w'), KeyEventKind::Press, start);
        source.expire(start + Duration::from_millis(100));
        assert!(source.pending.is_empty());

        source.expire(start + Duration::from_millis(300));
        assert_eq!(source.pending.pop_front(), Some(KeyEvent::release('w')));
        assert!(source.pressed_keys.is_empty());
    }

    #[test]
    fn system_keys_raise_flags() {
        let mut source = source();
        let now = Instant::now();
        assert_eq!(source.translate(KeyCode::Char('r'), KeyEventKind::Press, now), None);
        assert!(source.reset.load(Ordering::Acquire));

        assert_eq!(source.translate(KeyCode::Esc, KeyEventKind::Press, now), None);
        assert!(source.quit.load(Ordering::Acquire));
        assert_eq!(source.next_event(), None);
    }

    #[test]
    fn non_character_keys_are_ignored() {
        let mut source = source();
        assert_eq!(
            source.translate(KeyCode::Enter, KeyEventKind::Press, Instant::now()),
            None
        );
    }
}
