//! Quit requests typed on the terminal.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Latches once the designated key is entered on stdin.
#[derive(Debug, Clone, Default)]
pub struct QuitKey {
    pressed: Arc<AtomicBool>,
}

impl QuitKey {
    /// A key that is only pressed programmatically.
    pub fn manual() -> Self {
        Self::default()
    }

    /// Watches stdin on a background thread for a line starting with `key`.
    pub fn watch_stdin(key: char) -> Self {
        let quit = Self::default();
        let pressed = Arc::clone(&quit.pressed);

        let spawned = std::thread::Builder::new()
            .name("quit-key".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if line.trim_start().starts_with(key) {
                        pressed.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Cannot watch stdin; quit with Ctrl-C instead");
        }

        tracing::info!("Type '{}' and press Enter to stop", key);
        quit
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_press() {
        let key = QuitKey::manual();
        let clone = key.clone();
        assert!(!key.is_pressed());
        clone.press();
        assert!(key.is_pressed());
    }
}
