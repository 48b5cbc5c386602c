//! Keyboard gestures for history navigation.
//!
//! Ctrl/Cmd+Z steps back, Ctrl/Cmd+Shift+Z and Ctrl/Cmd+Y step forward. All of
//! them are ignored while a text input has focus so they keep their usual
//! text-editing meaning there.

/// A key press as reported by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn ctrl(key: char) -> Self {
        Self {
            key,
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryShortcut {
    StepBack,
    StepForward,
}

/// Map a key press to a history action, if it is one.
pub fn history_shortcut(chord: KeyChord, text_input_focused: bool) -> Option<HistoryShortcut> {
    if text_input_focused || !(chord.ctrl || chord.meta) {
        return None;
    }
    match chord.key.to_ascii_lowercase() {
        'z' if chord.shift => Some(HistoryShortcut::StepForward),
        'z' => Some(HistoryShortcut::StepBack),
        'y' => Some(HistoryShortcut::StepForward),
        _ => None,
    }
}
