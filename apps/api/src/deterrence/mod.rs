//! Screen-capture deterrence. Advisory only: it discourages casual copying of
//! the rendered resume and is not a security control. Print chords are never
//! intercepted so the export flow keeps working.

pub mod blur;

use serde::{Deserialize, Serialize};

pub use blur::{BlurController, SCREENSHOT_BLUR};

/// A key press as reported by the client, modifier flags included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Cmd on macOS, Win on Windows.
    pub meta: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    fn key_is(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|c| self.key.eq_ignore_ascii_case(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyVerdict {
    /// Default action proceeds.
    Allow,
    /// Default action is suppressed (devtools, view source).
    Suppress,
    /// Likely screenshot: blur the content for `SCREENSHOT_BLUR`.
    BlurBriefly,
}

pub fn classify_key(chord: &KeyChord) -> KeyVerdict {
    if is_print(chord) {
        return KeyVerdict::Allow;
    }
    if is_devtools(chord) {
        return KeyVerdict::Suppress;
    }
    if is_screenshot(chord) {
        return KeyVerdict::BlurBriefly;
    }
    KeyVerdict::Allow
}

/// The context menu is suppressed everywhere.
pub fn suppress_context_menu() -> bool {
    true
}

fn is_print(chord: &KeyChord) -> bool {
    (chord.ctrl || chord.meta) && !chord.shift && !chord.alt && chord.key_is(&["p"])
}

fn is_devtools(chord: &KeyChord) -> bool {
    chord.key_is(&["F12"])
        || (chord.ctrl && chord.shift && chord.key_is(&["i", "j", "c"]))
        || (chord.meta && chord.alt && chord.key_is(&["i", "j", "c", "u"]))
        || (chord.ctrl && !chord.shift && chord.key_is(&["u"]))
}

fn is_screenshot(chord: &KeyChord) -> bool {
    chord.key_is(&["PrintScreen"])
        || (chord.meta && chord.shift && chord.key_is(&["3", "4", "5", "s"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devtools_chords_are_suppressed() {
        let chords = [
            KeyChord::new("F12"),
            KeyChord::new("I").ctrl().shift(),
            KeyChord::new("J").ctrl().shift(),
            KeyChord::new("C").ctrl().shift(),
            KeyChord::new("i").meta().alt(),
            KeyChord::new("j").meta().alt(),
            KeyChord::new("c").meta().alt(),
            KeyChord::new("u").ctrl(),
            KeyChord::new("u").meta().alt(),
        ];
        for chord in chords {
            assert_eq!(classify_key(&chord), KeyVerdict::Suppress, "{chord:?}");
        }
    }

    #[test]
    fn test_screenshot_chords_blur() {
        let chords = [
            KeyChord::new("PrintScreen"),
            KeyChord::new("3").meta().shift(),
            KeyChord::new("4").meta().shift(),
            KeyChord::new("5").meta().shift(),
            KeyChord::new("S").meta().shift(),
        ];
        for chord in chords {
            assert_eq!(classify_key(&chord), KeyVerdict::BlurBriefly, "{chord:?}");
        }
    }

    #[test]
    fn test_print_and_ordinary_keys_pass_through() {
        assert_eq!(classify_key(&KeyChord::new("p").ctrl()), KeyVerdict::Allow);
        assert_eq!(classify_key(&KeyChord::new("p").meta()), KeyVerdict::Allow);
        assert_eq!(classify_key(&KeyChord::new("a")), KeyVerdict::Allow);
        assert_eq!(classify_key(&KeyChord::new("c").ctrl()), KeyVerdict::Allow);
        assert_eq!(classify_key(&KeyChord::new("3").shift()), KeyVerdict::Allow);
        assert!(suppress_context_menu());
    }

    #[test]
    fn test_chord_deserializes_with_missing_modifiers() {
        let chord: KeyChord = serde_json::from_str(r#"{"key":"F12"}"#).unwrap();
        assert_eq!(chord, KeyChord::new("F12"));
        let chord: KeyChord =
            serde_json::from_str(r#"{"key":"4","meta":true,"shift":true}"#).unwrap();
        assert_eq!(classify_key(&chord), KeyVerdict::BlurBriefly);
    }
}
