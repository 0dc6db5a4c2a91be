//! Key naming
//!
//! Keys are identified by lowercase names so allow-lists can be written by
//! hand (`"space"`, `"f"`, `"return"`). Matching is case-insensitive.

use device_query::Keycode;
use std::borrow::Cow;

/// Normalise a key name for comparison
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalise an allow-list. An empty list accepts every key.
pub fn normalize_list<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| normalize(n.as_ref())).collect()
}

/// Whether `key` passes a normalised allow-list
pub fn is_allowed(allow: &[String], key: &str) -> bool {
    allow.is_empty() || allow.iter().any(|k| k == key)
}

/// Name of a device_query key code.
///
/// Codes without a name of their own fall back to their lowercased variant
/// name, so distinct keys never share a name.
pub fn key_name(keycode: Keycode) -> Cow<'static, str> {
    match named(keycode) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("{keycode:?}").to_lowercase()),
    }
}

fn named(keycode: Keycode) -> Option<&'static str> {
    use Keycode as DK;
    let name = match keycode {
        DK::Escape => "escape",
        DK::Key1 => "1",
        DK::Key2 => "2",
        DK::Key3 => "3",
        DK::Key4 => "4",
        DK::Key5 => "5",
        DK::Key6 => "6",
        DK::Key7 => "7",
        DK::Key8 => "8",
        DK::Key9 => "9",
        DK::Key0 => "0",
        DK::Minus => "minus",
        DK::Equal => "equal",
        DK::Backspace => "backspace",
        DK::Tab => "tab",
        DK::Q => "q",
        DK::W => "w",
        DK::E => "e",
        DK::R => "r",
        DK::T => "t",
        DK::Y => "y",
        DK::U => "u",
        DK::I => "i",
        DK::O => "o",
        DK::P => "p",
        DK::LeftBracket => "bracketleft",
        DK::RightBracket => "bracketright",
        DK::Enter => "return",
        DK::LControl => "lctrl",
        DK::A => "a",
        DK::S => "s",
        DK::D => "d",
        DK::F => "f",
        DK::G => "g",
        DK::H => "h",
        DK::J => "j",
        DK::K => "k",
        DK::L => "l",
        DK::Semicolon => "semicolon",
        DK::Apostrophe => "apostrophe",
        DK::Grave => "grave",
        DK::LShift => "lshift",
        DK::BackSlash => "backslash",
        DK::Z => "z",
        DK::X => "x",
        DK::C => "c",
        DK::V => "v",
        DK::B => "b",
        DK::N => "n",
        DK::M => "m",
        DK::Comma => "comma",
        DK::Dot => "period",
        DK::Slash => "slash",
        DK::RShift => "rshift",
        DK::LAlt => "lalt",
        DK::Space => "space",
        DK::CapsLock => "capslock",
        DK::F1 => "f1",
        DK::F2 => "f2",
        DK::F3 => "f3",
        DK::F4 => "f4",
        DK::F5 => "f5",
        DK::F6 => "f6",
        DK::F7 => "f7",
        DK::F8 => "f8",
        DK::F9 => "f9",
        DK::F10 => "f10",
        DK::F11 => "f11",
        DK::F12 => "f12",
        DK::RControl => "rctrl",
        DK::RAlt => "ralt",
        DK::Home => "home",
        DK::Up => "up",
        DK::PageUp => "pageup",
        DK::Left => "left",
        DK::Right => "right",
        DK::End => "end",
        DK::Down => "down",
        DK::PageDown => "pagedown",
        DK::Insert => "insert",
        DK::Delete => "delete",
        DK::LMeta => "lwindows",
        DK::RMeta => "rwindows",
        DK::Numpad0 => "num_0",
        DK::Numpad1 => "num_1",
        DK::Numpad2 => "num_2",
        DK::Numpad3 => "num_3",
        DK::Numpad4 => "num_4",
        DK::Numpad5 => "num_5",
        DK::Numpad6 => "num_6",
        DK::Numpad7 => "num_7",
        DK::Numpad8 => "num_8",
        DK::Numpad9 => "num_9",
        DK::NumpadSubtract => "num_subtract",
        DK::NumpadAdd => "num_add",
        DK::NumpadDivide => "num_divide",
        DK::NumpadMultiply => "num_multiply",
        DK::NumpadEnter => "num_enter",
        DK::NumpadDecimal => "num_decimal",
        DK::NumpadEquals => "num_equal",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercase() {
        assert_eq!(key_name(Keycode::Space), "space");
        assert_eq!(key_name(Keycode::Enter), "return");
        assert_eq!(key_name(Keycode::F), "f");
        assert_eq!(key_name(Keycode::NumpadEnter), "num_enter");
    }

    #[test]
    fn unnamed_codes_keep_distinct_names() {
        assert_eq!(key_name(Keycode::F13), "f13");
        assert_eq!(key_name(Keycode::F14), "f14");
        assert_eq!(key_name(Keycode::Command), "command");
        assert_eq!(key_name(Keycode::LOption), "loption");
        assert_ne!(key_name(Keycode::LOption), key_name(Keycode::ROption));
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let allow = normalize_list(&["F", "RETURN"]);
        assert!(is_allowed(&allow, "f"));
        assert!(is_allowed(&allow, &normalize("Return")));
        assert!(!is_allowed(&allow, "j"));
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        assert!(is_allowed(&[], "anything"));
    }
}
