use std::collections::{HashMap, HashSet};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct BindingSpec {
    pub action: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Canvas-mode bindings. Dialog input is never remapped: every printable key
/// typed into a dialog belongs to the draft.
pub const BINDING_SPECS: &[BindingSpec] = &[
    BindingSpec { action: "quit", default: "q", description: "Quit" },
    BindingSpec { action: "open_issue", default: "enter", description: "Open issue under cursor" },
    BindingSpec { action: "new_issue", default: "n", description: "New issue at cursor" },
    BindingSpec { action: "next_issue", default: "tab", description: "Jump to next issue" },
    BindingSpec {
        action: "toggle_resolved",
        default: "r",
        description: "Show or hide resolved markers",
    },
    BindingSpec {
        action: "focus_dialogs",
        default: "ctrl+o",
        description: "Move focus between canvas and dialogs",
    },
    BindingSpec { action: "pan_left", default: "ctrl+left", description: "Pan canvas left" },
    BindingSpec { action: "pan_right", default: "ctrl+right", description: "Pan canvas right" },
    BindingSpec { action: "pan_up", default: "ctrl+up", description: "Pan canvas up" },
    BindingSpec { action: "pan_down", default: "ctrl+down", description: "Pan canvas down" },
];

pub fn help_line() -> String {
    BINDING_SPECS
        .iter()
        .filter(|spec| !spec.action.starts_with("pan_"))
        .map(|spec| format!("{} {}", spec.default, spec.description.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" · ")
}

#[derive(Debug, Default, Clone)]
pub struct Keybinds {
    remap: HashMap<String, KeyEvent>,
    disabled_defaults: HashSet<String>,
}

impl Keybinds {
    pub fn from_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut remap = HashMap::new();
        let mut disabled_defaults = HashSet::new();

        for spec in BINDING_SPECS {
            let Some(default_event) = parse_binding(spec.default) else {
                continue;
            };
            let default_key = normalize_event(default_event);
            let override_key = overrides
                .get(spec.action)
                .and_then(|binding| normalize_binding(binding));

            match override_key {
                Some(override_key) if override_key != default_key => {
                    remap.insert(override_key, default_event);
                    disabled_defaults.insert(default_key);
                }
                _ => {
                    remap.insert(default_key, default_event);
                }
            }
        }

        // A default stays live when another action still claims it.
        for key in remap.keys() {
            disabled_defaults.remove(key);
        }

        Self {
            remap,
            disabled_defaults,
        }
    }

    pub fn remap_key(&self, key: KeyEvent) -> Option<KeyEvent> {
        let normalized = normalize_event(key);
        if let Some(mapped) = self.remap.get(normalized.as_str()) {
            return Some(KeyEvent::new(mapped.code, mapped.modifiers));
        }
        if self.disabled_defaults.contains(normalized.as_str()) {
            return None;
        }
        Some(key)
    }
}

pub fn parse_binding(binding: &str) -> Option<KeyEvent> {
    let tokens = binding
        .split('+')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<&str>>();
    let (key_token_raw, modifier_tokens) = tokens.split_last()?;

    let mut modifiers = KeyModifiers::empty();
    for token in modifier_tokens {
        modifiers |= match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return None,
        };
    }

    let code = match key_token_raw.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let mut chars = key_token_raw.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(ch.to_ascii_lowercase())
        }
    };

    Some(KeyEvent::new(code, modifiers))
}

pub fn normalize_binding(binding: &str) -> Option<String> {
    parse_binding(binding).map(normalize_event)
}

pub fn normalize_event(event: KeyEvent) -> String {
    let key = match event.code {
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
        _ => return String::new(),
    };

    let mut tokens = Vec::new();
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        tokens.push("ctrl".to_string());
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        tokens.push("alt".to_string());
    }
    if event.modifiers.contains(KeyModifiers::SHIFT) {
        tokens.push("shift".to_string());
    }
    tokens.push(key);
    tokens.join("+")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::{Keybinds, help_line, normalize_binding, parse_binding};

    #[test]
    fn parse_binding_supports_named_keys_and_modifiers() {
        let key = parse_binding("ctrl+shift+left").expect("parse binding");
        assert_eq!(key.code, KeyCode::Left);
        assert!(key.modifiers.contains(KeyModifiers::CONTROL));
        assert!(key.modifiers.contains(KeyModifiers::SHIFT));
        assert!(parse_binding("hyper+x").is_none());
        assert!(parse_binding("").is_none());
    }

    #[test]
    fn normalize_binding_converts_aliases() {
        let binding = normalize_binding("Control+Return").expect("normalize binding");
        assert_eq!(binding, "ctrl+enter");
    }

    #[test]
    fn override_maps_to_default_and_disables_old_key() {
        let mut overrides = HashMap::new();
        overrides.insert("new_issue".to_string(), "a".to_string());
        let keybinds = Keybinds::from_overrides(&overrides);

        let remapped = keybinds
            .remap_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE))
            .expect("remapped key");
        assert_eq!(remapped.code, KeyCode::Char('n'));
        assert!(
            keybinds
                .remap_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE))
                .is_none()
        );
    }

    #[test]
    fn unbound_keys_pass_through() {
        let keybinds = Keybinds::from_overrides(&HashMap::new());
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(keybinds.remap_key(key), Some(key));
    }

    #[test]
    fn help_line_skips_pan_bindings() {
        let help = help_line();
        assert!(help.contains("n new issue at cursor"));
        assert!(!help.contains("pan"));
    }
}
