use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct ThemePalette {
    pub name: &'static str,
    pub accent_primary: Color,
    pub accent_subtle: Color,
    pub marker_open: Color,
    pub marker_resolved: Color,
    pub bg_app: Color,
    pub bg_canvas: Color,
    pub text_primary: Color,
    pub text_muted: Color,
    pub border_panel: Color,
    pub border_focus: Color,
    pub bg_dialog: Color,
    pub bg_input: Color,
    pub bg_tooltip: Color,
    pub cursor: Color,
}

pub const THEMES: [ThemePalette; 3] = [
    ThemePalette {
        name: "slate",
        accent_primary: Color::Rgb(64, 150, 255),
        accent_subtle: Color::Rgb(145, 171, 255),
        marker_open: Color::Rgb(245, 108, 108),
        marker_resolved: Color::Rgb(82, 196, 26),
        bg_app: Color::Rgb(0, 0, 0),
        bg_canvas: Color::Rgb(10, 12, 18),
        text_primary: Color::Rgb(226, 235, 255),
        text_muted: Color::Rgb(124, 138, 175),
        border_panel: Color::Rgb(35, 50, 88),
        border_focus: Color::Rgb(105, 138, 255),
        bg_dialog: Color::Rgb(20, 24, 34),
        bg_input: Color::Rgb(30, 36, 50),
        bg_tooltip: Color::Rgb(60, 60, 60),
        cursor: Color::Rgb(250, 204, 21),
    },
    ThemePalette {
        name: "midnight",
        accent_primary: Color::Rgb(91, 157, 255),
        accent_subtle: Color::Rgb(166, 189, 255),
        marker_open: Color::Rgb(238, 111, 129),
        marker_resolved: Color::Rgb(68, 201, 127),
        bg_app: Color::Rgb(9, 13, 20),
        bg_canvas: Color::Rgb(15, 20, 31),
        text_primary: Color::Rgb(226, 234, 250),
        text_muted: Color::Rgb(141, 157, 190),
        border_panel: Color::Rgb(39, 57, 98),
        border_focus: Color::Rgb(115, 156, 255),
        bg_dialog: Color::Rgb(18, 24, 37),
        bg_input: Color::Rgb(28, 42, 71),
        bg_tooltip: Color::Rgb(44, 51, 66),
        cursor: Color::Rgb(255, 214, 102),
    },
    ThemePalette {
        name: "paper",
        accent_primary: Color::Rgb(24, 144, 255),
        accent_subtle: Color::Rgb(89, 126, 247),
        marker_open: Color::Rgb(207, 19, 34),
        marker_resolved: Color::Rgb(56, 158, 13),
        bg_app: Color::Rgb(240, 242, 245),
        bg_canvas: Color::Rgb(250, 250, 250),
        text_primary: Color::Rgb(38, 38, 38),
        text_muted: Color::Rgb(140, 140, 140),
        border_panel: Color::Rgb(217, 217, 217),
        border_focus: Color::Rgb(24, 144, 255),
        bg_dialog: Color::Rgb(255, 255, 255),
        bg_input: Color::Rgb(245, 245, 245),
        bg_tooltip: Color::Rgb(38, 38, 38),
        cursor: Color::Rgb(212, 107, 8),
    },
];

pub fn resolve_theme(name: Option<&str>) -> &'static ThemePalette {
    if let Some(name) = name
        && let Some(theme) = THEMES
            .iter()
            .find(|theme| theme.name.eq_ignore_ascii_case(name))
    {
        return theme;
    }
    default_theme()
}

pub fn default_theme() -> &'static ThemePalette {
    &THEMES[0]
}

#[cfg(test)]
mod tests {
    use super::{default_theme, resolve_theme};

    #[test]
    fn resolves_known_theme_case_insensitive() {
        let theme = resolve_theme(Some("PaPeR"));
        assert_eq!(theme.name, "paper");
    }

    #[test]
    fn falls_back_to_default_for_unknown_or_missing_theme() {
        assert_eq!(resolve_theme(Some("neon")).name, default_theme().name);
        assert_eq!(resolve_theme(None).name, "slate");
    }
}
