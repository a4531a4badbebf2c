use owo_colors::Style;
use std::sync::OnceLock;

/// Set to `1` or `true` to silence everything printed to stdout
pub const ENV_QUIET: &str = "GRAPH_EDITOR_QUIET";

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of terminal output, plus whether stdout is silenced
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    /// Icon next to an info line
    pub accent: Style,
    /// Labels in `label: value` lines
    pub label: Style,
    pub muted: Style,
    /// Node names in CLI output
    pub node: Style,
    pub quiet: bool,
}

impl Theme {
    /// Colored on a terminal unless colors are disabled (`NO_COLOR`, `CLICOLOR=0`)
    pub fn detect() -> Self {
        let colored = console::Term::stdout().is_term() && console::colors_enabled();
        Self::resolve(colored, |key| std::env::var(key).ok())
    }

    pub fn resolve(colored: bool, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut theme = if colored { Self::colored() } else { Self::plain() };
        theme.quiet = lookup(ENV_QUIET)
            .map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        theme
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            accent: Style::new().magenta(),
            label: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            node: Style::new().blue().bold(),
            quiet: false,
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            header: none,
            success: none,
            error: none,
            warn: none,
            accent: none,
            label: none,
            muted: none,
            node: none,
            quiet: false,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    fn env(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| (key == ENV_QUIET).then_some(value).flatten().map(str::to_string)
    }

    #[test]
    fn test_quiet_flag_from_env() {
        assert!(Theme::resolve(false, env(Some("1"))).quiet);
        assert!(Theme::resolve(false, env(Some(" TRUE "))).quiet);
        assert!(!Theme::resolve(false, env(Some("0"))).quiet);
        assert!(!Theme::resolve(false, env(Some("yes"))).quiet);
        assert!(!Theme::resolve(true, env(None)).quiet);
    }

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let theme = Theme::resolve(false, env(None));
        assert_eq!("Paris".style(theme.node).to_string(), "Paris");

        let theme = Theme::resolve(true, env(None));
        assert_ne!("Paris".style(theme.node).to_string(), "Paris");
    }
}
