use once_cell::sync::Lazy;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use thiserror::Error;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);
static PLAIN_THEME: Lazy<Theme> = Lazy::new(Theme::default);

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("no syntax definition for language {0:?}")]
    UnsupportedLanguage(String),
}

/// Highlights `text` for the language named by its file extension,
/// producing styled lines for the content pane.
///
/// An unrecognized language is a recoverable error; the caller renders
/// it as an inline message instead of failing the frame. An unknown
/// theme name silently falls back to a bundled default so a typo in
/// the config never disables highlighting.
pub fn highlight(
    text: &str,
    language: &str,
    theme: &str,
) -> Result<Text<'static>, HighlightError> {
    let syntax = SYNTAX_SET
        .find_syntax_by_extension(language)
        .or_else(|| SYNTAX_SET.find_syntax_by_token(language))
        .ok_or_else(|| HighlightError::UnsupportedLanguage(language.to_string()))?;

    let theme = resolve_theme(theme);
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for raw in text.lines() {
        let regions = highlighter
            .highlight_line(raw, &SYNTAX_SET)
            .unwrap_or_default();
        if regions.is_empty() {
            lines.push(Line::from(Span::raw(raw.to_string())));
            continue;
        }
        let spans: Vec<Span<'static>> = regions
            .into_iter()
            .map(|(style, segment)| {
                let fg = style.foreground;
                Span::styled(
                    segment.to_string(),
                    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                )
            })
            .collect();
        lines.push(Line::from(spans));
    }

    Ok(Text::from(lines))
}

fn resolve_theme(name: &str) -> &'static Theme {
    THEME_SET
        .themes
        .get(name)
        .or_else(|| THEME_SET.themes.get("base16-ocean.dark"))
        .or_else(|| THEME_SET.themes.values().next())
        .unwrap_or(&PLAIN_THEME)
}

/// Right-aligned line-number gutter for a rendered block of
/// `line_count` lines. Numbers run the height of the content and the
/// final row is the conventional `~` end-of-buffer marker.
pub fn gutter(line_count: usize) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(line_count + 1);
    for number in 1..=line_count {
        lines.push(Line::from(Span::raw(format!("{number:3} "))));
    }
    lines.push(Line::from(Span::raw("  ~ ")));
    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language() {
        let text = highlight("fn main() {}\n", "rs", "base16-ocean.dark").unwrap();
        assert_eq!(text.lines.len(), 1);
        assert!(!text.lines[0].spans.is_empty());
    }

    #[test]
    fn unknown_language_is_an_error() {
        let err = highlight("hello", "nosuchlang", "base16-ocean.dark").unwrap_err();
        assert!(matches!(err, HighlightError::UnsupportedLanguage(lang) if lang == "nosuchlang"));
    }

    #[test]
    fn unknown_theme_falls_back() {
        let text = highlight("x = 1\n", "py", "not-a-theme").unwrap();
        assert_eq!(text.lines.len(), 1);
    }

    #[test]
    fn gutter_height_matches_content() {
        let gutter = gutter(3);
        assert_eq!(gutter.lines.len(), 4);
        assert_eq!(gutter.lines[0].spans[0].content.as_ref(), "  1 ");
        assert_eq!(gutter.lines[2].spans[0].content.as_ref(), "  3 ");
        assert_eq!(gutter.lines[3].spans[0].content.as_ref(), "  ~ ");
    }

    #[test]
    fn preserves_line_count() {
        let source = "let a = 1;\nlet b = 2;\nlet c = 3;";
        let text = highlight(source, "rs", "base16-ocean.dark").unwrap();
        assert_eq!(text.lines.len(), 3);
    }
}
