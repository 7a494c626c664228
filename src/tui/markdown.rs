//! Markdown → ratatui `Text` renderer.
//!
//! Thin wrapper around `pulldown_cmark` that converts markdown events into
//! styled `Line`/`Span` values. Headings, bold, italic, inline code, fenced
//! code blocks (with syntect highlighting), lists, blockquotes, and links.
//!
//! The controller only sees the [`Renderer`] trait, so tests can swap in a
//! renderer that fails or returns canned output.

use std::fmt;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::core::config::StyleName;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RenderError {}

/// Converts a document body into display lines.
pub trait Renderer: Send + Sync {
    fn render(&self, body: &str, style: StyleName) -> Result<Text<'static>, RenderError>;
}

/// The default renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, body: &str, style: StyleName) -> Result<Text<'static>, RenderError> {
        render(body, style)
    }
}

/// Unstyled lines of `body`, shown when rendering fails.
pub fn plain(body: &str) -> Text<'static> {
    Text::from(
        body.lines()
            .map(|l| Line::raw(l.replace('\t', "    ")))
            .collect::<Vec<_>>(),
    )
}

/// Parse markdown content into styled `Text` for the given style.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn render(content: &str, style: StyleName) -> Result<Text<'static>, RenderError> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut w = Writer::new(Palette::for_style(style));
    for event in Parser::new_ext(content, opts) {
        w.handle(event)?;
    }
    Ok(w.text)
}

// ── Palette ─────────────────────────────────────────────────────────────────

/// Colours per style. `None` means "leave the terminal default".
struct Palette {
    base: Option<Color>,
    heading: Option<Color>,
    muted: Option<Color>,
    link: Option<Color>,
    code_fg: Option<Color>,
    code_bg: Option<Color>,
    /// syntect theme for fenced code; `None` disables highlighting.
    theme: Option<&'static str>,
}

impl Palette {
    fn for_style(style: StyleName) -> Self {
        match style {
            StyleName::Light => Palette {
                base: Some(Color::Black),
                heading: Some(Color::Blue),
                muted: Some(Color::Gray),
                link: Some(Color::Blue),
                code_fg: Some(Color::Red),
                code_bg: Some(Color::Rgb(0xee, 0xee, 0xee)),
                theme: Some("InspiredGitHub"),
            },
            StyleName::NoTty => Palette {
                base: None,
                heading: None,
                muted: None,
                link: None,
                code_fg: None,
                code_bg: None,
                theme: None,
            },
            StyleName::Dark | StyleName::Auto => Palette {
                base: Some(Color::Gray),
                heading: Some(Color::Magenta),
                muted: Some(Color::DarkGray),
                link: Some(Color::Cyan),
                code_fg: Some(Color::White),
                code_bg: Some(Color::DarkGray),
                theme: Some("base16-ocean.dark"),
            },
        }
    }

    fn fg(color: Option<Color>) -> Style {
        color.map_or_else(Style::default, |c| Style::default().fg(c))
    }

    fn muted(&self) -> Style {
        Self::fg(self.muted)
    }

    fn link(&self) -> Style {
        Self::fg(self.link).add_modifier(Modifier::UNDERLINED)
    }

    fn inline_code(&self) -> Style {
        let style = Self::fg(self.code_fg);
        match self.code_bg {
            Some(bg) => style.bg(bg),
            None => style,
        }
    }
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    palette: Palette,
    /// Inline style stack (bold, italic, heading text, etc.). Styles compose
    /// via `patch` so nested bold+italic works.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote `│`).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    /// Active syntax highlighter for fenced code blocks.
    highlighter: Option<HighlightLines<'static>>,
    /// True when inside a fenced code block without syntax highlighting.
    in_plain_code: bool,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    /// Whether the next block element should be preceded by a blank line.
    needs_newline: bool,
}

impl Writer {
    fn new(palette: Palette) -> Self {
        Self {
            text: Text::default(),
            palette,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            highlighter: None,
            in_plain_code: false,
            link_url: None,
            needs_newline: false,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    /// Current effective style: top of stack, or base foreground color.
    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Palette::fg(self.palette.base))
    }

    /// Push a style that composes with the current one (inherits parent modifiers).
    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    fn handle(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t)?,
            Event::Code(c) => self.inline_code(c),
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.push_line(Line::default()),
            Event::Rule => {
                self.blank_line_if_needed();
                self.push_line(Line::from(Span::styled("─".repeat(40), self.palette.muted())));
                self.needs_newline = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(Span::raw(marker));
            }
            _ => {} // HTML, footnotes, math — skip
        }
        Ok(())
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            // ── Block elements ──────────────────────────────────────────
            Tag::Paragraph => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.blank_line_if_needed();
                let hs = heading_style(self.palette.heading, level);
                let depth = heading_depth(level) as usize;
                self.push_line(Line::from(Span::styled(format!("{} ", "#".repeat(depth)), hs)));
                self.push_style(hs);
            }
            Tag::BlockQuote(_) => {
                self.blank_line_if_needed();
                self.line_prefixes.push(Span::styled("│ ", self.palette.muted()));
                self.push_style(
                    Palette::fg(self.palette.base).add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            Tag::CodeBlock(kind) => {
                if !self.text.lines.is_empty() {
                    self.push_line(Line::default());
                }
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.as_ref(),
                    CodeBlockKind::Indented => "",
                };

                // Top border: ╭── lang  or just ╭──
                let bs = self.palette.muted();
                let top = if lang.is_empty() {
                    Line::from(Span::styled("╭──", bs))
                } else {
                    Line::from(vec![
                        Span::styled("╭── ", bs),
                        Span::styled(lang.to_owned(), bs.add_modifier(Modifier::BOLD)),
                        Span::styled(" ──", bs),
                    ])
                };
                self.push_line(top);
                self.line_prefixes.push(Span::styled("│ ", bs));

                if !lang.is_empty()
                    && let Some(theme) = self.palette.theme.and_then(|t| THEME_SET.themes.get(t))
                    && let Some(syn) = SYNTAX_SET.find_syntax_by_token(lang)
                {
                    self.highlighter = Some(HighlightLines::new(syn, theme));
                }
                if self.highlighter.is_none() {
                    self.in_plain_code = true;
                }
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.push_line(Line::default());
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let muted = self.palette.muted();
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}• "),
                        Some(n) => {
                            let s = format!("{indent}{n}. ");
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, muted));
                }
            }

            // ── Inline elements ─────────────────────────────────────────
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(self.palette.link());
            }
            _ => {} // Tables, images, definitions — skip
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.needs_newline = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::CodeBlock => {
                self.highlighter = None;
                self.in_plain_code = false;
                self.line_prefixes.pop(); // remove │ prefix before bottom border
                self.push_line(Line::from(Span::styled("╰──", self.palette.muted())));
                self.needs_newline = true;
            }
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            TagEnd::Item => {}
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" ("));
                    self.push_span(Span::styled(url, self.palette.link()));
                    self.push_span(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    // ── Content handlers ────────────────────────────────────────────────

    fn text(&mut self, cow: CowStr<'_>) -> Result<(), RenderError> {
        // Expand tabs → 4 spaces (ratatui renders \t as zero-width)
        let text = cow.replace('\t', "    ");

        // Take the highlighter out: highlight_line borrows it, push_line borrows self
        if let Some(mut hl) = self.highlighter.take() {
            for line in LinesWithEndings::from(text.as_str()) {
                let ranges = hl
                    .highlight_line(line, &SYNTAX_SET)
                    .map_err(|e| RenderError(format!("syntax highlighting failed: {e}")))?;
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .filter_map(|(hl_style, frag)| {
                        let content = frag.trim_end_matches('\n');
                        if content.is_empty() {
                            return None;
                        }
                        let fg = Color::Rgb(
                            hl_style.foreground.r,
                            hl_style.foreground.g,
                            hl_style.foreground.b,
                        );
                        Some(Span::styled(content.to_owned(), Style::default().fg(fg)))
                    })
                    .collect();
                self.push_line(Line::from(spans));
            }
            self.highlighter = Some(hl);
            return Ok(());
        }

        if self.in_plain_code {
            let code_style = Palette::fg(self.palette.code_fg);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return Ok(());
        }

        // Normal text — inherits current style (heading, bold, etc.)
        let style = self.style();
        self.push_span(Span::styled(text, style));
        Ok(())
    }

    fn inline_code(&mut self, cow: CowStr<'_>) {
        self.push_span(Span::styled(cow.to_string(), self.palette.inline_code()));
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn heading_style(color: Option<Color>, level: HeadingLevel) -> Style {
    let base = Palette::fg(color);
    match level {
        HeadingLevel::H1 => base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => base.add_modifier(Modifier::BOLD),
        _ => base.add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
