//! Message rendering
//!
//! Converts message text into safe markup. All text is escaped first; the
//! structural passes that follow only ever insert fixed markup around text
//! that is already escaped, so no pass can reintroduce caller-controlled tags.
//!
//! User text stops after escaping. Bot and system text come from the backend
//! and go through the full formatting pipeline.


use crate::message::{Entities, Message, Sender};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

const LINE_BREAK: &str = "<br>";
const BULLET_GLYPH: &str = "•";

static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.[ \t]").expect("valid numbered marker regex"));
static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*-][ \t]").expect("valid bullet marker regex"));
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<]+").expect("valid url regex"));
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a [^>]*>.*?</a>").expect("valid anchor regex"));
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid emphasis regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Rendering switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append the intent/entities block to bot messages
    pub debug_annotations: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            debug_annotations: true,
        }
    }
}

/// What a rendered block holds. Only `Content` blocks carry message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Content,
    Timestamp,
    Debug,
}

impl BlockKind {
    fn css_class(self) -> &'static str {
        match self {
            BlockKind::Content => "message-content",
            BlockKind::Timestamp => "message-time",
            BlockKind::Debug => "message-debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub kind: BlockKind,
    pub markup: String,
}

impl RenderedBlock {
    pub fn new(kind: BlockKind, markup: impl Into<String>) -> Self {
        Self {
            kind,
            markup: markup.into(),
        }
    }

    pub fn text_content(&self) -> String {
        text_content(&self.markup)
    }
}

/// A message as it appears on the display surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Role as shown on the surface. Not restricted to known senders.
    pub role: String,
    pub blocks: Vec<RenderedBlock>,
}

impl RenderedMessage {
    pub fn new(role: impl Into<String>, blocks: Vec<RenderedBlock>) -> Self {
        Self {
            role: role.into(),
            blocks,
        }
    }

    /// First block that is neither timestamp nor debug metadata
    pub fn primary_block(&self) -> Option<&RenderedBlock> {
        self.blocks.iter().find(|b| b.kind == BlockKind::Content)
    }

    /// Text content of every block, in order
    pub fn full_text(&self) -> String {
        self.blocks.iter().map(RenderedBlock::text_content).collect()
    }

    /// Widget markup for the whole entry
    pub fn to_html(&self) -> String {
        let role = escape_html(&self.role);
        let mut html = format!(r#"<div class="message {role}-message"><div class="message-bubble">"#);
        for block in &self.blocks {
            let _ = write!(
                html,
                r#"<div class="{}">{}</div>"#,
                block.kind.css_class(),
                block.markup
            );
        }
        html.push_str("</div></div>");
        html
    }
}

/// Renders transcript messages into [`RenderedMessage`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRenderer {
    options: RenderOptions,
}

impl MessageRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, message: &Message) -> RenderedMessage {
        let sender = message.sender();
        let mut blocks = vec![RenderedBlock::new(
            BlockKind::Content,
            render_markup(message.text(), sender),
        )];

        if sender == Sender::System {
            return RenderedMessage::new(sender.as_str(), blocks);
        }

        blocks.push(RenderedBlock::new(
            BlockKind::Timestamp,
            message.timestamp().format("%H:%M").to_string(),
        ));

        if self.options.debug_annotations && sender == Sender::Bot {
            if let Some(debug) = debug_annotation(message.intent(), message.entities()) {
                blocks.push(RenderedBlock::new(BlockKind::Debug, debug));
            }
        }

        RenderedMessage::new(sender.as_str(), blocks)
    }
}

/// Markup for a message body. Untrusted (user) text is only escaped.
pub fn render_markup(text: &str, sender: Sender) -> String {
    if sender.is_trusted() {
        format_bot_text(text)
    } else {
        escape_html(text)
    }
}

/// Full formatting pipeline for backend-authored text
pub fn format_bot_text(text: &str) -> String {
    let escaped = escape_html(text);
    let with_breaks = escaped.replace('\n', LINE_BREAK);
    let numbered = rewrite_markers(&with_breaks, &NUMBERED_MARKER, None);
    let bulleted = rewrite_markers(&numbered, &BULLET_MARKER, Some(BULLET_GLYPH));
    let linked = linkify(&bulleted);
    embolden(&linked)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Visible text of a markup fragment: tags dropped, entities decoded
pub fn text_content(markup: &str) -> String {
    let stripped = TAG.replace_all(markup, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Put a line break before each list marker, optionally swapping the marker
/// for a glyph.
///
/// A marker glued to a word, `*` or `-` is not a marker, so closing `**` and
/// `--` survive. A marker that already starts a line, indented or not, gets
/// no extra break.
fn rewrite_markers(text: &str, marker: &Regex, glyph: Option<&str>) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for found in marker.find_iter(text) {
        let before = text.get(..found.start()).unwrap_or_default();
        let glued = before
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '*' | '-'));
        if glued {
            continue;
        }

        out.push_str(text.get(last..found.start()).unwrap_or_default());
        let line_start = before.trim_end_matches([' ', '\t']);
        if !(line_start.is_empty() || line_start.ends_with(LINE_BREAK)) {
            out.push_str(LINE_BREAK);
        }
        match glyph {
            Some(glyph) => {
                out.push_str(glyph);
                out.push(' ');
            }
            None => out.push_str(found.as_str()),
        }
        last = found.end();
    }

    out.push_str(text.get(last..).unwrap_or_default());
    out
}

/// Turn bare URLs into links that open in a new context.
///
/// The input is already escaped, so the URL can be placed in the attribute
/// as-is; escaping it again would double-encode `&amp;`.
fn linkify(text: &str) -> String {
    BARE_URL
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let url = &caps[0];
            format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#)
        })
        .into_owned()
}

/// `**text**` to strong emphasis, never inside link markup
fn embolden(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for anchor in ANCHOR.find_iter(text) {
        let plain = text.get(last..anchor.start()).unwrap_or_default();
        out.push_str(&STRONG.replace_all(plain, "<strong>$1</strong>"));
        out.push_str(anchor.as_str());
        last = anchor.end();
    }
    let rest = text.get(last..).unwrap_or_default();
    out.push_str(&STRONG.replace_all(rest, "<strong>$1</strong>"));
    out
}

fn debug_annotation(intent: Option<&str>, entities: Option<&Entities>) -> Option<String> {
    let entities = entities.filter(|e| !e.is_empty());
    if intent.is_none() && entities.is_none() {
        return None;
    }

    let mut markup = String::new();
    if let Some(intent) = intent {
        let _ = write!(
            markup,
            "<div><strong>Intent:</strong> {}</div>",
            escape_html(intent)
        );
    }
    if let Some(entities) = entities {
        let json = serde_json::to_string(entities).unwrap_or_default();
        let _ = write!(
            markup,
            "<div><strong>Entities:</strong> {}</div>",
            escape_html(&json)
        );
    }
    Some(markup)
}
