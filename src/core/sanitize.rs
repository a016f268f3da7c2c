//! Text sanitization for speech engines
//!
//! Strips pictographic content and decorative glyphs that speech engines either
//! read aloud literally ("white heavy check mark") or choke on, then normalizes
//! whitespace. Both the remote avatar channel and the local synthesis channel
//! receive text that went through [`sanitize`].

use once_cell::sync::Lazy;
use regex::Regex;

// Pre-compiled regex patterns
//
// Emoji and symbol blocks. U+24C2 is the lone circled "M"; the enclosed
// alphanumeric and ideographic supplements start at U+1F170. Variation
// selectors and the zero-width joiner are left behind by emoji sequences.
static PICTOGRAPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F600}-\x{1F64F}",
        r"\x{1F300}-\x{1F5FF}",
        r"\x{1F680}-\x{1F6FF}",
        r"\x{1F1E0}-\x{1F1FF}",
        r"\x{2702}-\x{27B0}",
        r"\x{24C2}",
        r"\x{1F170}-\x{1F251}",
        r"\x{1F900}-\x{1F9FF}",
        r"\x{1FA00}-\x{1FA6F}",
        r"\x{1FA70}-\x{1FAFF}",
        r"\x{2600}-\x{26FF}",
        r"\x{2700}-\x{27BF}",
        r"\x{2B00}-\x{2BFF}",
        r"\x{FE0E}\x{FE0F}\x{200D}",
        "]"
    ))
    .unwrap()
});

// Arrows, bullets, checkmarks, stars and play/pause triangles used as list
// decoration. Replaced with a space so the words around them stay apart.
static DECORATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new("[→•✓✔✅❌⭐★►▶◄◀]").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize text so it is safe to hand to a speech engine.
///
/// Accepts either `&str` or `Option<&str>`; absent input yields an empty string.
///
/// The transformation:
/// - removes characters in the emoji and pictographic symbol blocks
/// - replaces decorative glyphs (`→ • ✓ ✔ ✅ ❌ ⭐ ★ ► ▶ ◄ ◀`) with a space
/// - collapses whitespace runs into a single space
/// - trims both ends
///
/// The function is total and idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
///
/// # Example
/// ```
/// use speech_dispatch::core::sanitize::sanitize;
///
/// assert_eq!(sanitize("✅ Listo → vamos  ★"), "Listo vamos");
/// assert_eq!(sanitize("Hola 😀 mundo"), "Hola mundo");
/// assert_eq!(sanitize(None), "");
/// ```
pub fn sanitize<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };
    if text.is_empty() {
        return String::new();
    }

    let stripped = PICTOGRAPH_RE.replace_all(text, "");
    let undecorated = DECORATION_RE.replace_all(&stripped, " ");
    let collapsed = WHITESPACE_RE.replace_all(&undecorated, " ");

    collapsed.trim().to_string()
}

/// Whether `c` is removed or replaced by [`sanitize`].
pub fn is_unspeakable(c: char) -> bool {
    let mut buf = [0u8; 4];
    let s = c.encode_utf8(&mut buf);
    PICTOGRAPH_RE.is_match(s) || DECORATION_RE.is_match(s)
}

/// Shorten text for log lines without splitting a character.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
