//! The inline markup formatter.
//!
//! Guide book text bodies embed a small inline markup language. This module
//! parses it by recursive descent and emits safe HTML fragments: plain text is
//! escaped at every seam, directive content is formatted recursively (bold
//! inside a link works), and nothing here ever returns an error — malformed
//! markup degrades to literal text, unresolvable references degrade to plain
//! text, and both record a warning on the context.
//!
//! ## Grammar
//!
//! | Syntax | Output |
//! |--------|--------|
//! | `**text**` | `<strong>` |
//! | `*text*` | `<em>` |
//! | `__text__` | `<u>` |
//! | `~~text~~` | `<s>` |
//! | `[key]` | internal link, display text from the link table |
//! | `[text](target)` | link with explicit text; a target containing `://` is external |
//! | `$(style)text$()` | colored span, style name resolved via the configured palette |
//! | `$(k:name)` | configured keybind label, e.g. `<code>Right Click</code>` |
//! | `$(br)` | `<br>` |
//!
//! Internal link targets are entry or category keys, optionally namespaced
//! (the prefix is stripped) and optionally carrying a `#anchor` suffix that
//! survives into the href. Hrefs are computed relative to the page currently
//! being rendered.
//!
//! Style spans end at the first `$()`; other delimiters nest freely inside
//! them. An opener with no closer, or a closer with no opener, is literal
//! text.

use crate::context::RenderContext;

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

/// Format markup text into an HTML fragment.
///
/// Total: consults the context's link table and palette, records warnings for
/// anything it cannot resolve, and always returns a fragment.
pub fn format(ctx: &mut RenderContext, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while !rest.is_empty() {
        match try_directive(ctx, rest, &mut out) {
            Some(consumed) => rest = &rest[consumed..],
            None => {
                let c = rest.chars().next().unwrap();
                push_escaped(&mut out, c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Try to consume one directive at the start of `rest`, appending its HTML to
/// `out`. Returns the number of bytes consumed, or `None` if `rest` does not
/// begin with a well-formed directive (caller emits one literal char).
fn try_directive(ctx: &mut RenderContext, rest: &str, out: &mut String) -> Option<usize> {
    if rest.starts_with("$(") {
        return dollar_directive(ctx, rest, out);
    }
    for (delim, open, close) in [
        ("**", "<strong>", "</strong>"),
        ("__", "<u>", "</u>"),
        ("~~", "<s>", "</s>"),
        ("*", "<em>", "</em>"),
    ] {
        if rest.starts_with(delim) {
            return paired_span(ctx, rest, delim, open, close, out);
        }
    }
    if rest.starts_with('[') {
        return link_directive(ctx, rest, out);
    }
    None
}

/// `**text**` and friends. Inner content is recursively formatted.
fn paired_span(
    ctx: &mut RenderContext,
    rest: &str,
    delim: &str,
    open: &str,
    close: &str,
    out: &mut String,
) -> Option<usize> {
    let inner_start = delim.len();
    let mut inner_end = rest[inner_start..].find(delim)? + inner_start;
    // `**a *b***` ends in a run of three asterisks, which must split as the
    // inner `*` closer followed by the outer `**` closer. The leftmost `**`
    // match takes the wrong two, so shift one byte right when the span
    // still has an `*` waiting for its partner.
    if delim == "**"
        && rest[inner_end..].starts_with("***")
        && has_unclosed_em(&rest[inner_start..inner_end])
    {
        inner_end += 1;
    }
    let inner = &rest[inner_start..inner_end];
    out.push_str(open);
    out.push_str(&format(ctx, inner));
    out.push_str(close);
    Some(inner_end + delim.len())
}

/// True when `s` contains a lone `*` with no partner. `**` pairs are skipped
/// whole so they never count as two singles.
fn has_unclosed_em(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut singles = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'*' {
            if bytes.get(i + 1) == Some(&b'*') {
                i += 2;
                continue;
            }
            singles += 1;
        }
        i += 1;
    }
    singles % 2 == 1
}

/// `$(...)` directives: style spans, keybinds, and `$(br)`.
fn dollar_directive(ctx: &mut RenderContext, rest: &str, out: &mut String) -> Option<usize> {
    let name_end = rest.find(')')?;
    let name = &rest[2..name_end];
    let after_name = name_end + 1;

    // A bare "$()" here has no matching opener: literal text, fail soft.
    if name.is_empty() {
        out.push_str("$()");
        return Some(after_name);
    }

    // "$(" followed by something that isn't a directive name is plain prose.
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
    {
        return None;
    }

    if name == "br" {
        out.push_str("<br>");
        return Some(after_name);
    }

    if let Some(binding) = name.strip_prefix("k:") {
        match ctx.config.keybinds.get(binding).cloned() {
            Some(label) => {
                out.push_str("<code>");
                out.push_str(&escape_html(&label));
                out.push_str("</code>");
            }
            None => {
                ctx.warn(format!("Unknown keybind in markup: {binding}"));
                out.push_str(&escape_html(&rest[..after_name]));
            }
        }
        return Some(after_name);
    }

    // Style span: content runs to the first "$()".
    let span = &rest[after_name..];
    let close = match span.find("$()") {
        Some(pos) => pos,
        None => {
            ctx.warn(format!("Unclosed style span in markup: $({name})"));
            out.push_str(&escape_html(&rest[..after_name]));
            return Some(after_name);
        }
    };
    let inner = &span[..close];
    let consumed = after_name + close + 3;

    match ctx.config.palette.get(name).cloned() {
        Some(color) => {
            out.push_str(&format!(
                "<span style=\"color: {}\">",
                escape_html(&color)
            ));
            out.push_str(&format(ctx, inner));
            out.push_str("</span>");
        }
        None => {
            ctx.warn(format!("Unknown style in markup: {name}"));
            out.push_str(&format(ctx, inner));
        }
    }
    Some(consumed)
}

/// `[key]` and `[text](target)` links.
fn link_directive(ctx: &mut RenderContext, rest: &str, out: &mut String) -> Option<usize> {
    let (inner, bracket_len) = parse_brackets(rest)?;

    let after = &rest[bracket_len..];
    if let Some((target, paren_len)) = parse_parens(after) {
        let text = format(ctx, inner);
        render_link(ctx, target, Some(&text), out);
        return Some(bracket_len + paren_len);
    }

    render_link(ctx, inner, None, out);
    Some(bracket_len)
}

/// Render a link to `out`. `text` is pre-formatted HTML when the markup gave
/// explicit link text; otherwise display text comes from the resolved target.
fn render_link(ctx: &mut RenderContext, target: &str, text: Option<&str>, out: &mut String) {
    if target.contains("://") {
        out.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">",
            escape_html(target)
        ));
        match text {
            Some(html) => out.push_str(html),
            None => out.push_str(&escape_html(target)),
        }
        out.push_str("</a>");
        return;
    }

    let stripped = crate::model::strip_namespace(target);
    let (key, fragment) = match stripped.split_once('#') {
        Some((key, frag)) => (key, Some(frag)),
        None => (stripped, None),
    };

    match ctx.resolve_link(key).cloned() {
        Some(resolved) => {
            let mut href = ctx.href_to(&resolved.path);
            if let Some(frag) = fragment {
                href.push_str(&format!("#anchor-{frag}"));
            }
            out.push_str(&format!("<a href=\"{}\">", escape_html(&href)));
            match text {
                Some(html) => out.push_str(html),
                None => out.push_str(&escape_html(&resolved.name)),
            }
            out.push_str("</a>");
        }
        None => {
            ctx.warn(format!("Unresolved cross-reference: {target}"));
            match text {
                // Explicit text: keep the words, drop the dead link.
                Some(html) => out.push_str(html),
                None => {
                    out.push('[');
                    out.push_str(&escape_html(target));
                    out.push(']');
                }
            }
        }
    }
}

/// Parse `[content]` with nesting. Returns (content, bytes consumed incl.
/// brackets), or `None` when unclosed.
fn parse_brackets(s: &str) -> Option<(&str, usize)> {
    debug_assert!(s.starts_with('['));
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a `(target)` suffix. Targets never contain parentheses, so no
/// nesting here.
fn parse_parens(s: &str) -> Option<(&str, usize)> {
    if !s.starts_with('(') {
        return None;
    }
    let end = s.find(')')?;
    Some((&s[1..end], end + 1))
}

// ============================================================================
// Dispatcher helpers
// ============================================================================

/// Append a `<h5>` title block, if the page declared one.
pub fn format_title(ctx: &mut RenderContext, buffer: &mut Vec<String>, title: Option<&str>) {
    if let Some(title) = title {
        if !title.is_empty() {
            buffer.push(format!("<h5>{}</h5>", format(ctx, title)));
        }
    }
}

/// Append a paragraph of formatted body text, if present.
pub fn format_text(ctx: &mut RenderContext, buffer: &mut Vec<String>, text: Option<&str>) {
    if let Some(text) = text {
        if !text.is_empty() {
            buffer.push(format!("<p>{}</p>", format(ctx, text)));
        }
    }
}

/// Append a centered paragraph of formatted text, if present.
pub fn format_centered_text(ctx: &mut RenderContext, buffer: &mut Vec<String>, text: Option<&str>) {
    if let Some(text) = text {
        if !text.is_empty() {
            buffer.push(format!("<p class=\"gb-center\">{}</p>", format(ctx, text)));
        }
    }
}

/// A span with a hover title, for one-off "view in game" call-outs.
///
/// `html` is trusted fragment content from a renderer; `title` is plain text
/// and gets escaped.
pub fn tooltip(html: &str, title: &str) -> String {
    format!(
        "<span class=\"gb-tooltip\" title=\"{}\">{}</span>",
        escape_html(title),
        html
    )
}
