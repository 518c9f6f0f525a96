use std::ops::Range;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Render a post body to HTML. The body is trusted and passed through as-is.
pub fn render_markdown_to_html(markdown: &str) -> String {
    let normalized_markdown = normalize_latex_delimiters(markdown);
    let parser = Parser::new_ext(&normalized_markdown, markdown_options()).map(|event| match event {
        Event::InlineMath(math) => Event::Html(CowStr::Boxed(typeset_math(&math, false).into_boxed_str())),
        Event::DisplayMath(math) => Event::Html(CowStr::Boxed(typeset_math(&math, true).into_boxed_str())),
        other => other,
    });

    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html_out
}

// Byte ranges of code spans and code blocks, which keep their backslashes.
fn code_ranges(input: &str) -> Vec<Range<usize>> {
    Parser::new_ext(input, Options::ENABLE_TABLES)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

// Rewrites `\(..\)` and `\[..\]` outside code into the `$`/`$$` forms pulldown-cmark understands.
fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let code = code_ranges(input);
    let mut code = code.iter().peekable();
    let mut i = 0;

    while i < input.len() {
        while code.next_if(|range| range.end <= i).is_some() {}
        let next_code = code.peek().map_or(input.len(), |range| range.start.max(i));
        if let Some(range) = code.peek().filter(|range| range.start <= i) {
            out.push_str(&input[i..range.end]);
            i = range.end;
            continue;
        }

        if let Some((open, close, display_mode)) = delimiter_at(input, i) {
            let content_start = i + open.len();
            let search_end = next_code.max(content_start);
            if let Some(close_at) = input[content_start..search_end].find(close) {
                let content_end = content_start + close_at;
                let content = &input[content_start..content_end];
                if display_mode || content.contains('\n') {
                    out.push_str("$$");
                    out.push_str(content);
                    out.push_str("$$");
                } else {
                    out.push('$');
                    out.push_str(content);
                    out.push('$');
                }
                i = content_end + close.len();
                continue;
            }
        }

        if let Some(ch) = input[i..].chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }

    out
}

fn delimiter_at(input: &str, index: usize) -> Option<(&'static str, &'static str, bool)> {
    let tail = &input[index..];
    if tail.starts_with("\\(") {
        Some(("\\(", "\\)", false))
    } else if tail.starts_with("\\[") {
        Some(("\\[", "\\]", true))
    } else {
        None
    }
}

#[cfg(feature = "math")]
fn typeset_math(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    let rendered = match opts.build() {
        Ok(opts) => katex::render_with_opts(source, opts),
        Err(e) => {
            tracing::debug!("katex options rejected: {}", e);
            return untypeset_math(source, display_mode);
        }
    };

    match rendered {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("katex could not typeset {:?}: {}", source, e);
            untypeset_math(source, display_mode)
        }
    }
}

#[cfg(not(feature = "math"))]
fn typeset_math(source: &str, display_mode: bool) -> String {
    untypeset_math(source, display_mode)
}

// Leaves the math in TeX delimiters so a client-side typesetter can still pick it up.
fn untypeset_math(source: &str, display_mode: bool) -> String {
    let escaped = htmlescape::encode_minimal(source);
    if display_mode {
        format!("<span class=\"math math-display\">\\[{escaped}\\]</span>")
    } else {
        format!("<span class=\"math math-inline\">\\({escaped}\\)</span>")
    }
}
