//! Page templates
//!
//! Pages are plain `format!` templates. Every value that does not come from
//! the chapter rewriter is escaped with `html_escape`.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::reader::{BookSession, TocEntry, ALLOWED_EXTENSIONS};

const STYLE: &str = r#"
    body {
        font-family: Georgia, 'Times New Roman', serif;
        margin: 0;
        background: #faf8f3;
        color: #222;
    }
    header, nav.pager {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        display: flex;
        justify-content: space-between;
        align-items: center;
        padding: 0.75rem 1.5rem;
        background: #efe9dc;
    }
    header h1 { font-size: 1.1rem; margin: 0; }
    main { max-width: 42rem; margin: 0 auto; padding: 1.5rem; line-height: 1.6; }
    main img { max-width: 100%; height: auto; }
    .notice { background: #fde68a; padding: 0.75rem 1.5rem; margin: 0; }
    .toc { font-family: sans-serif; padding: 0 1.5rem; }
    .toc ul { list-style: none; padding-left: 0; }
    .toc li.current > a { font-weight: bold; }
    .disabled { color: #999; }
    form.upload { font-family: sans-serif; max-width: 30rem; margin: 4rem auto; text-align: center; }
"#;

/// Everything the reader page shows
pub struct ReaderView<'a> {
    pub book: &'a BookSession,
    /// Prepared chapter markup, embedded without escaping
    pub content: &'a str,
    pub notice: Option<&'a str>,
}

fn layout(title: &str, notice: Option<&str>, body: &str) -> String {
    let notice = notice
        .filter(|n| !n.trim().is_empty())
        .map(|n| format!(r#"<p class="notice" role="alert">{}</p>"#, encode_text(n)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
{notice}
{body}
</body>
</html>"#,
        title = encode_text(title),
        style = STYLE,
        notice = notice,
        body = body,
    )
}

/// Upload form, with an optional message from a failed action
pub fn index_page(notice: Option<&str>) -> String {
    let accept: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();

    let body = format!(
        r#"<form class="upload" action="/upload" method="post" enctype="multipart/form-data">
    <h1>Lector</h1>
    <p>Choose an EPUB file to start reading.</p>
    <input type="file" name="file" accept="{accept}" required>
    <button type="submit">Read</button>
</form>"#,
        accept = encode_double_quoted_attribute(&accept.join(",")),
    );

    layout("Lector", notice, &body)
}

/// Chapter page with table of contents and navigation
pub fn reader_page(view: &ReaderView<'_>) -> String {
    let book = view.book;
    let index = book.current_index();
    let chapter_title = book
        .toc()
        .iter()
        .find(|e| e.index == index)
        .map(|e| e.title.as_str());

    let heading = match chapter_title {
        Some(title) => format!("{} &middot; {}", encode_text(book.title()), encode_text(title)),
        None => encode_text(book.title()).into_owned(),
    };

    let body = format!(
        r#"<header>
    <h1>{heading}</h1>
    <a href="/exit">Close book</a>
</header>
{toc}
{pager}
<main>
{content}
</main>
{pager}"#,
        heading = heading,
        toc = toc_panel(book.toc(), index, book.toc_visible()),
        pager = pager(book),
        content = view.content,
    );

    layout(book.title(), view.notice, &body)
}

/// Collapsible table of contents
fn toc_panel(entries: &[TocEntry], current: usize, visible: bool) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let items: String = entries
        .iter()
        .map(|entry| {
            format!(
                r#"<li{class} style="margin-left: {indent}rem"><a href="/read/{index}">{title}</a></li>"#,
                class = if entry.index == current { r#" class="current""# } else { "" },
                indent = entry.depth,
                index = entry.index,
                title = encode_text(&entry.title),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<details class="toc"{open}>
    <summary><a href="/toc">Table of Contents</a></summary>
    <ul>
{items}
    </ul>
</details>"#,
        open = if visible { " open" } else { "" },
        items = items,
    )
}

fn pager(book: &BookSession) -> String {
    let previous = if book.is_first() {
        r#"<span class="disabled">&larr; Previous</span>"#.to_string()
    } else {
        r#"<a href="/previous" rel="prev">&larr; Previous</a>"#.to_string()
    };
    let next = if book.is_last() {
        r#"<span class="disabled">Next &rarr;</span>"#.to_string()
    } else {
        r#"<a href="/next" rel="next">Next &rarr;</a>"#.to_string()
    };

    format!(
        r#"<nav class="pager">{previous}<span>Chapter {position} of {total}</span>{next}</nav>"#,
        previous = previous,
        position = book.current_index() + 1,
        total = book.len(),
        next = next,
    )
}

/// Generic failure page
pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"<main>
    <h1>Something went wrong</h1>
    <p>{}</p>
    <p><a href="/">Back to upload</a></p>
</main>"#,
        encode_text(message)
    );
    layout("Lector", None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::testing::{book_session, FakeBook};

    #[test]
    fn test_index_page_escapes_notice() {
        let page = index_page(Some("<b>bad</b> file"));
        assert!(page.contains("&lt;b&gt;bad&lt;/b&gt; file"));
        assert!(page.contains(r#"action="/upload""#));
        assert!(page.contains(r#"accept=".epub""#));
    }

    #[test]
    fn test_index_page_without_notice() {
        assert!(!index_page(None).contains("notice\""));
    }

    #[test]
    fn test_reader_page_first_chapter() {
        let book = book_session(FakeBook::chapters(3).with_toc_entry("Opening", "c0.xhtml"));
        let page = reader_page(&ReaderView {
            book: &book,
            content: "<p>Once upon a time</p>",
            notice: None,
        });

        assert!(page.contains("<p>Once upon a time</p>"));
        assert!(page.contains("Chapter 1 of 3"));
        assert!(page.contains(r#"<span class="disabled">&larr; Previous</span>"#));
        assert!(page.contains(r#"href="/next""#));
        assert!(page.contains(r#"<li class="current""#));
        assert!(page.contains("Fake Book &middot; Opening"));
    }

    #[test]
    fn test_toc_visibility_controls_open_attribute() {
        let mut book = book_session(FakeBook::chapters(2).with_toc_entry("One", "c0.xhtml"));
        let closed = reader_page(&ReaderView { book: &book, content: "", notice: None });
        assert!(closed.contains(r#"<details class="toc">"#));

        book.toggle_toc();
        let open = reader_page(&ReaderView { book: &book, content: "", notice: None });
        assert!(open.contains(r#"<details class="toc" open>"#));
    }

    #[test]
    fn test_last_chapter_disables_next() {
        let mut book = book_session(FakeBook::chapters(2));
        book.next().unwrap();
        let page = reader_page(&ReaderView { book: &book, content: "", notice: None });

        assert!(page.contains(r#"<span class="disabled">Next &rarr;</span>"#));
        assert!(page.contains(r#"href="/previous""#));
    }
}
