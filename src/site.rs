//! Site assembly.
//!
//! Walks the book tree, builds the document model, and writes the HTML site.
//! One pass per configured language:
//!
//! ```text
//! book/<lang>/categories/**.json  ─┐
//! book/<lang>/entries/**.json     ─┴─> Book ─> link table ─> rendered pages
//! ```
//!
//! Output layout mirrors the model:
//!
//! ```text
//! out/
//! ├── index.html                  # redirect to the first language
//! ├── _images/                    # shared across languages
//! └── en_us/
//!     ├── index.html              # category cards
//!     └── stone_age/
//!         ├── index.html          # category page
//!         └── knapping.html       # entry page
//! ```
//!
//! Error handling is file-granular: a malformed category/entry file or a
//! failed page write is recorded and skipped, and the rest of the batch
//! continues. Only output-directory creation is fatal.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Page *chrome* (head, nav tree, breadcrumbs, language switcher, footer) is
//! typed maud markup; page *bodies* are the fragment buffers accumulated by
//! the dispatcher, already escaped at the formatter seams.

use crate::config::SiteConfig;
use crate::context::{LinkTarget, RenderContext};
use crate::markup;
use crate::model::{Book, Category, Entry, ModelError};
use crate::render::render_page;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const CSS: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("no languages configured")]
    NoLanguages,
}

/// Input and output locations for one run.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Book root: `<book>/<lang>/{categories,entries}/...`.
    pub book_dir: PathBuf,
    /// Mod asset root, for image sources.
    pub assets_dir: PathBuf,
    /// Mod data root, for recipe JSON.
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Totals reported after a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub languages: usize,
    pub categories: usize,
    pub entries: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Generate the whole site.
pub fn build(config: &SiteConfig, request: &BuildRequest) -> Result<RunSummary, SiteError> {
    if config.languages.is_empty() {
        return Err(SiteError::NoLanguages);
    }

    let images_dir = request.output_dir.join("_images");
    create_dir(&images_dir)?;

    let mut summary = RunSummary::default();
    for lang in &config.languages {
        let lang_dir = request.book_dir.join(lang);
        if !lang_dir.is_dir() {
            tracing::warn!("Book has no {lang} directory, skipping language");
            summary.warnings += 1;
            continue;
        }
        tracing::info!("Rendering language {lang}");

        let (mut book, load_errors) = load_book(&lang_dir);
        book.sort();

        let mut ctx = RenderContext::new(
            config.clone(),
            request.assets_dir.clone(),
            request.data_dir.clone(),
            images_dir.clone(),
        );
        for err in load_errors {
            ctx.error(err.to_string());
        }
        register_links(&mut ctx, &book);

        let lang_out = request.output_dir.join(lang);
        create_dir(&lang_out)?;
        render_language(config, &mut ctx, &book, lang, &lang_out);

        summary.languages += 1;
        summary.categories += book.categories.len();
        summary.entries += book.entry_count();
        summary.warnings += ctx.warning_count();
        summary.errors += ctx.error_count();
    }

    write_root_redirect(&request.output_dir, &config.languages[0])?;
    Ok(summary)
}

/// Parse every book file without writing anything. Returns the same summary
/// shape as [`build`], with `errors` counting unloadable files.
pub fn check(config: &SiteConfig, request: &BuildRequest) -> Result<RunSummary, SiteError> {
    if config.languages.is_empty() {
        return Err(SiteError::NoLanguages);
    }

    let mut summary = RunSummary::default();
    for lang in &config.languages {
        let lang_dir = request.book_dir.join(lang);
        if !lang_dir.is_dir() {
            tracing::warn!("Book has no {lang} directory, skipping language");
            summary.warnings += 1;
            continue;
        }
        let (book, load_errors) = load_book(&lang_dir);
        for err in &load_errors {
            tracing::error!("{err}");
        }
        summary.languages += 1;
        summary.categories += book.categories.len();
        summary.entries += book.entry_count();
        summary.errors += load_errors.len();
    }
    Ok(summary)
}

// ============================================================================
// Model loading
// ============================================================================

/// Load all categories and entries for one language. Unloadable files are
/// collected, not fatal.
fn load_book(lang_dir: &Path) -> (Book, Vec<ModelError>) {
    let mut book = Book::default();
    let mut errors = Vec::new();

    for (id, path) in json_files(&lang_dir.join("categories")) {
        match read_file(&path)
            .and_then(|content| Category::parse(&id, &path.display().to_string(), &content))
        {
            Ok(category) => book.add_category(category),
            Err(err) => errors.push(err),
        }
    }

    for (id, path) in json_files(&lang_dir.join("entries")) {
        let result = read_file(&path)
            .and_then(|content| Entry::parse(&id, &path.display().to_string(), &content))
            .and_then(|entry| book.add_entry(entry));
        if let Err(err) = result {
            errors.push(err);
        }
    }

    (book, errors)
}

fn read_file(path: &Path) -> Result<String, ModelError> {
    fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// All `.json` files under `base`, lexically ordered, as
/// (id relative to base without extension, full path).
fn json_files(base: &Path) -> Vec<(String, PathBuf)> {
    if !base.is_dir() {
        return Vec::new();
    }
    WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(base)
                .unwrap_or(e.path())
                .with_extension("");
            let id = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (id, e.path().to_path_buf())
        })
        .collect()
}

/// Populate the cross-reference table. Keys: category id, full entry id, and
/// the entry's bare file stem. First registration wins, and the book is
/// sorted before this runs, so stem collisions resolve deterministically.
fn register_links(ctx: &mut RenderContext, book: &Book) {
    for category in &book.categories {
        ctx.register_link(
            &category.id,
            LinkTarget {
                path: format!("{}/index", category.id),
                name: category.name.clone(),
            },
        );
        for entry in &category.entries {
            let target = LinkTarget {
                path: entry.id.clone(),
                name: entry.name.clone(),
            };
            ctx.register_link(&entry.id, target.clone());
            if let Some((_, stem)) = entry.id.rsplit_once('/') {
                ctx.register_link(stem, target);
            }
        }
    }
}

// ============================================================================
// Page rendering
// ============================================================================

fn render_language(
    config: &SiteConfig,
    ctx: &mut RenderContext,
    book: &Book,
    lang: &str,
    lang_out: &Path,
) {
    for category in &book.categories {
        for entry in &category.entries {
            ctx.set_current_page(&entry.id);
            let page = render_entry_page(config, ctx, book, lang, category, entry);
            write_page(ctx, &lang_out.join(format!("{}.html", entry.id)), page);
        }

        let current = format!("{}/index", category.id);
        ctx.set_current_page(&current);
        let page = render_category_page(config, ctx, book, lang, category);
        write_page(ctx, &lang_out.join(&category.id).join("index.html"), page);
    }

    ctx.set_current_page("index");
    let page = render_index_page(config, ctx, book, lang);
    write_page(ctx, &lang_out.join("index.html"), page);
}

fn render_index_page(
    config: &SiteConfig,
    ctx: &mut RenderContext,
    book: &Book,
    lang: &str,
) -> Markup {
    let breadcrumb = html! { (config.title) };
    let cards = html! {
        main class="gb-index" {
            div class="gb-card-grid" {
                @for category in &book.categories {
                    @let description = markup::format(ctx, &category.description);
                    a class="gb-card" href=(ctx.href_to(&format!("{}/index", category.id))) {
                        span class="gb-card-title" { (category.name) }
                        span class="gb-card-body" { (PreEscaped(description)) }
                    }
                }
            }
        }
    };
    page_shell(config, book, lang, "index", &config.title, breadcrumb, cards)
}

fn render_category_page(
    config: &SiteConfig,
    ctx: &mut RenderContext,
    book: &Book,
    lang: &str,
    category: &Category,
) -> Markup {
    let current = format!("{}/index", category.id);
    let breadcrumb = html! {
        a href=(ctx.href_to("index")) { (config.title) }
        " \u{203a} "
        (category.name)
    };
    let description = markup::format(ctx, &category.description);
    let content = html! {
        main class="gb-category" {
            header {
                h1 { (category.name) }
                p class="gb-description" { (PreEscaped(description)) }
            }
            div class="gb-card-grid" {
                @for entry in &category.entries {
                    a class="gb-card" href=(ctx.href_to(&entry.id)) {
                        span class="gb-card-title" { (entry.name) }
                    }
                }
            }
        }
    };
    page_shell(config, book, lang, &current, &category.name, breadcrumb, content)
}

fn render_entry_page(
    config: &SiteConfig,
    ctx: &mut RenderContext,
    book: &Book,
    lang: &str,
    category: &Category,
    entry: &Entry,
) -> Markup {
    let breadcrumb = html! {
        a href=(ctx.href_to("index")) { (config.title) }
        " \u{203a} "
        a href=(ctx.href_to(&format!("{}/index", category.id))) { (category.name) }
        " \u{203a} "
        (entry.name)
    };

    let mut buffer = Vec::new();
    for page in &entry.pages {
        render_page(ctx, page, &mut buffer);
    }

    let content = html! {
        main class="gb-entry" {
            article {
                h1 { (entry.name) }
                @for fragment in &buffer {
                    (PreEscaped(fragment))
                }
            }
        }
    };
    page_shell(config, book, lang, &entry.id, &entry.name, breadcrumb, content)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Base document plus the shared chrome: breadcrumb header, nav tree,
/// language switcher, version footer. `current` is the language-relative page
/// path without extension; it drives both relative hrefs and nav
/// highlighting.
fn page_shell(
    config: &SiteConfig,
    book: &Book,
    lang: &str,
    current: &str,
    title: &str,
    breadcrumb: Markup,
    content: Markup,
) -> Markup {
    let depth = current.matches('/').count();
    let root = "../".repeat(depth);
    let site = "../".repeat(depth + 1);

    let body = html! {
        header class="site-header" {
            nav class="breadcrumb" { (breadcrumb) }
            (language_nav(&config.languages, lang, &site))
        }
        div class="gb-layout" {
            (render_nav(book, &root, current))
            (content)
        }
        footer class="site-footer" {
            (config.title) " " (config.version)
        }
    };
    base_document(title, body)
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

/// The category/entry tree sidebar.
fn render_nav(book: &Book, root: &str, current: &str) -> Markup {
    html! {
        nav class="site-nav" {
            ul {
                @for category in &book.categories {
                    @let in_category = current.starts_with(&format!("{}/", category.id));
                    li class=[in_category.then_some("current")] {
                        a href={ (root) (category.id) "/index.html" } { (category.name) }
                        ul {
                            @for entry in &category.entries {
                                li class=[(entry.id == current).then_some("current")] {
                                    a href={ (root) (entry.id) ".html" } { (entry.name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Links to the other languages' index pages.
fn language_nav(languages: &[String], current: &str, site: &str) -> Markup {
    html! {
        nav class="lang-nav" {
            @for lang in languages {
                @if lang == current {
                    span class="lang-current" { (lang) }
                } @else {
                    a href={ (site) (lang) "/index.html" } { (lang) }
                }
            }
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn create_dir(path: &Path) -> Result<(), SiteError> {
    fs::create_dir_all(path).map_err(|source| SiteError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write one page, creating parent directories. Failure is reported on the
/// context and skips this file only.
fn write_page(ctx: &mut RenderContext, path: &Path, markup: Markup) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            ctx.error(format!("Cannot create {}: {err}", parent.display()));
            return;
        }
    }
    match fs::write(path, markup.into_string()) {
        Ok(()) => tracing::debug!("Wrote {}", path.display()),
        Err(err) => ctx.error(format!("Failed to write {}: {err}", path.display())),
    }
}

/// Top-level `index.html`: immediate redirect into the default language.
fn write_root_redirect(output_dir: &Path, lang: &str) -> Result<(), SiteError> {
    let target = format!("{lang}/index.html");
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta http-equiv="refresh" content=(format!("0; url={target}"));
                title { "Redirecting" }
            }
            body {
                a href=(target) { "Continue" }
            }
        }
    };
    let path = output_dir.join("index.html");
    fs::write(&path, page.into_string()).map_err(|source| SiteError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture_book(root: &Path) {
        write(
            root,
            "book/en_us/categories/stone_age.json",
            r#"{ "name": "Stone Age", "description": "The **beginning**.", "sortnum": 0 }"#,
        );
        write(
            root,
            "book/en_us/entries/stone_age/knapping.json",
            r#"{
                "name": "Flint Knapping",
                "category": "mymod:stone_age",
                "sortnum": 0,
                "pages": [
                    { "type": "patchouli:text", "title": "Flint", "text": "Hello **world**" }
                ]
            }"#,
        );
    }

    fn request(root: &Path) -> BuildRequest {
        BuildRequest {
            book_dir: root.join("book"),
            assets_dir: root.join("assets"),
            data_dir: root.join("data"),
            output_dir: root.join("out"),
        }
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn builds_index_category_and_entry_pages() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());

        let summary = build(&SiteConfig::default(), &request(tmp.path())).unwrap();
        assert_eq!(summary.languages, 1);
        assert_eq!(summary.categories, 1);
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.warnings, 0);
        assert_eq!(summary.errors, 0);

        let index = read(tmp.path(), "out/en_us/index.html");
        assert!(index.contains("Stone Age"));
        assert!(index.contains("href=\"stone_age/index.html\""));
        assert!(index.contains("The <strong>beginning</strong>."));

        let category = read(tmp.path(), "out/en_us/stone_age/index.html");
        assert!(category.contains("href=\"../stone_age/knapping.html\""));

        let entry = read(tmp.path(), "out/en_us/stone_age/knapping.html");
        assert!(entry.contains("<h1>Flint Knapping</h1>"));
        assert!(entry.contains("<h5>Flint</h5>"));
        assert!(entry.contains("<p>Hello <strong>world</strong></p>"));

        let redirect = read(tmp.path(), "out/index.html");
        assert!(redirect.contains("url=en_us/index.html"));
        assert!(tmp.path().join("out/_images").is_dir());
    }

    #[test]
    fn cross_reference_by_stem_resolves() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        write(
            tmp.path(),
            "book/en_us/entries/stone_age/pottery.json",
            r#"{
                "name": "Pottery",
                "category": "mymod:stone_age",
                "sortnum": 1,
                "pages": [{ "type": "patchouli:text", "text": "After [knapping]." }]
            }"#,
        );

        let summary = build(&SiteConfig::default(), &request(tmp.path())).unwrap();
        assert_eq!(summary.warnings, 0);

        let pottery = read(tmp.path(), "out/en_us/stone_age/pottery.html");
        assert!(pottery.contains("<a href=\"../stone_age/knapping.html\">Flint Knapping</a>"));
    }

    #[test]
    fn malformed_entry_skipped_batch_continues() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        write(
            tmp.path(),
            "book/en_us/entries/stone_age/broken.json",
            "{ not json",
        );

        let summary = build(&SiteConfig::default(), &request(tmp.path())).unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.entries, 1);
        assert!(tmp.path().join("out/en_us/stone_age/knapping.html").is_file());
    }

    #[test]
    fn entry_with_unknown_category_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        write(
            tmp.path(),
            "book/en_us/entries/lost/orphan.json",
            r#"{ "name": "Orphan", "category": "mymod:lost", "pages": [] }"#,
        );

        let summary = build(&SiteConfig::default(), &request(tmp.path())).unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.entries, 1);
    }

    #[test]
    fn missing_language_directory_warns() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        let mut config = SiteConfig::default();
        config.languages = vec!["en_us".to_string(), "ja_jp".to_string()];

        let summary = build(&config, &request(tmp.path())).unwrap();
        assert_eq!(summary.languages, 1);
        assert_eq!(summary.warnings, 1);
        assert!(!tmp.path().join("out/ja_jp").exists());
    }

    #[test]
    fn second_language_gets_its_own_tree() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        write(
            tmp.path(),
            "book/ja_jp/categories/stone_age.json",
            r#"{ "name": "石器時代", "description": "始まり。", "sortnum": 0 }"#,
        );
        write(
            tmp.path(),
            "book/ja_jp/entries/stone_age/knapping.json",
            r#"{
                "name": "火打ち",
                "category": "mymod:stone_age",
                "pages": [{ "type": "patchouli:text", "text": "こんにちは" }]
            }"#,
        );
        let mut config = SiteConfig::default();
        config.languages = vec!["en_us".to_string(), "ja_jp".to_string()];

        let summary = build(&config, &request(tmp.path())).unwrap();
        assert_eq!(summary.languages, 2);
        assert_eq!(summary.entries, 2);

        let entry = read(tmp.path(), "out/ja_jp/stone_age/knapping.html");
        assert!(entry.contains("こんにちは"));
        // Entry pages link to the sibling language one level above the root
        assert!(entry.contains("href=\"../../en_us/index.html\""));
    }

    #[test]
    fn check_parses_without_writing() {
        let tmp = TempDir::new().unwrap();
        fixture_book(tmp.path());
        write(
            tmp.path(),
            "book/en_us/entries/stone_age/broken.json",
            "{ not json",
        );

        let summary = check(&SiteConfig::default(), &request(tmp.path())).unwrap();
        assert_eq!(summary.languages, 1);
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.errors, 1);
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn no_languages_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.languages.clear();
        assert!(matches!(
            build(&config, &request(tmp.path())),
            Err(SiteError::NoLanguages)
        ));
    }
}
