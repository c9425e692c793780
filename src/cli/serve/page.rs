//! Page composition: header, title, up link, content, footer.

use crate::config::WikiConfig;
use crate::core::{RenderError, WikiError};
use crate::debug;
use crate::page::{FileExt, PageName, PathResolver, ResolveError, ResolvedFile};
use crate::pipeline::markdown::to_html;
use crate::pipeline::{Document, LinkAnnotator, MarkdownOptions, RenderOptions};
use crate::utils::html::{escape, escape_attr};

const HEADER: &str = ".header";
const FOOTER: &str = ".footer";

/// Render `file`, the resolved source of page `name`, to a full HTML document.
pub fn render_page(
    config: &WikiConfig,
    resolver: &PathResolver,
    name: &PageName,
    file: ResolvedFile,
) -> Result<String, WikiError> {
    debug!("render"; "/{} from {}", name, file.path.display());
    let mut raw = String::with_capacity(file.contents.len() * 2);

    if let Some(header) = fragment(resolver, HEADER)? {
        raw.push_str(&header);
    }
    push_title(&mut raw, &config.site.title, name);
    if let Some(parent) = name.parent_url() {
        raw.push_str(&format!(
            "<a href=\"{}\" class=\"up-arrow\">\u{21b0} up</a>",
            escape_attr(&parent)
        ));
    }
    raw.push_str(&content_html(name, file)?);
    if let Some(footer) = fragment(resolver, FOOTER)? {
        raw.push_str(&footer);
    }

    let mut doc = Document::parse(&raw).map_err(RenderError::from)?;
    let report = LinkAnnotator::new(resolver, name)
        .map_err(RenderError::from)?
        .annotate(&mut doc);
    debug!(
        "render";
        "/{}: {} links, {} broken, {} external",
        name,
        report.total(),
        report.broken,
        report.external
    );

    let body = doc.render(RenderOptions {
        minify: config.render.minify,
    });
    Ok(format!("<!DOCTYPE html>{body}"))
}

fn push_title(out: &mut String, site: &str, name: &PageName) {
    let site = escape(site);
    if name.is_root() {
        out.push_str(&format!("<title>{site}</title>\n"));
    } else {
        out.push_str(&format!("<title>{site}: {}</title>\n", escape(name.as_str())));
    }
}

/// HTML pages are included as-is; everything else is Markdown.
fn content_html(name: &PageName, file: ResolvedFile) -> Result<String, RenderError> {
    let text = String::from_utf8(file.contents).map_err(|_| RenderError::Encoding {
        name: name.to_string(),
    })?;
    Ok(match file.ext {
        FileExt::Html => text,
        FileExt::Markdown | FileExt::Verbatim => to_html(&text, &MarkdownOptions::all()),
    })
}

/// Optional raw fragment such as `.header`, resolved with extension fallback.
fn fragment(resolver: &PathResolver, name: &str) -> Result<Option<String>, WikiError> {
    match resolver.resolve_with_fallback(&PageName::new(name)) {
        Ok(file) => Ok(Some(String::from_utf8_lossy(&file.contents).into_owned())),
        Err(ResolveError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
