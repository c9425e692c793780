//! Link annotation.
//!
//! Every `<a href>` in a rendered page is classified the way a browser would
//! resolve it from the page's own URL:
//!
//! | Href | Class |
//! |------|-------|
//! | `https://example.com/x`, `//example.com` | `external-link` |
//! | `mailto:me@host`, `tel:...` (no host) | unchanged |
//! | `notes/todo`, `/todo`, `#top` that resolve to a page | unchanged |
//! | anything else (missing page, dotfile, unparsable URL) | `broken-link` |
//!
//! Hrefs are taken from the document still entity-encoded (`a&amp;b`) and
//! decoded before classification. Existence is checked through
//! [`PathResolver::page_exists`], so a link can never reach outside the wiki
//! root.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::page::{PageName, PathResolver};
use crate::pipeline::dom::{Document, Element};
use crate::pipeline::visit::ElementVisitor;
use crate::utils::html::unescape;

pub const BROKEN_CLASS: &str = "broken-link";
pub const EXTERNAL_CLASS: &str = "external-link";

/// Synthetic origin that page-relative hrefs are resolved against.
const LOCAL_ORIGIN: &str = "http://wiki.invalid";

/// What an anchor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    /// Existing page, fragment or host-less scheme.
    Ordinary,
    /// Local target that does not resolve, or an unparsable href.
    Broken,
    /// Another host.
    External,
}

impl LinkClass {
    /// Class appended to the anchor, if any.
    pub const fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Ordinary => None,
            Self::Broken => Some(BROKEN_CLASS),
            Self::External => Some(EXTERNAL_CLASS),
        }
    }
}

/// Counts of annotated anchors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkReport {
    pub ordinary: usize,
    pub broken: usize,
    pub external: usize,
}

impl LinkReport {
    fn record(&mut self, class: LinkClass) {
        match class {
            LinkClass::Ordinary => self.ordinary += 1,
            LinkClass::Broken => self.broken += 1,
            LinkClass::External => self.external += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ordinary + self.broken + self.external
    }
}

/// Marks broken and external anchors in a page document.
pub struct LinkAnnotator<'a> {
    resolver: &'a PathResolver,
    base: Url,
    report: LinkReport,
}

impl<'a> LinkAnnotator<'a> {
    /// Annotator for links appearing on `page`.
    pub fn new(resolver: &'a PathResolver, page: &PageName) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(LOCAL_ORIGIN)?;
        base.set_path(&page.to_url());
        Ok(Self {
            resolver,
            base,
            report: LinkReport::default(),
        })
    }

    /// Annotate every anchor in `doc`. Running it twice changes nothing.
    pub fn annotate(mut self, doc: &mut Document) -> LinkReport {
        doc.walk_mut(&mut self);
        self.report
    }

    /// Classify a decoded href (no HTML entities).
    pub fn classify(&self, href: &str) -> LinkClass {
        match Url::parse(href) {
            Ok(url) => {
                return if url.host_str().is_some_and(|h| !h.is_empty()) {
                    LinkClass::External
                } else {
                    LinkClass::Ordinary
                };
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(_) => return LinkClass::Broken,
        }

        let Ok(target) = self.base.join(href) else {
            return LinkClass::Broken;
        };
        if target.origin() != self.base.origin() {
            return LinkClass::External;
        }

        let Ok(path) = percent_decode_str(target.path()).decode_utf8() else {
            return LinkClass::Broken;
        };
        // Dotfiles exist on disk but are never served.
        let name = PageName::new(&path);
        if !name.is_hidden() && self.resolver.page_exists(&name) {
            LinkClass::Ordinary
        } else {
            LinkClass::Broken
        }
    }
}

impl ElementVisitor for LinkAnnotator<'_> {
    fn visit_element(&mut self, element: &mut Element) {
        if !element.is("a") {
            return;
        }
        let Some(href) = element.get_attr("href") else {
            return;
        };

        let class = self.classify(&unescape(href));
        self.report.record(class);
        if let Some(css) = class.css_class() {
            element.add_class(css);
        }
    }
}
