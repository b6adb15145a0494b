use crate::page::Page;
use serde::Serialize;

/// Index of an element inside its page's arena.
///
/// Only ever minted by [`Page`]; because the arena is append-only, an id is
/// valid for the lifetime of the page that created it. Ids from a different
/// page are undetectable misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    /// Stable identity token, suitable for memoization keys.
    #[must_use]
    pub fn token(self) -> String {
        format!("el#{}", self.0)
    }
}

/// A borrowed-by-handle view of one element, passed to element-bound actions.
#[derive(Debug, Clone)]
pub struct ElementRef {
    page: Page,
    id: ElementId,
}

impl ElementRef {
    pub(crate) const fn new(page: Page, id: ElementId) -> Self {
        Self { page, id }
    }

    /// The element's id within its page.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// The page this element belongs to.
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Stable identity token of the underlying element.
    #[must_use]
    pub fn token(&self) -> String {
        self.id.token()
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag(&self) -> String {
        self.page.tag(self.id)
    }

    /// Looks up an attribute value on the element.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.page.attribute(self.id, name)
    }

    /// Whether the element carries the given class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.page.has_class(self.id, class)
    }
}
