//! Document fragment tree.
//!
//! A [`Fragment`] is the caller-owned view of one XML element: a kind tag,
//! string-valued attributes in document order, optional text content and
//! ordered child fragments. The engine never reads bytes itself; loaders turn
//! documents into fragments and the engine turns fragments into nodes.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Span;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Local element name (`EntityType`).
    pub tag: SmolStr,
    /// Namespace prefix as written (`edmx` in `edmx:Runtime`), kept for writing back.
    pub prefix: Option<SmolStr>,
    pub attributes: IndexMap<SmolStr, String>,
    pub text: Option<String>,
    pub children: Vec<Fragment>,
    pub span: Option<Span>,
}

impl Fragment {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: SmolStr::new(tag.as_ref()),
            ..Self::default()
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(SmolStr::new(name.as_ref()), value.into());
        self
    }

    /// Builder: append a child fragment.
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append several child fragments.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Fragment>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builder: set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child with the given local name.
    pub fn child(&self, tag: &str) -> Option<&Fragment> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Fragment> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Name as written in the document, with its prefix.
    pub fn qualified_tag(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.tag),
            None => self.tag.to_string(),
        }
    }

    /// Number of fragments in this subtree, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Fragment::subtree_size)
            .sum::<usize>()
    }
}
