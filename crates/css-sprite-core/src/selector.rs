use serde::{Deserialize, Serialize};

/// A parsed selector as a closed tree of simple selectors.
///
/// A whitespace-separated chain `A B` is stored as
/// `Composite[Descendant(A), <simple selectors of B>]`: the descendant node only
/// carries the ancestor, the target lives next to it in the enclosing composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SelectorNode {
    /// `*`
    Wildcard,
    /// Components in source order.
    Composite(Vec<SelectorNode>),
    /// `.name`
    ClassName(String),
    /// `#name`
    Id(String),
    /// Bare element name (`div`, `a:hover`).
    ElementName(String),
    /// Ancestor side of a descendant combinator.
    Descendant(Box<SelectorNode>),
}

impl SelectorNode {
    /// Rebuilds selector text from the tree.
    ///
    /// Class and id names are followed by a space. A descendant node emits its
    /// ancestor only, so `div .x` comes back as `div.x `.
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        match self {
            SelectorNode::Wildcard => out.push('*'),
            SelectorNode::Composite(children) => {
                for child in children {
                    child.write_into(out);
                }
            }
            SelectorNode::ClassName(name) => {
                out.push('.');
                out.push_str(name);
                out.push(' ');
            }
            SelectorNode::Id(name) => {
                out.push('#');
                out.push_str(name);
                out.push(' ');
            }
            SelectorNode::ElementName(name) => out.push_str(name),
            SelectorNode::Descendant(ancestor) => ancestor.write_into(out),
        }
    }

    /// Two selectors are equivalent when they reconstruct to the same text.
    pub fn equivalent(&self, other: &SelectorNode) -> bool {
        self.reconstruct() == other.reconstruct()
    }

    pub fn contains_descendant(&self) -> bool {
        match self {
            SelectorNode::Descendant(_) => true,
            SelectorNode::Composite(children) => children.iter().any(|c| c.contains_descendant()),
            _ => false,
        }
    }
}

impl std::fmt::Display for SelectorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reconstruct())
    }
}
