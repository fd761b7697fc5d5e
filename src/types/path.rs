use std::fmt;

/// Location of a node relative to its resource root.
///
/// A path is an immutable linked list living on the call stack: `child`
/// borrows the parent instead of mutating it, so sibling branches of a
/// traversal can never observe each other's segments. Array indices are
/// never part of a path; elements of a collection share their parent's path.
#[derive(Clone, Copy, Default)]
pub struct PropertyPath<'a> {
    segment: Option<&'a str>,
    parent: Option<&'a PropertyPath<'a>>,
    depth: usize,
}

impl<'a> PropertyPath<'a> {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child<'b>(&'b self, name: &'b str) -> PropertyPath<'b> {
        PropertyPath {
            segment: Some(name),
            parent: Some(self),
            depth: self.depth + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    pub fn last(&self) -> Option<&'a str> {
        self.segment
    }

    /// Segments from the root to this node.
    pub fn segments(&self) -> Vec<&'a str> {
        let mut segments = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(path) = current {
            if let Some(segment) = path.segment {
                segments.push(segment);
            }
            current = path.parent;
        }
        segments.reverse();
        segments
    }
}

impl fmt::Display for PropertyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("."))
    }
}

impl fmt::Debug for PropertyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments()).finish()
    }
}

impl PartialEq for PropertyPath<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.segments() == other.segments()
    }
}

impl Eq for PropertyPath<'_> {}
