use ego_tree::NodeRef;
use scraper::Node;

/// Lazy depth-first traversal of a subtree in reverse document order: the
/// last node of the document comes out first, the starting node last. The
/// quote-string scan consumes this one node at a time and breaks as soon as
/// it reaches real content, so the walk must not precompute anything.
pub struct BackwardWalker<'a> {
    // (node, expanded): a node is yielded only after its children have been.
    stack: Vec<(NodeRef<'a, Node>, bool)>,
}

impl<'a> BackwardWalker<'a> {
    pub fn new(root: NodeRef<'a, Node>) -> Self {
        Self {
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for BackwardWalker<'a> {
    type Item = NodeRef<'a, Node>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, expanded)) = self.stack.pop() {
            if expanded {
                return Some(node);
            }
            self.stack.push((node, true));
            // Children pushed in document order, so the last child is popped
            // (and therefore fully walked) first.
            for child in node.children() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
