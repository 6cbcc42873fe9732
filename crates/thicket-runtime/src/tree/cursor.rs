use super::Node;

/// One level of the walk: the visible children of a node and the position
/// among them.
struct Level<'t> {
    siblings: Vec<Node<'t>>,
    index: usize,
}

/// Walks the visible nodes of a tree, depth first.
pub struct TreeCursor<'t> {
    levels: Vec<Level<'t>>,
}

impl<'t> TreeCursor<'t> {
    pub fn new(node: Node<'t>) -> Self {
        Self {
            levels: vec![Level {
                siblings: vec![node],
                index: 0,
            }],
        }
    }

    pub fn node(&self) -> Node<'t> {
        let level = &self.levels[self.levels.len() - 1];
        level.siblings[level.index]
    }

    pub fn field_name(&self) -> Option<&'t str> {
        if self.levels.len() < 2 {
            return None;
        }
        self.node().field_name()
    }

    /// Zero at the node the cursor started from.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn reset(&mut self, node: Node<'t>) {
        self.levels.clear();
        self.levels.push(Level {
            siblings: vec![node],
            index: 0,
        });
    }

    pub fn goto_first_child(&mut self) -> bool {
        let siblings: Vec<_> = self.node().children().collect();
        if siblings.is_empty() {
            return false;
        }
        self.levels.push(Level { siblings, index: 0 });
        true
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.levels.len() < 2 {
            return false;
        }
        let Some(level) = self.levels.last_mut() else {
            return false;
        };
        if level.index + 1 >= level.siblings.len() {
            return false;
        }
        level.index += 1;
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.levels.len() < 2 {
            return false;
        }
        self.levels.pop();
        true
    }

    /// Move to the first child that ends after `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let siblings: Vec<_> = self.node().children().collect();
        let index = siblings.iter().position(|c| c.end_byte() > byte)?;
        self.levels.push(Level { siblings, index });
        Some(index)
    }
}
