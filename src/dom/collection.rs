//! Child collection operations
//!
//! Structural mutations on the arena tree. Every operation here keeps the
//! sibling pointers consistent with the ordered child list, maintains the id
//! index, and marks the parent chain changed.

use crate::dom::document::Document;
use crate::dom::node::NodeId;
use crate::error::HtmlError;

impl Document {
    /// Add a node to the end of a parent's children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HtmlError> {
        self.detach(child);
        let last = self.node(parent).last_child();
        if let Some(last) = last {
            self.node_mut(last).next_sibling = Some(child);
        }
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        self.node_mut(parent).children.push(child);
        self.after_attach(parent, child);
        Ok(())
    }

    /// Add a node to the beginning of a parent's children
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HtmlError> {
        self.detach(child);
        let first = self.node(parent).first_child();
        if let Some(first) = first {
            self.node_mut(first).prev_sibling = Some(child);
        }
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = None;
            node.next_sibling = first;
        }
        self.node_mut(parent).children.insert(0, child);
        self.after_attach(parent, child);
        Ok(())
    }

    /// Insert a node before a reference child
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: NodeId,
    ) -> Result<(), HtmlError> {
        let index = self.child_index(parent, ref_child)?;
        self.insert_child_at(parent, new_child, index)
    }

    /// Insert a node after a reference child
    pub fn insert_after(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: NodeId,
    ) -> Result<(), HtmlError> {
        let index = self.child_index(parent, ref_child)?;
        self.insert_child_at(parent, new_child, index + 1)
    }

    /// Insert a node at a position in the child list
    pub fn insert_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), HtmlError> {
        if index > self.node(parent).children.len() {
            return Err(HtmlError::NotAChild);
        }
        self.detach(child);

        let prev = if index > 0 {
            Some(self.node(parent).children[index - 1])
        } else {
            None
        };
        let next = self.node(parent).children.get(index).copied();

        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = Some(child);
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sibling = Some(child);
        }
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        self.node_mut(parent).children.insert(index, child);
        self.after_attach(parent, child);
        Ok(())
    }

    /// Replace an existing child with another node
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), HtmlError> {
        let index = self.child_index(parent, old_child)?;
        self.detach(new_child);

        let prev = self.node(old_child).prev_sibling;
        let next = self.node(old_child).next_sibling;

        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = Some(new_child);
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sibling = Some(new_child);
        }
        {
            let node = self.node_mut(new_child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        self.node_mut(parent).children[index] = new_child;

        {
            let old = self.node_mut(old_child);
            old.parent = None;
            old.prev_sibling = None;
            old.next_sibling = None;
        }
        self.unregister_ids_deep(old_child);
        self.after_attach(parent, new_child);
        Ok(())
    }

    /// Remove a child, dropping its subtree from the tree
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HtmlError> {
        let index = self.child_index(parent, child)?;
        let prev = self.node(child).prev_sibling;
        let next = self.node(child).next_sibling;

        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sibling = prev;
        }
        self.node_mut(parent).children.remove(index);
        {
            let node = self.node_mut(child);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        self.unregister_ids_deep(child);
        self.mark_changed(parent);
        Ok(())
    }

    /// Remove a child but keep its children in place of it
    pub fn remove_child_keep_grandchildren(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), HtmlError> {
        let index = self.child_index(parent, child)?;
        let grandchildren = std::mem::take(&mut self.node_mut(child).children);

        let children = &mut self.node_mut(parent).children;
        children.splice(index..=index, grandchildren.iter().copied());
        self.relink_children(parent);

        {
            let node = self.node_mut(child);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        self.unregister_id(child);
        self.mark_changed(parent);
        Ok(())
    }

    /// Detach every child, clearing their parent and sibling links
    pub fn remove_all_children(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for &child in &children {
            let node = self.node_mut(child);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        for child in children {
            self.unregister_ids_deep(child);
        }
        self.mark_changed(parent);
    }

    /// Position of a node in a parent's child list
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, HtmlError> {
        self.node(parent)
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(HtmlError::NotAChild)
    }

    /// Remove a node from its current parent, if it has one
    pub(crate) fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node(child).parent {
            // Ignore the impossible not-a-child case; parent came from the node
            let _ = self.remove_child(parent, child);
        }
    }

    fn after_attach(&mut self, parent: NodeId, child: NodeId) {
        self.register_ids_deep(child);
        self.mark_changed(parent);
    }

    /// Rebuild parent and sibling links from the child list after a splice
    fn relink_children(&mut self, parent: NodeId) {
        let children = self.node(parent).children.clone();
        for (i, &c) in children.iter().enumerate() {
            let prev = if i > 0 { Some(children[i - 1]) } else { None };
            let next = children.get(i + 1).copied();
            let node = self.node_mut(c);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::document::{Document, Options};
    use crate::dom::node::NodeId;
    use crate::error::HtmlError;

    fn assert_links_consistent(doc: &Document, parent: NodeId) {
        let children = doc.children(parent);
        for (i, &c) in children.iter().enumerate() {
            assert_eq!(doc.node(c).parent, Some(parent));
            let prev = if i > 0 { Some(children[i - 1]) } else { None };
            let next = children.get(i + 1).copied();
            assert_eq!(doc.node(c).prev_sibling, prev);
            assert_eq!(doc.node(c).next_sibling, next);
        }
    }

    #[test]
    fn test_append_and_prepend() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(root, b).unwrap();
        doc.append_child(root, c).unwrap();
        doc.prepend_child(root, a).unwrap();
        assert_eq!(doc.children(root), &[a, b, c]);
        assert_links_consistent(&doc, root);
        assert!(doc.node(root).is_changed());
    }

    #[test]
    fn test_insert_before_after() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let c = doc.create_element("c");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, c).unwrap();

        let b = doc.create_element("b");
        doc.insert_after(root, b, a).unwrap();
        let d = doc.create_element("d");
        doc.insert_before(root, d, a).unwrap();
        assert_eq!(doc.children(root), &[d, a, b, c]);
        assert_links_consistent(&doc, root);
    }

    #[test]
    fn test_not_a_child() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let stray = doc.create_element("stray");
        doc.append_child(root, a).unwrap();
        assert!(matches!(
            doc.insert_before(root, a, stray),
            Err(HtmlError::NotAChild)
        ));
        assert!(matches!(
            doc.remove_child(root, stray),
            Err(HtmlError::NotAChild)
        ));
    }

    #[test]
    fn test_replace_child() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        let n = doc.create_element("n");
        doc.append_child(root, b).unwrap();
        doc.replace_child(root, n, a).unwrap();
        assert_eq!(doc.children(root), &[n, b]);
        assert!(doc.node(a).parent.is_none());
        assert_links_consistent(&doc, root);
    }

    #[test]
    fn test_remove_keep_grandchildren() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let wrapper = doc.create_element("div");
        let x = doc.create_element("x");
        let y = doc.create_element("y");
        doc.append_child(root, wrapper).unwrap();
        doc.append_child(wrapper, x).unwrap();
        doc.append_child(wrapper, y).unwrap();

        doc.remove_child_keep_grandchildren(root, wrapper).unwrap();
        assert_eq!(doc.children(root), &[x, y]);
        assert!(doc.node(wrapper).parent.is_none());
        assert_links_consistent(&doc, root);
    }

    #[test]
    fn test_remove_all_children() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.remove_all_children(root);
        assert!(doc.children(root).is_empty());
        assert!(doc.node(a).parent.is_none());
        assert!(doc.node(a).prev_sibling.is_none());
        assert!(doc.node(b).next_sibling.is_none());
    }

    #[test]
    fn test_reattach_moves_node() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        // appending an attached node moves it
        doc.append_child(b, a).unwrap();
        assert_eq!(doc.children(root), &[b]);
        assert_eq!(doc.children(b), &[a]);
        assert_links_consistent(&doc, root);
        assert_links_consistent(&doc, b);
    }

    #[test]
    fn test_id_index_follows_structure() {
        let mut doc = Document::new(Options::default());
        let root = doc.root();
        let div = doc.create_element("div");
        doc.set_attribute(div, "id", Some("main"));
        doc.append_child(root, div).unwrap();
        assert_eq!(doc.get_element_by_id("main").unwrap(), Some(div));
        doc.remove_child(root, div).unwrap();
        assert_eq!(doc.get_element_by_id("main").unwrap(), None);
    }
}
