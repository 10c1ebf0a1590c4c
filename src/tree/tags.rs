// Document structure tree collected from the tagged elements of each page
use std::collections::HashMap;

use super::{ElementPaint, NodeId, StackingContext};

/// A tagged element and the tagged elements painted inside it
#[derive(Clone, Debug, PartialEq)]
pub struct TagNode {
    pub tag: String,
    /// Marked-content id, unique across the document and never zero
    pub id: i32,
    pub children: Vec<TagNode>,
}

/// Structure tree for a whole document.
///
/// Elements are visited in painting order and untagged elements are
/// transparent: their tagged descendants attach to the nearest tagged
/// ancestor. Iframe documents are not walked; their content is marked with
/// the iframe element's id.
#[derive(Clone, Debug, Default)]
pub struct StructureTree {
    pub roots: Vec<TagNode>,
    pages: Vec<HashMap<NodeId, i32>>,
}

impl StructureTree {
    pub fn build(pages: &[StackingContext]) -> Self {
        let mut tree = StructureTree::default();
        let mut next_id = 1;
        for page in pages {
            let mut collector = Collector {
                ids: HashMap::new(),
                next_id,
            };
            collector.stack(page, &mut tree.roots);
            next_id = collector.next_id;
            tree.pages.push(collector.ids);
        }
        tree
    }

    /// Marked-content ids of the tagged elements on one page
    pub fn page_ids(&self, page: usize) -> Option<&HashMap<NodeId, i32>> {
        self.pages.get(page)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

struct Collector {
    ids: HashMap<NodeId, i32>,
    next_id: i32,
}

impl Collector {
    fn assign(&mut self, element: &ElementPaint) -> Option<(String, i32)> {
        let tag = element.tag.clone()?;
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(element.id, id);
        Some((tag, id))
    }

    fn attach(tagged: Option<(String, i32)>, children: Vec<TagNode>, out: &mut Vec<TagNode>) {
        match tagged {
            Some((tag, id)) => out.push(TagNode { tag, id, children }),
            None => out.extend(children),
        }
    }

    fn element(&mut self, element: &ElementPaint, out: &mut Vec<TagNode>) {
        if !element.visible {
            return;
        }
        let tagged = self.assign(element);
        Self::attach(tagged, Vec::new(), out);
    }

    fn stack(&mut self, stack: &StackingContext, out: &mut Vec<TagNode>) {
        if !stack.element.visible {
            return;
        }
        let tagged = self.assign(&stack.element);

        let mut children = Vec::new();
        for child in &stack.negative_z_index {
            self.stack(child, &mut children);
        }
        for node in &stack.non_inline_level {
            self.element(node, &mut children);
        }
        for child in &stack.non_positioned_floats {
            self.stack(child, &mut children);
        }
        for child in &stack.non_positioned_inline_level {
            self.stack(child, &mut children);
        }
        for node in &stack.inline_level {
            self.element(node, &mut children);
        }
        for child in &stack.zero_or_auto_z_index_or_transformed_or_opacity {
            self.stack(child, &mut children);
        }
        for child in &stack.positive_z_index {
            self.stack(child, &mut children);
        }

        Self::attach(tagged, children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BoxGeometry;
    use kurbo::Rect;

    fn element(id: u64, tag: Option<&str>) -> ElementPaint {
        let mut element = ElementPaint::new(NodeId(id), BoxGeometry::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        element.tag = tag.map(str::to_string);
        element
    }

    #[test]
    fn untagged_elements_pass_children_through() {
        let mut root = StackingContext::new(element(1, Some("Document")));
        let mut wrapper = StackingContext::new(element(2, None));
        wrapper.non_inline_level.push(element(3, Some("P")));
        root.zero_or_auto_z_index_or_transformed_or_opacity.push(wrapper);
        root.non_inline_level.push(element(4, Some("H1")));

        let tree = StructureTree::build(&[root]);
        assert_eq!(tree.roots.len(), 1);
        let document = &tree.roots[0];
        assert_eq!(document.tag, "Document");
        let children: Vec<&str> = document.children.iter().map(|node| node.tag.as_str()).collect();
        assert_eq!(children, vec!["H1", "P"]);

        let ids = tree.page_ids(0).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains_key(&NodeId(2)));
        assert_eq!(ids[&NodeId(1)], document.id);
    }

    #[test]
    fn ids_are_unique_across_pages() {
        let first = StackingContext::new(element(1, Some("P")));
        let second = StackingContext::new(element(1, Some("P")));
        let tree = StructureTree::build(&[first, second]);

        assert_eq!(tree.roots.len(), 2);
        let a = tree.page_ids(0).unwrap()[&NodeId(1)];
        let b = tree.page_ids(1).unwrap()[&NodeId(1)];
        assert_ne!(a, b);
        assert!(a > 0 && b > 0);
    }

    #[test]
    fn invisible_subtrees_are_not_tagged() {
        let mut root = StackingContext::new(element(1, Some("Document")));
        let mut hidden = StackingContext::new(element(2, Some("Sect")));
        hidden.element.visible = false;
        hidden.non_inline_level.push(element(3, Some("P")));
        root.positive_z_index.push(hidden);

        let tree = StructureTree::build(&[root]);
        assert!(tree.roots[0].children.is_empty());
        assert_eq!(tree.page_ids(0).unwrap().len(), 1);
    }
}
