//! In-memory element tree shared by the decoder and the encoder.

/// An XML element: name, ordered attributes, text content and children.
///
/// Text content is never absent; an element without text carries an empty
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name of the element.
    pub name: String,
    /// Text content, empty if the element has none.
    pub text: String,
    /// Attributes as name-value pairs, in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements, in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the text content of this element.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute to this element.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Add a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of elements in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Iterate over this subtree in pre-order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

// Deep trees are torn down with a work list rather than nested drops.
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut element) = pending.pop() {
            pending.append(&mut element.children);
        }
    }
}

/// Pre-order iterator over an element subtree.
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_order() {
        let tree = Element::new("a")
            .child(Element::new("b").child(Element::new("c")).child(Element::new("d")))
            .child(Element::new("e"));

        let names: Vec<_> = tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_deep_tree_drop() {
        let mut tree = Element::new("leaf");
        for _ in 0..200_000 {
            tree = Element::new("a").child(tree);
        }
        assert_eq!(tree.iter().count(), 200_001);
        drop(tree);
    }

    #[test]
    fn test_attribute_lookup() {
        let element = Element::new("Texture").attr("Map", "Diffuse").attr("File", "a.dds");

        assert_eq!(element.attribute("File"), Some("a.dds"));
        assert_eq!(element.attribute("Missing"), None);
    }
}
