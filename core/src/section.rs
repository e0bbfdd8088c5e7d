//! Ordered documentation tree.
//!
//! A [`Section`] has a title, child sections and items, both kept in
//! insertion order. The engine uses it to publish the reference for its
//! globals (see [`crate::api::Environment::documentation`]).

#[derive(Debug, Clone, PartialEq)]
pub struct Section<I> {
    title: String,
    sections: Vec<Section<I>>,
    items: Vec<I>,
}

impl<I> Section<I> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_section(&mut self, child: Section<I>) {
        self.sections.push(child);
    }

    pub fn add_item(&mut self, item: I) {
        self.items.push(item);
    }

    pub fn sections(&self) -> &[Section<I>] {
        &self.sections
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Child section with the given title, if any.
    pub fn section(&self, title: &str) -> Option<&Section<I>> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn is_sections_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_items_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_section_is_empty() {
        let section: Section<&str> = Section::new("Reference");
        assert_eq!(section.title(), "Reference");
        assert!(section.is_sections_empty());
        assert!(section.is_items_empty());
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut root = Section::new("root");
        let mut math = Section::new("Math");
        math.add_item("+");
        math.add_item("-");
        math.add_item("abs");
        root.add_section(Section::new("Strings"));
        root.add_section(math);
        root.add_item("loose");

        let titles: Vec<_> = root.sections().iter().map(Section::title).collect();
        assert_eq!(titles, vec!["Strings", "Math"]);
        assert_eq!(root.items(), &["loose"]);
        assert!(!root.is_sections_empty());

        let math = root.section("Math").unwrap();
        assert_eq!(math.items(), &["+", "-", "abs"]);
        assert!(math.is_sections_empty());
        assert!(root.section("Lists").is_none());
    }
}
