//! Layout tree shared by host layouts, plugin descriptors and merged output.
//!
//! A layout is a labeled ordered tree read from and written to the XML GUI
//! description format:
//!
//! ```xml
//! <!DOCTYPE gui SYSTEM "kpartgui.dtd">
//! <gui name="kipiplugin_flickr" version="3">
//!  <MenuBar>
//!   <Menu name="Export"><text>&amp;Export</text>
//!    <Action name="flickrexport"/>
//!   </Menu>
//!  </MenuBar>
//!  <ToolBar name="mainToolBar"><text>Main Toolbar</text></ToolBar>
//!  <ActionProperties/>
//! </gui>
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{PluginError, Result};

pub const TAG_GUI: &str = "gui";
pub const TAG_KPARTGUI: &str = "kpartgui";
pub const TAG_MENU_BAR: &str = "MenuBar";
pub const TAG_MENU: &str = "Menu";
pub const TAG_ACTION: &str = "Action";
pub const TAG_TOOL_BAR: &str = "ToolBar";
pub const TAG_ACTION_PROPERTIES: &str = "ActionProperties";
pub const TAG_TEXT: &str = "text";

const ATTR_NAME: &str = "name";

/// A node in a layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutNode {
    /// Element tag
    pub tag: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<LayoutNode>,
    /// Character data, if any
    pub text: Option<String>,
}

impl LayoutNode {
    /// Create an empty node.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Create a node carrying a `name` attribute.
    pub fn named(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(tag).with_attr(ATTR_NAME, name)
    }

    /// Create a `text` label element.
    pub fn label(text: impl Into<String>) -> Self {
        Self::new(TAG_TEXT).with_text(text)
    }

    /// Set an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = LayoutNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the character data.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if already present.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// The `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attr(ATTR_NAME)
    }

    /// Whether this node has the given tag.
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// First child with the given tag.
    pub fn first_child(&self, tag: &str) -> Option<&LayoutNode> {
        self.children.iter().find(|c| c.is(tag))
    }

    /// Mutable first child with the given tag.
    pub fn first_child_mut(&mut self, tag: &str) -> Option<&mut LayoutNode> {
        self.children.iter_mut().find(|c| c.is(tag))
    }

    /// Children with the given tag.
    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a LayoutNode> {
        self.children.iter().filter(move |c| c.is(tag))
    }

    /// Child with the given tag and name.
    pub fn find_child(&self, tag: &str, name: &str) -> Option<&LayoutNode> {
        self.children
            .iter()
            .find(|c| c.is(tag) && c.name() == Some(name))
    }

    /// Tag, attributes and text without any children.
    pub fn bare_clone(&self) -> LayoutNode {
        LayoutNode {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
            text: self.text.clone(),
        }
    }

    /// Like [`bare_clone`](Self::bare_clone) but keeps `text` label children.
    pub fn header_clone(&self) -> LayoutNode {
        let mut node = self.bare_clone();
        node.children = self.children_tagged(TAG_TEXT).cloned().collect();
        node
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(LayoutNode::node_count).sum::<usize>()
    }
}

/// A complete layout document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDocument {
    /// Doctype declaration content, e.g. `gui SYSTEM "kpartgui.dtd"`
    pub doctype: Option<String>,
    /// Root element (`gui` or `kpartgui`)
    pub root: LayoutNode,
}

impl LayoutDocument {
    /// Create a document around a root node.
    pub fn new(root: LayoutNode) -> Self {
        Self {
            doctype: None,
            root,
        }
    }

    /// Set the doctype.
    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }

    /// Parse a document from XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut doctype = None;
        let mut stack: Vec<LayoutNode> = Vec::new();
        let mut root: Option<LayoutNode> = None;

        loop {
            match reader.read_event()? {
                Event::DocType(d) => {
                    doctype = Some(String::from_utf8_lossy(&d).trim().to_string());
                }
                Event::Start(e) => stack.push(node_from_start(&e)?),
                Event::Empty(e) => {
                    let node = node_from_start(&e)?;
                    attach(node, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let node = stack.pop().ok_or_else(|| {
                        PluginError::MalformedLayout("unbalanced closing tag".into())
                    })?;
                    attach(node, &mut stack, &mut root)?;
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(c) => {
                    let data = c.into_inner();
                    push_text(&mut stack, &String::from_utf8_lossy(&data))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(PluginError::MalformedLayout("unclosed element".into()));
        }
        let root = root.ok_or_else(|| PluginError::MalformedLayout("no root element".into()))?;
        if !root.is(TAG_GUI) && !root.is(TAG_KPARTGUI) {
            return Err(PluginError::MalformedLayout(format!(
                "unexpected root element <{}>",
                root.tag
            )));
        }

        Ok(Self { doctype, root })
    }

    /// Read and parse a document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Serialize the document to XML text.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
        }
        write_node(&mut writer, &self.root)?;

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| PluginError::MalformedLayout(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }

    /// The `MenuBar` element.
    pub fn menu_bar(&self) -> Option<&LayoutNode> {
        self.root.first_child(TAG_MENU_BAR)
    }

    /// The `ToolBar` element.
    pub fn tool_bar(&self) -> Option<&LayoutNode> {
        self.root.first_child(TAG_TOOL_BAR)
    }

    /// The `ActionProperties` element.
    pub fn action_properties(&self) -> Option<&LayoutNode> {
        self.root.first_child(TAG_ACTION_PROPERTIES)
    }
}

impl FromStr for LayoutDocument {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn node_from_start(start: &BytesStart<'_>) -> Result<LayoutNode> {
    let mut node = LayoutNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(
    node: LayoutNode,
    stack: &mut [LayoutNode],
    root: &mut Option<LayoutNode>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(PluginError::MalformedLayout(
                "more than one root element".into(),
            ))
        }
    }
    Ok(())
}

// Whitespace-only text is indentation. Other text is kept verbatim and must
// come before the element's children.
fn push_text(stack: &mut [LayoutNode], text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let Some(node) = stack.last_mut() else {
        return Ok(());
    };
    if !node.children.is_empty() {
        return Err(PluginError::MalformedLayout(format!(
            "text after child elements in <{}>",
            node.tag
        )));
    }
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
    Ok(())
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &LayoutNode) -> Result<()> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &node.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
    Ok(())
}
