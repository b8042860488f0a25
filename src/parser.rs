//! XML → tree. Builds a small owned DOM over `quick-xml`'s event stream
//! (closer to the reference `ElementTree` two-phase parse than a lazy
//! single-pass reader), then recursively instantiates nodes from it through
//! a [`NodeRegistry`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use quick_xml::events::Event;
use thiserror::Error;

use crate::blackboard::Blackboard;
use crate::node::TreeNode;
use crate::nodes::subtree::{RootTree, SubTree};
use crate::registry::{NodeRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error reading XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("error reading an XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("XML was not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("error reading an included file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("document is empty, expected a <root> element")]
    MissingRoot,
    #[error("expected <root> as the document element, found <{0}>")]
    ExpectedRoot(String),
    #[error("unsupported or missing BTCPP_format attribute, expected \"4\"")]
    UnsupportedFormatVersion,
    #[error("<{0}> is missing the required attribute [{1}]")]
    MissingAttribute(String, String),
    #[error("ros_pkg includes are not supported")]
    RosPkgUnsupported,
    #[error("invalid top-level tag: <{0}>")]
    InvalidTag(String),
    #[error("subtree ID [{0}] collides with an already-registered node name or subtree")]
    DuplicateTreeId(String),
    #[error("no tree registered for ID [{0}]")]
    UnknownTree(String),
    #[error("<{0}> must have exactly one XML child")]
    WrongChildCount(String),
    #[error("node [{0}] reported class_name() [{1}], expected [{0}]")]
    ClassNameMismatch(String, String),
    #[error("no main tree: set main_tree_to_execute or declare exactly one <BehaviorTree>")]
    NoMainTree,
}

/// Resolves `<include path="...">` to file contents. The parser core never
/// touches the filesystem directly, so it can be driven from in-memory
/// strings in tests.
pub trait IncludeLoader {
    fn load(&self, path: &Path) -> Result<String, ParseError>;
}

/// Reads included files straight from disk.
pub struct FsIncludeLoader;

impl IncludeLoader for FsIncludeLoader {
    fn load(&self, path: &Path) -> Result<String, ParseError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[derive(Clone)]
struct XmlElement {
    tag: String,
    attrs: HashMap<String, String>,
    children: Vec<XmlElement>,
}

fn parse_xml(xml: &str) -> Result<XmlElement, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.trim_text(true);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let tag = String::from_utf8(e.name().as_ref().to_vec())?;
                let attrs = attrs_to_map(&e)?;
                stack.push(XmlElement {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            }
            Event::Empty(e) => {
                let tag = String::from_utf8(e.name().as_ref().to_vec())?;
                let attrs = attrs_to_map(&e)?;
                let elem = XmlElement {
                    tag,
                    attrs,
                    children: Vec::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None => root = Some(elem),
                }
            }
            Event::End(_) => {
                let finished = stack.pop().expect("unbalanced XML (checked by quick-xml)");
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None => root = Some(finished),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or(ParseError::MissingRoot)
}

fn attrs_to_map(e: &quick_xml::events::BytesStart) -> Result<HashMap<String, String>, ParseError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

type Decorator = Box<dyn Fn(Box<dyn TreeNode>) -> Box<dyn TreeNode>>;

/// Loads `BehaviorTree` objects from XML. One parser instance corresponds to
/// one parse: construct, call `parse`/`parse_string` once, discard.
pub struct BtParser<'a> {
    registry: &'a NodeRegistry,
    loader: Box<dyn IncludeLoader>,
    decorators: Vec<Decorator>,
    main_tree: RefCell<Option<String>>,
    tree_descriptions: RefCell<HashMap<String, XmlElement>>,
}

impl<'a> BtParser<'a> {
    pub fn new(registry: &'a NodeRegistry) -> Self {
        BtParser {
            registry,
            loader: Box::new(FsIncludeLoader),
            decorators: Vec::new(),
            main_tree: RefCell::new(None),
            tree_descriptions: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn IncludeLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Add a post-construction wrapper applied, in registration order, to
    /// every non-`SubTree` node this parser instantiates.
    pub fn with_decorator(
        mut self,
        decorator: impl Fn(Box<dyn TreeNode>) -> Box<dyn TreeNode> + 'static,
    ) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn parse(
        &self,
        path: &Path,
        blackboard: Option<Blackboard>,
    ) -> Result<RootTree, ParseError> {
        self.parse_file(path, true)?;
        self.build(blackboard)
    }

    pub fn parse_string(
        &self,
        xml: &str,
        cwd: &Path,
        blackboard: Option<Blackboard>,
    ) -> Result<RootTree, ParseError> {
        self.parse_string_into(xml, cwd, true)?;
        self.build(blackboard)
    }

    fn parse_file(&self, path: &Path, first: bool) -> Result<(), ParseError> {
        let xml = self.loader.load(path)?;
        let cwd = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        self.parse_string_into(&xml, &cwd, first)
    }

    fn parse_string_into(&self, xml: &str, cwd: &Path, first: bool) -> Result<(), ParseError> {
        let root = parse_xml(xml)?;
        self.from_xml(&root, cwd, first)
    }

    fn from_xml(&self, xml: &XmlElement, cwd: &Path, first: bool) -> Result<(), ParseError> {
        if xml.tag != "root" {
            return Err(ParseError::ExpectedRoot(xml.tag.clone()));
        }
        if xml.attrs.get("BTCPP_format").map(String::as_str) != Some("4") {
            return Err(ParseError::UnsupportedFormatVersion);
        }
        if first {
            if let Some(main) = xml.attrs.get("main_tree_to_execute") {
                *self.main_tree.borrow_mut() = Some(main.clone());
            }
        }

        for child in &xml.children {
            match child.tag.as_str() {
                "BehaviorTree" => {
                    let id = child
                        .attrs
                        .get("ID")
                        .ok_or_else(|| {
                            ParseError::MissingAttribute("BehaviorTree".to_string(), "ID".to_string())
                        })?
                        .clone();
                    if self.registry.has(&id) || self.tree_descriptions.borrow().contains_key(&id) {
                        return Err(ParseError::DuplicateTreeId(id));
                    }
                    if self.main_tree.borrow().is_none() {
                        *self.main_tree.borrow_mut() = Some(id.clone());
                    }
                    if child.children.len() != 1 {
                        return Err(ParseError::WrongChildCount("BehaviorTree".to_string()));
                    }
                    self.tree_descriptions
                        .borrow_mut()
                        .insert(id, child.children[0].clone());
                }
                "include" => {
                    if child.attrs.contains_key("ros_pkg") {
                        return Err(ParseError::RosPkgUnsupported);
                    }
                    let rel = child.attrs.get("path").ok_or_else(|| {
                        ParseError::MissingAttribute("include".to_string(), "path".to_string())
                    })?;
                    let included = cwd.join(rel);
                    self.parse_file(&included, false)?;
                }
                "TreeNodesModel" => {}
                other => return Err(ParseError::InvalidTag(other.to_string())),
            }
        }
        Ok(())
    }

    fn build(&self, blackboard: Option<Blackboard>) -> Result<RootTree, ParseError> {
        let main = self
            .main_tree
            .borrow()
            .clone()
            .ok_or(ParseError::NoMainTree)?;
        let body = self
            .tree_descriptions
            .borrow()
            .get(&main)
            .cloned()
            .ok_or_else(|| ParseError::UnknownTree(main.clone()))?;
        let child = self.load_element(&body)?;
        let mut root_tree = RootTree::new(main, child, HashMap::new());
        root_tree.attach_blackboard(&blackboard.unwrap_or_else(Blackboard::new_root))?;
        Ok(root_tree)
    }

    fn load_element(&self, xml: &XmlElement) -> Result<Box<dyn TreeNode>, ParseError> {
        let mut attrs = xml.attrs.clone();

        if xml.tag == "SubTree" {
            let id = attrs
                .remove("ID")
                .ok_or_else(|| ParseError::MissingAttribute("SubTree".to_string(), "ID".to_string()))?;
            if !xml.children.is_empty() {
                return Err(ParseError::WrongChildCount("SubTree".to_string()));
            }
            let body = self
                .tree_descriptions
                .borrow()
                .get(&id)
                .cloned()
                .ok_or_else(|| ParseError::UnknownTree(id.clone()))?;
            let nested = self.load_element(&body)?;
            // SubTree nodes are never decorator-wrapped themselves; only the
            // nested body they reference is, via the recursive call above.
            return Ok(Box::new(SubTree::new(id, nested, attrs)));
        }

        let name = if xml.tag == "Action" {
            attrs
                .remove("ID")
                .ok_or_else(|| ParseError::MissingAttribute("Action".to_string(), "ID".to_string()))?
        } else {
            xml.tag.clone()
        };

        let children = xml
            .children
            .iter()
            .map(|c| self.load_element(c))
            .collect::<Result<Vec<_>, _>>()?;

        let factory = self.registry.get(&name)?;
        let mut node = factory(children, attrs);
        if node.class_name() != name {
            return Err(ParseError::ClassNameMismatch(
                name,
                node.class_name().to_string(),
            ));
        }
        for decorator in &self.decorators {
            node = decorator(node);
        }
        Ok(node)
    }
}
