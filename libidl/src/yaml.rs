//
// yaml.rs
// The IDL Compiler
//

//! The lowest stage of the pipeline: turning IDL document text into
//! a DOM in which every node remembers where it came from. The
//! `yaml_rust` crate only attaches markers to its event stream, not
//! to its `Yaml` values, so this module drives the event parser
//! itself and assembles `MarkedNode`s, which the rule-table parser
//! then maps onto syntax-tree entities.

use yaml_rust::parser::{ Parser, MarkedEventReceiver, Event };
use yaml_rust::scanner::Marker;
use error::{ ParserError, ERROR_ID_YAML_SCAN };
use util::Location;


/// The value of one node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// A scalar leaf; always kept in its string spelling.
    Scalar(String),
    /// An ordered sequence of child nodes.
    Sequence(Vec<MarkedNode>),
    /// A mapping, kept as (key, value) pairs in document order.
    /// Keys are expected to be scalars; the parser diagnoses the rest.
    Mapping(Vec<(MarkedNode, MarkedNode)>),
}

/// A YAML node annotated with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedNode {
    /// Where the node starts in the source document.
    pub location: Location,
    /// The node's value.
    pub value: NodeValue,
}

impl MarkedNode {
    /// A human-readable name for the node's shape, used in
    /// wrong-node-type diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self.value {
            NodeValue::Scalar(_)   => "scalar",
            NodeValue::Sequence(_) => "sequence",
            NodeValue::Mapping(_)  => "mapping",
        }
    }

    /// The scalar value, if this node is a scalar.
    pub fn scalar(&self) -> Option<&str> {
        match self.value {
            NodeValue::Scalar(ref s) => Some(s),
            _ => None,
        }
    }

    /// The children, if this node is a sequence.
    pub fn sequence(&self) -> Option<&[MarkedNode]> {
        match self.value {
            NodeValue::Sequence(ref items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this node is a mapping.
    pub fn mapping(&self) -> Option<&[(MarkedNode, MarkedNode)]> {
        match self.value {
            NodeValue::Mapping(ref entries) => Some(entries),
            _ => None,
        }
    }
}

// Containers currently being assembled. Mapping children are kept
// flat (key, value, key, value, ...) and paired up at MappingEnd.
#[derive(Debug)]
enum OpenNode {
    Sequence(Location, Vec<MarkedNode>),
    Mapping(Location, Vec<MarkedNode>),
}

#[derive(Debug, Default)]
struct DomBuilder {
    file: String,
    stack: Vec<OpenNode>,
    root: Option<MarkedNode>,
    alias_location: Option<Location>,
}

impl DomBuilder {
    fn location(&self, marker: Marker) -> Location {
        // marker lines are 1-based, columns 0-based
        Location::new(self.file.as_str(), marker.line(), marker.col() + 1)
    }

    fn push_value(&mut self, node: MarkedNode) {
        match self.stack.last_mut() {
            Some(&mut OpenNode::Sequence(_, ref mut items)) => items.push(node),
            Some(&mut OpenNode::Mapping(_, ref mut items))  => items.push(node),
            None => self.root = Some(node),
        }
    }

    fn close(&mut self) {
        let node = match self.stack.pop() {
            Some(OpenNode::Sequence(location, items)) => MarkedNode {
                location,
                value: NodeValue::Sequence(items),
            },
            Some(OpenNode::Mapping(location, items)) => {
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();

                while let Some(key) = iter.next() {
                    match iter.next() {
                        Some(value) => entries.push((key, value)),
                        None => break, // unterminated pair; scanner reports it
                    }
                }

                MarkedNode {
                    location,
                    value: NodeValue::Mapping(entries),
                }
            },
            None => return,
        };

        self.push_value(node)
    }
}

impl MarkedEventReceiver for DomBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        match event {
            Event::Scalar(value, _, _, _) => {
                let location = self.location(marker);
                self.push_value(
                    MarkedNode {
                        location,
                        value: NodeValue::Scalar(value),
                    }
                )
            },
            Event::SequenceStart(_) => {
                let location = self.location(marker);
                self.stack.push(OpenNode::Sequence(location, vec![]))
            },
            Event::MappingStart(_) => {
                let location = self.location(marker);
                self.stack.push(OpenNode::Mapping(location, vec![]))
            },
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(_) => {
                // IDL documents have no use for anchors; remember the
                // position so load() can reject the document.
                if self.alias_location.is_none() {
                    self.alias_location = Some(self.location(marker));
                }
            },
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {},
        }
    }
}

/// Parses one document's worth of YAML into a marked DOM.
///
/// Returns `Ok(None)` for an empty document, and a single located
/// diagnostic for malformed YAML (the scanner stops at the first
/// error, so there is never more than one).
pub fn load(file_name: &str, source: &str) -> ::std::result::Result<Option<MarkedNode>, ParserError> {
    let mut builder = DomBuilder {
        file: file_name.to_owned(),
        ..Default::default()
    };

    let mut parser = Parser::new(source.chars());

    parser.load(&mut builder, false).map_err(|scan_error| {
        let marker = *scan_error.marker();
        ParserError {
            location: Location::new(file_name, marker.line(), marker.col() + 1),
            id: ERROR_ID_YAML_SCAN,
            msg: format!("invalid YAML: {}", scan_error),
        }
    })?;

    if let Some(location) = builder.alias_location {
        return Err(
            ParserError {
                location,
                id: ERROR_ID_YAML_SCAN,
                msg: "anchors and aliases are not allowed in IDL documents".to_owned(),
            }
        );
    }

    Ok(builder.root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(source: &str) -> MarkedNode {
        load("test.idl", source).unwrap().unwrap()
    }

    #[test]
    fn scalar_locations_are_one_based() {
        let node = root("global:\n    cpp_namespace: mongo\n");
        let entries = node.mapping().unwrap();

        assert_eq!(entries[0].0.scalar(), Some("global"));
        assert_eq!(entries[0].0.location.line, 1);
        assert_eq!(entries[0].0.location.column, 1);

        let inner = entries[0].1.mapping().unwrap();
        assert_eq!(inner[0].0.scalar(), Some("cpp_namespace"));
        assert_eq!(inner[0].0.location.line, 2);
        assert_eq!(inner[0].0.location.column, 5);
    }

    #[test]
    fn sequences_and_shapes() {
        let node = root("imports:\n    - a.idl\n    - b.idl\n");
        let entries = node.mapping().unwrap();
        let imports = entries[0].1.sequence().unwrap();

        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].scalar(), Some("a.idl"));
        assert_eq!(entries[0].1.type_name(), "sequence");
    }

    #[test]
    fn empty_document_has_no_root() {
        assert_eq!(load("test.idl", "").unwrap(), None);
    }

    #[test]
    fn malformed_yaml_is_one_located_error() {
        let err = load("test.idl", "a: [unclosed\n").unwrap_err();
        assert_eq!(err.id, ERROR_ID_YAML_SCAN);
    }
}
