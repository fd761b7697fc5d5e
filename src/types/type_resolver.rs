// Path to declared-type resolution over a precomputed element index

use std::collections::HashMap;
use std::fmt;

use super::schema::{FhirSchemaElement, SchemaRegistry};

/// Outcome of resolving a property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType<'a> {
    Named(&'a str),
    /// The schema declares no single type at this path: unknown segments,
    /// polymorphic branches, or paths running below a primitive.
    Unresolved,
}

impl<'a> ResolvedType<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ResolvedType::Named(name) => Some(*name),
            ResolvedType::Unresolved => None,
        }
    }

    pub fn is(&self, type_name: &str) -> bool {
        self.as_str() == Some(type_name)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedType::Named(_))
    }
}

impl fmt::Display for ResolvedType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Named(name) => write!(f, "{name}"),
            ResolvedType::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

type NodeId = usize;

#[derive(Debug, Clone)]
enum Step {
    /// A type with elements of its own; resolution may continue below it.
    Node(NodeId),
    /// A named type without elements (primitives, undeclared types).
    Leaf(String),
    Polymorphic,
}

#[derive(Debug, Clone)]
struct TypeNode {
    name: String,
    elements: HashMap<String, Step>,
}

/// Resolves `Patient.identifier.type` style paths to declared type names.
///
/// The element tables of every type, including inherited elements and
/// inline backbone elements, are flattened once at construction. A lookup
/// is then one hash probe per segment.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    types: HashMap<String, NodeId>,
    nodes: Vec<TypeNode>,
}

impl TypeResolver {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut resolver = Self {
            types: HashMap::new(),
            nodes: Vec::new(),
        };

        // Ids first so element steps can point at any type.
        let mut complex: Vec<&str> = registry
            .schemas()
            .filter(|schema| !schema.is_primitive())
            .map(|schema| schema.type_name.as_str())
            .collect();
        complex.sort_unstable();
        for name in &complex {
            let id = resolver.push_node(name);
            resolver.types.insert(name.to_string(), id);
        }

        for name in complex {
            let id = resolver.types[name];
            let mut elements = HashMap::new();
            for schema in registry.base_chain(name).into_iter().rev() {
                for (element_name, element) in &schema.elements {
                    let step = resolver.step_for(registry, element);
                    elements.insert(element_name.clone(), step);
                }
            }
            resolver.nodes[id].elements = elements;
        }

        tracing::debug!(
            "Type resolver indexed {} types ({} nodes)",
            resolver.types.len(),
            resolver.nodes.len()
        );
        resolver
    }

    fn push_node(&mut self, name: &str) -> NodeId {
        self.nodes.push(TypeNode {
            name: name.to_string(),
            elements: HashMap::new(),
        });
        self.nodes.len() - 1
    }

    fn step_for(&mut self, registry: &SchemaRegistry, element: &FhirSchemaElement) -> Step {
        if element.is_choice_base() {
            return Step::Polymorphic;
        }
        if let Some(type_name) = &element.type_name {
            if registry.is_abstract(type_name) {
                return Step::Polymorphic;
            }
            return match self.types.get(type_name) {
                Some(id) => Step::Node(*id),
                None => Step::Leaf(type_name.clone()),
            };
        }
        let Some(children) = &element.elements else {
            return Step::Polymorphic;
        };
        let id = self.push_node("BackboneElement");
        let mut elements = HashMap::new();
        for (child_name, child) in children {
            let step = self.step_for(registry, child);
            elements.insert(child_name.clone(), step);
        }
        self.nodes[id].elements = elements;
        Step::Node(id)
    }

    /// Resolve a path whose first segment is the resource type and whose
    /// remaining segments are property names (no array indices).
    pub fn resolve(&self, path: &[&str]) -> ResolvedType<'_> {
        let Some((root, rest)) = path.split_first() else {
            return ResolvedType::Unresolved;
        };
        let Some(&root_id) = self.types.get(*root) else {
            return ResolvedType::Unresolved;
        };

        let mut current = root_id;
        for (position, segment) in rest.iter().enumerate() {
            match self.nodes[current].elements.get(*segment) {
                Some(Step::Node(id)) => current = *id,
                Some(Step::Leaf(name)) if position + 1 == rest.len() => {
                    return ResolvedType::Named(name.as_str());
                }
                _ => return ResolvedType::Unresolved,
            }
        }
        ResolvedType::Named(self.nodes[current].name.as_str())
    }

    /// Resolve a dotted path. Index suffixes (`identifier[0]`) and purely
    /// numeric segments are dropped first.
    pub fn resolve_dotted(&self, dotted: &str) -> ResolvedType<'_> {
        let segments: Vec<&str> = dotted
            .split('.')
            .map(|segment| segment.split('[').next().unwrap_or(segment))
            .filter(|segment| !segment.is_empty() && !segment.bytes().all(|b| b.is_ascii_digit()))
            .collect();
        self.resolve(&segments)
    }

    pub fn knows_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }
}
