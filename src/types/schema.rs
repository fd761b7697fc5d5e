use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{BundleValidatorError, Result};

/// Kind of a schema definition, mirroring StructureDefinition.kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaKind {
    Resource,
    ComplexType,
    PrimitiveType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FhirSchemaElement {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub array: bool,

    // Choice type handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(rename = "choiceOf", skip_serializing_if = "Option::is_none")]
    pub choice_of: Option<String>,

    // Inline backbone elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<HashMap<String, FhirSchemaElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl FhirSchemaElement {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    pub fn backbone() -> Self {
        Self::default()
    }

    pub fn choice(choices: Vec<String>) -> Self {
        Self {
            choices: Some(choices),
            ..Default::default()
        }
    }

    pub fn as_array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn with_choice_of(mut self, base: impl Into<String>) -> Self {
        self.choice_of = Some(base.into());
        self
    }

    pub fn with_element(mut self, name: impl Into<String>, element: FhirSchemaElement) -> Self {
        self.elements
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), element);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// An element declared with nested elements and no type of its own.
    pub fn is_backbone(&self) -> bool {
        self.type_name.is_none() && self.elements.is_some()
    }

    /// The `value[x]` base element: only the concrete `valueQuantity`
    /// style elements carry a type.
    pub fn is_choice_base(&self) -> bool {
        self.type_name.is_none() && self.choices.is_some()
    }

    pub fn child(&self, name: &str) -> Option<&FhirSchemaElement> {
        self.elements.as_ref()?.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FhirSchema {
    #[serde(rename = "type")]
    pub type_name: String,
    pub kind: SchemaKind,
    #[serde(rename = "abstract", default, skip_serializing_if = "std::ops::Not::not")]
    pub abstract_type: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub elements: HashMap<String, FhirSchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl FhirSchema {
    pub fn new(type_name: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            abstract_type: false,
            base: None,
            elements: HashMap::new(),
            required: Vec::new(),
        }
    }

    pub fn as_abstract(mut self) -> Self {
        self.abstract_type = true;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_element(mut self, name: impl Into<String>, element: FhirSchemaElement) -> Self {
        self.elements.insert(name.into(), element);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn is_resource(&self) -> bool {
        self.kind == SchemaKind::Resource
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == SchemaKind::PrimitiveType
    }
}

/// Static set of type definitions, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: HashMap<String, FhirSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schemas(schemas: impl IntoIterator<Item = FhirSchema>) -> Self {
        let mut registry = Self::new();
        for schema in schemas {
            registry.insert(schema);
        }
        registry
    }

    /// Parse a JSON object mapping type names to definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let schemas: HashMap<String, FhirSchema> = serde_json::from_str(json)?;
        for (name, schema) in &schemas {
            if name != &schema.type_name {
                return Err(BundleValidatorError::schema_error(format!(
                    "definition keyed '{name}' declares type '{}'",
                    schema.type_name
                )));
            }
        }
        Ok(Self { schemas })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn insert(&mut self, schema: FhirSchema) {
        self.schemas.insert(schema.type_name.clone(), schema);
    }

    pub fn get(&self, type_name: &str) -> Option<&FhirSchema> {
        self.schemas.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// The definition of `type_name` followed by its base definitions,
    /// derived first. Stops at an unknown base or a repeated type.
    pub fn base_chain<'a>(&'a self, type_name: &str) -> Vec<&'a FhirSchema> {
        let mut chain: Vec<&FhirSchema> = Vec::new();
        let mut current = self.get(type_name);
        while let Some(schema) = current {
            if chain.iter().any(|seen| seen.type_name == schema.type_name) {
                break;
            }
            chain.push(schema);
            current = schema.base.as_deref().and_then(|base| self.get(base));
        }
        chain
    }

    /// Look up an element of `type_name`, following the base chain.
    pub fn element<'a>(&'a self, type_name: &str, name: &str) -> Option<&'a FhirSchemaElement> {
        self.base_chain(type_name)
            .into_iter()
            .find_map(|schema| schema.elements.get(name))
    }

    /// Required element names of `type_name` including inherited ones.
    pub fn required_elements<'a>(&'a self, type_name: &str) -> Vec<&'a str> {
        let mut required: Vec<&str> = Vec::new();
        for schema in self.base_chain(type_name).into_iter().rev() {
            for name in &schema.required {
                if !required.contains(&name.as_str()) {
                    required.push(name);
                }
            }
        }
        required
    }

    /// Polymorphic types: values of these carry their concrete type in
    /// `resourceType` rather than in the schema.
    pub fn is_abstract(&self, type_name: &str) -> bool {
        self.get(type_name).is_some_and(|schema| schema.abstract_type)
    }

    pub fn is_primitive(&self, type_name: &str) -> bool {
        self.get(type_name).is_some_and(FhirSchema::is_primitive)
    }

    /// Names of all concrete resource types.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .schemas
            .values()
            .filter(|schema| schema.is_resource() && !schema.abstract_type)
            .map(|schema| schema.type_name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn schemas(&self) -> impl Iterator<Item = &FhirSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
