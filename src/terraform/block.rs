//! Declared blocks: resources, data sources, modules and provider configurations.

use serde_json::{Map, Value};

use super::address::{Address, ProviderRef, sanitize_id};

/// A resource, data source or module declaration with its dependency edges.
#[derive(Debug, Clone)]
pub struct Block {
    address: Address,
    body: Map<String, Value>,
    depends_on: Vec<Address>,
    provider: Option<ProviderRef>,
}

impl Block {
    pub fn resource(kind: &str, name: &str) -> Self {
        Self::with_address(Address::resource(kind, name))
    }

    pub fn data(kind: &str, name: &str) -> Self {
        Self::with_address(Address::data(kind, name))
    }

    /// Module block pinned to a registry source and version constraint.
    pub fn module(name: &str, source: &str, version: &str) -> Self {
        Self::with_address(Address::module(name))
            .attr("source", source)
            .attr("version", version)
    }

    fn with_address(address: Address) -> Self {
        Self {
            address,
            body: Map::new(),
            depends_on: Vec::new(),
            provider: None,
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }

    /// Add an explicit ordering edge. Duplicate edges are ignored.
    pub fn depends_on(mut self, target: &Address) -> Self {
        if !self.depends_on.contains(target) {
            self.depends_on.push(target.clone());
        }
        self
    }

    pub fn depends_on_all<'a>(self, targets: impl IntoIterator<Item = &'a Address>) -> Self {
        targets.into_iter().fold(self, |block, t| block.depends_on(t))
    }

    pub fn provider(mut self, provider: &ProviderRef) -> Self {
        self.provider = Some(provider.clone());
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn dependencies(&self) -> &[Address] {
        &self.depends_on
    }

    pub fn provider_ref(&self) -> Option<&ProviderRef> {
        self.provider.as_ref()
    }

    /// Render the block body as Terraform JSON, including meta-arguments.
    pub fn to_json(&self) -> Value {
        let mut body = self.body.clone();
        if let Some(provider) = &self.provider {
            body.insert("provider".to_string(), Value::String(provider.to_string()));
        }
        if !self.depends_on.is_empty() {
            let deps = self
                .depends_on
                .iter()
                .map(|d| Value::String(d.to_string()))
                .collect();
            body.insert("depends_on".to_string(), Value::Array(deps));
        }
        Value::Object(body)
    }
}

/// A provider configuration block.
#[derive(Debug, Clone)]
pub struct Provider {
    reference: ProviderRef,
    body: Map<String, Value>,
}

impl Provider {
    pub fn new(name: &str) -> Self {
        Self {
            reference: ProviderRef::default_for(name),
            body: Map::new(),
        }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            reference: ProviderRef::aliased(name, &sanitize_id(alias)),
            body: Map::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }

    pub fn reference(&self) -> &ProviderRef {
        &self.reference
    }

    pub fn to_json(&self) -> Value {
        let mut body = self.body.clone();
        if let Some(alias) = &self.reference.alias {
            body.insert("alias".to_string(), Value::String(alias.clone()));
        }
        Value::Object(body)
    }
}
