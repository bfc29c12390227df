//! The desired-state graph: every block declared for one synthesis run.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value, json};
use topological_sort::TopologicalSort;
use tracing::debug;

use super::address::{Address, ProviderRef};
use super::block::{Block, Provider};
use crate::error::{Result, StackError};

/// Registry source and version constraint for each provider the stack may configure.
const PROVIDER_SOURCES: &[(&str, &str, &str)] = &[
    ("aws", "hashicorp/aws", "~> 5.0"),
    ("awx", "denouche/awx", ">= 0.19"),
    ("helm", "hashicorp/helm", "~> 2.15"),
    ("local", "hashicorp/local", "~> 2.5"),
    ("null", "hashicorp/null", "~> 3.2"),
    ("vault", "hashicorp/vault", "~> 4.0"),
];

/// Blocks the engine may process in parallel, in dependency order.
pub type Waves = Vec<Vec<Address>>;

/// Named collection of providers, blocks, outputs and file assets.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    backend: Option<(String, Value)>,
    providers: Vec<Provider>,
    blocks: BTreeMap<Address, Block>,
    outputs: BTreeMap<String, Value>,
    assets: BTreeMap<String, String>,
}

impl Stack {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            backend: None,
            providers: Vec::new(),
            blocks: BTreeMap::new(),
            outputs: BTreeMap::new(),
            assets: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_backend(&mut self, kind: &str, config: Value) {
        self.backend = Some((kind.to_string(), config));
    }

    pub fn backend(&self) -> Option<(&str, &Value)> {
        self.backend.as_ref().map(|(k, v)| (k.as_str(), v))
    }

    /// Configure a provider. A second configuration for the same name and alias is ignored.
    pub fn add_provider(&mut self, provider: Provider) -> ProviderRef {
        let reference = provider.reference().clone();
        if !self.has_provider(&reference) {
            debug!(provider = %reference, "Configuring provider");
            self.providers.push(provider);
        }
        reference
    }

    pub fn has_provider(&self, reference: &ProviderRef) -> bool {
        self.providers.iter().any(|p| p.reference() == reference)
    }

    /// Declare a block. Fails if the address is already taken.
    pub fn add(&mut self, block: Block) -> Result<Address> {
        let address = block.address().clone();
        if self.blocks.contains_key(&address) {
            return Err(StackError::DuplicateBlock(address.to_string()));
        }
        debug!(block = %address, "Declaring block");
        self.blocks.insert(address.clone(), block);
        Ok(address)
    }

    /// Declare a block unless one with the same address exists; returns the address either way.
    pub fn ensure(&mut self, block: Block) -> Address {
        let address = block.address().clone();
        self.blocks.entry(address.clone()).or_insert(block);
        address
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.blocks.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Block> {
        self.blocks.get(address)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add_output(&mut self, name: &str, value: impl Into<Value>, sensitive: bool) {
        let value: Value = value.into();
        let mut output = json!({ "value": value });
        if sensitive {
            output["sensitive"] = Value::Bool(true);
        }
        self.outputs.insert(name.to_string(), output);
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    /// Attach a file written next to the synthesized configuration.
    pub fn add_asset(&mut self, relative_path: &str, contents: &str) {
        self.assets
            .insert(relative_path.to_string(), contents.to_string());
    }

    pub fn assets(&self) -> &BTreeMap<String, String> {
        &self.assets
    }

    /// Explicit dependencies plus blocks referenced through interpolations in the body.
    pub fn edges(&self, block: &Block) -> Vec<Address> {
        let mut edges: Vec<Address> = block.dependencies().to_vec();
        let text = Value::Object(block.body().clone()).to_string();

        for candidate in self.blocks.keys() {
            if candidate == block.address() || edges.contains(candidate) {
                continue;
            }
            if references(&text, &candidate.to_string()) {
                edges.push(candidate.clone());
            }
        }
        edges
    }

    /// Check dependency targets and providers, then order the graph.
    ///
    /// Returns the topological waves, or `DependencyCycle` listing the blocks
    /// that could not be ordered.
    pub fn validate(&self) -> Result<Waves> {
        for block in self.blocks.values() {
            for dep in block.dependencies() {
                if !self.blocks.contains_key(dep) {
                    return Err(StackError::UnknownDependency {
                        from: block.address().to_string(),
                        to: dep.to_string(),
                    });
                }
            }
            if let Some(provider) = block.provider_ref()
                && !self.has_provider(provider)
            {
                return Err(StackError::UnknownProvider {
                    block: block.address().to_string(),
                    provider: provider.to_string(),
                });
            }
        }

        let mut sort = TopologicalSort::<Address>::new();
        for (address, block) in &self.blocks {
            sort.insert(address.clone());
            for dep in self.edges(block) {
                sort.add_dependency(dep, address.clone());
            }
        }

        let mut waves: Waves = Vec::new();
        loop {
            let mut wave = sort.pop_all();
            if wave.is_empty() {
                break;
            }
            wave.sort();
            waves.push(wave);
        }

        if !sort.is_empty() {
            let ordered: HashSet<&Address> = waves.iter().flatten().collect();
            let stuck = self
                .blocks
                .keys()
                .filter(|a| !ordered.contains(a))
                .map(ToString::to_string)
                .collect();
            return Err(StackError::DependencyCycle(stuck));
        }

        Ok(waves)
    }

    /// Render the stack as a Terraform JSON configuration document.
    pub fn to_json(&self) -> Value {
        let mut terraform = Map::new();

        let mut required = Map::new();
        for provider in &self.providers {
            let name = &provider.reference().name;
            if let Some((_, source, version)) =
                PROVIDER_SOURCES.iter().find(|(n, _, _)| n == name)
            {
                required.insert(
                    name.clone(),
                    json!({ "source": source, "version": version }),
                );
            }
        }
        terraform.insert("required_providers".to_string(), Value::Object(required));

        if let Some((kind, config)) = &self.backend {
            let mut backend = Map::new();
            backend.insert(kind.clone(), config.clone());
            terraform.insert("backend".to_string(), Value::Object(backend));
        }

        let mut providers: Map<String, Value> = Map::new();
        for provider in &self.providers {
            let entry = providers
                .entry(provider.reference().name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(configs) = entry {
                configs.push(provider.to_json());
            }
        }

        let mut data: Map<String, Value> = Map::new();
        let mut resources: Map<String, Value> = Map::new();
        let mut modules: Map<String, Value> = Map::new();

        for (address, block) in &self.blocks {
            match address {
                Address::Resource { kind, name } => insert_nested(&mut resources, kind, name, block),
                Address::Data { kind, name } => insert_nested(&mut data, kind, name, block),
                Address::Module { name } => {
                    modules.insert(name.clone(), block.to_json());
                }
            }
        }

        let mut doc = Map::new();
        doc.insert("terraform".to_string(), Value::Object(terraform));
        if !providers.is_empty() {
            doc.insert("provider".to_string(), Value::Object(providers));
        }
        if !data.is_empty() {
            doc.insert("data".to_string(), Value::Object(data));
        }
        if !resources.is_empty() {
            doc.insert("resource".to_string(), Value::Object(resources));
        }
        if !modules.is_empty() {
            doc.insert("module".to_string(), Value::Object(modules));
        }
        if !self.outputs.is_empty() {
            let outputs = self
                .outputs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            doc.insert("output".to_string(), Value::Object(outputs));
        }
        Value::Object(doc)
    }
}

fn insert_nested(section: &mut Map<String, Value>, kind: &str, name: &str, block: &Block) {
    let entry = section
        .entry(kind.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(by_name) = entry {
        by_name.insert(name.to_string(), block.to_json());
    }
}

/// True if `text` contains an attribute traversal of `address` (`<address>.`),
/// not embedded in a longer address such as `data.<address>`.
fn references(text: &str, address: &str) -> bool {
    let needle = format!("{}.", address);
    text.match_indices(&needle).any(|(i, _)| {
        text[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    })
}
