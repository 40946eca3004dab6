use serde::{Deserialize, Serialize};

use crate::crypto::{function_selector, SELECTOR_SIZE};

/// Kind of a JSON ABI entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiEntryKind {
    // Solidity treats a missing `type` as a function
    #[default]
    Function,
    Constructor,
    Event,
    Error,
    Fallback,
    Receive,
}

/// Parameter of a function, event or error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

impl AbiParam {
    /// Canonical type as it appears in a signature, with tuples expanded
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self
                    .components
                    .iter()
                    .map(AbiParam::canonical_type)
                    .collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    #[serde(rename = "type", default)]
    pub kind: AbiEntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anonymous: bool,
}

impl AbiEntry {
    /// `name(type1,type2)`
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(AbiParam::canonical_type).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    pub fn selector(&self) -> [u8; SELECTOR_SIZE] {
        function_selector(&self.signature())
    }

    pub fn is_view(&self) -> bool {
        matches!(self.state_mutability.as_deref(), Some("view") | Some("pure"))
    }
}

/// A contract's JSON ABI
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractInterface(Vec<AbiEntry>);

impl ContractInterface {
    pub fn new(entries: Vec<AbiEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.0
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.0
            .iter()
            .filter(|entry| entry.kind == AbiEntryKind::Function)
    }

    // First overload wins, as viem does for name-only lookups
    pub fn function(&self, name: &str) -> Option<&AbiEntry> {
        self.functions().find(|entry| entry.name == name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
