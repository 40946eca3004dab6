use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RegistryError;
use crate::{
    abi::ContractInterface,
    chain::ChainId,
    crypto::{parse_address, Address},
    error::ModulesResult,
    types::{map_type, ValueCategory},
};

/// One creation argument as described by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Solidity type descriptor, e.g. `uint256[]`
    #[serde(rename = "type")]
    pub type_descriptor: String,
    /// Example value used for test deployments
    #[serde(default)]
    pub example: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl ArgSpec {
    pub fn category(&self) -> ModulesResult<ValueCategory> {
        map_type(&self.type_descriptor)
    }
}

/// Positional creation arguments
///
/// Immutable arguments become part of the instance identity; mutable ones
/// are initialization data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationArgs {
    /// Whether the module is scoped to the hat it is created for
    #[serde(default = "default_use_hat_id")]
    pub use_hat_id: bool,
    pub immutable: Vec<ArgSpec>,
    pub mutable: Vec<ArgSpec>,
}

impl Default for CreationArgs {
    fn default() -> Self {
        Self {
            use_hat_id: default_use_hat_id(),
            immutable: Vec::new(),
            mutable: Vec::new(),
        }
    }
}

fn default_use_hat_id() -> bool {
    true
}

/// Known implementation address of a module on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub chain_id: ChainId,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
}

/// A deployable module template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_address: Option<Address>,
    pub abi: ContractInterface,
    pub creation_args: CreationArgs,
    pub deployments: Vec<Deployment>,
}

impl Module {
    /// Deployment of this module on `chain_id`, if any
    pub fn deployment_on(&self, chain_id: ChainId) -> Option<&Deployment> {
        self.deployments
            .iter()
            .find(|deployment| deployment.chain_id == chain_id)
    }

    pub fn is_deployed_on(&self, chain_id: ChainId) -> bool {
        self.deployment_on(chain_id).is_some()
    }

    /// Validate and convert one raw registry entry
    pub(super) fn from_raw(id: &str, entry: &Value) -> Result<Self, RegistryError> {
        let object = entry
            .as_object()
            .ok_or_else(|| invalid_field(id, "<entry>", "an object"))?;

        if let Some(found) = object.get("id") {
            if found.as_str() != Some(id) {
                return Err(RegistryError::IdMismatch {
                    module_id: id.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let name = match object.get("name") {
            None => id.to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(invalid_field(id, "name", "a string")),
        };

        let details = match object.get("details") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(line)) => vec![line.clone()],
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|line| line.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| invalid_field(id, "details", "a list of strings"))?,
            Some(_) => return Err(invalid_field(id, "details", "a list of strings")),
        };

        let abi_value = require(object, id, "abi")?;
        if !abi_value.is_array() {
            return Err(invalid_field(id, "abi", "an array"));
        }
        let abi: ContractInterface = serde_json::from_value(abi_value.clone())
            .map_err(|e| invalid_field(id, "abi", &format!("a JSON ABI ({})", e)))?;

        let creation = require(object, id, "creationArgs")?
            .as_object()
            .ok_or_else(|| invalid_field(id, "creationArgs", "an object"))?;
        let use_hat_id = match creation.get("useHatId") {
            None | Some(Value::Null) => default_use_hat_id(),
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(invalid_field(id, "creationArgs.useHatId", "a boolean")),
        };
        let creation_args = CreationArgs {
            use_hat_id,
            immutable: parse_arg_specs(id, "creationArgs.immutable", creation)?,
            mutable: parse_arg_specs(id, "creationArgs.mutable", creation)?,
        };

        let implementation_address = match object.get("implementationAddress") {
            None | Some(Value::Null) => None,
            Some(value) => Some(address_field(id, "implementationAddress", value)?),
        };

        let raw_deployments = require(object, id, "deployments")?
            .as_array()
            .ok_or_else(|| invalid_field(id, "deployments", "an array"))?;
        let mut deployments: Vec<Deployment> = Vec::with_capacity(raw_deployments.len());
        for (index, raw) in raw_deployments.iter().enumerate() {
            let deployment = parse_deployment(id, index, raw, implementation_address)?;
            if deployments
                .iter()
                .any(|known| known.chain_id == deployment.chain_id)
            {
                return Err(RegistryError::DuplicateDeployment {
                    module_id: id.to_string(),
                    chain_id: deployment.chain_id.to_string(),
                });
            }
            deployments.push(deployment);
        }

        Ok(Module {
            id: id.to_string(),
            name,
            details,
            implementation_address,
            abi,
            creation_args,
            deployments,
        })
    }
}

fn require<'a>(
    object: &'a Map<String, Value>,
    module_id: &str,
    field: &str,
) -> Result<&'a Value, RegistryError> {
    object.get(field).ok_or_else(|| RegistryError::MissingField {
        module_id: module_id.to_string(),
        field: field.to_string(),
    })
}

fn invalid_field(module_id: &str, field: &str, expected: &str) -> RegistryError {
    RegistryError::InvalidField {
        module_id: module_id.to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

fn parse_arg_specs(
    module_id: &str,
    field: &str,
    creation: &Map<String, Value>,
) -> Result<Vec<ArgSpec>, RegistryError> {
    let key = field.rsplit('.').next().unwrap_or(field);
    let items = creation
        .get(key)
        .ok_or_else(|| RegistryError::MissingField {
            module_id: module_id.to_string(),
            field: field.to_string(),
        })?
        .as_array()
        .ok_or_else(|| invalid_field(module_id, field, "an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone()).map_err(|e| {
                invalid_field(
                    module_id,
                    &format!("{}[{}]", field, index),
                    &format!("an argument spec ({})", e),
                )
            })
        })
        .collect()
}

fn address_field(module_id: &str, field: &str, value: &Value) -> Result<Address, RegistryError> {
    let raw = value
        .as_str()
        .ok_or_else(|| invalid_field(module_id, field, "an address string"))?;
    parse_address(raw).map_err(|e| RegistryError::InvalidAddress {
        module_id: module_id.to_string(),
        field: field.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_deployment(
    module_id: &str,
    index: usize,
    raw: &Value,
    implementation_address: Option<Address>,
) -> Result<Deployment, RegistryError> {
    let field = format!("deployments[{}]", index);
    let object = raw
        .as_object()
        .ok_or_else(|| invalid_field(module_id, &field, "an object"))?;

    let raw_chain = object
        .get("chainId")
        .ok_or_else(|| RegistryError::MissingField {
            module_id: module_id.to_string(),
            field: format!("{}.chainId", field),
        })?;
    let chain_id = ChainId::from_json(raw_chain).ok_or_else(|| RegistryError::InvalidChainId {
        module_id: module_id.to_string(),
        value: raw_chain.to_string(),
    })?;

    let address = match object.get("address") {
        None | Some(Value::Null) => {
            implementation_address.ok_or_else(|| RegistryError::MissingDeploymentAddress {
                module_id: module_id.to_string(),
                chain_id: chain_id.to_string(),
            })?
        }
        Some(value) => address_field(module_id, &format!("{}.address", field), value)?,
    };

    let block = match object.get("block") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_u64()
                .ok_or_else(|| invalid_field(module_id, &format!("{}.block", field), "a block number"))?,
        ),
        Some(Value::String(s)) => Some(s.trim().parse::<u64>().map_err(|_| {
            invalid_field(module_id, &format!("{}.block", field), "a block number")
        })?),
        Some(_) => {
            return Err(invalid_field(
                module_id,
                &format!("{}.block", field),
                "a block number",
            ))
        }
    };

    let factory = match object.get("factory") {
        None | Some(Value::Null) => None,
        Some(value) => Some(address_field(module_id, &format!("{}.factory", field), value)?),
    };

    Ok(Deployment {
        chain_id,
        address,
        block,
        factory,
    })
}
