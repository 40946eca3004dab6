// Module Registry
//
// Built once from the registry document, then only read. Construction is
// fail-fast: one malformed entry rejects the whole document so later
// iteration can never silently miss a module.

mod error;
mod module;

pub use error::*;
pub use module::*;

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::Value;

use crate::{
    chain::ChainId,
    crypto::Address,
    error::{ModulesError, ModulesResult},
};

/// Immutable index of module definitions keyed by module id
///
/// Iteration follows the order of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    modules: IndexMap<String, Module>,
}

impl Registry {
    /// Build a registry from the raw document (`{ "<module id>": { ... } }`)
    pub fn build(raw: &Value) -> Result<Self, RegistryError> {
        let entries = raw.as_object().ok_or(RegistryError::NotAnObject)?;

        let mut modules = IndexMap::with_capacity(entries.len());
        for (id, entry) in entries {
            let module = Module::from_raw(id, entry)?;
            if log::log_enabled!(log::Level::Trace) {
                trace!(
                    "registered module {} ({} immutable, {} mutable args, {} deployments)",
                    id,
                    module.creation_args.immutable.len(),
                    module.creation_args.mutable.len(),
                    module.deployments.len()
                );
            }
            modules.insert(id.clone(), module);
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!("registry built with {} modules", modules.len());
        }
        Ok(Self { modules })
    }

    /// Parse then build; the caller is responsible for reading the document
    pub fn from_json_str(document: &str) -> Result<Self, RegistryError> {
        let raw: Value =
            serde_json::from_str(document).map_err(|e| RegistryError::Json(e.to_string()))?;
        Self::build(&raw)
    }

    pub fn get_all_modules(&self) -> &IndexMap<String, Module> {
        &self.modules
    }

    pub fn get_module(&self, id: &str) -> ModulesResult<&Module> {
        self.modules.get(id).ok_or_else(|| ModulesError::NotFound {
            module_id: id.to_string(),
        })
    }

    pub fn get_deployment(&self, id: &str, chain_id: ChainId) -> Option<&Deployment> {
        self.modules
            .get(id)
            .and_then(|module| module.deployment_on(chain_id))
    }

    /// Lazily select the modules deployed on `chain_id`
    pub fn modules_on_chain(&self, chain_id: ChainId) -> impl Iterator<Item = &Module> + '_ {
        self.modules
            .values()
            .filter(move |module| module.is_deployed_on(chain_id))
    }

    /// Reverse lookup from an implementation address on any chain
    pub fn get_module_by_implementation(&self, address: &Address) -> Option<&Module> {
        self.modules.values().find(|module| {
            module.implementation_address.as_ref() == Some(address)
                || module
                    .deployments
                    .iter()
                    .any(|deployment| deployment.address == *address)
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    const IMPLEMENTATION: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const OTHER_IMPLEMENTATION: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    fn hat_id_abi() -> Value {
        json!([{
            "inputs": [],
            "name": "hatId",
            "outputs": [{ "name": "", "type": "uint256" }],
            "stateMutability": "pure",
            "type": "function"
        }])
    }

    fn sample() -> Value {
        json!({
            "hatter-clone-v1": {
                "name": "Hatter Clone",
                "implementationAddress": IMPLEMENTATION,
                "abi": hat_id_abi(),
                "creationArgs": {
                    "immutable": [{ "name": "Hats", "type": "uint256[]", "example": ["1", "2"] }],
                    "mutable": []
                },
                "deployments": [
                    { "chainId": "100", "block": "29000000" },
                    { "chainId": "5", "address": OTHER_IMPLEMENTATION }
                ]
            },
            "staking-eligibility": {
                "name": "Staking Eligibility",
                "abi": hat_id_abi(),
                "creationArgs": { "immutable": [], "mutable": [] },
                "deployments": [{ "chainId": 137, "address": OTHER_IMPLEMENTATION, "block": 1 }]
            }
        })
    }

    #[test]
    fn test_build_and_lookup() {
        let registry = Registry::build(&sample()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["hatter-clone-v1", "staking-eligibility"]
        );

        let module = registry.get_module("hatter-clone-v1").unwrap();
        assert_eq!(module.name, "Hatter Clone");
        assert_eq!(module.creation_args.immutable.len(), 1);
        assert!(module.abi.has_function("hatId"));

        // Falls back to the implementation address
        let gnosis = registry
            .get_deployment("hatter-clone-v1", ChainId::GNOSIS)
            .unwrap();
        assert_eq!(gnosis.address, Address::from_str(IMPLEMENTATION).unwrap());
        assert_eq!(gnosis.block, Some(29_000_000));

        let goerli = registry
            .get_deployment("hatter-clone-v1", ChainId::GOERLI)
            .unwrap();
        assert_eq!(goerli.address, Address::from_str(OTHER_IMPLEMENTATION).unwrap());
        assert!(registry
            .get_deployment("hatter-clone-v1", ChainId::MAINNET)
            .is_none());
    }

    #[test]
    fn test_missing_module_is_not_found() {
        let registry = Registry::build(&sample()).unwrap();
        match registry.get_module("nonexistent") {
            Err(ModulesError::NotFound { module_id }) => assert_eq!(module_id, "nonexistent"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(registry.get_deployment("nonexistent", ChainId::GNOSIS).is_none());
    }

    #[test]
    fn test_build_is_idempotent() {
        let first = Registry::build(&sample()).unwrap();
        let second = Registry::build(&sample()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.ids().collect::<Vec<_>>(),
            second.ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_modules_on_chain_filter() {
        let registry = Registry::build(&sample()).unwrap();
        let on_gnosis: Vec<&str> = registry
            .modules_on_chain(ChainId::GNOSIS)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(on_gnosis, vec!["hatter-clone-v1"]);

        let on_polygon: Vec<&str> = registry
            .modules_on_chain(ChainId::POLYGON)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(on_polygon, vec!["staking-eligibility"]);
        assert_eq!(registry.modules_on_chain(ChainId::SEPOLIA).count(), 0);
    }

    #[test]
    fn test_lookup_by_implementation() {
        let registry = Registry::build(&sample()).unwrap();
        let address = Address::from_str(IMPLEMENTATION).unwrap();
        assert_eq!(
            registry.get_module_by_implementation(&address).unwrap().id,
            "hatter-clone-v1"
        );
        assert!(registry
            .get_module_by_implementation(&Address::ZERO)
            .is_none());
    }

    #[test]
    fn test_rejects_non_object_document() {
        assert_eq!(
            Registry::build(&json!([1, 2])),
            Err(RegistryError::NotAnObject)
        );
        assert!(matches!(
            Registry::from_json_str("{not json"),
            Err(RegistryError::Json(_))
        ));
    }

    #[test]
    fn test_malformed_entry_fails_whole_build() {
        let mut raw = sample();
        raw["broken"] = json!({
            "abi": [],
            "creationArgs": { "immutable": [] },
            "deployments": []
        });
        assert_eq!(
            Registry::build(&raw),
            Err(RegistryError::MissingField {
                module_id: "broken".to_string(),
                field: "creationArgs.mutable".to_string()
            })
        );
    }

    #[test]
    fn test_missing_top_level_fields() {
        for field in ["abi", "creationArgs", "deployments"] {
            let mut raw = sample();
            raw["staking-eligibility"]
                .as_object_mut()
                .unwrap()
                .remove(field);
            assert_eq!(
                Registry::build(&raw),
                Err(RegistryError::MissingField {
                    module_id: "staking-eligibility".to_string(),
                    field: field.to_string()
                })
            );
        }
    }

    #[test]
    fn test_wrong_shapes() {
        let mut raw = sample();
        raw["staking-eligibility"]["abi"] = json!({});
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::InvalidField { field, .. }) if field == "abi"
        ));

        let mut raw = sample();
        raw["staking-eligibility"]["creationArgs"]["immutable"] = json!([{ "name": "no type" }]);
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::InvalidField { field, .. }) if field == "creationArgs.immutable[0]"
        ));
    }

    #[test]
    fn test_duplicate_chain_rejected() {
        let mut raw = sample();
        raw["staking-eligibility"]["deployments"] = json!([
            { "chainId": "137", "address": OTHER_IMPLEMENTATION },
            { "chainId": 137, "address": IMPLEMENTATION }
        ]);
        assert_eq!(
            Registry::build(&raw),
            Err(RegistryError::DuplicateDeployment {
                module_id: "staking-eligibility".to_string(),
                chain_id: "137".to_string()
            })
        );
    }

    #[test]
    fn test_deployment_without_any_address() {
        let mut raw = sample();
        raw["staking-eligibility"]["deployments"] = json!([{ "chainId": "137" }]);
        assert_eq!(
            Registry::build(&raw),
            Err(RegistryError::MissingDeploymentAddress {
                module_id: "staking-eligibility".to_string(),
                chain_id: "137".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_addresses_and_chain_ids() {
        let mut raw = sample();
        raw["staking-eligibility"]["deployments"] = json!([{ "chainId": "137", "address": "0x12" }]);
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::InvalidAddress { .. })
        ));

        let mut raw = sample();
        raw["staking-eligibility"]["deployments"] =
            json!([{ "chainId": "polygon", "address": IMPLEMENTATION }]);
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::InvalidChainId { .. })
        ));
    }

    #[test]
    fn test_id_field_must_match_key() {
        let mut raw = sample();
        raw["staking-eligibility"]["id"] = json!("something-else");
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::IdMismatch { .. })
        ));

        let mut raw = sample();
        raw["staking-eligibility"]["id"] = json!("staking-eligibility");
        assert!(Registry::build(&raw).is_ok());
    }

    #[test]
    fn test_name_defaults_to_id() {
        let mut raw = sample();
        raw["staking-eligibility"]
            .as_object_mut()
            .unwrap()
            .remove("name");
        let registry = Registry::build(&raw).unwrap();
        assert_eq!(
            registry.get_module("staking-eligibility").unwrap().name,
            "staking-eligibility"
        );
    }

    #[test]
    fn test_details_and_hat_scoping() {
        let mut raw = sample();
        raw["hatter-clone-v1"]["details"] = json!(["Clones hats", "Second line"]);
        raw["hatter-clone-v1"]["creationArgs"]["useHatId"] = json!(false);
        raw["staking-eligibility"]["details"] = json!("Single line");
        let registry = Registry::build(&raw).unwrap();

        let hatter = registry.get_module("hatter-clone-v1").unwrap();
        assert_eq!(hatter.details, vec!["Clones hats", "Second line"]);
        assert!(!hatter.creation_args.use_hat_id);

        let staking = registry.get_module("staking-eligibility").unwrap();
        assert_eq!(staking.details, vec!["Single line"]);
        assert!(staking.creation_args.use_hat_id);

        raw["staking-eligibility"]["details"] = json!([1]);
        assert!(matches!(
            Registry::build(&raw),
            Err(RegistryError::InvalidField { field, .. }) if field == "details"
        ));
    }
}
