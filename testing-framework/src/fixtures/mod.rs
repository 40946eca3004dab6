// Registry fixtures
//
// A small registry shaped like the published Hats modules registry: one
// module per argument shape the client has to handle, deployed on Gnosis
// Chain and Goerli in different combinations.

use anyhow::{Context, Result};
use hats_modules_common::registry::Registry;
use serde_json::{json, Value};

/// Instance cloning hats; one `uint256[]` immutable arg, no mutable args
pub const HATTER_CLONE_ID: &str = "hatter-clone-v1";
/// Owner and arbitrator hats immutable, initial allowlist mutable
pub const ALLOWLIST_ID: &str = "allowlist-eligibility-v1";
/// Mutable-only configuration
pub const SEASON_TOGGLE_ID: &str = "season-toggle-v1";
/// Only deployed on Goerli
pub const STAKING_ID: &str = "staking-eligibility-v1";

pub const HATTER_CLONE_IMPLEMENTATION: &str = "0xa6C6e3aaaA5F1bDB1Fb39D5A6d1fcD8b58A2fC6b";
pub const HATTER_CLONE_GOERLI_IMPLEMENTATION: &str = "0xfD2a1e5c7B4b3f5E8b9D1C2A3e4f5a6B7c8D9E0f";
pub const ALLOWLIST_IMPLEMENTATION: &str = "0x9E01030aF633Be5a439DF122F2eEf750b44B8aC7";
pub const SEASON_TOGGLE_IMPLEMENTATION: &str = "0x4b4E2ED40B4e7A5D8F63b0E4e96A2c1f51B09e32";
pub const STAKING_IMPLEMENTATION: &str = "0x97ea1bd4B2B0c87CdD3Ff8c1fE2bC6D4a0f1e2d3";

/// Hat id used by the deployment scenarios, top hat of domain 1
pub const SCENARIO_HAT_ID: &str =
    "0x0000000100000000000000000000000000000000000000000000000000000000";

/// View functions every Hats module exposes
pub fn hats_module_abi() -> Value {
    json!([
        {
            "inputs": [{ "internalType": "string", "name": "_version", "type": "string" }],
            "stateMutability": "nonpayable",
            "type": "constructor"
        },
        {
            "inputs": [],
            "name": "HATS",
            "outputs": [{ "internalType": "contract IHats", "name": "", "type": "address" }],
            "stateMutability": "pure",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "IMPLEMENTATION",
            "outputs": [{ "internalType": "address", "name": "", "type": "address" }],
            "stateMutability": "pure",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "hatId",
            "outputs": [{ "internalType": "uint256", "name": "", "type": "uint256" }],
            "stateMutability": "pure",
            "type": "function"
        },
        {
            "inputs": [{ "internalType": "bytes", "name": "_initData", "type": "bytes" }],
            "name": "setUp",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "version",
            "outputs": [{ "internalType": "string", "name": "", "type": "string" }],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "anonymous": false,
            "inputs": [{ "indexed": false, "internalType": "uint8", "name": "version", "type": "uint8" }],
            "name": "Initialized",
            "type": "event"
        }
    ])
}

/// Raw registry document
pub fn sample_registry_json() -> Value {
    json!({
        HATTER_CLONE_ID: {
            "name": "Hatter Clone",
            "details": ["Mints and transfers a fixed set of hats on behalf of its hat"],
            "implementationAddress": HATTER_CLONE_IMPLEMENTATION,
            "abi": hats_module_abi(),
            "creationArgs": {
                "useHatId": true,
                "immutable": [{
                    "name": "Hats",
                    "description": "Hats the clone is allowed to administer",
                    "type": "uint256[]",
                    "example": ["1", "2"],
                    "displayType": "hats"
                }],
                "mutable": []
            },
            "deployments": [
                { "chainId": "100", "block": "30183472" },
                { "chainId": "5", "address": HATTER_CLONE_GOERLI_IMPLEMENTATION, "block": "9711734" }
            ]
        },
        ALLOWLIST_ID: {
            "name": "Allowlist Eligibility",
            "implementationAddress": ALLOWLIST_IMPLEMENTATION,
            "abi": hats_module_abi(),
            "creationArgs": {
                "immutable": [
                    {
                        "name": "Owner Hat",
                        "type": "uint256",
                        "example": "0x0000000100010000000000000000000000000000000000000000000000000000"
                    },
                    {
                        "name": "Arbitrator Hat",
                        "type": "uint256",
                        "example": "0x0000000100020000000000000000000000000000000000000000000000000000"
                    }
                ],
                "mutable": [{
                    "name": "Initial Accounts",
                    "type": "address[]",
                    "example": [
                        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
                    ]
                }]
            },
            "deployments": [{ "chainId": "100", "block": "31297850" }]
        },
        SEASON_TOGGLE_ID: {
            "name": "Season Toggle",
            "implementationAddress": SEASON_TOGGLE_IMPLEMENTATION,
            "abi": hats_module_abi(),
            "creationArgs": {
                "immutable": [],
                "mutable": [
                    { "name": "Season Duration", "type": "uint256", "example": "2592000" },
                    { "name": "Extension Delay", "type": "uint256", "example": 5000 }
                ]
            },
            "deployments": [{ "chainId": 100 }]
        },
        STAKING_ID: {
            "name": "Staking Eligibility",
            "implementationAddress": STAKING_IMPLEMENTATION,
            "abi": hats_module_abi(),
            "creationArgs": {
                "immutable": [{
                    "name": "Token",
                    "type": "address",
                    "example": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
                }],
                "mutable": [
                    { "name": "Minimum Stake", "type": "uint248", "example": "1000000000000000000" },
                    { "name": "Cooldown", "type": "uint32", "example": "86400" }
                ]
            },
            "deployments": [{ "chainId": "5" }]
        }
    })
}

pub fn sample_registry() -> Result<Registry> {
    Registry::build(&sample_registry_json()).context("building the sample registry")
}

/// Sample registry plus one module whose example cannot be coerced
pub fn registry_with_bad_example_json() -> Value {
    let mut raw = sample_registry_json();
    raw["broken-example-v1"] = json!({
        "name": "Broken Example",
        "implementationAddress": STAKING_IMPLEMENTATION,
        "abi": hats_module_abi(),
        "creationArgs": {
            "immutable": [{ "name": "Threshold", "type": "uint256", "example": "notanumber" }],
            "mutable": []
        },
        "deployments": [{ "chainId": "100" }]
    });
    raw
}
