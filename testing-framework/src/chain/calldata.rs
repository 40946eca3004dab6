// Decoding of factory calldata
//
// Only what the in-process chain needs: the four arguments of
// `createHatsModule(address,uint256,bytes,bytes)`.

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use hats_modules_common::{
    crypto::{Address, SELECTOR_SIZE},
    factory::createHatsModuleCall,
};

/// Arguments of one `createHatsModule` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateModuleCall {
    pub implementation: Address,
    pub hat_id: U256,
    pub other_immutable_args: Vec<u8>,
    pub init_data: Vec<u8>,
}

/// Decode `createHatsModule` calldata, or explain why it is not one
pub fn decode_create_module(data: &[u8]) -> Result<CreateModuleCall, String> {
    if data.len() < SELECTOR_SIZE {
        return Err("calldata shorter than a selector".to_string());
    }
    let (selector, body) = data.split_at(SELECTOR_SIZE);
    if selector != createHatsModuleCall::SELECTOR {
        return Err(format!("unknown selector 0x{}", hex::encode(selector)));
    }

    let call = createHatsModuleCall::abi_decode_raw(body, true)
        .map_err(|e| format!("malformed createHatsModule arguments: {}", e))?;
    Ok(CreateModuleCall {
        implementation: call.implementation,
        hat_id: call.hatId,
        other_immutable_args: call.otherImmutableArgs.to_vec(),
        init_data: call.initData.to_vec(),
    })
}
