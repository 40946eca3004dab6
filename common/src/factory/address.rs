use alloy_primitives::U256;

use crate::{
    chain::ChainId,
    crypto::{keccak256, keccak256_concat, Address, Hash},
    error::{ModulesError, ModulesResult},
};

// Clone creation code around the implementation address and the appended
// immutable args. The two length fields inside the prefix and the trailing
// uint16 depend on the args length, so they are filled in by
// `clone_init_code`.
const CLONE_CREATION_HEAD: u8 = 0x61; // PUSH2 runSize
const CLONE_CREATION_BODY: [u8; 16] = [
    0x3d, 0x81, 0x60, 0x0a, 0x3d, 0x39, 0xf3, 0x3d, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x3d, 0x37, 0x61,
];
const CLONE_CALLDATA_COPY: [u8; 6] = [0x60, 0x37, 0x36, 0x39, 0x36, 0x61];
const CLONE_DELEGATE_PREFIX: [u8; 3] = [0x01, 0x3d, 0x73];
const CLONE_DELEGATE_SUFFIX: [u8; 13] = [
    0x5a, 0xf4, 0x3d, 0x3d, 0x93, 0x80, 0x3e, 0x60, 0x35, 0x57, 0xfd, 0x5b, 0xf3,
];

// Size of the creation code without the appended data
const CLONE_BASE_SIZE: usize = 0x41;
// Creation-only bytes before the runtime code starts
const CLONE_CREATION_SIZE: usize = 0x0a;

/// Immutable args layout read by every module instance:
/// `implementation (20) ‖ hats (20) ‖ hatId (32) ‖ packed other immutable args`
pub fn instance_args(
    implementation: &Address,
    hats: &Address,
    hat_id: &U256,
    packed_immutable_args: &[u8],
) -> Vec<u8> {
    let mut args = Vec::with_capacity(20 + 20 + 32 + packed_immutable_args.len());
    args.extend_from_slice(implementation.as_slice());
    args.extend_from_slice(hats.as_slice());
    args.extend_from_slice(&hat_id.to_be_bytes::<32>());
    args.extend_from_slice(packed_immutable_args);
    args
}

/// Salt used by the factory: `keccak256(args ‖ uint256(chainId))`
pub fn instance_salt(args: &[u8], chain_id: ChainId) -> Hash {
    keccak256_concat(&[args, &chain_id.to_word()])
}

/// Creation code of a clone of `implementation` carrying `args`
///
/// The runtime copies the calldata, appends the immutable args followed by
/// their length as a uint16, then delegates to the implementation.
pub fn clone_init_code(implementation: &Address, args: &[u8]) -> ModulesResult<Vec<u8>> {
    // +2 for the trailing length
    let extra_length = args.len() + 2;
    let run_size = CLONE_BASE_SIZE + extra_length - CLONE_CREATION_SIZE;
    if run_size > u16::MAX as usize {
        return Err(ModulesError::Validation {
            module_id: implementation.to_string(),
            reason: format!("immutable args too large for a clone ({} bytes)", args.len()),
        });
    }
    let extra = (extra_length as u16).to_be_bytes();

    let mut code = Vec::with_capacity(CLONE_BASE_SIZE + extra_length);
    code.push(CLONE_CREATION_HEAD);
    code.extend_from_slice(&(run_size as u16).to_be_bytes());
    code.extend_from_slice(&CLONE_CREATION_BODY);
    code.extend_from_slice(&extra);
    code.extend_from_slice(&CLONE_CALLDATA_COPY);
    code.extend_from_slice(&extra);
    code.extend_from_slice(&CLONE_DELEGATE_PREFIX);
    code.extend_from_slice(implementation.as_slice());
    code.extend_from_slice(&CLONE_DELEGATE_SUFFIX);
    code.extend_from_slice(args);
    code.extend_from_slice(&extra);
    Ok(code)
}

/// CREATE2 address: `keccak256(0xff ‖ deployer ‖ salt ‖ init_code_hash)[12..]`
pub fn create2_address(deployer: &Address, salt: &Hash, init_code_hash: &Hash) -> Address {
    deployer.create2(*salt, *init_code_hash)
}

/// Address a factory will assign to the instance of `implementation`
/// scoped to `hat_id` with the given packed immutable args
///
/// Same inputs always give the same address. Mutable args are not an input.
pub fn predict_instance_address(
    factory: &Address,
    chain_id: ChainId,
    implementation: &Address,
    hats: &Address,
    hat_id: &U256,
    packed_immutable_args: &[u8],
) -> ModulesResult<Address> {
    let args = instance_args(implementation, hats, hat_id, packed_immutable_args);
    let salt = instance_salt(&args, chain_id);
    let init_code = clone_init_code(implementation, &args)?;
    Ok(create2_address(factory, &salt, &keccak256(&init_code)))
}
