use {
    crate::{
        error::{Error, Result},
        tron::clip_hex_prefix,
    },
    alloy_primitives::hex,
    solana_hash::Hash,
    solana_message::{VersionedMessage, compiled_instruction::CompiledInstruction},
    solana_pubkey::Pubkey,
    solana_signature::Signature,
    solana_signer::Signer,
    solana_transaction::versioned::VersionedTransaction,
    tracing::trace,
};

pub const COMPUTE_BUDGET_PROGRAM: Pubkey = solana_compute_budget_interface::ID;
/// `ComputeBudgetInstruction::SetComputeUnitLimit(u32)`
pub const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
/// `ComputeBudgetInstruction::SetComputeUnitPrice(u64)`
pub const SET_COMPUTE_UNIT_PRICE: u8 = 3;

/// Decode a hex (optionally `0x` prefixed) bincode serialized transaction, the
/// form DLN returns Solana orders in.
pub fn decode_transaction(payload: &str) -> Result<VersionedTransaction> {
    let bytes = hex::decode(clip_hex_prefix(payload.trim()))?;
    Ok(bincode::deserialize(&bytes)?)
}

fn instructions_mut(message: &mut VersionedMessage) -> &mut Vec<CompiledInstruction> {
    match message {
        VersionedMessage::Legacy(m) => &mut m.instructions,
        VersionedMessage::V0(m) => &mut m.instructions,
    }
}

/// Position of the first compute budget instruction with `discriminator`.
/// Program ids are always static keys, lookup tables can't hold them.
pub fn find_compute_budget_instruction(
    message: &VersionedMessage,
    discriminator: u8,
) -> Option<usize> {
    let program_index = message
        .static_account_keys()
        .iter()
        .position(|k| *k == COMPUTE_BUDGET_PROGRAM)?;
    message.instructions().iter().position(|ix| {
        usize::from(ix.program_id_index) == program_index && ix.data.first() == Some(&discriminator)
    })
}

fn patch_instruction(
    message: &mut VersionedMessage,
    discriminator: u8,
    value: &[u8],
    name: &str,
) -> Result<()> {
    let index = find_compute_budget_instruction(message, discriminator)
        .ok_or_else(|| Error::InvalidComputeBudget(format!("{name} instruction not found")))?;
    let ix = &mut instructions_mut(message)[index];
    if ix.data.len() != value.len() + 1 {
        return Err(Error::InvalidComputeBudget(format!(
            "{name} data is {} bytes, expected {}",
            ix.data.len(),
            value.len() + 1
        )));
    }
    ix.data[1..].copy_from_slice(value);
    Ok(())
}

/// Overwrite the compute unit price, and the limit when given, in the
/// transaction's existing compute budget instructions. Signatures are left
/// stale, re-sign afterwards.
pub fn update_priority_fee(
    tx: &mut VersionedTransaction,
    price: u64,
    limit: Option<u32>,
) -> Result<()> {
    patch_instruction(
        &mut tx.message,
        SET_COMPUTE_UNIT_PRICE,
        &price.to_le_bytes(),
        "SetComputeUnitPrice",
    )?;
    if let Some(limit) = limit {
        patch_instruction(
            &mut tx.message,
            SET_COMPUTE_UNIT_LIMIT,
            &limit.to_le_bytes(),
            "SetComputeUnitLimit",
        )?;
    }
    trace!(price, ?limit, "updated compute budget");
    Ok(())
}

/// Current `(price, limit)` of the transaction's compute budget instructions
pub fn read_compute_budget(tx: &VersionedTransaction) -> (Option<u64>, Option<u32>) {
    let read = |discriminator: u8| {
        find_compute_budget_instruction(&tx.message, discriminator)
            .map(|i| tx.message.instructions()[i].data[1..].to_vec())
    };
    let price = read(SET_COMPUTE_UNIT_PRICE)
        .and_then(|d| <[u8; 8]>::try_from(d.as_slice()).ok())
        .map(u64::from_le_bytes);
    let limit = read(SET_COMPUTE_UNIT_LIMIT)
        .and_then(|d| <[u8; 4]>::try_from(d.as_slice()).ok())
        .map(u32::from_le_bytes);
    (price, limit)
}

/// Sign the message with `signer`, replacing only its own signature slot.
/// Other signers' slots are kept as they are.
pub fn sign_with<S: Signer + ?Sized>(tx: &mut VersionedTransaction, signer: &S) -> Result<()> {
    let pubkey = signer.try_pubkey()?;
    let required = usize::from(tx.message.header().num_required_signatures);
    let slot = tx
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|k| *k == pubkey)
        .ok_or_else(|| Error::SignerNotRequired(pubkey.to_string()))?;
    if tx.signatures.len() < required {
        tx.signatures.resize(required, Signature::default());
    }
    tx.signatures[slot] = signer.try_sign_message(&tx.message.serialize())?;
    Ok(())
}

/// Set the recent blockhash and sign
pub fn refresh_and_sign<S: Signer + ?Sized>(
    tx: &mut VersionedTransaction,
    blockhash: Hash,
    signer: &S,
) -> Result<()> {
    tx.message.set_recent_blockhash(blockhash);
    sign_with(tx, signer)
}
