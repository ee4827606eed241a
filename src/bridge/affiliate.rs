use {
    super::{Dln, solana::SolanaProvider},
    crate::{
        DLN_SOURCE_PROGRAM,
        compute_budget::sign_with,
        error::{Error, Result},
    },
    alloy_primitives::{B256, hex},
    solana_compute_budget_interface::ComputeBudgetInstruction,
    solana_hash::Hash,
    solana_instruction::{AccountMeta, Instruction},
    solana_message::{VersionedMessage, v0},
    solana_packet::PACKET_DATA_SIZE,
    solana_pubkey::Pubkey,
    solana_signature::Signature,
    solana_signer::Signer,
    solana_transaction::versioned::VersionedTransaction,
    spl_associated_token_account::get_associated_token_address_with_program_id,
    std::{fmt::Display, str::FromStr},
    tokio::time::sleep,
    tracing::{Level, debug, info, instrument, warn},
};

pub const GIVE_ORDER_STATE_SEED: &[u8] = b"GIVE_ORDER_STATE";
pub const GIVE_ORDER_WALLET_SEED: &[u8] = b"GIVE_ORDER_WALLET";
/// Anchor discriminator of `withdraw_affiliate_fee`
pub const WITHDRAW_AFFILIATE_FEE_DISCRIMINATOR: [u8; 8] = [143, 79, 158, 208, 125, 51, 86, 85];
/// `getMultipleAccounts` limit
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;
pub const WITHDRAW_COMPUTE_UNIT_LIMIT: u32 = 300_000;
pub const WITHDRAW_COMPUTE_UNIT_PRICE: u64 = 30_000;

/// Offset of `amount` in an SPL token account
const SPL_AMOUNT_OFFSET: usize = 64;

pub fn give_order_state_address(order_id: &[u8; 32]) -> Pubkey {
    Pubkey::find_program_address(&[GIVE_ORDER_STATE_SEED, order_id], &DLN_SOURCE_PROGRAM).0
}

pub fn give_order_wallet_address(order_id: &[u8; 32]) -> Pubkey {
    Pubkey::find_program_address(&[GIVE_ORDER_WALLET_SEED, order_id], &DLN_SOURCE_PROGRAM).0
}

/// A Solana sourced order in the `ClaimedUnlock` state whose affiliate fee
/// may still sit in its give-order wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockedOrder {
    pub order_id: [u8; 32],
    pub beneficiary: Pubkey,
    pub token_mint: Pubkey,
}

impl UnlockedOrder {
    /// `order_id` as `0x` prefixed hex
    pub fn new(order_id: &str, beneficiary: Pubkey, token_mint: Pubkey) -> Result<Self> {
        let order_id = B256::from_str(order_id)?;
        Ok(Self {
            order_id: order_id.0,
            beneficiary,
            token_mint,
        })
    }

    pub fn order_id_hex(&self) -> String {
        format!("0x{}", hex::encode(self.order_id))
    }
}

/// An order whose give-order wallet holds a non zero balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawableFee {
    pub order: UnlockedOrder,
    pub amount: u64,
    /// Owner of the give-order wallet, spl-token or token-2022
    pub token_program: Pubkey,
}

impl WithdrawableFee {
    pub fn instruction(&self) -> Instruction {
        withdraw_affiliate_fee_instruction(
            &self.order.order_id,
            &self.order.beneficiary,
            &self.order.token_mint,
            &self.token_program,
        )
    }
}

pub fn withdraw_affiliate_fee_instruction(
    order_id: &[u8; 32],
    beneficiary: &Pubkey,
    token_mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let beneficiary_ata =
        get_associated_token_address_with_program_id(beneficiary, token_mint, token_program);
    let mut data = WITHDRAW_AFFILIATE_FEE_DISCRIMINATOR.to_vec();
    data.extend_from_slice(order_id);
    Instruction {
        program_id: DLN_SOURCE_PROGRAM,
        accounts: vec![
            AccountMeta::new(*beneficiary, true),
            AccountMeta::new(beneficiary_ata, false),
            AccountMeta::new(give_order_state_address(order_id), false),
            AccountMeta::new(give_order_wallet_address(order_id), false),
            AccountMeta::new_readonly(*token_mint, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data,
    }
}

/// `amount` of an SPL token account, `None` when the data is too short
pub fn spl_token_amount(data: &[u8]) -> Option<u64> {
    data.get(SPL_AMOUNT_OFFSET..SPL_AMOUNT_OFFSET + 8)
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .map(u64::from_le_bytes)
}

/// Instructions that fit in one transaction, and the orders they withdraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionBatch {
    pub instructions: Vec<Instruction>,
    pub order_ids: Vec<String>,
}

fn budget_instructions() -> Vec<Instruction> {
    vec![
        ComputeBudgetInstruction::set_compute_unit_limit(WITHDRAW_COMPUTE_UNIT_LIMIT),
        ComputeBudgetInstruction::set_compute_unit_price(WITHDRAW_COMPUTE_UNIT_PRICE),
    ]
}

/// Serialized size of a v0 transaction, placeholder blockhash and signatures
pub fn transaction_size(payer: &Pubkey, instructions: &[Instruction]) -> Result<usize> {
    let message = v0::Message::try_compile(payer, instructions, &[], Hash::default())?;
    let tx = VersionedTransaction {
        signatures: vec![
            Signature::default();
            usize::from(message.header.num_required_signatures)
        ],
        message: VersionedMessage::V0(message),
    };
    Ok(bincode::serialized_size(&tx)? as usize)
}

fn fits(payer: &Pubkey, batch: &[Instruction], ix: &Instruction) -> Result<bool> {
    let candidate = [batch, std::slice::from_ref(ix)].concat();
    Ok(transaction_size(payer, &candidate)? <= PACKET_DATA_SIZE)
}

/// Greedily pack `(instruction, order id)` pairs into transactions no larger
/// than a packet. Every batch starts with the compute budget instructions.
pub fn pack_instructions(
    payer: &Pubkey,
    instructions: impl IntoIterator<Item = (Instruction, String)>,
) -> Result<Vec<InstructionBatch>> {
    let base_len = budget_instructions().len();
    let mut batches = Vec::new();
    let mut current = budget_instructions();
    let mut order_ids = Vec::new();

    for (ix, order_id) in instructions {
        if !fits(payer, &current, &ix)? {
            if current.len() == base_len {
                return Err(Error::InstructionTooLarge);
            }
            batches.push(InstructionBatch {
                instructions: std::mem::replace(&mut current, budget_instructions()),
                order_ids: std::mem::take(&mut order_ids),
            });
            if !fits(payer, &current, &ix)? {
                return Err(Error::InstructionTooLarge);
            }
        }
        current.push(ix);
        order_ids.push(order_id);
    }

    if current.len() > base_len {
        batches.push(InstructionBatch {
            instructions: current,
            order_ids,
        });
    }
    Ok(batches)
}

#[derive(Clone, Debug)]
pub struct AffiliateWithdrawal {
    pub signature: Signature,
    pub order_ids: Vec<String>,
}

impl Display for AffiliateWithdrawal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}]", self.signature, self.order_ids.join(", "))
    }
}

impl<P: SolanaProvider> Dln<P> {
    /// Orders of `beneficiary` with a balance left to withdraw
    pub async fn withdrawable_affiliate_fees(
        &self,
        beneficiary: &Pubkey,
        orders: &[UnlockedOrder],
    ) -> Result<Vec<WithdrawableFee>> {
        let orders: Vec<&UnlockedOrder> =
            orders.iter().filter(|o| o.beneficiary == *beneficiary).collect();
        let mut fees = Vec::new();

        for chunk in orders.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let wallets: Vec<Pubkey> = chunk
                .iter()
                .map(|o| give_order_wallet_address(&o.order_id))
                .collect();
            let accounts = self.provider.rpc().get_multiple_accounts(&wallets).await?;
            for (order, account) in chunk.iter().zip(accounts) {
                let Some(account) = account else {
                    warn!("no give-order wallet for {}", order.order_id_hex());
                    continue;
                };
                match spl_token_amount(&account.data) {
                    Some(amount) if amount > 0 => fees.push(WithdrawableFee {
                        order: **order,
                        amount,
                        token_program: account.owner,
                    }),
                    _ => debug!("nothing to withdraw for {}", order.order_id_hex()),
                }
            }
        }
        Ok(fees)
    }

    /// Withdraw every pending affiliate fee of `signer`, one transaction per
    /// batch
    #[instrument(skip(self, signer, orders), level = Level::INFO)]
    pub async fn withdraw_affiliate_fees<S: Signer + ?Sized>(
        &self,
        signer: &S,
        orders: &[UnlockedOrder],
    ) -> Result<Vec<AffiliateWithdrawal>> {
        let payer = signer.try_pubkey()?;
        let fees = self.withdrawable_affiliate_fees(&payer, orders).await?;
        let batches = pack_instructions(
            &payer,
            fees.iter().map(|f| (f.instruction(), f.order.order_id_hex())),
        )?;
        info!(orders = fees.len(), batches = batches.len(), "withdrawing affiliate fees");

        let rpc = self.provider.rpc();
        let mut results = Vec::with_capacity(batches.len());
        for (i, batch) in batches.into_iter().enumerate() {
            if i > 0 {
                sleep(self.config.batch_interval).await;
            }
            let blockhash = rpc.get_latest_blockhash().await?;
            let message = v0::Message::try_compile(&payer, &batch.instructions, &[], blockhash)?;
            let mut tx = VersionedTransaction {
                signatures: vec![],
                message: VersionedMessage::V0(message),
            };
            sign_with(&mut tx, signer)?;
            let signature = rpc.send_and_confirm_transaction(&tx).await?;
            let withdrawal = AffiliateWithdrawal {
                signature,
                order_ids: batch.order_ids,
            };
            info!("withdrawn {withdrawal}");
            results.push(withdrawal);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{SOLANA_USDC_TOKEN, SPL_TOKEN_PROGRAM},
    };

    fn fee(beneficiary: Pubkey, seed: u8) -> WithdrawableFee {
        WithdrawableFee {
            order: UnlockedOrder {
                order_id: [seed; 32],
                beneficiary,
                token_mint: SOLANA_USDC_TOKEN,
            },
            amount: 1,
            token_program: SPL_TOKEN_PROGRAM,
        }
    }

    #[test]
    fn test_withdraw_instruction() {
        let beneficiary = Pubkey::new_unique();
        let order_id = [7u8; 32];
        let ix = withdraw_affiliate_fee_instruction(
            &order_id,
            &beneficiary,
            &SOLANA_USDC_TOKEN,
            &SPL_TOKEN_PROGRAM,
        );
        assert_eq!(ix.program_id, DLN_SOURCE_PROGRAM);
        assert_eq!(ix.data.len(), 40);
        assert_eq!(ix.data[..8], WITHDRAW_AFFILIATE_FEE_DISCRIMINATOR);
        assert_eq!(ix.data[8..], order_id);

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|a| a.pubkey).collect();
        assert_eq!(keys, vec![
            beneficiary,
            get_associated_token_address_with_program_id(
                &beneficiary,
                &SOLANA_USDC_TOKEN,
                &SPL_TOKEN_PROGRAM
            ),
            give_order_state_address(&order_id),
            give_order_wallet_address(&order_id),
            SOLANA_USDC_TOKEN,
            SPL_TOKEN_PROGRAM,
        ]);
        let flags: Vec<(bool, bool)> =
            ix.accounts.iter().map(|a| (a.is_signer, a.is_writable)).collect();
        assert_eq!(flags, vec![
            (true, true),
            (false, true),
            (false, true),
            (false, true),
            (false, false),
            (false, false),
        ]);
    }

    #[test]
    fn test_order_pdas() {
        let order_id = [1u8; 32];
        let state = give_order_state_address(&order_id);
        let wallet = give_order_wallet_address(&order_id);
        assert_ne!(state, wallet);
        assert_ne!(state, give_order_state_address(&[2u8; 32]));
        assert!(!state.is_on_curve());
    }

    #[test]
    fn test_unlocked_order_id() -> anyhow::Result<()> {
        let hex_id = "0xc0b6853690f085eb232c47b57fe8aebb38e2426f391b0805094910f1863cec46";
        let order = UnlockedOrder::new(hex_id, Pubkey::new_unique(), SOLANA_USDC_TOKEN)?;
        assert_eq!(order.order_id[0], 0xc0);
        assert_eq!(order.order_id_hex(), hex_id);
        assert!(UnlockedOrder::new("0x1234", Pubkey::new_unique(), SOLANA_USDC_TOKEN).is_err());
        Ok(())
    }

    #[test]
    fn test_spl_token_amount() {
        let mut data = vec![0u8; 165];
        data[64..72].copy_from_slice(&42u64.to_le_bytes());
        assert_eq!(spl_token_amount(&data), Some(42));
        assert_eq!(spl_token_amount(&data[..70]), None);
        assert_eq!(spl_token_amount(&[]), None);
    }

    #[test]
    fn test_pack_instructions() -> anyhow::Result<()> {
        let payer = Pubkey::new_unique();
        let fees: Vec<WithdrawableFee> = (0..12).map(|i| fee(payer, i)).collect();
        let batches = pack_instructions(
            &payer,
            fees.iter().map(|f| (f.instruction(), f.order.order_id_hex())),
        )?;
        assert!(batches.len() > 1);

        let mut seen = Vec::new();
        for batch in &batches {
            assert_eq!(batch.instructions.len(), batch.order_ids.len() + 2);
            assert_eq!(batch.instructions[..2], budget_instructions()[..]);
            assert!(transaction_size(&payer, &batch.instructions)? <= PACKET_DATA_SIZE);
            seen.extend(batch.order_ids.iter().cloned());
        }
        let expected: Vec<String> = fees.iter().map(|f| f.order.order_id_hex()).collect();
        assert_eq!(seen, expected);

        // every batch but the last is full
        for pair in batches.windows(2) {
            let mut grown = pair[0].instructions.clone();
            grown.push(pair[1].instructions[2].clone());
            assert!(transaction_size(&payer, &grown)? > PACKET_DATA_SIZE);
        }
        Ok(())
    }

    #[test]
    fn test_pack_nothing() -> anyhow::Result<()> {
        assert!(pack_instructions(&Pubkey::new_unique(), Vec::new())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_pack_oversized_instruction() {
        let payer = Pubkey::new_unique();
        let small = fee(payer, 1);
        let big = Instruction::new_with_bytes(DLN_SOURCE_PROGRAM, &[0u8; PACKET_DATA_SIZE], vec![]);

        let after_batch = pack_instructions(&payer, vec![
            (small.instruction(), small.order.order_id_hex()),
            (big.clone(), "0xbig".to_string()),
        ]);
        assert!(matches!(after_batch, Err(Error::InstructionTooLarge)));

        let first = pack_instructions(&payer, vec![
            (big, "0xbig".to_string()),
            (small.instruction(), small.order.order_id_hex()),
        ]);
        assert!(matches!(first, Err(Error::InstructionTooLarge)));
    }

    #[test]
    fn test_pack_single_fee() -> anyhow::Result<()> {
        let payer = Pubkey::new_unique();
        let only = fee(payer, 3);
        let batches = pack_instructions(&payer, vec![(
            only.instruction(),
            only.order.order_id_hex(),
        )])?;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].instructions.len(), 3);
        assert_eq!(batches[0].instructions[2], only.instruction());
        assert_eq!(batches[0].order_ids, vec![only.order.order_id_hex()]);
        Ok(())
    }
}
