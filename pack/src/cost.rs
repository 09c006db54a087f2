//! The cost model: turns a sanitized [`TxnInput`] into a costed, priced
//! [`TxnP`], or rejects it outright.
//!
//! Grounded on the resource-accounting fields `fd_pack.h` threads through
//! its limits struct (`max_cost_per_block`, `max_write_cost_per_acct`, a
//! data-bytes ceiling) and on the insertion rejection codes it documents
//! (`FD_PACK_INSERT_REJECT_*`). The specific per-unit weights below
//! (signature, per-instruction, write-lock, and data-byte costs) are this
//! crate's own numbers in the same spirit as those fields — not verified
//! against a byte-for-byte original source excerpt, and called out as a
//! judgment call in the design notes rather than asserted as authoritative.
use crate::types::{is_sysvar, ComputeBudget, InsertionOutcome, TxnInput, TxnP};
use vld_config::PackLimits;

/// Compute units charged per transaction signature.
pub const SIGNATURE_COST_UNITS: u64 = 720;
/// Base compute units charged per instruction, before its own execution cost.
pub const BASE_INSTRUCTION_COST_UNITS: u64 = 150;
/// Compute units charged per account a transaction locks for writing.
pub const WRITE_LOCK_COST_UNITS: u64 = 300;
/// Compute units charged per KiB of loaded transaction+account data.
pub const DATA_BYTES_COST_PER_KIB: u64 = 8;
/// Scale factor applied when turning a fee-per-cost-unit ratio into an
/// integer priority, matching the micro-lamport-per-CU convention the
/// cluster's fee market already uses for prioritization fees.
pub const PRIORITY_SCALE: u128 = 1_000_000;
/// Maximum accounts a single transaction may reference.
pub const MAX_ACCOUNTS_PER_TXN: usize = 64;

/// Computes the resident [`TxnP`] for a sanitized transaction, or the
/// specific rejection code if it can never be admitted regardless of pool
/// state (malformed, oversized, or otherwise consensus-illegal).
pub fn compute(input: TxnInput, limits: &PackLimits) -> Result<TxnP, InsertionOutcome> {
    if input.accounts.len() > MAX_ACCOUNTS_PER_TXN {
        return Err(InsertionOutcome::RejectAccountCnt);
    }

    for (i, a) in input.accounts.iter().enumerate() {
        if input.accounts[..i].iter().any(|b| b.address == a.address) {
            return Err(InsertionOutcome::RejectDuplicateAcct);
        }
    }

    if input.writes().any(|w| is_sysvar(w)) {
        return Err(InsertionOutcome::RejectWritesSysvar);
    }

    if input.uses_address_lookup_table {
        return Err(InsertionOutcome::RejectAddrLut);
    }

    let instruction_cu = match input.compute_budget {
        ComputeBudget::Malformed => return Err(InsertionOutcome::RejectEstimationFail),
        ComputeBudget::Requested(units) => units as u64,
        ComputeBudget::Default => {
            input.instructions.len() as u64 * BASE_INSTRUCTION_COST_UNITS
        }
    };

    let signature_cu = input.signature_count as u64 * SIGNATURE_COST_UNITS;
    let write_cu = input.writes().count() as u64 * WRITE_LOCK_COST_UNITS;
    let data_cu = input.loaded_data_bytes.div_ceil(1024) * DATA_BYTES_COST_PER_KIB;

    let cost_units = signature_cu + instruction_cu + write_cu + data_cu;

    if cost_units > limits.max_cost_per_block {
        vld_logger::debug!(
            "rejecting transaction: cost {cost_units} exceeds block ceiling {}",
            limits.max_cost_per_block
        );
        return Err(InsertionOutcome::RejectTooLarge);
    }

    let fee = input.signature_count as u64 * limits.fee_per_signature;
    let priority = (fee as u128 * PRIORITY_SCALE) / cost_units.max(1) as u128;
    let is_simple_vote = input.is_simple_vote();

    Ok(TxnP {
        input,
        cost_units,
        fee,
        priority,
        expires_at: 0,
        is_simple_vote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountMeta, Instruction};
    use proptest::prelude::*;
    use smallvec::smallvec;

    fn addr(b: u8) -> [u8; 32] {
        let mut a = [0u8; 32];
        a[0] = b;
        a
    }

    fn simple_txn() -> TxnInput {
        TxnInput {
            first_signature: [1u8; 64],
            signature_count: 1,
            accounts: smallvec![AccountMeta {
                address: addr(9),
                is_writable: true,
                is_signer: true,
            }],
            instructions: smallvec![Instruction {
                program_id: addr(42),
                data_len: 0,
            }],
            compute_budget: ComputeBudget::Default,
            loaded_data_bytes: 0,
            uses_address_lookup_table: false,
        }
    }

    #[test]
    fn computes_cost_and_fee_for_a_simple_transfer() {
        let limits = PackLimits::default();
        let txn = compute(simple_txn(), &limits).unwrap();
        assert_eq!(
            txn.cost_units,
            SIGNATURE_COST_UNITS + BASE_INSTRUCTION_COST_UNITS + WRITE_LOCK_COST_UNITS
        );
        assert_eq!(txn.fee, limits.fee_per_signature);
        assert!(txn.priority > 0);
    }

    #[test]
    fn rejects_duplicate_accounts() {
        let limits = PackLimits::default();
        let mut txn = simple_txn();
        let dup = txn.accounts[0];
        txn.accounts.push(dup);
        assert_eq!(
            compute(txn, &limits),
            Err(InsertionOutcome::RejectDuplicateAcct)
        );
    }

    #[test]
    fn rejects_writes_to_sysvars() {
        let limits = PackLimits::default();
        let mut txn = simple_txn();
        txn.accounts[0].address = crate::types::SYSVAR_ADDRESSES[0];
        assert_eq!(
            compute(txn, &limits),
            Err(InsertionOutcome::RejectWritesSysvar)
        );
    }

    #[test]
    fn rejects_address_lookup_tables() {
        let limits = PackLimits::default();
        let mut txn = simple_txn();
        txn.uses_address_lookup_table = true;
        assert_eq!(compute(txn, &limits), Err(InsertionOutcome::RejectAddrLut));
    }

    #[test]
    fn rejects_malformed_compute_budget() {
        let limits = PackLimits::default();
        let mut txn = simple_txn();
        txn.compute_budget = ComputeBudget::Malformed;
        assert_eq!(
            compute(txn, &limits),
            Err(InsertionOutcome::RejectEstimationFail)
        );
    }

    #[test]
    fn rejects_transactions_exceeding_the_block_cost_ceiling() {
        let mut limits = PackLimits::default();
        limits.max_cost_per_block = 10;
        assert_eq!(
            compute(simple_txn(), &limits),
            Err(InsertionOutcome::RejectTooLarge)
        );
    }

    proptest! {
        #[test]
        fn priority_never_exceeds_the_fee_scaled_by_priority_scale(sig_count in 1u8..=16) {
            let limits = PackLimits::default();
            let mut txn = simple_txn();
            txn.signature_count = sig_count as u32;
            let txn = compute(txn, &limits).unwrap();
            // cost_units is always >= 1, so fee * PRIORITY_SCALE / cost_units
            // can never exceed fee * PRIORITY_SCALE.
            prop_assert!(txn.priority <= txn.fee as u128 * PRIORITY_SCALE);
        }

        #[test]
        fn doubling_the_write_locked_accounts_never_lowers_cost(extra_writers in 0u8..8) {
            let limits = PackLimits::default();
            let base = compute(simple_txn(), &limits).unwrap();
            let mut txn = simple_txn();
            for i in 0..extra_writers {
                txn.accounts.push(AccountMeta {
                    address: addr(100 + i),
                    is_writable: true,
                    is_signer: false,
                });
            }
            let widened = compute(txn, &limits).unwrap();
            prop_assert!(widened.cost_units >= base.cost_units);
        }
    }
}
