//! Shared vocabulary types: accounts, handles, the parsed-transaction input
//! a caller builds during `insert_init`/`insert_fini`, and the resident,
//! fully-costed transaction (`TxnP`) the pool actually stores.

use smallvec::SmallVec;

/// A 32-byte account address. Real deployments derive these from ed25519
/// public keys; this crate treats them as opaque, comparable, hashable bytes.
pub type Address = [u8; 32];

/// A transaction's first signature, used as its pool-wide identity.
pub type Signature = [u8; 64];

/// Opaque identifier for a pipeline worker (a "bank tile" in the original
/// implementation's vocabulary) that microblocks are dispatched to.
pub type WorkerId = u32;

/// A resident transaction's slot in [`crate::pool::Pool`]'s arena.
pub type Handle = usize;

/// Program id of the vote program, used to structurally detect simple-vote
/// transactions (a transaction with exactly one instruction targeting it).
/// Grounded on the original implementation's `FD_VOTE_PROGRAM_ID`-style
/// well-known constant; the exact byte pattern is a placeholder since this
/// crate never verifies real cluster pubkeys.
pub const VOTE_PROGRAM_ID: Address = {
    let mut id = [0u8; 32];
    id[0] = 0x07;
    id
};

/// A small, hardcoded set of sysvar addresses a transaction must not write
/// to. Real sysvars are well-known pubkeys published by the cluster; this
/// crate hardcodes placeholders for the handful the cost model cares about.
pub const SYSVAR_ADDRESSES: &[Address] = &[
    {
        let mut id = [0u8; 32];
        id[0] = 0xff;
        id
    },
    {
        let mut id = [0u8; 32];
        id[0] = 0xff;
        id[1] = 0x01;
        id
    },
];

pub fn is_sysvar(addr: &Address) -> bool {
    SYSVAR_ADDRESSES.contains(addr)
}

/// A single account reference within a transaction's account list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub is_writable: bool,
    pub is_signer: bool,
}

/// A single instruction, reduced to the fields the cost model and the
/// vote-structural check need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub data_len: u32,
}

/// The requested-compute-unit field of a transaction, parsed out of its
/// compute-budget instruction (if any).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeBudget {
    /// No compute-budget instruction present; the cost model applies its
    /// default per-instruction cost.
    Default,
    /// An explicit unit limit was requested and parsed successfully.
    Requested(u32),
    /// A compute-budget instruction was present but malformed (wrong data
    /// length, unknown opcode byte, or the like).
    Malformed,
}

/// The raw, sanitized-but-uncosted fields a caller fills in between
/// `insert_init` and `insert_fini`. Mirrors the span of a sanitized
/// transaction the original implementation's pack holds a raw pointer to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxnInput {
    pub first_signature: Signature,
    pub signature_count: u32,
    pub accounts: SmallVec<[AccountMeta; 8]>,
    pub instructions: SmallVec<[Instruction; 4]>,
    pub compute_budget: ComputeBudget,
    pub loaded_data_bytes: u64,
    pub uses_address_lookup_table: bool,
}

impl Default for ComputeBudget {
    fn default() -> Self {
        ComputeBudget::Default
    }
}

impl Default for TxnInput {
    fn default() -> Self {
        Self {
            first_signature: [0u8; 64],
            signature_count: 0,
            accounts: SmallVec::new(),
            instructions: SmallVec::new(),
            compute_budget: ComputeBudget::default(),
            loaded_data_bytes: 0,
            uses_address_lookup_table: false,
        }
    }
}

impl TxnInput {
    pub fn is_simple_vote(&self) -> bool {
        self.instructions.len() == 1 && self.instructions[0].program_id == VOTE_PROGRAM_ID
    }

    pub fn writes(&self) -> impl Iterator<Item = &Address> {
        self.accounts
            .iter()
            .filter(|a| a.is_writable)
            .map(|a| &a.address)
    }

    pub fn reads(&self) -> impl Iterator<Item = &Address> {
        self.accounts
            .iter()
            .filter(|a| !a.is_writable)
            .map(|a| &a.address)
    }
}

/// A resident transaction: the sanitized input plus every field the cost
/// model derived from it. This is what the pool actually stores and
/// schedules; it never changes after admission.
#[derive(Clone, Debug)]
pub struct TxnP {
    pub input: TxnInput,
    pub cost_units: u64,
    pub fee: u64,
    pub priority: u128,
    pub expires_at: u64,
    pub is_simple_vote: bool,
}

impl TxnP {
    pub fn first_signature(&self) -> Signature {
        self.input.first_signature
    }

    pub fn writes(&self) -> impl Iterator<Item = &Address> {
        self.input.writes()
    }

    pub fn reads(&self) -> impl Iterator<Item = &Address> {
        self.input.reads()
    }

    pub fn data_bytes(&self) -> u64 {
        self.input.loaded_data_bytes
    }
}

/// A strict total order over resident transactions: priority first, then a
/// lexicographically-lesser first signature breaks ties so that no two
/// distinct transactions ever compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankKey {
    pub priority: u128,
    pub signature: Signature,
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.signature.cmp(&self.signature))
    }
}

/// The result of an insertion attempt, mirroring the original implementation's
/// exact integer result codes one-for-one so operators diagnosing rejected
/// transactions can cross-reference either implementation's documentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum InsertionOutcome {
    NonVoteAdd = 0,
    VoteAdd = 1,
    NonVoteReplace = 2,
    VoteReplace = 3,
    RejectPriority = -1,
    RejectDuplicate = -2,
    RejectUnaffordable = -3,
    RejectAddrLut = -4,
    RejectExpired = -5,
    RejectTooLarge = -6,
    RejectAccountCnt = -7,
    RejectDuplicateAcct = -8,
    RejectEstimationFail = -9,
    RejectWritesSysvar = -10,
}

impl InsertionOutcome {
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn is_accepted(self) -> bool {
        self.code() >= 0
    }
}

/// An opaque handle into the pending-insertion staging arena, returned by
/// `insert_init` and consumed by exactly one of `insert_fini`/`insert_cancel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingHandle(pub(crate) usize);
