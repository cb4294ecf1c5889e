use crate::*;
use thiserror::Error;

/// Coarse classification of an [`Error`]
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad admin, owner or voter credentials, or a wrong secret key
    Authorization,
    /// Unknown province, constituency, party, candidate, voter or admin
    NotFound,
    /// The id or name is already taken
    Duplicate,
    /// The operation is not allowed in the current state
    State,
    /// Malformed or out-of-range input
    Validation,
    /// The ledger could not be read or written
    Storage,
}

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    // Authorization
    // -------------
    #[error("ballotbox: admin {0} does not exist")]
    AdminDoesNotExist(NationalId),

    #[error("ballotbox: invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("ballotbox: invalid owner secret")]
    InvalidOwnerSecret,

    #[error("ballotbox: invalid voter credentials")]
    InvalidVoterCredentials,

    #[error("ballotbox: invalid secret key")]
    InvalidSecretKey,

    #[error("ballotbox: current password does not match for voter {0}")]
    PasswordMismatch(NationalId),

    // Not found
    // ---------
    #[error("ballotbox: admin {0} not found")]
    AdminNotFound(NationalId),

    #[error("ballotbox: province {0} not found")]
    ProvinceNotFound(String),

    #[error("ballotbox: constituency {0} not found")]
    ConstituencyNotFound(Seat),

    #[error("ballotbox: party {0} not found")]
    PartyNotFound(String),

    #[error("ballotbox: candidate {0} not found")]
    CandidateNotFound(CandidateId),

    #[error("ballotbox: voter {0} not found")]
    VoterNotFound(NationalId),

    // Duplicates
    // ----------
    #[error("ballotbox: national id {0} already registered as admin")]
    AdminExists(NationalId),

    #[error("ballotbox: province {0} already exists")]
    ProvinceExists(String),

    #[error("ballotbox: constituency {0} already exists")]
    ConstituencyExists(Seat),

    #[error("ballotbox: party {0} already exists")]
    PartyExists(String),

    #[error("ballotbox: national id {0} already registered as candidate")]
    CandidateExists(NationalId),

    #[error("ballotbox: national id {0} already registered as voter")]
    VoterExists(NationalId),

    // State
    // -----
    #[error("ballotbox: province {0} has constituencies")]
    ProvinceHasConstituencies(String),

    #[error("ballotbox: party {party} already has a candidate in {seat}")]
    PartySeatTaken { party: String, seat: Seat },

    #[error("ballotbox: voting is already active")]
    VotingAlreadyActive,

    #[error("ballotbox: voting is not active")]
    VotingNotActive,

    #[error("ballotbox: voting still in progress")]
    VotingInProgress,

    #[error("ballotbox: voter {0} has already voted")]
    AlreadyVoted(NationalId),

    #[error("ballotbox: voter {0} already registered a secret key")]
    SecretKeyAlreadyRegistered(NationalId),

    #[error("ballotbox: voter {0} has not registered a secret key")]
    SecretKeyNotRegistered(NationalId),

    #[error("ballotbox: result for {0} already declared")]
    AlreadyDeclared(Seat),

    // Validation
    // ----------
    #[error("ballotbox: invalid national id {0:?} - must be exactly 13 digits")]
    InvalidNationalId(String),

    #[error("ballotbox: invalid candidate id {0:?}")]
    InvalidCandidateId(String),

    #[error("ballotbox: {field} must be at least {min} characters")]
    NameTooShort { field: &'static str, min: usize },

    #[error("ballotbox: {0} cannot be empty")]
    EmptyField(&'static str),

    #[error("ballotbox: password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("ballotbox: voting duration {hours}h is outside {min}h..={max}h")]
    DurationOutOfRange { hours: u64, min: u64, max: u64 },

    #[error("ballotbox: {ids} candidate ids but {counts} vote counts")]
    MismatchedLengths { ids: usize, counts: usize },

    #[error("ballotbox: no vote counts supplied")]
    EmptyVoteCounts,

    #[error("ballotbox: candidate {0} listed more than once")]
    RepeatedCandidate(CandidateId),

    #[error("ballotbox: candidates span more than one constituency")]
    MixedConstituencies,

    #[error("ballotbox: candidate {0} is not in your constituency")]
    WrongConstituency(CandidateId),

    #[error("ballotbox: invalid fingerprint - invalid hexidecimal")]
    FingerprintBadHex,

    #[error("ballotbox: invalid fingerprint - wrong length")]
    FingerprintBadLen,

    #[error("ballotbox: batch entry {index}: {source}")]
    BatchEntry {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    // Storage
    // -------
    #[error("ballotbox: ledger io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ballotbox: JSON error in ledger: {0}")]
    JSON(#[from] serde_json::Error),

    #[error("ballotbox: CBOR error in ledger: {0}")]
    CBOR(#[from] serde_cbor::Error),

    #[error("ballotbox: error deserializing ledger: unknown format")]
    UnknownFormat,

    #[error("ballotbox: no ledger found in store")]
    MissingLedger,

    #[error("ballotbox: a ledger already exists in store")]
    LedgerExists,
}

impl Error {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        use Error::*;

        match self {
            AdminDoesNotExist(_)
            | InvalidAdminCredentials
            | InvalidOwnerSecret
            | InvalidVoterCredentials
            | InvalidSecretKey
            | PasswordMismatch(_) => ErrorKind::Authorization,

            AdminNotFound(_)
            | ProvinceNotFound(_)
            | ConstituencyNotFound(_)
            | PartyNotFound(_)
            | CandidateNotFound(_)
            | VoterNotFound(_) => ErrorKind::NotFound,

            AdminExists(_)
            | ProvinceExists(_)
            | ConstituencyExists(_)
            | PartyExists(_)
            | CandidateExists(_)
            | VoterExists(_) => ErrorKind::Duplicate,

            ProvinceHasConstituencies(_)
            | PartySeatTaken { .. }
            | VotingAlreadyActive
            | VotingNotActive
            | VotingInProgress
            | AlreadyVoted(_)
            | SecretKeyAlreadyRegistered(_)
            | SecretKeyNotRegistered(_)
            | AlreadyDeclared(_) => ErrorKind::State,

            InvalidNationalId(_)
            | InvalidCandidateId(_)
            | NameTooShort { .. }
            | EmptyField(_)
            | PasswordTooShort(_)
            | DurationOutOfRange { .. }
            | MismatchedLengths { .. }
            | EmptyVoteCounts
            | RepeatedCandidate(_)
            | MixedConstituencies
            | WrongConstituency(_)
            | FingerprintBadHex
            | FingerprintBadLen => ErrorKind::Validation,

            BatchEntry { source, .. } => source.kind(),

            Io(_) | JSON(_) | CBOR(_) | UnknownFormat | MissingLedger | LedgerExists => {
                ErrorKind::Storage
            }
        }
    }
}
