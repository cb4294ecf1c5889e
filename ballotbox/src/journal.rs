use crate::*;
use std::str::FromStr;

/// Who committed a journal entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "role", content = "id")]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Owner,
    Admin(NationalId),
    Voter(NationalId),
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Actor::Owner => write!(f, "owner"),
            Actor::Admin(id) => write!(f, "admin {}", id),
            Actor::Voter(id) => write!(f, "voter {}", id),
        }
    }
}

/// A committed change to the ledger
///
/// Vote events identify the voter but never the chosen candidate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Event {
    AdminAdded {
        id: NationalId,
        name: String,
    },
    AdminRemoved {
        id: NationalId,
    },
    ProvinceAdded {
        province: String,
    },
    ProvinceRemoved {
        province: String,
    },
    ConstituencyAdded {
        seat: Seat,
    },
    ConstituencyRemoved {
        seat: Seat,
    },
    PartyAdded {
        party: String,
    },
    PartyRemoved {
        party: String,
    },
    CandidateRegistered {
        candidate_id: CandidateId,
        national_id: NationalId,
        seat: Seat,
        party: String,
    },
    CandidateRemoved {
        candidate_id: CandidateId,
    },
    VoterRegistered {
        national_id: NationalId,
        seat: Seat,
    },
    VoterRemoved {
        national_id: NationalId,
    },
    VoterPasswordChanged {
        national_id: NationalId,
    },
    VoterMarkedAsVoted {
        national_id: NationalId,
    },
    VotingStarted {
        start: Timestamp,
        end: Timestamp,
    },
    VotingStopped {
        at: Timestamp,
    },
    SecretKeyRegistered {
        national_id: NationalId,
    },
    VoteCast {
        national_id: NationalId,
    },
    VoteCountsLoaded {
        seat: Seat,
    },
    VoteCountsEntered {
        seat: Seat,
    },
    WinnerDeclared {
        seat: Seat,
        winner: CandidateId,
        winner_votes: u64,
    },
    ResultsReset,
    VotersReset,
}

impl Event {
    /// Get the event type
    pub fn event_type(&self) -> EventType {
        match self {
            Event::AdminAdded { .. } => EventType::AdminAdded,
            Event::AdminRemoved { .. } => EventType::AdminRemoved,
            Event::ProvinceAdded { .. } => EventType::ProvinceAdded,
            Event::ProvinceRemoved { .. } => EventType::ProvinceRemoved,
            Event::ConstituencyAdded { .. } => EventType::ConstituencyAdded,
            Event::ConstituencyRemoved { .. } => EventType::ConstituencyRemoved,
            Event::PartyAdded { .. } => EventType::PartyAdded,
            Event::PartyRemoved { .. } => EventType::PartyRemoved,
            Event::CandidateRegistered { .. } => EventType::CandidateRegistered,
            Event::CandidateRemoved { .. } => EventType::CandidateRemoved,
            Event::VoterRegistered { .. } => EventType::VoterRegistered,
            Event::VoterRemoved { .. } => EventType::VoterRemoved,
            Event::VoterPasswordChanged { .. } => EventType::VoterPasswordChanged,
            Event::VoterMarkedAsVoted { .. } => EventType::VoterMarkedAsVoted,
            Event::VotingStarted { .. } => EventType::VotingStarted,
            Event::VotingStopped { .. } => EventType::VotingStopped,
            Event::SecretKeyRegistered { .. } => EventType::SecretKeyRegistered,
            Event::VoteCast { .. } => EventType::VoteCast,
            Event::VoteCountsLoaded { .. } => EventType::VoteCountsLoaded,
            Event::VoteCountsEntered { .. } => EventType::VoteCountsEntered,
            Event::WinnerDeclared { .. } => EventType::WinnerDeclared,
            Event::ResultsReset => EventType::ResultsReset,
            Event::VotersReset => EventType::VotersReset,
        }
    }
}

/// An event type
#[derive(Serialize, Deserialize, Copy, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AdminAdded,
    AdminRemoved,
    ProvinceAdded,
    ProvinceRemoved,
    ConstituencyAdded,
    ConstituencyRemoved,
    PartyAdded,
    PartyRemoved,
    CandidateRegistered,
    CandidateRemoved,
    VoterRegistered,
    VoterRemoved,
    VoterPasswordChanged,
    VoterMarkedAsVoted,
    VotingStarted,
    VotingStopped,
    SecretKeyRegistered,
    VoteCast,
    VoteCountsLoaded,
    VoteCountsEntered,
    WinnerDeclared,
    ResultsReset,
    VotersReset,
}

impl EventType {
    pub const ALL: [EventType; 23] = [
        EventType::AdminAdded,
        EventType::AdminRemoved,
        EventType::ProvinceAdded,
        EventType::ProvinceRemoved,
        EventType::ConstituencyAdded,
        EventType::ConstituencyRemoved,
        EventType::PartyAdded,
        EventType::PartyRemoved,
        EventType::CandidateRegistered,
        EventType::CandidateRemoved,
        EventType::VoterRegistered,
        EventType::VoterRemoved,
        EventType::VoterPasswordChanged,
        EventType::VoterMarkedAsVoted,
        EventType::VotingStarted,
        EventType::VotingStopped,
        EventType::SecretKeyRegistered,
        EventType::VoteCast,
        EventType::VoteCountsLoaded,
        EventType::VoteCountsEntered,
        EventType::WinnerDeclared,
        EventType::ResultsReset,
        EventType::VotersReset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::AdminAdded => "admin_added",
            EventType::AdminRemoved => "admin_removed",
            EventType::ProvinceAdded => "province_added",
            EventType::ProvinceRemoved => "province_removed",
            EventType::ConstituencyAdded => "constituency_added",
            EventType::ConstituencyRemoved => "constituency_removed",
            EventType::PartyAdded => "party_added",
            EventType::PartyRemoved => "party_removed",
            EventType::CandidateRegistered => "candidate_registered",
            EventType::CandidateRemoved => "candidate_removed",
            EventType::VoterRegistered => "voter_registered",
            EventType::VoterRemoved => "voter_removed",
            EventType::VoterPasswordChanged => "voter_password_changed",
            EventType::VoterMarkedAsVoted => "voter_marked_as_voted",
            EventType::VotingStarted => "voting_started",
            EventType::VotingStopped => "voting_stopped",
            EventType::SecretKeyRegistered => "secret_key_registered",
            EventType::VoteCast => "vote_cast",
            EventType::VoteCountsLoaded => "vote_counts_loaded",
            EventType::VoteCountsEntered => "vote_counts_entered",
            EventType::WinnerDeclared => "winner_declared",
            EventType::ResultsReset => "results_reset",
            EventType::VotersReset => "voters_reset",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown event type {}", s))
    }
}

/// One immutable line of the audit trail
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub actor: Actor,
    pub event: Event,
}

/// Append-only audit trail of every committed mutation
///
/// Election resets clear results and voting state but never the journal, so earlier
/// declarations stay auditable.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub(crate) fn append(&mut self, timestamp: Timestamp, actor: Actor, event: Event) -> u64 {
        let sequence = self.last_sequence() + 1;
        self.entries.push(JournalEntry {
            sequence,
            timestamp,
            actor,
            event,
        });
        sequence
    }

    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence).unwrap_or(0)
    }

    /// Entries with a sequence number greater than `since`
    pub fn since(&self, since: u64) -> &[JournalEntry] {
        // Sequences are dense and start at 1
        let start = (since as usize).min(self.entries.len());
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Journal entries with a sequence number greater than `since`
    pub fn journal(&self, since: u64) -> Vec<JournalEntry> {
        self.read(|ledger, _| ledger.journal.since(since).to_vec())
    }
}
