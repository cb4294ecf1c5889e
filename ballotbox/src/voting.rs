use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// The election-wide voting window
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VotingWindow {
    pub active: bool,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl VotingWindow {
    /// Voting is open iff the window was started, not stopped, and `now` is inside it
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.active && self.start <= now && now <= self.end
    }
}

/// Snapshot of the voting window as seen at `now`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VotingStatus {
    pub active: bool,
    pub start: Timestamp,
    pub end: Timestamp,
    pub now: Timestamp,
}

/// A cast ballot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub candidate: CandidateId,

    /// The voter's constituency at the time of casting
    pub seat: Seat,
    pub cast_at: Timestamp,
}

/// Ballots of the current cycle, keyed by the voter's secret key commitment
///
/// Only someone holding the secret key can derive the key of a ballot, so reading back a
/// single vote requires the key. Tallies scan the whole box by constituency.
///
/// The box also remembers who has cast a ballot this cycle, separately from the ballots
/// themselves. That roll outlives the voter record, so removing and registering a voter
/// again does not grant a second ballot.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BallotBox {
    ballots: BTreeMap<Commitment, Ballot>,

    #[serde(default)]
    cast_by: BTreeSet<NationalId>,
}

impl BallotBox {
    pub fn get(&self, commitment: &Commitment) -> Option<&Ballot> {
        self.ballots.get(commitment)
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    pub fn for_seat<'a>(&'a self, seat: &'a Seat) -> impl Iterator<Item = &'a Ballot> {
        self.ballots.values().filter(move |b| &b.seat == seat)
    }

    /// Whether `national_id` has cast a ballot this cycle
    pub fn has_cast(&self, national_id: NationalId) -> bool {
        self.cast_by.contains(&national_id)
    }

    /// Drop a ballot in the box; an occupied commitment or a repeat voter is refused
    pub(crate) fn cast(
        &mut self,
        national_id: NationalId,
        commitment: Commitment,
        ballot: Ballot,
    ) -> Result<(), Error> {
        if self.cast_by.contains(&national_id) || self.ballots.contains_key(&commitment) {
            return Err(Error::AlreadyVoted(national_id));
        }
        self.cast_by.insert(national_id);
        self.ballots.insert(commitment, ballot);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.ballots.clear();
        self.cast_by.clear();
    }
}

/// What a voter learns by presenting their secret key
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    /// The candidate voted for, or [`CandidateId::DRAW`] when not verified
    pub candidate: CandidateId,
    pub verified: bool,
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Open a voting window of `hours` hours starting now
    ///
    /// Every constituency result and every voter's has-voted flag and secret key
    /// commitment is cleared first, so each cycle starts from a clean slate.
    pub fn start_voting(&self, credentials: &Credentials, hours: u64) -> Result<VotingWindow, Error> {
        self.commit("start_voting", Guard::Admin(credentials), |tx| {
            let duration = tx.ledger.limits.voting_hours(hours)?;
            if tx.ledger.window.is_open(tx.now) {
                return Err(Error::VotingAlreadyActive);
            }

            tx.ledger.reset_results();
            tx.record(Event::ResultsReset);
            tx.ledger.reset_voters();
            tx.record(Event::VotersReset);

            let window = VotingWindow {
                active: true,
                start: tx.now,
                end: tx.now + duration,
            };
            tx.ledger.window = window;

            info!(start = window.start, end = window.end, by = %tx.actor, "voting started");
            tx.record(Event::VotingStarted {
                start: window.start,
                end: window.end,
            });
            Ok(window)
        })
    }

    /// Close the voting window; the end time is kept
    pub fn stop_voting(&self, credentials: &Credentials) -> Result<(), Error> {
        self.commit("stop_voting", Guard::Admin(credentials), |tx| {
            if !tx.ledger.window.active {
                return Err(Error::VotingNotActive);
            }
            tx.ledger.window.active = false;

            info!(at = tx.now, by = %tx.actor, "voting stopped");
            tx.record(Event::VotingStopped { at: tx.now });
            Ok(())
        })
    }

    /// Commit to a secret key for this cycle
    ///
    /// Exactly once per cycle: a second registration is refused even with the same key.
    pub fn register_secret_key(
        &self,
        national_id: NationalId,
        password: &str,
        secret_key: &str,
    ) -> Result<(), Error> {
        self.commit(
            "register_secret_key",
            Guard::Voter(national_id, password),
            |tx| {
                if !tx.ledger.window.is_open(tx.now) {
                    return Err(Error::VotingNotActive);
                }
                let voter = tx
                    .ledger
                    .voters
                    .get(national_id)
                    .ok_or(Error::VoterNotFound(national_id))?;
                if voter.has_voted || tx.ledger.ballots.has_cast(national_id) {
                    return Err(Error::AlreadyVoted(national_id));
                }
                tx.ledger.limits.secret_key(secret_key)?;

                tx.ledger
                    .voters
                    .set_commitment(national_id, Commitment::derive(national_id, secret_key))?;

                info!(%national_id, "secret key registered");
                tx.record(Event::SecretKeyRegistered { national_id });
                Ok(())
            },
        )
    }

    /// Cast a vote for a candidate of the voter's own constituency
    pub fn cast_vote(
        &self,
        national_id: NationalId,
        password: &str,
        candidate: CandidateId,
        secret_key: &str,
    ) -> Result<(), Error> {
        self.commit("cast_vote", Guard::Voter(national_id, password), |tx| {
            if !tx.ledger.window.is_open(tx.now) {
                return Err(Error::VotingNotActive);
            }
            let voter = tx
                .ledger
                .voters
                .get(national_id)
                .ok_or(Error::VoterNotFound(national_id))?;
            if voter.has_voted || tx.ledger.ballots.has_cast(national_id) {
                return Err(Error::AlreadyVoted(national_id));
            }

            let commitment = voter
                .commitment
                .ok_or(Error::SecretKeyNotRegistered(national_id))?;
            if Commitment::derive(national_id, secret_key) != commitment {
                return Err(Error::InvalidSecretKey);
            }

            let chosen = tx
                .ledger
                .candidates
                .get(candidate)
                .ok_or(Error::CandidateNotFound(candidate))?;
            if chosen.seat != voter.seat {
                return Err(Error::WrongConstituency(candidate));
            }
            let seat = voter.seat.clone();

            tx.ledger.ballots.cast(
                national_id,
                commitment,
                Ballot {
                    candidate,
                    seat,
                    cast_at: tx.now,
                },
            )?;
            tx.ledger
                .voters
                .mark_voted(national_id, MarkVoted::grant())?;

            info!(%national_id, "vote cast");
            tx.record(Event::VoteCast { national_id });
            Ok(())
        })
    }

    /// Read back a vote with the secret key it was cast under
    ///
    /// A wrong key, an unknown voter and a voter who has not voted all look the same.
    pub fn verify_my_vote(&self, national_id: NationalId, secret_key: &str) -> VoteReceipt {
        let commitment = Commitment::derive(national_id, secret_key);
        self.read(|ledger, _| match ledger.ballots.get(&commitment) {
            Some(ballot) => VoteReceipt {
                candidate: ballot.candidate,
                verified: true,
            },
            None => {
                debug!(%national_id, "vote not verified");
                VoteReceipt {
                    candidate: CandidateId::DRAW,
                    verified: false,
                }
            }
        })
    }

    pub fn voting_status(&self) -> VotingStatus {
        self.read(|ledger, now| VotingStatus {
            active: ledger.window.is_open(now),
            start: ledger.window.start,
            end: ledger.window.end,
            now,
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::sync::Arc;

    const T0: Timestamp = 1_700_000_000;

    fn id(s: &str) -> NationalId {
        s.parse().unwrap()
    }

    struct Fixture {
        election: Election<MemStore, Arc<ManualClock>>,
        clock: Arc<ManualClock>,
        admin: Credentials,
        voter: NationalId,
        candidate: CandidateId,
        rival: CandidateId,
    }

    fn setup() -> Fixture {
        let clock = Arc::new(ManualClock::new(T0));
        let election = Election::create(MemStore, clock.clone(), "owner-secret").unwrap();
        let owner = Authority::Owner {
            secret: "owner-secret".into(),
        };
        let admin_id = id("1234567890123");
        election
            .add_admin(&owner, admin_id, "Test Admin", "admin123")
            .unwrap();
        let admin = Credentials::new(admin_id, "admin123");

        election.add_province(&admin, "Punjab").unwrap();
        election.add_constituency(&admin, "Punjab", "NA-1").unwrap();
        election.add_constituency(&admin, "Punjab", "NA-2").unwrap();
        election.add_party(&admin, "PTI").unwrap();
        let candidate = election
            .register_candidate(&admin, id("1111111111111"), "Ali Khan", "Punjab", "NA-1", "PTI")
            .unwrap();
        let rival = election
            .register_candidate(&admin, id("2222222222222"), "Sara Malik", "Punjab", "NA-2", "PTI")
            .unwrap();

        let voter = id("5555555555555");
        election
            .register_voter(&admin, voter, "Test Voter", "Punjab", "NA-1", "voter123")
            .unwrap();

        Fixture {
            election,
            clock,
            admin,
            voter,
            candidate,
            rival,
        }
    }

    #[test]
    fn test_window_lifecycle() {
        let f = setup();
        assert!(!f.election.voting_status().active);

        let err = f.election.start_voting(&f.admin, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = f.election.start_voting(&f.admin, 169).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let window = f.election.start_voting(&f.admin, 24).unwrap();
        assert_eq!(window.start, T0);
        assert_eq!(window.end, T0 + 24 * SECONDS_PER_HOUR);
        assert!(f.election.voting_status().active);

        let err = f.election.start_voting(&f.admin, 24).unwrap_err();
        assert!(matches!(err, Error::VotingAlreadyActive));

        f.clock.advance(3600);
        f.election.stop_voting(&f.admin).unwrap();
        let status = f.election.voting_status();
        assert!(!status.active);
        assert_eq!(status.end, T0 + 24 * SECONDS_PER_HOUR);
        assert_eq!(status.now, T0 + 3600);

        let err = f.election.stop_voting(&f.admin).unwrap_err();
        assert!(matches!(err, Error::VotingNotActive));
    }

    #[test]
    fn test_expired_window_is_inactive() {
        let f = setup();
        f.election.start_voting(&f.admin, 1).unwrap();

        f.clock.advance(SECONDS_PER_HOUR + 1);
        assert!(!f.election.voting_status().active);
        let err = f
            .election
            .register_secret_key(f.voter, "voter123", "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::VotingNotActive));

        // A new window may be started over an expired one
        f.election.start_voting(&f.admin, 2).unwrap();
        assert!(f.election.voting_status().active);
    }

    #[test]
    fn test_vote_and_verify() {
        let f = setup();
        f.election.start_voting(&f.admin, 24).unwrap();

        f.election
            .register_secret_key(f.voter, "voter123", "secret123")
            .unwrap();
        assert!(f.election.voter_commitment(f.voter).unwrap().is_some());

        f.election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap();
        assert!(f.election.view_voter(f.voter).unwrap().has_voted);

        let receipt = f.election.verify_my_vote(f.voter, "secret123");
        assert_eq!(
            receipt,
            VoteReceipt {
                candidate: f.candidate,
                verified: true
            }
        );
        assert!(!f.election.verify_my_vote(f.voter, "wrong").verified);

        let err = f
            .election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyVoted(_)));
        assert_eq!(err.kind(), ErrorKind::State);

        // The journal never reveals the chosen candidate
        let cast = f
            .election
            .journal(0)
            .into_iter()
            .find(|e| e.event.event_type() == EventType::VoteCast)
            .unwrap();
        let json = serde_json::to_string(&cast).unwrap();
        assert!(!json.contains("candidate"));
    }

    #[test]
    fn test_vote_preconditions() {
        let f = setup();

        let err = f
            .election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::VotingNotActive));

        f.election.start_voting(&f.admin, 24).unwrap();

        let err = f
            .election
            .register_secret_key(f.voter, "wrongpass", "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidVoterCredentials));

        let err = f
            .election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::SecretKeyNotRegistered(_)));

        let err = f
            .election
            .register_secret_key(f.voter, "voter123", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        f.election
            .register_secret_key(f.voter, "voter123", "secret123")
            .unwrap();
        let err = f
            .election
            .register_secret_key(f.voter, "voter123", "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::SecretKeyAlreadyRegistered(_)));

        let err = f
            .election
            .cast_vote(f.voter, "voter123", f.candidate, "other-key")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSecretKey));
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = f
            .election
            .cast_vote(f.voter, "voter123", f.rival, "secret123")
            .unwrap_err();
        assert!(matches!(err, Error::WrongConstituency(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = f
            .election
            .cast_vote(f.voter, "voter123", CandidateId(99), "secret123")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // None of the failures counted as a vote
        assert!(!f.election.view_voter(f.voter).unwrap().has_voted);
        f.election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap();
    }

    #[test]
    fn test_new_window_resets_voting_state() {
        let f = setup();
        f.election.start_voting(&f.admin, 24).unwrap();
        f.election
            .register_secret_key(f.voter, "voter123", "secret123")
            .unwrap();
        f.election
            .cast_vote(f.voter, "voter123", f.candidate, "secret123")
            .unwrap();
        f.election.stop_voting(&f.admin).unwrap();

        f.clock.advance(60);
        f.election.start_voting(&f.admin, 24).unwrap();
        let view = f.election.view_voter(f.voter).unwrap();
        assert!(!view.has_voted);
        assert!(!view.has_secret_key);
        assert!(!f.election.verify_my_vote(f.voter, "secret123").verified);

        // A fresh key may be registered for the new cycle
        f.election
            .register_secret_key(f.voter, "voter123", "fresh-key")
            .unwrap();
    }
}
