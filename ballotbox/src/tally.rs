use crate::*;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// A candidate's standing in a declared result
///
/// Display fields are copied from the candidate record at declaration, so the row stays
/// readable after the candidate is removed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub candidate_id: CandidateId,
    pub national_id: Option<NationalId>,
    pub name: String,
    pub party: String,
    pub votes: u64,
}

/// Working counts and the declaration of one constituency
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConstituencyResult {
    pub seat: Seat,

    /// Vote counts in entry order
    pub counts: IndexMap<CandidateId, u64>,

    pub declared: bool,
    pub winner: CandidateId,
    pub winner_votes: u64,

    #[serde(default)]
    pub standings: Vec<Standing>,

    #[serde(default)]
    pub declared_at: Option<Timestamp>,
}

impl ConstituencyResult {
    fn new(seat: Seat) -> Self {
        ConstituencyResult {
            seat,
            counts: IndexMap::new(),
            declared: false,
            winner: CandidateId::DRAW,
            winner_votes: 0,
            standings: Vec::new(),
            declared_at: None,
        }
    }
}

/// Declared winner of a constituency
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub winner: CandidateId,
    pub winner_votes: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSheet {
    pub candidate_ids: Vec<CandidateId>,
    pub vote_counts: Vec<u64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinnerView {
    pub winner: CandidateId,
    pub winner_votes: u64,
    pub declared: bool,
}

/// Pick the winner of a set of counts
///
/// The single holder of the highest count wins. If nobody received a vote, or two or
/// more candidates share the highest count, the winner is [`CandidateId::DRAW`]. The
/// returned vote count is the highest count either way.
pub fn determine_winner(counts: &IndexMap<CandidateId, u64>) -> Declaration {
    let winner_votes = counts.values().copied().max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|&(_, &votes)| votes == winner_votes);

    let winner = match (leaders.next(), leaders.next()) {
        (Some((&id, _)), None) if winner_votes > 0 => id,
        _ => CandidateId::DRAW,
    };
    Declaration {
        winner,
        winner_votes,
    }
}

/// Constituency results, by province then constituency
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ResultStore {
    results: BTreeMap<String, BTreeMap<String, ConstituencyResult>>,
}

impl ResultStore {
    pub fn get(&self, seat: &Seat) -> Option<&ConstituencyResult> {
        self.results
            .get(&seat.province)
            .and_then(|c| c.get(&seat.constituency))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstituencyResult> {
        self.results.values().flat_map(|c| c.values())
    }

    fn entry(&mut self, seat: &Seat) -> &mut ConstituencyResult {
        self.results
            .entry(seat.province.clone())
            .or_default()
            .entry(seat.constituency.clone())
            .or_insert_with(|| ConstituencyResult::new(seat.clone()))
    }

    /// Replace the working counts of an undeclared constituency
    pub(crate) fn set_counts(
        &mut self,
        seat: &Seat,
        counts: IndexMap<CandidateId, u64>,
    ) -> Result<(), Error> {
        if self.get(seat).map(|r| r.declared).unwrap_or(false) {
            return Err(Error::AlreadyDeclared(seat.clone()));
        }
        self.entry(seat).counts = counts;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.results.clear();
    }
}

impl Ledger {
    /// Count the ballots cast in a constituency
    ///
    /// Every active candidate of the constituency is listed, in id order, even with no
    /// votes. Ballots for candidates removed since are counted too.
    fn count_ballots(&self, seat: &Seat) -> IndexMap<CandidateId, u64> {
        let mut counts: IndexMap<CandidateId, u64> =
            self.candidates.by_seat(seat).map(|c| (c.id, 0)).collect();
        for ballot in self.ballots.for_seat(seat) {
            *counts.entry(ballot.candidate).or_insert(0) += 1;
        }
        counts
    }

    /// A seat with a result row, or one that still exists
    fn require_result_seat(&self, seat: &Seat) -> Result<(), Error> {
        if self.results.get(seat).is_some() {
            return Ok(());
        }
        self.require_seat(seat)
    }

    fn require_closed(&self, now: Timestamp) -> Result<(), Error> {
        if self.window.is_open(now) {
            return Err(Error::VotingInProgress);
        }
        Ok(())
    }

    fn standing(&self, candidate_id: CandidateId, votes: u64) -> Standing {
        match self.candidates.history(candidate_id) {
            Some(c) => Standing {
                candidate_id,
                national_id: Some(c.national_id),
                name: c.name.clone(),
                party: c.party.clone(),
                votes,
            },
            None => Standing {
                candidate_id,
                national_id: None,
                name: String::new(),
                party: String::new(),
                votes,
            },
        }
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Count the cast ballots of a constituency without storing anything
    pub fn tally_votes(&self, province: &str, constituency: &str) -> Result<IndexMap<CandidateId, u64>, Error> {
        let seat = Seat::new(province, constituency);
        self.read(|ledger, now| {
            ledger.require_seat(&seat)?;
            ledger.require_closed(now)?;
            Ok(ledger.count_ballots(&seat))
        })
    }

    /// Count the cast ballots of a constituency and store them as its working counts
    pub fn load_vote_counts(
        &self,
        credentials: &Credentials,
        province: &str,
        constituency: &str,
    ) -> Result<IndexMap<CandidateId, u64>, Error> {
        let seat = Seat::new(province, constituency);
        self.commit("load_vote_counts", Guard::Admin(credentials), |tx| {
            tx.ledger.require_seat(&seat)?;
            tx.ledger.require_closed(tx.now)?;

            let counts = tx.ledger.count_ballots(&seat);
            tx.ledger.results.set_counts(&seat, counts.clone())?;

            info!(%seat, candidates = counts.len(), by = %tx.actor, "vote counts loaded");
            tx.record(Event::VoteCountsLoaded { seat });
            Ok(counts)
        })
    }

    /// Overwrite a constituency's working counts
    ///
    /// `counts[i]` belongs to `candidate_ids[i]`. The constituency is the one all the
    /// candidates stand in. Removed candidates are accepted. Returns that constituency.
    pub fn enter_vote_counts(
        &self,
        credentials: &Credentials,
        candidate_ids: &[CandidateId],
        counts: &[u64],
    ) -> Result<Seat, Error> {
        self.commit("enter_vote_counts", Guard::Admin(credentials), |tx| {
            if candidate_ids.len() != counts.len() {
                return Err(Error::MismatchedLengths {
                    ids: candidate_ids.len(),
                    counts: counts.len(),
                });
            }
            if candidate_ids.is_empty() {
                return Err(Error::EmptyVoteCounts);
            }

            let mut seen = HashSet::new();
            let mut seat: Option<&Seat> = None;
            for &id in candidate_ids {
                if !seen.insert(id) {
                    return Err(Error::RepeatedCandidate(id));
                }
                let candidate = tx
                    .ledger
                    .candidates
                    .history(id)
                    .ok_or(Error::CandidateNotFound(id))?;
                match seat {
                    None => seat = Some(&candidate.seat),
                    Some(s) if s != &candidate.seat => return Err(Error::MixedConstituencies),
                    Some(_) => {}
                }
            }
            let seat = seat.cloned().ok_or(Error::EmptyVoteCounts)?;

            let entered: IndexMap<CandidateId, u64> = candidate_ids
                .iter()
                .copied()
                .zip(counts.iter().copied())
                .collect();
            tx.ledger.results.set_counts(&seat, entered)?;

            info!(%seat, candidates = candidate_ids.len(), by = %tx.actor, "vote counts entered");
            tx.record(Event::VoteCountsEntered { seat: seat.clone() });
            Ok(seat)
        })
    }

    /// Declare the winner of a constituency from its working counts
    ///
    /// Allowed once per cycle per constituency, and only while voting is closed. The
    /// candidates' display fields are snapshotted into the result.
    pub fn declare_winner(
        &self,
        credentials: &Credentials,
        province: &str,
        constituency: &str,
    ) -> Result<Declaration, Error> {
        let seat = Seat::new(province, constituency);
        self.commit("declare_winner", Guard::Admin(credentials), |tx| {
            tx.ledger.require_closed(tx.now)?;
            tx.ledger.require_result_seat(&seat)?;
            if tx.ledger.results.get(&seat).map(|r| r.declared).unwrap_or(false) {
                return Err(Error::AlreadyDeclared(seat.clone()));
            }

            let counts = tx
                .ledger
                .results
                .get(&seat)
                .map(|r| r.counts.clone())
                .unwrap_or_default();
            let declaration = determine_winner(&counts);
            let standings: Vec<Standing> = counts
                .iter()
                .map(|(&id, &votes)| tx.ledger.standing(id, votes))
                .collect();

            let now = tx.now;
            let row = tx.ledger.results.entry(&seat);
            row.declared = true;
            row.winner = declaration.winner;
            row.winner_votes = declaration.winner_votes;
            row.standings = standings;
            row.declared_at = Some(now);

            info!(
                %seat,
                winner = %declaration.winner,
                winner_votes = declaration.winner_votes,
                by = %tx.actor,
                "winner declared"
            );
            tx.record(Event::WinnerDeclared {
                seat,
                winner: declaration.winner,
                winner_votes: declaration.winner_votes,
            });
            Ok(declaration)
        })
    }

    /// Working counts of a constituency, in entry order
    pub fn get_results(&self, province: &str, constituency: &str) -> Result<ResultSheet, Error> {
        let seat = Seat::new(province, constituency);
        self.read(|ledger, _| {
            ledger.require_result_seat(&seat)?;
            Ok(match ledger.results.get(&seat) {
                Some(row) => ResultSheet {
                    candidate_ids: row.counts.keys().copied().collect(),
                    vote_counts: row.counts.values().copied().collect(),
                },
                None => ResultSheet::default(),
            })
        })
    }

    pub fn get_winner(&self, province: &str, constituency: &str) -> Result<WinnerView, Error> {
        let seat = Seat::new(province, constituency);
        self.read(|ledger, _| {
            ledger.require_result_seat(&seat)?;
            Ok(match ledger.results.get(&seat) {
                Some(row) => WinnerView {
                    winner: row.winner,
                    winner_votes: row.winner_votes,
                    declared: row.declared,
                },
                None => WinnerView {
                    winner: CandidateId::DRAW,
                    winner_votes: 0,
                    declared: false,
                },
            })
        })
    }

    /// The working count of one candidate in its constituency
    pub fn get_candidate_votes(&self, id: CandidateId) -> Result<u64, Error> {
        self.read(|ledger, _| {
            let candidate = ledger
                .candidates
                .history(id)
                .ok_or(Error::CandidateNotFound(id))?;
            Ok(ledger
                .results
                .get(&candidate.seat)
                .and_then(|row| row.counts.get(&id).copied())
                .unwrap_or(0))
        })
    }

    /// Every declared constituency result of this cycle
    pub fn declared_results(&self) -> Vec<ConstituencyResult> {
        self.read(|ledger, _| ledger.results.iter().filter(|r| r.declared).cloned().collect())
    }

    /// Clear every constituency result, declarations included
    pub fn reset_all_results(&self, credentials: &Credentials) -> Result<(), Error> {
        self.commit("reset_all_results", Guard::Admin(credentials), |tx| {
            tx.ledger.require_closed(tx.now)?;
            tx.ledger.reset_results();

            info!(by = %tx.actor, "results reset");
            tx.record(Event::ResultsReset);
            Ok(())
        })
    }

    /// Clear every voter's has-voted flag and secret key commitment, and the ballots
    pub fn reset_all_voters(&self, credentials: &Credentials) -> Result<(), Error> {
        self.commit("reset_all_voters", Guard::Admin(credentials), |tx| {
            tx.ledger.require_closed(tx.now)?;
            tx.ledger.reset_voters();

            info!(by = %tx.actor, "voters reset");
            tx.record(Event::VotersReset);
            Ok(())
        })
    }
}
