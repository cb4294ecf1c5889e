use crate::*;

/// The complete state of one election system
///
/// Seven record stores (admins, provinces, constituencies, parties, candidates, voters,
/// constituency results) plus the voting window singleton, the ballot box and the
/// journal. A ledger is only ever mutated through an [`Election`], which serializes
/// writers and persists the ledger after every committed operation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Ledger {
    pub(crate) owner: PasswordHash,
    pub(crate) limits: Limits,
    pub(crate) admins: AdminRegistry,
    pub(crate) geography: Geography,
    pub(crate) parties: PartyRegistry,
    pub(crate) candidates: CandidateRegistry,
    pub(crate) voters: VoterRegistry,
    pub(crate) window: VotingWindow,
    pub(crate) ballots: BallotBox,
    pub(crate) results: ResultStore,
    pub(crate) journal: Journal,
}

impl Ledger {
    /// Create an empty ledger owned by the holder of `owner_secret`
    pub fn new(owner_secret: &str, limits: Limits) -> Result<Self, Error> {
        limits.password(owner_secret)?;

        Ok(Ledger {
            owner: PasswordHash::owner(owner_secret),
            limits,
            admins: AdminRegistry::default(),
            geography: Geography::default(),
            parties: PartyRegistry::default(),
            candidates: CandidateRegistry::default(),
            voters: VoterRegistry::default(),
            window: VotingWindow::default(),
            ballots: BallotBox::default(),
            results: ResultStore::default(),
            journal: Journal::default(),
        })
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    pub(crate) fn verify_owner(&self, secret: &str) -> bool {
        PasswordHash::owner(secret) == self.owner
    }

    /// Require that `seat` names a registered constituency
    pub(crate) fn require_seat(&self, seat: &Seat) -> Result<(), Error> {
        if !self.geography.has_province(&seat.province) {
            return Err(Error::ProvinceNotFound(seat.province.clone()));
        }
        if !self.geography.has_constituency(seat) {
            return Err(Error::ConstituencyNotFound(seat.clone()));
        }
        Ok(())
    }

    /// Clear every constituency result
    pub(crate) fn reset_results(&mut self) {
        self.results.clear();
    }

    /// Clear every voter's has-voted flag and secret-key commitment, and empty the
    /// ballot box
    pub(crate) fn reset_voters(&mut self) {
        self.voters.reset_all();
        self.ballots.clear();
    }
}
