use crate::*;

/// Registry sizes and turnout
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub provinces: usize,
    pub constituencies: usize,
    pub parties: usize,
    pub candidates: usize,
    pub voters: usize,
    pub votes_cast: usize,
}

/// The roles a national id currently holds
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    pub admin: bool,
    pub voter: bool,
    pub candidate_id: Option<CandidateId>,
}

impl<S: Store, C: Clock> Election<S, C> {
    pub fn statistics(&self) -> Statistics {
        self.read(|ledger, _| Statistics {
            provinces: ledger.geography.province_count(),
            constituencies: ledger.geography.constituency_count(),
            parties: ledger.parties.len(),
            candidates: ledger.candidates.count(),
            voters: ledger.voters.len(),
            votes_cast: ledger.voters.votes_cast(),
        })
    }

    /// Check which registries a national id appears in
    pub fn lookup_national_id(&self, national_id: NationalId) -> Roles {
        self.read(|ledger, _| Roles {
            admin: ledger.admins.is_admin(national_id),
            voter: ledger.voters.contains(national_id),
            candidate_id: ledger.candidates.by_national_id(national_id).map(|c| c.id),
        })
    }
}
