use crate::*;
use std::collections::BTreeMap;
use tracing::info;

/// A candidate record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: CandidateId,
    pub national_id: NationalId,
    pub name: String,
    pub seat: Seat,
    pub party: String,

    /// Set when the candidate is removed. The record is kept so the id is never reused.
    #[serde(default)]
    pub removed: bool,
}

/// Candidate arena
///
/// Ids come from a counter that only ever grows. Removal tombstones the record instead
/// of deleting it, so result rows that reference an id can always be explained.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CandidateRegistry {
    next_id: u64,
    records: BTreeMap<CandidateId, Candidate>,
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        CandidateRegistry {
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

impl CandidateRegistry {
    /// An active candidate
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.records.get(&id).filter(|c| !c.removed)
    }

    /// Any candidate ever registered, including removed ones
    pub fn history(&self, id: CandidateId) -> Option<&Candidate> {
        self.records.get(&id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Candidate> {
        self.records.values().filter(|c| !c.removed)
    }

    pub fn by_national_id(&self, national_id: NationalId) -> Option<&Candidate> {
        self.active().find(|c| c.national_id == national_id)
    }

    pub fn by_seat<'a>(&'a self, seat: &'a Seat) -> impl Iterator<Item = &'a Candidate> {
        self.active().filter(move |c| &c.seat == seat)
    }

    pub fn count(&self) -> usize {
        self.active().count()
    }

    pub(crate) fn insert(
        &mut self,
        national_id: NationalId,
        name: String,
        seat: Seat,
        party: String,
    ) -> Result<CandidateId, Error> {
        if self.by_national_id(national_id).is_some() {
            return Err(Error::CandidateExists(national_id));
        }
        if self.by_seat(&seat).any(|c| c.party == party) {
            return Err(Error::PartySeatTaken { party, seat });
        }

        let id = CandidateId(self.next_id);
        self.next_id += 1;
        self.records.insert(
            id,
            Candidate {
                id,
                national_id,
                name,
                seat,
                party,
                removed: false,
            },
        );
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: CandidateId) -> Result<(), Error> {
        match self.records.get_mut(&id) {
            Some(candidate) if !candidate.removed => {
                candidate.removed = true;
                Ok(())
            }
            _ => Err(Error::CandidateNotFound(id)),
        }
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Register a candidate and return its newly allocated id
    pub fn register_candidate(
        &self,
        credentials: &Credentials,
        national_id: NationalId,
        name: &str,
        province: &str,
        constituency: &str,
        party: &str,
    ) -> Result<CandidateId, Error> {
        self.commit("register_candidate", Guard::Admin(credentials), |tx| {
            let name = tx.ledger.limits.person_name("candidate name", name)?;
            let seat = Seat::new(province, constituency);
            let party = party.trim().to_owned();

            tx.ledger.require_seat(&seat)?;
            if !tx.ledger.parties.has(&party) {
                return Err(Error::PartyNotFound(party));
            }

            let candidate_id =
                tx.ledger
                    .candidates
                    .insert(national_id, name, seat.clone(), party.clone())?;

            info!(%candidate_id, %national_id, %seat, %party, by = %tx.actor, "candidate registered");
            tx.record(Event::CandidateRegistered {
                candidate_id,
                national_id,
                seat,
                party,
            });
            Ok(candidate_id)
        })
    }

    /// Remove a candidate
    ///
    /// Counts already entered under its id stay valid, and declared results keep the
    /// snapshot taken at declaration.
    pub fn remove_candidate(&self, credentials: &Credentials, id: CandidateId) -> Result<(), Error> {
        self.commit("remove_candidate", Guard::Admin(credentials), |tx| {
            tx.ledger.candidates.remove(id)?;

            info!(candidate_id = %id, by = %tx.actor, "candidate removed");
            tx.record(Event::CandidateRemoved { candidate_id: id });
            Ok(())
        })
    }

    pub fn view_candidate(&self, id: CandidateId) -> Result<Candidate, Error> {
        self.read(|ledger, _| {
            ledger
                .candidates
                .get(id)
                .cloned()
                .ok_or(Error::CandidateNotFound(id))
        })
    }

    /// Look up a candidate record even if it has since been removed
    pub fn candidate_history(&self, id: CandidateId) -> Result<Candidate, Error> {
        self.read(|ledger, _| {
            ledger
                .candidates
                .history(id)
                .cloned()
                .ok_or(Error::CandidateNotFound(id))
        })
    }

    pub fn candidates_by_constituency(&self, province: &str, constituency: &str) -> Vec<Candidate> {
        let seat = Seat::new(province, constituency);
        self.read(|ledger, _| ledger.candidates.by_seat(&seat).cloned().collect())
    }

    pub fn candidate_count(&self) -> usize {
        self.read(|ledger, _| ledger.candidates.count())
    }

    pub fn list_candidates(&self) -> Vec<Candidate> {
        self.read(|ledger, _| ledger.candidates.active().cloned().collect())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn id(s: &str) -> NationalId {
        s.parse().unwrap()
    }

    fn setup() -> (Election, Credentials) {
        let election = Election::in_memory("owner-secret").unwrap();
        let admin = id("1234567890123");
        let owner = Authority::Owner {
            secret: "owner-secret".into(),
        };
        election
            .add_admin(&owner, admin, "Test Admin", "admin123")
            .unwrap();
        let creds = Credentials::new(admin, "admin123");

        election.add_province(&creds, "Punjab").unwrap();
        election.add_constituency(&creds, "Punjab", "NA-1").unwrap();
        election.add_constituency(&creds, "Punjab", "NA-2").unwrap();
        election.add_party(&creds, "PTI").unwrap();
        election.add_party(&creds, "PML-N").unwrap();
        (election, creds)
    }

    #[test]
    fn test_register_candidate() {
        let (election, admin) = setup();

        let first = election
            .register_candidate(&admin, id("1111111111111"), "Ali Khan", "Punjab", "NA-1", "PTI")
            .unwrap();
        assert_eq!(first, CandidateId(1));

        let candidate = election.view_candidate(first).unwrap();
        assert_eq!(candidate.name, "Ali Khan");
        assert_eq!(candidate.seat, Seat::new("Punjab", "NA-1"));
        assert_eq!(candidate.party, "PTI");

        // Same party, same constituency
        let err = election
            .register_candidate(&admin, id("2222222222222"), "Bilal Ahmed", "Punjab", "NA-1", "PTI")
            .unwrap_err();
        assert!(matches!(err, Error::PartySeatTaken { .. }));
        assert_eq!(err.kind(), ErrorKind::State);

        // Same national id
        let err = election
            .register_candidate(&admin, id("1111111111111"), "Ali Khan", "Punjab", "NA-2", "PML-N")
            .unwrap_err();
        assert!(matches!(err, Error::CandidateExists(_)));

        // Unknown references
        let err = election
            .register_candidate(&admin, id("3333333333333"), "Sara Malik", "Sindh", "NA-1", "PTI")
            .unwrap_err();
        assert!(matches!(err, Error::ProvinceNotFound(_)));
        let err = election
            .register_candidate(&admin, id("3333333333333"), "Sara Malik", "Punjab", "NA-9", "PTI")
            .unwrap_err();
        assert!(matches!(err, Error::ConstituencyNotFound(_)));
        let err = election
            .register_candidate(&admin, id("3333333333333"), "Sara Malik", "Punjab", "NA-1", "PPP")
            .unwrap_err();
        assert!(matches!(err, Error::PartyNotFound(_)));

        let second = election
            .register_candidate(&admin, id("3333333333333"), "Sara Malik", "Punjab", "NA-1", "PML-N")
            .unwrap();
        assert_eq!(second, CandidateId(2));
        assert_eq!(election.candidate_count(), 2);
        assert_eq!(
            election.candidates_by_constituency("Punjab", "NA-1").len(),
            2
        );
        assert!(election
            .candidates_by_constituency("Punjab", "NA-2")
            .is_empty());
    }

    #[test]
    fn test_removed_ids_are_never_reused() {
        let (election, admin) = setup();
        let first = election
            .register_candidate(&admin, id("1111111111111"), "Ali Khan", "Punjab", "NA-1", "PTI")
            .unwrap();

        election.remove_candidate(&admin, first).unwrap();
        assert_eq!(
            election.view_candidate(first).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(election.candidate_history(first).unwrap().removed);
        assert_eq!(
            election.remove_candidate(&admin, first).unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // Seat and national id are free again, but the id moves on
        let again = election
            .register_candidate(&admin, id("1111111111111"), "Ali Khan", "Punjab", "NA-1", "PTI")
            .unwrap();
        assert_eq!(again, CandidateId(2));
        assert_eq!(election.list_candidates().len(), 1);
    }

    #[test]
    fn test_candidate_may_also_be_voter() {
        let (election, admin) = setup();
        let national_id = id("1111111111111");
        election
            .register_voter(&admin, national_id, "Ali Khan", "Punjab", "NA-1", "voter123")
            .unwrap();
        election
            .register_candidate(&admin, national_id, "Ali Khan", "Punjab", "NA-1", "PTI")
            .unwrap();

        let roles = election.lookup_national_id(national_id);
        assert!(roles.voter);
        assert_eq!(roles.candidate_id, Some(CandidateId(1)));
    }
}
