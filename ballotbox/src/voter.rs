use crate::*;
use std::collections::BTreeMap;
use tracing::info;

/// A registered voter
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Voter {
    pub national_id: NationalId,
    pub name: String,
    pub seat: Seat,
    pub password_hash: PasswordHash,

    /// Commitment to the voter's secret key, empty until registered for this cycle
    pub commitment: Option<Commitment>,
    pub has_voted: bool,
}

/// Public view of a voter, without the password digest or the commitment
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VoterView {
    pub national_id: NationalId,
    pub name: String,
    pub seat: Seat,
    pub has_voted: bool,
    pub has_secret_key: bool,
}

impl From<&Voter> for VoterView {
    fn from(voter: &Voter) -> Self {
        VoterView {
            national_id: voter.national_id,
            name: voter.name.clone(),
            seat: voter.seat.clone(),
            has_voted: voter.has_voted,
            has_secret_key: voter.commitment.is_some(),
        }
    }
}

/// One entry of a voter registration form
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoterRegistration {
    pub national_id: NationalId,
    pub name: String,
    pub province: String,
    pub constituency: String,
    pub password: String,
}

/// Capability to set a voter's has-voted flag
///
/// Only this crate can mint one: the voting controller does so when a ballot is cast, and
/// the admin-authorized [`Election::mark_as_voted`] does so after checking credentials.
pub(crate) struct MarkVoted(());

impl MarkVoted {
    pub(crate) fn grant() -> Self {
        MarkVoted(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VoterRegistry {
    voters: BTreeMap<NationalId, Voter>,
}

impl VoterRegistry {
    pub fn get(&self, id: NationalId) -> Option<&Voter> {
        self.voters.get(&id)
    }

    pub fn contains(&self, id: NationalId) -> bool {
        self.voters.contains_key(&id)
    }

    pub fn verify_hash(&self, id: NationalId, password_hash: &PasswordHash) -> bool {
        self.voters
            .get(&id)
            .map(|v| &v.password_hash == password_hash)
            .unwrap_or(false)
    }

    pub fn verify_password(&self, id: NationalId, password: &str) -> bool {
        self.verify_hash(id, &PasswordHash::derive(id, password))
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voter> {
        self.voters.values()
    }

    pub fn votes_cast(&self) -> usize {
        self.voters.values().filter(|v| v.has_voted).count()
    }

    fn get_mut(&mut self, id: NationalId) -> Result<&mut Voter, Error> {
        self.voters.get_mut(&id).ok_or(Error::VoterNotFound(id))
    }

    pub(crate) fn insert(&mut self, voter: Voter) -> Result<(), Error> {
        if self.contains(voter.national_id) {
            return Err(Error::VoterExists(voter.national_id));
        }
        self.voters.insert(voter.national_id, voter);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: NationalId) -> Result<Voter, Error> {
        self.voters.remove(&id).ok_or(Error::VoterNotFound(id))
    }

    pub(crate) fn set_commitment(&mut self, id: NationalId, commitment: Commitment) -> Result<(), Error> {
        let voter = self.get_mut(id)?;
        if voter.commitment.is_some() {
            return Err(Error::SecretKeyAlreadyRegistered(id));
        }
        voter.commitment = Some(commitment);
        Ok(())
    }

    pub(crate) fn mark_voted(&mut self, id: NationalId, _: MarkVoted) -> Result<(), Error> {
        let voter = self.get_mut(id)?;
        if voter.has_voted {
            return Err(Error::AlreadyVoted(id));
        }
        voter.has_voted = true;
        Ok(())
    }

    pub(crate) fn set_password(&mut self, id: NationalId, password_hash: PasswordHash) -> Result<(), Error> {
        self.get_mut(id)?.password_hash = password_hash;
        Ok(())
    }

    /// Clear every has-voted flag and commitment; accounts survive
    pub(crate) fn reset_all(&mut self) {
        for voter in self.voters.values_mut() {
            voter.has_voted = false;
            voter.commitment = None;
        }
    }
}

impl Ledger {
    /// Validate a registration form against the ledger, without applying it
    fn voter_from_form(&self, form: &VoterRegistration) -> Result<Voter, Error> {
        let name = self.limits.person_name("voter name", &form.name)?;
        self.limits.password(&form.password)?;
        let seat = Seat::new(&form.province, &form.constituency);
        self.require_seat(&seat)?;

        Ok(Voter {
            national_id: form.national_id,
            name,
            seat,
            password_hash: PasswordHash::derive(form.national_id, &form.password),
            commitment: None,
            has_voted: self.ballots.has_cast(form.national_id),
        })
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    pub fn register_voter(
        &self,
        credentials: &Credentials,
        national_id: NationalId,
        name: &str,
        province: &str,
        constituency: &str,
        password: &str,
    ) -> Result<(), Error> {
        let form = VoterRegistration {
            national_id,
            name: name.to_owned(),
            province: province.to_owned(),
            constituency: constituency.to_owned(),
            password: password.to_owned(),
        };

        self.commit("register_voter", Guard::Admin(credentials), |tx| {
            let voter = tx.ledger.voter_from_form(&form)?;
            let seat = voter.seat.clone();
            tx.ledger.voters.insert(voter)?;

            info!(%national_id, %seat, by = %tx.actor, "voter registered");
            tx.record(Event::VoterRegistered { national_id, seat });
            Ok(())
        })
    }

    /// Register many voters at once
    ///
    /// All or nothing: every entry is checked against the ledger and against the entries
    /// before it, and if any fails nothing is registered and the error carries the
    /// failing entry's index. Returns the number of voters registered.
    pub fn batch_register_voters(
        &self,
        credentials: &Credentials,
        forms: &[VoterRegistration],
    ) -> Result<usize, Error> {
        self.commit("batch_register_voters", Guard::Admin(credentials), |tx| {
            let mut staged = tx.ledger.voters.clone();
            let mut registered = Vec::with_capacity(forms.len());

            for (index, form) in forms.iter().enumerate() {
                let seat = tx
                    .ledger
                    .voter_from_form(form)
                    .and_then(|voter| {
                        let seat = voter.seat.clone();
                        staged.insert(voter)?;
                        Ok(seat)
                    })
                    .map_err(|e| Error::BatchEntry {
                        index,
                        source: Box::new(e),
                    })?;
                registered.push((form.national_id, seat));
            }

            tx.ledger.voters = staged;

            info!(count = registered.len(), by = %tx.actor, "voter batch registered");
            for (national_id, seat) in registered {
                tx.record(Event::VoterRegistered { national_id, seat });
            }
            Ok(forms.len())
        })
    }

    /// Delete a voter record
    ///
    /// A ballot the voter already cast stays in the ballot box and is still tallied, and
    /// registering the same national id again in this cycle yields a voter who has voted.
    pub fn remove_voter(&self, credentials: &Credentials, national_id: NationalId) -> Result<(), Error> {
        self.commit("remove_voter", Guard::Admin(credentials), |tx| {
            tx.ledger.voters.remove(national_id)?;

            info!(%national_id, by = %tx.actor, "voter removed");
            tx.record(Event::VoterRemoved { national_id });
            Ok(())
        })
    }

    /// Check a voter's password digest, as produced by [`PasswordHash::derive`]
    pub fn verify_voter_credentials(&self, national_id: NationalId, password_hash: &PasswordHash) -> bool {
        self.read(|ledger, _| ledger.voters.verify_hash(national_id, password_hash))
    }

    /// Set a voter's has-voted flag by hand
    pub fn mark_as_voted(&self, credentials: &Credentials, national_id: NationalId) -> Result<(), Error> {
        self.commit("mark_as_voted", Guard::Admin(credentials), |tx| {
            tx.ledger.voters.mark_voted(national_id, MarkVoted::grant())?;

            info!(%national_id, by = %tx.actor, "voter marked as voted");
            tx.record(Event::VoterMarkedAsVoted { national_id });
            Ok(())
        })
    }

    /// Replace a voter's password
    ///
    /// `old_password_hash` must match the stored digest. The has-voted flag and the secret
    /// key commitment are left as they are.
    pub fn change_voter_password(
        &self,
        credentials: &Credentials,
        national_id: NationalId,
        old_password_hash: &PasswordHash,
        new_password: &str,
    ) -> Result<(), Error> {
        self.commit("change_voter_password", Guard::Admin(credentials), |tx| {
            if !tx.ledger.voters.contains(national_id) {
                return Err(Error::VoterNotFound(national_id));
            }
            if !tx.ledger.voters.verify_hash(national_id, old_password_hash) {
                return Err(Error::PasswordMismatch(national_id));
            }
            tx.ledger.limits.password(new_password)?;

            tx.ledger
                .voters
                .set_password(national_id, PasswordHash::derive(national_id, new_password))?;

            info!(%national_id, by = %tx.actor, "voter password changed");
            tx.record(Event::VoterPasswordChanged { national_id });
            Ok(())
        })
    }

    pub fn view_voter(&self, national_id: NationalId) -> Result<VoterView, Error> {
        self.read(|ledger, _| {
            ledger
                .voters
                .get(national_id)
                .map(VoterView::from)
                .ok_or(Error::VoterNotFound(national_id))
        })
    }

    /// The voter's stored secret key commitment, if one is registered
    pub fn voter_commitment(&self, national_id: NationalId) -> Result<Option<Commitment>, Error> {
        self.read(|ledger, _| {
            ledger
                .voters
                .get(national_id)
                .map(|v| v.commitment)
                .ok_or(Error::VoterNotFound(national_id))
        })
    }

    pub fn voter_count(&self) -> usize {
        self.read(|ledger, _| ledger.voters.len())
    }

    pub fn list_voters(&self) -> Vec<VoterView> {
        self.read(|ledger, _| ledger.voters.iter().map(VoterView::from).collect())
    }

    pub fn voters_by_constituency(&self, province: &str, constituency: &str) -> Vec<VoterView> {
        let seat = Seat::new(province, constituency);
        self.read(|ledger, _| {
            ledger
                .voters
                .iter()
                .filter(|v| v.seat == seat)
                .map(VoterView::from)
                .collect()
        })
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
        (election, creds)
    }

    fn form(national_id: &str, constituency: &str) -> VoterRegistration {
        VoterRegistration {
            national_id: id(national_id),
            name: "Test Voter".into(),
            province: "Punjab".into(),
            constituency: constituency.into(),
            password: "voter123".into(),
        }
    }

    #[test]
    fn test_register_voter() {
        let (election, admin) = setup();
        let voter = id("5555555555555");

        election
            .register_voter(&admin, voter, "Test Voter", "Punjab", "NA-1", "voter123")
            .unwrap();
        assert!(election.verify_voter_credentials(voter, &PasswordHash::derive(voter, "voter123")));
        assert!(!election.verify_voter_credentials(voter, &PasswordHash::derive(voter, "wrong1")));

        let view = election.view_voter(voter).unwrap();
        assert_eq!(view.seat, Seat::new("Punjab", "NA-1"));
        assert!(!view.has_voted);
        assert!(!view.has_secret_key);
        assert_eq!(election.voter_commitment(voter).unwrap(), None);

        let err = election
            .register_voter(&admin, voter, "Test Voter", "Punjab", "NA-2", "voter123")
            .unwrap_err();
        assert!(matches!(err, Error::VoterExists(_)));

        let other = id("6666666666666");
        let err = election
            .register_voter(&admin, other, "Test Voter", "Punjab", "NA-9", "voter123")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = election
            .register_voter(&admin, other, "Te", "Punjab", "NA-1", "voter123")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(election.voter_count(), 1);
        assert_eq!(election.voters_by_constituency("Punjab", "NA-1").len(), 1);
        assert!(election.voters_by_constituency("Punjab", "NA-2").is_empty());

        election.remove_voter(&admin, voter).unwrap();
        assert_eq!(
            election.view_voter(voter).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(election.remove_voter(&admin, voter).is_err());
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let (election, admin) = setup();

        // Third entry repeats the first
        let batch = vec![
            form("5555555555555", "NA-1"),
            form("6666666666666", "NA-2"),
            form("5555555555555", "NA-2"),
        ];
        let err = election
            .batch_register_voters(&admin, &batch)
            .unwrap_err();
        assert!(matches!(err, Error::BatchEntry { index: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(election.voter_count(), 0);
        assert!(election.journal(0).iter().all(|e| e.event.event_type() != EventType::VoterRegistered));

        // Unknown constituency
        let batch = vec![form("5555555555555", "NA-1"), form("6666666666666", "NA-9")];
        let err = election
            .batch_register_voters(&admin, &batch)
            .unwrap_err();
        assert!(matches!(err, Error::BatchEntry { index: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(election.voter_count(), 0);

        let batch = vec![form("5555555555555", "NA-1"), form("6666666666666", "NA-2")];
        assert_eq!(election.batch_register_voters(&admin, &batch).unwrap(), 2);
        assert_eq!(election.voter_count(), 2);

        // Clashes with an existing voter
        let batch = vec![form("7777777777777", "NA-1"), form("6666666666666", "NA-1")];
        assert!(election.batch_register_voters(&admin, &batch).is_err());
        assert_eq!(election.voter_count(), 2);
    }

    #[test]
    fn test_change_password_keeps_voting_state() {
        let (election, admin) = setup();
        let voter = id("5555555555555");
        election
            .register_voter(&admin, voter, "Test Voter", "Punjab", "NA-1", "voter123")
            .unwrap();
        election.mark_as_voted(&admin, voter).unwrap();

        let err = election
            .change_voter_password(&admin, voter, &PasswordHash::derive(voter, "guess12"), "newpass1")
            .unwrap_err();
        assert!(matches!(err, Error::PasswordMismatch(_)));

        let err = election
            .change_voter_password(&admin, voter, &PasswordHash::derive(voter, "voter123"), "short")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        election
            .change_voter_password(&admin, voter, &PasswordHash::derive(voter, "voter123"), "newpass1")
            .unwrap();
        assert!(election.verify_voter_credentials(voter, &PasswordHash::derive(voter, "newpass1")));
        assert!(election.view_voter(voter).unwrap().has_voted);
    }

    #[test]
    fn test_mark_as_voted_requires_admin() {
        let (election, admin) = setup();
        let voter = id("5555555555555");
        election
            .register_voter(&admin, voter, "Test Voter", "Punjab", "NA-1", "voter123")
            .unwrap();

        // A voter's own credentials are not admin credentials
        let err = election
            .mark_as_voted(&Credentials::new(voter, "voter123"), voter)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(!election.view_voter(voter).unwrap().has_voted);

        election.mark_as_voted(&admin, voter).unwrap();
        assert!(election.view_voter(voter).unwrap().has_voted);
        let err = election.mark_as_voted(&admin, voter).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
