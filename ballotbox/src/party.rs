use crate::*;
use std::collections::BTreeSet;
use tracing::info;

/// Registered party names
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PartyRegistry {
    parties: BTreeSet<String>,
}

impl PartyRegistry {
    pub fn has(&self, party: &str) -> bool {
        self.parties.contains(party)
    }

    pub fn list(&self) -> Vec<String> {
        self.parties.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    pub(crate) fn add(&mut self, party: String) -> Result<(), Error> {
        if self.parties.contains(&party) {
            return Err(Error::PartyExists(party));
        }
        self.parties.insert(party);
        Ok(())
    }

    pub(crate) fn remove(&mut self, party: &str) -> Result<(), Error> {
        if !self.parties.remove(party) {
            return Err(Error::PartyNotFound(party.to_owned()));
        }
        Ok(())
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    pub fn add_party(&self, credentials: &Credentials, party: &str) -> Result<(), Error> {
        self.commit("add_party", Guard::Admin(credentials), |tx| {
            let party = tx.ledger.limits.label("party", party)?;
            tx.ledger.parties.add(party.clone())?;

            info!(%party, by = %tx.actor, "party added");
            tx.record(Event::PartyAdded { party });
            Ok(())
        })
    }

    pub fn remove_party(&self, credentials: &Credentials, party: &str) -> Result<(), Error> {
        self.commit("remove_party", Guard::Admin(credentials), |tx| {
            let party = party.trim().to_owned();
            tx.ledger.parties.remove(&party)?;

            info!(%party, by = %tx.actor, "party removed");
            tx.record(Event::PartyRemoved { party });
            Ok(())
        })
    }

    pub fn list_parties(&self) -> Vec<String> {
        self.read(|ledger, _| ledger.parties.list())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parties() {
        let mut parties = PartyRegistry::default();
        assert!(parties.is_empty());

        parties.add("PTI".into()).unwrap();
        parties.add("PML-N".into()).unwrap();
        assert!(matches!(
            parties.add("PTI".into()),
            Err(Error::PartyExists(_))
        ));
        assert_eq!(parties.list(), vec!["PML-N", "PTI"]);

        parties.remove("PTI").unwrap();
        assert!(!parties.has("PTI"));
        assert_eq!(
            parties.remove("PTI").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(parties.len(), 1);
    }
}
