use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Provinces and the constituencies within them
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Geography {
    provinces: BTreeMap<String, BTreeSet<String>>,
}

impl Geography {
    pub fn has_province(&self, province: &str) -> bool {
        self.provinces.contains_key(province)
    }

    pub fn has_constituency(&self, seat: &Seat) -> bool {
        self.provinces
            .get(&seat.province)
            .map(|c| c.contains(&seat.constituency))
            .unwrap_or(false)
    }

    pub fn provinces(&self) -> Vec<String> {
        self.provinces.keys().cloned().collect()
    }

    pub fn constituencies(&self, province: &str) -> Result<Vec<String>, Error> {
        self.provinces
            .get(province)
            .map(|c| c.iter().cloned().collect())
            .ok_or_else(|| Error::ProvinceNotFound(province.to_owned()))
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn constituency_count(&self) -> usize {
        self.provinces.values().map(BTreeSet::len).sum()
    }

    pub(crate) fn add_province(&mut self, province: String) -> Result<(), Error> {
        if self.has_province(&province) {
            return Err(Error::ProvinceExists(province));
        }
        self.provinces.insert(province, BTreeSet::new());
        Ok(())
    }

    pub(crate) fn remove_province(&mut self, province: &str) -> Result<(), Error> {
        match self.provinces.get(province) {
            None => Err(Error::ProvinceNotFound(province.to_owned())),
            Some(constituencies) if !constituencies.is_empty() => {
                Err(Error::ProvinceHasConstituencies(province.to_owned()))
            }
            Some(_) => {
                self.provinces.remove(province);
                Ok(())
            }
        }
    }

    pub(crate) fn add_constituency(&mut self, seat: &Seat) -> Result<(), Error> {
        let constituencies = self
            .provinces
            .get_mut(&seat.province)
            .ok_or_else(|| Error::ProvinceNotFound(seat.province.clone()))?;
        if !constituencies.insert(seat.constituency.clone()) {
            return Err(Error::ConstituencyExists(seat.clone()));
        }
        Ok(())
    }

    pub(crate) fn remove_constituency(&mut self, seat: &Seat) -> Result<(), Error> {
        let constituencies = self
            .provinces
            .get_mut(&seat.province)
            .ok_or_else(|| Error::ProvinceNotFound(seat.province.clone()))?;
        if !constituencies.remove(&seat.constituency) {
            return Err(Error::ConstituencyNotFound(seat.clone()));
        }
        Ok(())
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    pub fn add_province(&self, credentials: &Credentials, province: &str) -> Result<(), Error> {
        self.commit("add_province", Guard::Admin(credentials), |tx| {
            let province = tx.ledger.limits.label("province", province)?;
            tx.ledger.geography.add_province(province.clone())?;

            info!(%province, by = %tx.actor, "province added");
            tx.record(Event::ProvinceAdded { province });
            Ok(())
        })
    }

    /// Remove a province that owns no constituencies
    pub fn remove_province(&self, credentials: &Credentials, province: &str) -> Result<(), Error> {
        self.commit("remove_province", Guard::Admin(credentials), |tx| {
            let province = province.trim().to_owned();
            tx.ledger.geography.remove_province(&province)?;

            info!(%province, by = %tx.actor, "province removed");
            tx.record(Event::ProvinceRemoved { province });
            Ok(())
        })
    }

    pub fn add_constituency(
        &self,
        credentials: &Credentials,
        province: &str,
        constituency: &str,
    ) -> Result<(), Error> {
        self.commit("add_constituency", Guard::Admin(credentials), |tx| {
            let province = tx.ledger.limits.label("province", province)?;
            let constituency = tx.ledger.limits.label("constituency", constituency)?;
            let seat = Seat::new(&province, &constituency);
            tx.ledger.geography.add_constituency(&seat)?;

            info!(%seat, by = %tx.actor, "constituency added");
            tx.record(Event::ConstituencyAdded { seat });
            Ok(())
        })
    }

    /// Remove a constituency
    ///
    /// Candidates, voters and results bound to it are left in place. Queries on them
    /// keep working; new registrations against it are refused.
    pub fn remove_constituency(
        &self,
        credentials: &Credentials,
        province: &str,
        constituency: &str,
    ) -> Result<(), Error> {
        self.commit("remove_constituency", Guard::Admin(credentials), |tx| {
            let seat = Seat::new(province, constituency);
            tx.ledger.geography.remove_constituency(&seat)?;

            info!(%seat, by = %tx.actor, "constituency removed");
            tx.record(Event::ConstituencyRemoved { seat });
            Ok(())
        })
    }

    pub fn list_provinces(&self) -> Vec<String> {
        self.read(|ledger, _| ledger.geography.provinces())
    }

    pub fn list_constituencies(&self, province: &str) -> Result<Vec<String>, Error> {
        self.read(|ledger, _| ledger.geography.constituencies(province.trim()))
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn setup() -> (Election, Credentials) {
        let election = Election::in_memory("owner-secret").unwrap();
        let admin: NationalId = "1234567890123".parse().unwrap();
        let owner = Authority::Owner {
            secret: "owner-secret".into(),
        };
        election
            .add_admin(&owner, admin, "Test Admin", "admin123")
            .unwrap();
        (election, Credentials::new(admin, "admin123"))
    }

    #[test]
    fn test_provinces() {
        let (election, admin) = setup();

        election.add_province(&admin, "Punjab").unwrap();
        election.add_province(&admin, " Sindh ").unwrap();
        assert_eq!(election.list_provinces(), vec!["Punjab", "Sindh"]);

        let err = election.add_province(&admin, "Punjab").unwrap_err();
        assert!(matches!(err, Error::ProvinceExists(_)));
        let err = election.add_province(&admin, "  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = election.remove_province(&admin, "Balochistan").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        election.remove_province(&admin, "Sindh").unwrap();
        assert_eq!(election.list_provinces(), vec!["Punjab"]);
    }

    #[test]
    fn test_province_with_constituencies_cannot_be_removed() {
        let (election, admin) = setup();
        election.add_province(&admin, "Punjab").unwrap();
        election.add_constituency(&admin, "Punjab", "NA-1").unwrap();
        election.add_constituency(&admin, "Punjab", "NA-2").unwrap();

        let err = election.remove_province(&admin, "Punjab").unwrap_err();
        assert!(matches!(err, Error::ProvinceHasConstituencies(_)));
        assert_eq!(err.kind(), ErrorKind::State);

        election.remove_constituency(&admin, "Punjab", "NA-1").unwrap();
        assert!(election.remove_province(&admin, "Punjab").is_err());
        election.remove_constituency(&admin, "Punjab", "NA-2").unwrap();
        election.remove_province(&admin, "Punjab").unwrap();
        assert!(election.list_provinces().is_empty());
    }

    #[test]
    fn test_constituencies() {
        let (election, admin) = setup();
        election.add_province(&admin, "Punjab").unwrap();
        election.add_province(&admin, "Sindh").unwrap();

        let err = election
            .add_constituency(&admin, "Balochistan", "NA-1")
            .unwrap_err();
        assert!(matches!(err, Error::ProvinceNotFound(_)));

        election.add_constituency(&admin, "Punjab", "NA-1").unwrap();
        let err = election
            .add_constituency(&admin, "Punjab", "NA-1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        // Names are only unique within a province
        election.add_constituency(&admin, "Sindh", "NA-1").unwrap();

        assert_eq!(election.list_constituencies("Punjab").unwrap(), vec!["NA-1"]);
        assert!(election.list_constituencies("Balochistan").is_err());

        let err = election
            .remove_constituency(&admin, "Punjab", "NA-9")
            .unwrap_err();
        assert!(matches!(err, Error::ConstituencyNotFound(_)));
    }

    #[test]
    fn test_geography_requires_admin() {
        let (election, admin) = setup();
        let intruder = Credentials::new(admin.id, "wrongpass");

        let err = election.add_province(&intruder, "Punjab").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(election.list_provinces().is_empty());
    }
}
