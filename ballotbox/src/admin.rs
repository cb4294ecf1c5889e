use crate::*;
use std::collections::BTreeMap;
use tracing::info;

/// An admin's login
#[derive(Clone)]
pub struct Credentials {
    pub id: NationalId,
    pub password: String,
}

impl Credentials {
    pub fn new(id: NationalId, password: &str) -> Self {
        Credentials {
            id,
            password: password.to_owned(),
        }
    }
}

// Never print the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who may add and remove admins
#[derive(Clone, Debug)]
pub enum Authority {
    /// The system owner, holding the secret the ledger was created with
    Owner { secret: String },
    /// Any active admin
    Admin(Credentials),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Admin {
    pub id: NationalId,
    pub name: String,
    pub password_hash: PasswordHash,
    pub exists: bool,
}

/// Public view of an admin record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AdminView {
    pub id: NationalId,
    pub name: String,
    pub exists: bool,
}

impl From<&Admin> for AdminView {
    fn from(admin: &Admin) -> Self {
        AdminView {
            id: admin.id,
            name: admin.name.clone(),
            exists: admin.exists,
        }
    }
}

/// Admin credential store
///
/// Removing an admin only clears its `exists` flag, so the record stays viewable and the
/// id can be registered again later.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AdminRegistry {
    admins: BTreeMap<NationalId, Admin>,
}

impl AdminRegistry {
    pub fn get(&self, id: NationalId) -> Option<&Admin> {
        self.admins.get(&id)
    }

    fn active(&self, id: NationalId) -> Option<&Admin> {
        self.admins.get(&id).filter(|a| a.exists)
    }

    pub fn is_admin(&self, id: NationalId) -> bool {
        self.active(id).is_some()
    }

    /// true iff an active admin with that id exists and the password matches
    pub fn verify(&self, id: NationalId, password: &str) -> bool {
        match self.active(id) {
            Some(admin) => admin.password_hash == PasswordHash::derive(id, password),
            None => false,
        }
    }

    /// Authorization guard for every admin operation
    pub(crate) fn authorize(&self, credentials: &Credentials) -> Result<(), Error> {
        let admin = self
            .active(credentials.id)
            .ok_or(Error::AdminDoesNotExist(credentials.id))?;
        if admin.password_hash != PasswordHash::derive(credentials.id, &credentials.password) {
            return Err(Error::InvalidAdminCredentials);
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, id: NationalId, name: String, password: &str) -> Result<(), Error> {
        if self.is_admin(id) {
            return Err(Error::AdminExists(id));
        }
        self.admins.insert(
            id,
            Admin {
                id,
                name,
                password_hash: PasswordHash::derive(id, password),
                exists: true,
            },
        );
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: NationalId) -> Result<(), Error> {
        match self.admins.get_mut(&id) {
            Some(admin) if admin.exists => {
                admin.exists = false;
                Ok(())
            }
            _ => Err(Error::AdminNotFound(id)),
        }
    }

    pub fn list(&self) -> Vec<AdminView> {
        self.admins
            .values()
            .filter(|a| a.exists)
            .map(AdminView::from)
            .collect()
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Register a new admin
    ///
    /// Callable by the system owner or by any active admin. A previously removed id may be
    /// registered again.
    pub fn add_admin(
        &self,
        authority: &Authority,
        id: NationalId,
        name: &str,
        password: &str,
    ) -> Result<(), Error> {
        self.commit("add_admin", Guard::Authority(authority), |tx| {
            let name = tx.ledger.limits.person_name("admin name", name)?;
            tx.ledger.limits.password(password)?;
            tx.ledger.admins.insert(id, name.clone(), password)?;

            info!(%id, by = %tx.actor, "admin added");
            tx.record(Event::AdminAdded { id, name });
            Ok(())
        })
    }

    /// Deactivate an admin; the id becomes available again
    pub fn remove_admin(&self, authority: &Authority, id: NationalId) -> Result<(), Error> {
        self.commit("remove_admin", Guard::Authority(authority), |tx| {
            tx.ledger.admins.remove(id)?;

            info!(%id, by = %tx.actor, "admin removed");
            tx.record(Event::AdminRemoved { id });
            Ok(())
        })
    }

    /// true iff an active admin with that id exists and the password matches
    pub fn verify_admin(&self, id: NationalId, password: &str) -> bool {
        self.read(|ledger, _| ledger.admins.verify(id, password))
    }

    pub fn is_admin(&self, id: NationalId) -> bool {
        self.read(|ledger, _| ledger.admins.is_admin(id))
    }

    /// View an admin record, including removed ones
    pub fn view_admin(&self, id: NationalId) -> Result<AdminView, Error> {
        self.read(|ledger, _| {
            ledger
                .admins
                .get(id)
                .map(AdminView::from)
                .ok_or(Error::AdminNotFound(id))
        })
    }

    /// All active admins
    pub fn list_admins(&self) -> Vec<AdminView> {
        self.read(|ledger, _| ledger.admins.list())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn id(s: &str) -> NationalId {
        s.parse().unwrap()
    }

    fn owner() -> Authority {
        Authority::Owner {
            secret: "owner-secret".into(),
        }
    }

    #[test]
    fn test_admin_lifecycle() {
        let election = Election::in_memory("owner-secret").unwrap();
        let first = id("1234567890123");
        let second = id("9999999999999");

        election
            .add_admin(&owner(), first, "Test Admin", "admin123")
            .unwrap();
        assert!(election.verify_admin(first, "admin123"));
        assert!(!election.verify_admin(first, "wrongpassword"));
        assert!(!election.verify_admin(second, "admin123"));

        // Duplicate id
        let err = election
            .add_admin(&owner(), first, "Duplicate Admin", "password")
            .unwrap_err();
        assert!(matches!(err, Error::AdminExists(_)));
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        // An existing admin may add another
        let by_admin = Authority::Admin(Credentials::new(first, "admin123"));
        election
            .add_admin(&by_admin, second, "New Admin", "password123")
            .unwrap();
        let view = election.view_admin(second).unwrap();
        assert!(view.exists);
        assert_eq!(view.name, "New Admin");
        assert_eq!(election.list_admins().len(), 2);

        // Removal keeps the record but clears the flag
        election.remove_admin(&owner(), second).unwrap();
        assert!(!election.view_admin(second).unwrap().exists);
        assert!(!election.is_admin(second));
        assert!(!election.verify_admin(second, "password123"));
        assert_eq!(election.list_admins().len(), 1);

        let err = election.remove_admin(&owner(), second).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // A removed id can be re-added
        election
            .add_admin(&by_admin, second, "Returning Admin", "another1")
            .unwrap();
        assert!(election.verify_admin(second, "another1"));
        assert!(!election.verify_admin(second, "password123"));
    }

    #[test]
    fn test_admin_authorization() {
        let election = Election::in_memory("owner-secret").unwrap();
        let admin = id("1234567890123");
        election
            .add_admin(&owner(), admin, "Test Admin", "admin123")
            .unwrap();

        let fake = Authority::Admin(Credentials::new(id("9999999999999"), "wrongpass"));
        let err = election
            .add_admin(&fake, id("8888888888888"), "Temp Admin", "password123")
            .unwrap_err();
        assert!(matches!(err, Error::AdminDoesNotExist(_)));

        let wrong_password = Authority::Admin(Credentials::new(admin, "wrongpass"));
        let err = election
            .remove_admin(&wrong_password, admin)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAdminCredentials));
        assert!(election.is_admin(admin));
    }

    #[test]
    fn test_admin_validation() {
        let election = Election::in_memory("owner-secret").unwrap();
        let admin = id("1234567890123");

        let err = election
            .add_admin(&owner(), admin, "Al", "admin123")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = election
            .add_admin(&owner(), admin, "Test Admin", "12345")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!election.is_admin(admin));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials::new(id("1234567890123"), "admin123");
        assert!(!format!("{:?}", credentials).contains("admin123"));
    }
}
