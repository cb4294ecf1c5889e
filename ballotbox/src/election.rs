use crate::*;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

/// The election service
///
/// Owns the [`Ledger`] behind a single `RwLock`. Every mutating operation runs as one
/// transaction under the write lock: the caller's credentials are checked first, then
/// every precondition, and only then is any effect applied, journaled and saved. Two
/// racing calls on the same key are therefore always serialized, and the loser observes
/// the winner's effect. Queries take the read lock and see a consistent snapshot.
///
/// An `Election` is `Send + Sync`; share it between threads with an `Arc`.
pub struct Election<S: Store = MemStore, C: Clock = SystemClock> {
    ledger: RwLock<Ledger>,
    store: S,
    clock: C,
}

impl Election<MemStore, SystemClock> {
    /// Create a fresh, non-persistent election system
    pub fn in_memory(owner_secret: &str) -> Result<Self, Error> {
        Election::create(MemStore, SystemClock, owner_secret)
    }
}

impl<S: Store, C: Clock> Election<S, C> {
    /// Create a new ledger in `store`
    ///
    /// Fails with [`Error::LedgerExists`] if the store already holds one.
    pub fn create(store: S, clock: C, owner_secret: &str) -> Result<Self, Error> {
        Election::create_with_limits(store, clock, owner_secret, Limits::default())
    }

    pub fn create_with_limits(
        store: S,
        clock: C,
        owner_secret: &str,
        limits: Limits,
    ) -> Result<Self, Error> {
        if store.load()?.is_some() {
            return Err(Error::LedgerExists);
        }
        let ledger = Ledger::new(owner_secret, limits)?;
        store.save(&ledger)?;

        Ok(Election {
            ledger: RwLock::new(ledger),
            store,
            clock,
        })
    }

    /// Open the ledger saved in `store`
    pub fn open(store: S, clock: C) -> Result<Self, Error> {
        let ledger = store.load()?.ok_or(Error::MissingLedger)?;

        Ok(Election {
            ledger: RwLock::new(ledger),
            store,
            clock,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A copy of the whole ledger
    pub fn snapshot(&self) -> Ledger {
        self.read(|ledger, _| ledger.clone())
    }

    // Mutations never panic while holding the lock, and every mutation validates before it
    // applies anything, so a poisoned lock never guards partial state.
    fn read_lock(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a query against a consistent snapshot
    pub(crate) fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Ledger, Timestamp) -> T,
    {
        let ledger = self.read_lock();
        f(&ledger, self.clock.now())
    }

    /// Run a mutating operation as one all-or-nothing transaction
    pub(crate) fn commit<T, F>(
        &self,
        op: &'static str,
        guard: Guard<'_>,
        f: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, Error>,
    {
        let mut ledger = self.write_lock();
        let now = self.clock.now();

        let actor = guard.check(&*ledger).map_err(|e| {
            warn!(op, error = %e, "rejected credentials");
            e
        })?;

        let mut tx = Transaction {
            ledger: &mut *ledger,
            now,
            actor,
            events: Vec::new(),
        };
        let output = f(&mut tx).map_err(|e| {
            debug!(op, %actor, error = %e, "rejected");
            e
        })?;

        let Transaction { events, .. } = tx;
        for event in events {
            ledger.journal.append(now, actor, event);
        }

        if let Err(e) = self.store.save(&ledger) {
            error!(op, error = %e, "failed to save ledger, rolling back");
            match self.store.load() {
                Ok(Some(previous)) => *ledger = previous,
                Ok(None) => error!(op, "no saved ledger to roll back to"),
                Err(load_err) => error!(op, error = %load_err, "failed to reload ledger"),
            }
            return Err(e);
        }

        Ok(output)
    }
}

/// Who is allowed to run a transaction
pub(crate) enum Guard<'a> {
    /// An active admin
    Admin(&'a Credentials),
    /// The system owner or an active admin
    Authority(&'a Authority),
    /// A registered voter
    Voter(NationalId, &'a str),
}

impl Guard<'_> {
    fn check(&self, ledger: &Ledger) -> Result<Actor, Error> {
        match self {
            Guard::Admin(credentials) => {
                ledger.admins.authorize(credentials)?;
                Ok(Actor::Admin(credentials.id))
            }
            Guard::Authority(Authority::Admin(credentials)) => {
                ledger.admins.authorize(credentials)?;
                Ok(Actor::Admin(credentials.id))
            }
            Guard::Authority(Authority::Owner { secret }) => {
                if !ledger.verify_owner(secret) {
                    return Err(Error::InvalidOwnerSecret);
                }
                Ok(Actor::Owner)
            }
            Guard::Voter(id, password) => {
                if !ledger.voters.verify_password(*id, password) {
                    return Err(Error::InvalidVoterCredentials);
                }
                Ok(Actor::Voter(*id))
            }
        }
    }
}

/// An open, authorized transaction against the ledger
pub(crate) struct Transaction<'a> {
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) now: Timestamp,
    pub(crate) actor: Actor,
    events: Vec<Event>,
}

impl Transaction<'_> {
    /// Journal an event once the transaction commits
    pub(crate) fn record(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn election_is_shareable() {
        assert_send_sync::<Election>();
        assert_send_sync::<Election<FileStore, ManualClock>>();
    }

    #[test]
    fn create_refuses_weak_owner_secret() {
        let err = Election::in_memory("short").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn failed_transaction_leaves_no_trace() {
        let election = Election::in_memory("owner-secret").unwrap();
        let owner = Authority::Owner {
            secret: "owner-secret".into(),
        };
        let bad_owner = Authority::Owner {
            secret: "wrong-secret".into(),
        };
        let admin: NationalId = "1234567890123".parse().unwrap();

        let err = election
            .add_admin(&bad_owner, admin, "Test Admin", "admin123")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(election.journal(0).is_empty());

        election
            .add_admin(&owner, admin, "Test Admin", "admin123")
            .unwrap();
        let journal = election.journal(0);
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].actor, Actor::Owner);
    }
}
