#[macro_use]
extern crate serde;

mod admin;
mod candidate;
mod clock;
mod election;
mod error;
mod fingerprint;
mod geography;
mod identifier;
mod journal;
mod ledger;
mod party;
mod report;
mod store;
mod tally;
mod validate;
mod voter;
mod voting;

pub use admin::*;
pub use candidate::*;
pub use clock::*;
pub use election::*;
pub use error::*;
pub use fingerprint::*;
pub use geography::*;
pub use identifier::*;
pub use journal::*;
pub use ledger::*;
pub use party::*;
pub use report::*;
pub use store::*;
pub use tally::*;
pub use validate::*;
pub use voter::*;
pub use voting::*;
