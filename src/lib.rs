// binopt-core: binary option settlement engine.
// participants are split into groups, each stakes into escrow, one oracle price
// after expiration decides the winning group, and winners claim fixed prizes.
// all settlement logic is deterministic. ledger, oracle and clock are injected.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, GroupIndex, Price, Amount, Timestamp
//   2.x  clock.rs: time source, system and manual
//   3.x  ledger.rs: token ledger trait, in-memory ledger, escrow account (mocked)
//   4.x  oracle.rs: price sample feed trait, mock oracle (mocked)
//   5.x  config.rs: groups, participants, collateral policy, validation
//   5.1x strategy/: win conditions: threshold, interval, barrier
//   6.x  events.rs: state transition events for audit
//   7.x  engine/: option contract: fund, resolve, claim

// core settlement modules
pub mod config;
pub mod engine;
pub mod events;
pub mod strategy;
pub mod types;

// integration modules
pub mod clock;
pub mod ledger;
pub mod oracle;

// re exports for convenience
pub use clock::*;
pub use config::*;
pub use engine::*;
pub use events::*;
pub use ledger::*;
pub use oracle::*;
pub use strategy::*;
pub use types::*;
