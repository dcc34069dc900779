//! Binary Option Settlement Simulation.
//!
//! Runs the three option flavours end to end against an in-memory ledger,
//! a mock oracle and a manual clock, printing every participant's balance.
//! Set `RUST_LOG=binopt_core=debug` to see the contract's own logging.

use std::error::Error;
use std::sync::Arc;

use binopt_core::*;
use tracing_subscriber::EnvFilter;

const ESCROW: AccountId = AccountId(1000);
const INITIAL_BALANCE: i64 = 1000;
const EXPIRY_SECS: i64 = 600;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Binary Option Settlement Engine Simulation");
    println!("Stake, Resolve, Claim\n");

    scenario_1_price_limit();
    scenario_2_range();
    scenario_3_touch();

    println!("\nAll simulations completed successfully.");
}

fn p(v: i64) -> Price {
    Price::from_int(v).unwrap_or_else(|| panic!("price {v} must be positive"))
}

fn entry(owner: u64, stake: i64, prize: i64) -> ParticipantEntry {
    ParticipantEntry::new(AccountId(owner), Amount::from_int(stake), Amount::from_int(prize))
}

/// Shared harness: mint, approve, build, fund, expire, resolve and let every
/// participant claim. The oracle shows `initial` at construction and `settle`
/// after expiration.
fn run(
    groups: Vec<Group>,
    condition: impl Into<WinCondition>,
    initial: Price,
    settle: Price,
) -> Result<(Arc<InMemoryLedger>, OptionContract), Box<dyn Error>> {
    let ledger = Arc::new(InMemoryLedger::new());
    let oracle = Arc::new(MockOracle::with_price(initial));
    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(0)));

    let config = OptionConfig::new(Timestamp::from_secs(EXPIRY_SECS), groups, condition);
    for participant in config.participants() {
        ledger.mint(participant.entry.owner, Amount::from_int(INITIAL_BALANCE))?;
        ledger.approve(participant.entry.owner, ESCROW, participant.entry.stake);
    }

    let contract = OptionContract::new(
        config,
        Arc::new(ledger.escrow_account(ESCROW)),
        Arc::clone(&oracle) as Arc<dyn PriceOracle>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )?;

    let funded = contract.fund()?;
    println!("  Funded: {} escrowed from {} participants", funded.total_escrowed, funded.participants);

    clock.advance_secs(EXPIRY_SECS + 1);
    oracle.push_price(settle, clock.now());

    let resolved = contract.resolve()?;
    match resolved.winning_group {
        Some(group) => println!("  Resolved at {}: {} wins {}", resolved.sample.price, group, resolved.total_prize),
        None => println!("  Resolved at {}: no winner", resolved.sample.price),
    }

    for participant in contract.config().participants() {
        let owner = participant.entry.owner;
        match contract.claim(owner) {
            Ok(prize) => println!("    {} claims {}", owner, prize),
            Err(e) => println!("    {} claim: {}", owner, e),
        }
    }

    Ok((ledger, contract))
}

fn print_balances(ledger: &InMemoryLedger, contract: &OptionContract) {
    for participant in contract.config().participants() {
        let owner = participant.entry.owner;
        println!("    {} ({}): {}", owner, participant.group, ledger.balance_of(owner));
    }
    println!("    escrow left: {}", ledger.balance_of(ESCROW));
}

/// Two groups on one limit. Group 0 wins above it.
fn scenario_1_price_limit() {
    println!("Scenario 1: Price Limit\n");

    let limit = 1_665_714_038;
    let groups = vec![Group::new(vec![entry(1, 100, 200)]), Group::new(vec![entry(2, 200, 100)])];

    match run(groups, ThresholdCondition::above(p(limit)), p(limit), p(limit + 1)) {
        Ok((ledger, contract)) => print_balances(&ledger, &contract),
        Err(e) => println!("  failed: {}", e),
    }
    println!();
}

/// One interval per group. The settlement price lands in group 1's range.
fn scenario_2_range() {
    println!("Scenario 2: Range\n");

    let groups = vec![
        Group::new(vec![entry(1, 40, 50), entry(2, 60, 50)]),
        Group::new(vec![entry(3, 100, 100)]),
    ];
    let condition = IntervalCondition::new(vec![
        PriceInterval::new(p(1_000_000_000), p(1_000_010_000)),
        PriceInterval::new(p(1_000_020_000), p(1_000_030_000)),
    ]);

    match run(groups, condition, p(1_000_000_000), p(1_000_020_001)) {
        Ok((ledger, contract)) => print_balances(&ledger, &contract),
        Err(e) => println!("  failed: {}", e),
    }
    println!();
}

/// Up and down barriers around the initial price, plus a fallback group.
fn scenario_3_touch() {
    println!("Scenario 3: Touch\n");

    let groups = || {
        vec![
            Group::new(vec![entry(1, 40, 200), entry(2, 60, 200)]),
            Group::new(vec![entry(3, 100, 150), entry(4, 100, 150)]),
            Group::new(vec![entry(5, 200, 300)]),
        ]
    };
    let condition =
        || BarrierCondition::new(vec![Barrier::touch(p(100_000)), Barrier::touch(p(90_000)), Barrier::Fallback]);

    // initial price above both targets: both barriers would point down
    match run(groups(), condition(), p(100_001), p(95_000)) {
        Ok(_) => println!("  unexpected: conflicting barriers accepted"),
        Err(e) => println!("  Rejected at 100001: {}", e),
    }

    match run(groups(), condition(), p(93_000), p(95_000)) {
        Ok((ledger, contract)) => print_balances(&ledger, &contract),
        Err(e) => println!("  failed: {}", e),
    }
}
