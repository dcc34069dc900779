//! End-to-end option flows.
//!
//! Each test mints 1000 to every participant, approves exactly the stake,
//! funds, expires, resolves and claims, then checks final balances.

use std::sync::Arc;

use binopt_core::*;

const ESCROW: AccountId = AccountId(1000);

fn p(v: i64) -> Price {
    Price::from_int(v).unwrap()
}

fn amt(v: i64) -> Amount {
    Amount::from_int(v)
}

fn entry(owner: u64, stake: i64, prize: i64) -> ParticipantEntry {
    ParticipantEntry::new(AccountId(owner), amt(stake), amt(prize))
}

struct Harness {
    ledger: Arc<InMemoryLedger>,
    oracle: Arc<MockOracle>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(initial_price: Option<Price>) -> Self {
        let oracle = match initial_price {
            Some(price) => MockOracle::with_price(price),
            None => MockOracle::new(),
        };
        Self {
            ledger: Arc::new(InMemoryLedger::new()),
            oracle: Arc::new(oracle),
            clock: Arc::new(ManualClock::new(Timestamp::from_secs(0))),
        }
    }

    fn mint_and_approve(&self, config: &OptionConfig) {
        for participant in config.participants() {
            self.ledger.mint(participant.entry.owner, amt(1000)).unwrap();
            self.ledger.approve(participant.entry.owner, ESCROW, participant.entry.stake);
        }
    }

    fn build(&self, config: OptionConfig) -> Result<OptionContract, SettlementError> {
        OptionContract::new(
            config,
            Arc::new(self.ledger.escrow_account(ESCROW)),
            Arc::clone(&self.oracle) as Arc<dyn PriceOracle>,
            Arc::clone(&self.clock) as Arc<dyn Clock>,
        )
    }

    fn expire_at(&self, contract: &OptionContract, price: Price) {
        self.clock.set(contract.expiration().plus_millis(1));
        self.oracle.push_price(price, self.clock.now());
    }

    fn balance(&self, owner: u64) -> Amount {
        self.ledger.balance_of(AccountId(owner))
    }
}

fn price_limit_config() -> OptionConfig {
    OptionConfig::new(
        Timestamp::from_secs(600),
        vec![Group::new(vec![entry(1, 100, 200)]), Group::new(vec![entry(2, 200, 100)])],
        ThresholdCondition::above(p(1_665_714_038)),
    )
}

fn range_config() -> OptionConfig {
    OptionConfig::new(
        Timestamp::from_secs(600),
        vec![
            Group::new(vec![entry(1, 40, 50), entry(2, 60, 50)]),
            Group::new(vec![entry(3, 100, 100)]),
        ],
        IntervalCondition::new(vec![
            PriceInterval::new(p(1_000_000_000), p(1_000_010_000)),
            PriceInterval::new(p(1_000_020_000), p(1_000_030_000)),
        ]),
    )
}

fn touch_config() -> OptionConfig {
    OptionConfig::new(
        Timestamp::from_secs(600),
        vec![
            Group::new(vec![entry(1, 40, 200), entry(2, 60, 200)]),
            Group::new(vec![entry(3, 100, 150), entry(4, 100, 150)]),
            Group::new(vec![entry(5, 200, 300)]),
        ],
        BarrierCondition::new(vec![Barrier::touch(p(100_000)), Barrier::touch(p(90_000)), Barrier::Fallback]),
    )
}

mod flows {
    use super::*;

    #[test]
    fn price_limit_above() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();

        let funded = contract.fund().unwrap();
        assert_eq!(funded.total_escrowed, amt(300));
        assert_eq!(funded.participants, 2);
        assert_eq!(h.balance(1000), amt(300));

        h.expire_at(&contract, p(1_665_714_039));
        let resolved = contract.resolve().unwrap();
        assert_eq!(resolved.winning_group, Some(GroupIndex(0)));
        assert_eq!(resolved.total_prize, amt(200));

        assert_eq!(contract.claim(AccountId(1)), Ok(amt(200)));
        assert_eq!(contract.claim(AccountId(2)), Err(SettlementError::NoPrizeAvailable));

        assert_eq!(h.balance(1), amt(1100));
        assert_eq!(h.balance(2), amt(800));
        assert_eq!(h.balance(1000), amt(100));
        assert_eq!(contract.escrow_balance(), amt(100));
    }

    #[test]
    fn price_limit_equality_goes_to_second_group() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(1_665_714_038));
        assert_eq!(contract.resolve().unwrap().winning_group, Some(GroupIndex(1)));
        assert_eq!(contract.claim(AccountId(2)), Ok(amt(100)));
        assert_eq!(h.balance(2), amt(900));
        assert_eq!(h.balance(1), amt(900));
    }

    #[test]
    fn range_second_interval_wins() {
        let h = Harness::new(None);
        let config = range_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(1_000_020_001));
        assert_eq!(contract.resolve().unwrap().winning_group, Some(GroupIndex(1)));

        assert!(contract.claim(AccountId(1)).is_err());
        assert!(contract.claim(AccountId(2)).is_err());
        assert_eq!(contract.claim(AccountId(3)), Ok(amt(100)));

        assert_eq!(h.balance(1), amt(960));
        assert_eq!(h.balance(2), amt(940));
        assert_eq!(h.balance(3), amt(1000));
        assert_eq!(h.balance(1000), amt(100));
    }

    #[test]
    fn range_price_in_no_interval_has_no_winner() {
        let h = Harness::new(None);
        let config = range_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(1_000_015_000));
        let resolved = contract.resolve().unwrap();
        assert_eq!(resolved.winning_group, None);
        assert_eq!(resolved.total_prize, Amount::zero());

        for owner in 1..=3 {
            assert_eq!(contract.claim(AccountId(owner)), Err(SettlementError::NoPrizeAvailable));
        }
        // stakes stay in escrow
        assert_eq!(h.balance(1000), amt(200));
    }

    #[test]
    fn touch_conflicting_initial_price_rejected() {
        let h = Harness::new(Some(p(100_001)));
        let result = h.build(touch_config());
        assert!(matches!(
            result,
            Err(SettlementError::ConflictingTouchConfiguration { .. })
        ));
        if let Err(e) = result {
            assert!(e.to_string().starts_with("There is conflict between the touch configurations"));
        }
    }

    #[test]
    fn touch_fallback_wins_when_nothing_touched() {
        let h = Harness::new(Some(p(93_000)));
        let config = touch_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        assert_eq!(contract.initial_price(), Some(p(93_000)));
        contract.fund().unwrap();

        h.expire_at(&contract, p(95_000));
        let resolved = contract.resolve().unwrap();
        assert_eq!(resolved.winning_group, Some(GroupIndex(2)));
        assert_eq!(resolved.total_prize, amt(300));

        for owner in 1..=4 {
            assert!(contract.claim(AccountId(owner)).is_err());
        }
        assert_eq!(contract.claim(AccountId(5)), Ok(amt(300)));

        assert_eq!(h.balance(1), amt(960));
        assert_eq!(h.balance(2), amt(940));
        assert_eq!(h.balance(3), amt(900));
        assert_eq!(h.balance(4), amt(900));
        assert_eq!(h.balance(5), amt(1100));
        assert_eq!(h.balance(1000), amt(200));
    }

    #[test]
    fn touch_up_barrier_wins() {
        let h = Harness::new(Some(p(93_000)));
        let config = touch_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(100_000));
        assert_eq!(contract.resolve().unwrap().winning_group, Some(GroupIndex(0)));
        assert_eq!(contract.claim(AccountId(1)), Ok(amt(200)));
        assert_eq!(contract.claim(AccountId(2)), Ok(amt(200)));
        assert_eq!(h.balance(1000), amt(100));
    }

    #[test]
    fn touch_down_barrier_wins() {
        let h = Harness::new(Some(p(93_000)));
        let config = touch_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(89_000));
        assert_eq!(contract.resolve().unwrap().winning_group, Some(GroupIndex(1)));
        assert_eq!(contract.claim(AccountId(3)), Ok(amt(150)));
        assert_eq!(contract.claim(AccountId(4)), Ok(amt(150)));
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn fund_twice_rejected() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();

        contract.fund().unwrap();
        assert_eq!(contract.fund(), Err(SettlementError::AlreadyFunded));
        assert_eq!(h.balance(1000), amt(300));
    }

    #[test]
    fn fund_without_allowance_moves_nothing_and_can_retry() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        h.ledger.approve(AccountId(2), ESCROW, amt(150));
        let contract = h.build(config).unwrap();

        let err = contract.fund().unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InsufficientAllowance { owner: AccountId(2), .. }
        ));
        assert!(err.is_retryable());
        assert_eq!(contract.lifecycle(), LifecycleState::Configured);
        assert_eq!(h.balance(1), amt(1000));
        assert_eq!(h.balance(1000), Amount::zero());
        assert!(matches!(
            contract.recent_events(1)[0].payload,
            EventPayload::FundingRejected(_)
        ));

        h.ledger.approve(AccountId(2), ESCROW, amt(200));
        contract.fund().unwrap();
        assert_eq!(contract.lifecycle(), LifecycleState::Funded);
        assert_eq!(h.balance(1000), amt(300));
    }

    #[test]
    fn resolve_order_of_checks() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();

        // not funded wins over not expired
        assert_eq!(contract.resolve(), Err(SettlementError::NotFunded));

        contract.fund().unwrap();
        assert!(matches!(contract.resolve(), Err(SettlementError::NotExpired { .. })));

        // expiration itself is still too early
        h.clock.set(contract.expiration());
        assert!(matches!(contract.resolve(), Err(SettlementError::NotExpired { .. })));
        assert_eq!(h.oracle.read_count(), 0);

        h.expire_at(&contract, p(1_665_714_039));
        contract.resolve().unwrap();
        assert_eq!(contract.resolve(), Err(SettlementError::AlreadyResolved));
        assert_eq!(h.oracle.read_count(), 1);
    }

    #[test]
    fn oracle_outage_leaves_contract_funded() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        h.expire_at(&contract, p(1_665_714_039));
        h.oracle.fail_with("feed stale");
        let err = contract.resolve().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Oracle);
        assert_eq!(contract.lifecycle(), LifecycleState::Funded);

        h.oracle.recover();
        assert_eq!(contract.resolve().unwrap().winning_group, Some(GroupIndex(0)));
    }

    #[test]
    fn claim_before_resolution_marks_nobody() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();

        assert_eq!(contract.claim(AccountId(1)), Err(SettlementError::NoPrizeAvailable));
        assert!(!contract.has_claimed(AccountId(1)));

        h.expire_at(&contract, p(1_665_714_039));
        contract.resolve().unwrap();
        assert_eq!(contract.claim(AccountId(1)), Ok(amt(200)));
    }

    #[test]
    fn outsider_claim_rejected_and_marked() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();
        h.expire_at(&contract, p(1_665_714_039));
        contract.resolve().unwrap();

        assert_eq!(contract.claim(AccountId(42)), Err(SettlementError::NoPrizeAvailable));
        assert!(contract.has_claimed(AccountId(42)));
    }

    #[test]
    fn undercollateralized_rejected_unless_unchecked() {
        let groups = || vec![Group::new(vec![entry(1, 10, 500)]), Group::new(vec![entry(2, 10, 5)])];
        let h = Harness::new(None);

        let strict = OptionConfig::new(Timestamp::from_secs(600), groups(), ThresholdCondition::above(p(50)));
        assert!(matches!(
            h.build(strict),
            Err(SettlementError::InvalidConfig(ConfigError::Undercollateralized { .. }))
        ));

        let loose = OptionConfig::new(Timestamp::from_secs(600), groups(), ThresholdCondition::above(p(50)))
            .with_collateral_policy(CollateralPolicy::Unchecked);
        h.mint_and_approve(&loose);
        let contract = h.build(loose).unwrap();
        contract.fund().unwrap();
        h.expire_at(&contract, p(51));
        contract.resolve().unwrap();

        // escrow holds 20, prize is 500
        assert!(matches!(contract.claim(AccountId(1)), Err(SettlementError::Payout(_))));
        assert!(!contract.has_claimed(AccountId(1)));
    }

    #[test]
    fn audit_trail_follows_lifecycle() {
        let h = Harness::new(None);
        let config = price_limit_config();
        h.mint_and_approve(&config);
        let contract = h.build(config).unwrap();
        contract.fund().unwrap();
        h.expire_at(&contract, p(1_665_714_039));
        contract.resolve().unwrap();
        contract.claim(AccountId(1)).unwrap();

        let kinds: Vec<&'static str> = contract
            .events()
            .iter()
            .map(|e| match e.payload {
                EventPayload::ContractCreated(_) => "created",
                EventPayload::StakeEscrowed(_) => "escrowed",
                EventPayload::FundingRejected(_) => "rejected",
                EventPayload::Funded(_) => "funded",
                EventPayload::Resolved(_) => "resolved",
                EventPayload::PrizeClaimed(_) => "claimed",
                EventPayload::ClaimRejected(_) => "claim_rejected",
            })
            .collect();
        assert_eq!(kinds, vec!["created", "escrowed", "escrowed", "funded", "resolved", "claimed"]);

        let snapshot = contract.snapshot();
        assert_eq!(snapshot.lifecycle, LifecycleState::Resolved);
        assert_eq!(snapshot.settlement_price, Some(p(1_665_714_039)));
        assert_eq!(snapshot.claimed, vec![AccountId(1)]);
        assert_eq!(snapshot.paid_out, amt(200));
    }
}
