//! 전략 세션(커밋 래퍼) 통합 테스트.

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use quant_core::Candle;
use quant_strategy::{GridConfig, PeriodicConfig, Strategy, StrategyConfig};

fn at(step: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + step * 60, 0).unwrap()
}

fn flat(price: rust_decimal::Decimal) -> Candle {
    Candle {
        open: price,
        high: price,
        low: price,
        close: price,
    }
}

fn grid_config(budget: rust_decimal::Decimal, amount: rust_decimal::Decimal) -> StrategyConfig {
    StrategyConfig::GridTrading(GridConfig {
        budget,
        leverage: 1,
        highest: dec!(75000),
        lowest: dec!(60000),
        num_interval: 20,
        amount,
        step_ratio: dec!(0.001),
    })
}

/// 예산을 깨뜨리는 첫 거래에서 배치 전체가 중단된다.
#[test]
fn budget_guard_stops_batch_on_first_breach() {
    // 수량 1로 그리드를 돌리면 두 번째 매수에서 평가손이 예산 2000을 넘는다
    let config = grid_config(dec!(2000), dec!(1));
    let mut strategy = Strategy::from_config(&config).unwrap();

    strategy.on_candle(at(0), &flat(dec!(65000))).unwrap();
    let falling = Candle::new(dec!(65000), dec!(65000), dec!(63000), dec!(63000)).unwrap();
    let committed = strategy.on_candle(at(1), &falling).unwrap();

    // 제안은 3건(64500/63750/63000)이지만 커밋은 1건뿐
    assert_eq!(committed, 1);
    assert_eq!(strategy.snapshots().len(), 1);
    assert_eq!(strategy.flow().amount, dec!(1));
    assert_eq!(strategy.flow().average_price, dec!(64500));
}

/// 커밋마다 스냅샷이 하나씩 쌓이고 레버리지는 정확히 한 번 적용된다.
#[test]
fn commits_apply_leverage_once_and_snapshot_each_trade() {
    let config = StrategyConfig::Dca(PeriodicConfig {
        budget: dec!(10000),
        leverage: 3,
        time_interval: 120,
        amount_in_usd: dec!(100),
    });
    let mut strategy = Strategy::from_config(&config).unwrap();

    strategy.on_candle(at(0), &flat(dec!(50))).unwrap();
    // 간격(120초) 미달: 거래 없음
    strategy.on_candle(at(1), &flat(dec!(50))).unwrap();
    strategy.on_candle(at(2), &flat(dec!(50))).unwrap();

    assert_eq!(strategy.snapshots().len(), 2);
    let first = &strategy.snapshots()[0];
    let tx = first.transaction.unwrap();
    // 100 USD / 50 = 2, 레버리지 3배 → 6
    assert_eq!(tx.amount, dec!(6));
    assert_eq!(strategy.last_trade_time(), Some(at(2)));
}

/// 저장/복원 후 동일한 미래 캔들에 대해 동일한 결정을 재현한다.
#[test]
fn saved_state_reproduces_identical_decisions() {
    let config = StrategyConfig::Dca(PeriodicConfig {
        budget: dec!(10000),
        leverage: 2,
        time_interval: 180,
        amount_in_usd: dec!(90),
    });
    let mut original = Strategy::from_config(&config).unwrap();
    for step in 0..4 {
        original.on_candle(at(step), &flat(dec!(45))).unwrap();
    }

    let path = std::env::temp_dir().join("quant-strategy-state-test/state.json");
    original.save(&path).unwrap();
    let mut restored = Strategy::load(&path).unwrap();

    for step in 4..10 {
        let price = dec!(45) + rust_decimal::Decimal::from(step);
        original.on_candle(at(step), &flat(price)).unwrap();
        restored.on_candle(at(step), &flat(price)).unwrap();
    }

    assert_eq!(original.snapshots(), restored.snapshots());
    assert_eq!(original.flow(), restored.flow());

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

/// 구간 종료 스냅샷은 거래 없이 시세만 기록한다.
#[test]
fn record_mark_appends_priced_snapshot() {
    let config = grid_config(dec!(200), dec!(0.003));
    let mut strategy = Strategy::from_config(&config).unwrap();
    strategy.record_mark(at(0), dec!(64000));

    let last = strategy.snapshots().last().unwrap();
    assert!(last.transaction.is_none());
    assert_eq!(last.current_price, Some(dec!(64000)));
    assert_eq!(strategy.last_trade_time(), None);
}
