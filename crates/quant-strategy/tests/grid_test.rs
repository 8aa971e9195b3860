//! 그리드 전략 통합 테스트.
//!
//! 대역 60000~75000, 20레벨(간격 750) 설정에서 한 캔들이 여러 레벨을
//! 지날 때 레벨당 정확히 한 건씩, 문서화된 순서로 드레인되는지 검증.

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use quant_core::{Candle, Side};
use quant_strategy::{GridConfig, GridDecision};

fn config() -> GridConfig {
    GridConfig {
        budget: dec!(200),
        leverage: 1,
        highest: dec!(75000),
        lowest: dec!(60000),
        num_interval: 20,
        amount: dec!(0.003),
        step_ratio: dec!(0.001),
    }
}

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

/// 대역 첫 진입 캔들은 종가에 트리거를 맞추고 거래는 내지 않는다.
#[test]
fn initializes_band_around_first_close() {
    let mut grid = GridDecision::new(&config()).unwrap();
    let txs = grid.decide(at(0), &flat(dec!(65000)));
    assert!(txs.is_empty());
    assert_eq!(grid.band(), (Some(dec!(64500)), Some(dec!(66000))));
}

/// 음봉의 저가가 세 레벨을 지나면 매수 세 건이 위에서 아래 순서로 나온다.
#[test]
fn falling_candle_drains_one_buy_per_crossed_level() {
    let mut grid = GridDecision::new(&config()).unwrap();
    grid.decide(at(0), &flat(dec!(65000)));

    let falling = Candle::new(dec!(65000), dec!(65000), dec!(63000), dec!(63100)).unwrap();
    let txs = grid.decide(at(1), &falling);

    let prices: Vec<_> = txs.iter().map(|t| t.price).collect();
    assert_eq!(prices, vec![dec!(64500), dec!(63750), dec!(63000)]);
    assert!(txs.iter().all(|t| t.side == Side::Buy));

    // 드레인 후에도 buy < sell
    let (buy, sell) = grid.band();
    assert_eq!(buy, Some(dec!(62250)));
    assert_eq!(sell, Some(dec!(63750)));
    assert!(buy < sell);
}

/// 양봉이 양쪽 트리거를 모두 지나면 매수측이 먼저 비워진다.
#[test]
fn rising_candle_drains_buys_before_sells() {
    let mut grid = GridDecision::new(&config()).unwrap();
    grid.decide(at(0), &flat(dec!(65000)));

    let rising = Candle::new(dec!(64000), dec!(66300), dec!(64000), dec!(66200)).unwrap();
    let txs = grid.decide(at(1), &rising);

    let sides: Vec<_> = txs.iter().map(|t| t.side).collect();
    assert_eq!(sides, vec![Side::Buy, Side::Sell, Side::Sell]);
    assert_eq!(txs[0].price, dec!(64500));
    assert_eq!(txs[1].price, dec!(65250));
    assert_eq!(txs[2].price, dec!(66000));

    let (buy, sell) = grid.band();
    assert!(buy.unwrap() < sell.unwrap());
}

/// 음봉은 매도측을 먼저 비운다.
#[test]
fn falling_candle_drains_sells_before_buys() {
    let mut grid = GridDecision::new(&config()).unwrap();
    grid.decide(at(0), &flat(dec!(65000)));

    // 고가가 매도 트리거(66000)를, 저가가 매수 트리거(64500)를 모두 지나는 음봉
    let falling = Candle::new(dec!(66100), dec!(66100), dec!(64400), dec!(64450)).unwrap();
    let txs = grid.decide(at(1), &falling);

    assert_eq!(txs[0].side, Side::Sell);
    assert!(txs.iter().skip(1).any(|t| t.side == Side::Buy));
}
