//! KDJ 오실레이터 임계값 변형.
//!
//! 설정된 모든 간격의 KDJ가 동시에 하한 아래(매수) 또는 상한 위(매도)
//! 이고 K/D 교차 방향이 맞을 때 신호를 냅니다. 측별 쿨다운으로 최소
//! 스텝 간격 안의 재신호를 막고, 부호화된 연속 신호 카운터가 같은
//! 방향 연속 신호를 제한합니다. 연속 한도에 도달한 뒤 가격이 유리하게
//! `min_ratio` 이상 움직이면 포지션 전체를 강제 청산합니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quant_core::{Candle, Side, Transaction};
use quant_data::{IndicatorSeries, Kdj};

use crate::decision::SessionView;
use crate::error::StrategyError;

/// 오실레이터 전략 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillatorConfig {
    /// 운용 예산
    pub budget: Decimal,

    /// 레버리지
    #[serde(default = "default_leverage")]
    pub leverage: u32,

    /// 1회 거래 수량
    #[serde(default = "default_amount")]
    pub amount: Decimal,

    /// 과매도 하한 (이 아래에서 매수 신호)
    #[serde(default = "default_lower_bound")]
    pub lower_bound: f64,

    /// 과매수 상한 (이 위에서 매도 신호)
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,

    /// 같은 방향 재신호에 요구하는 최소 가격 변화율
    #[serde(default = "default_min_ratio")]
    pub min_ratio: Decimal,

    /// 사용할 KDJ 간격 목록 (분)
    #[serde(default = "default_kdj_intervals")]
    pub kdj_intervals: Vec<u32>,

    /// 같은 방향 연속 신호 한도
    #[serde(default = "default_max_run")]
    pub max_run: u32,

    /// 측별 재신호 쿨다운 (스텝)
    #[serde(default = "default_cooldown_steps")]
    pub cooldown_steps: u32,

    /// 지표 워밍업 동안 건너뛸 스텝 수
    #[serde(default = "default_cold_start")]
    pub cold_start: u32,
}

fn default_leverage() -> u32 {
    1
}

fn default_amount() -> Decimal {
    dec!(8)
}

fn default_lower_bound() -> f64 {
    20.0
}

fn default_upper_bound() -> f64 {
    80.0
}

fn default_min_ratio() -> Decimal {
    dec!(0.2)
}

fn default_kdj_intervals() -> Vec<u32> {
    vec![1]
}

fn default_max_run() -> u32 {
    5
}

fn default_cooldown_steps() -> u32 {
    5
}

fn default_cold_start() -> u32 {
    10
}

impl OscillatorConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.budget <= Decimal::ZERO || self.amount <= Decimal::ZERO {
            return Err(StrategyError::Config(
                "예산과 수량은 0보다 커야 합니다".into(),
            ));
        }
        if self.lower_bound >= self.upper_bound {
            return Err(StrategyError::Config(
                "과매도 하한은 과매수 상한보다 작아야 합니다".into(),
            ));
        }
        if self.kdj_intervals.is_empty() {
            return Err(StrategyError::Config(
                "KDJ 간격을 하나 이상 지정해야 합니다".into(),
            ));
        }
        if self.max_run == 0 {
            return Err(StrategyError::Config(
                "연속 신호 한도는 0보다 커야 합니다".into(),
            ));
        }
        Ok(())
    }
}

/// 오실레이터 변형 상태.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillatorDecision {
    amount: Decimal,
    lower_bound: f64,
    upper_bound: f64,
    min_ratio: Decimal,
    intervals: Vec<u32>,
    max_run: i32,
    cooldown_steps: u32,
    cold_start: u32,

    // 가변 상태
    /// 부호화 연속 신호 카운터 (+매수 / -매도)
    run_weight: i32,
    prev_action: Option<Side>,
    prev_buy_price: Decimal,
    prev_sell_price: Decimal,
    buy_cooldown: u32,
    sell_cooldown: u32,
    counter: u32,

    /// 간격(분) → 사전 계산 KDJ 시리즈. 상태 저장에서 제외되며
    /// 복원 후 [`OscillatorDecision::attach_indicators`]로 다시 주입합니다.
    #[serde(skip)]
    series: HashMap<u32, IndicatorSeries>,
}

impl OscillatorDecision {
    pub fn new(config: &OscillatorConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            amount: config.amount,
            lower_bound: config.lower_bound,
            upper_bound: config.upper_bound,
            min_ratio: config.min_ratio,
            intervals: config.kdj_intervals.clone(),
            max_run: config.max_run as i32,
            cooldown_steps: config.cooldown_steps,
            cold_start: config.cold_start,
            run_weight: 0,
            prev_action: None,
            prev_buy_price: Decimal::ZERO,
            prev_sell_price: Decimal::ZERO,
            // 첫 신호가 쿨다운에 막히지 않도록 가득 찬 상태로 시작
            buy_cooldown: config.cooldown_steps,
            sell_cooldown: config.cooldown_steps,
            counter: 0,
            series: HashMap::new(),
        })
    }

    /// 사전 계산된 KDJ 시리즈를 주입합니다.
    pub fn attach_indicators(&mut self, series: HashMap<u32, IndicatorSeries>) {
        self.series = series;
    }

    /// 필요한 간격 목록.
    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    fn buy_criteria(&self, kdjs: &[Kdj]) -> bool {
        kdjs.iter()
            .all(|kdj| kdj.k < self.lower_bound && kdj.d < self.lower_bound && kdj.k >= kdj.d)
    }

    fn sell_criteria(&self, kdjs: &[Kdj]) -> bool {
        kdjs.iter()
            .all(|kdj| kdj.k > self.upper_bound && kdj.d > self.upper_bound && kdj.k <= kdj.d)
    }

    fn diff_ratio(prev: Decimal, current: Decimal) -> Decimal {
        (prev - current).abs() / prev
    }

    pub fn decide(
        &mut self,
        view: &SessionView<'_>,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Result<Vec<Transaction>, StrategyError> {
        let result = self.decide_inner(view, time, candle);
        self.counter = self.counter.saturating_add(1);
        self.buy_cooldown = self.buy_cooldown.saturating_add(1);
        self.sell_cooldown = self.sell_cooldown.saturating_add(1);
        result
    }

    fn decide_inner(
        &mut self,
        view: &SessionView<'_>,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Result<Vec<Transaction>, StrategyError> {
        if self.counter < self.cold_start {
            return Ok(Vec::new());
        }

        let mut kdjs = Vec::with_capacity(self.intervals.len());
        for interval in &self.intervals {
            let series = self
                .series
                .get(interval)
                .ok_or(StrategyError::MissingIndicator {
                    interval: *interval,
                })?;
            kdjs.push(series.lookback(time)?);
        }

        let close = candle.close;
        let unwind_amount = view.flow.amount.abs() / Decimal::from(view.leverage);

        // 연속 한도 초과 후 가격이 유리하게 움직였으면 전량 청산
        if self.run_weight >= self.max_run
            && self.prev_buy_price > Decimal::ZERO
            && close > self.prev_buy_price * (Decimal::ONE + self.min_ratio)
            && unwind_amount > Decimal::ZERO
        {
            info!(%close, run_weight = self.run_weight, "매수 연속 한도 도달, 전량 매도 청산");
            self.run_weight = 0;
            self.prev_action = Some(Side::Sell);
            self.prev_sell_price = close;
            self.prev_buy_price = Decimal::ZERO;
            return Ok(vec![Transaction::new(Side::Sell, close, unwind_amount, time)]);
        }
        if self.run_weight <= -self.max_run
            && self.prev_sell_price > Decimal::ZERO
            && close < self.prev_sell_price * (Decimal::ONE - self.min_ratio)
            && unwind_amount > Decimal::ZERO
        {
            info!(%close, run_weight = self.run_weight, "매도 연속 한도 도달, 전량 매수 청산");
            self.run_weight = 0;
            self.prev_action = Some(Side::Buy);
            self.prev_buy_price = close;
            self.prev_sell_price = Decimal::ZERO;
            return Ok(vec![Transaction::new(Side::Buy, close, unwind_amount, time)]);
        }

        if self.buy_criteria(&kdjs) && self.buy_cooldown >= self.cooldown_steps {
            let blocked = (self.prev_action == Some(Side::Buy)
                && Self::diff_ratio(self.prev_buy_price, close) < self.min_ratio)
                || self.run_weight >= self.max_run;
            if !blocked {
                debug!(%close, "KDJ 매수 신호");
                self.prev_action = Some(Side::Buy);
                self.prev_buy_price = close;
                self.run_weight += 1;
                self.buy_cooldown = 0;
                return Ok(vec![Transaction::new(Side::Buy, close, self.amount, time)]);
            }
        } else if self.sell_criteria(&kdjs) && self.sell_cooldown >= self.cooldown_steps {
            let blocked = (self.prev_action == Some(Side::Sell)
                && Self::diff_ratio(self.prev_sell_price, close) < self.min_ratio)
                || self.run_weight <= -self.max_run;
            if !blocked {
                debug!(%close, "KDJ 매도 신호");
                self.prev_action = Some(Side::Sell);
                self.prev_sell_price = close;
                self.run_weight -= 1;
                self.sell_cooldown = 0;
                return Ok(vec![Transaction::new(Side::Sell, close, self.amount, time)]);
            }
        }

        Ok(Vec::new())
    }
}
