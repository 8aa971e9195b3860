//! 순손익 이력의 낙폭/상승폭 통계.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use quant_core::{TimeValue, TimeValueWindow};

/// 슬라이딩 윈도우 기반 낙폭/상승폭 추적기.
///
/// 매 스텝 윈도우의 최대/최소를 비교해, 최대가 최소보다 시간상 먼저면
/// 낙폭(drop), 같거나 나중이면 상승폭(gain)으로 분류하고 각각의
/// 역대 최댓값을 유지합니다. 최대와 최소가 같은 시각이면 항상
/// 상승폭으로 분류합니다.
#[derive(Debug, Clone)]
pub struct SwingTracker {
    window: TimeValueWindow,
    max_drop: Decimal,
    max_gain: Decimal,
}

impl SwingTracker {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: TimeValueWindow::new(window_size),
            max_drop: Decimal::ZERO,
            max_gain: Decimal::ZERO,
        }
    }

    /// 한 스텝의 순손익을 관측합니다.
    pub fn observe(&mut self, time: DateTime<Utc>, value: Decimal) {
        self.window.push(TimeValue::new(time, value));

        if let (Some(min), Some(max)) = (self.window.min(), self.window.max()) {
            let spread = max.value - min.value;
            if max.time < min.time {
                self.max_drop = self.max_drop.max(spread);
            } else {
                self.max_gain = self.max_gain.max(spread);
            }
        }
    }

    /// 역대 최대 낙폭.
    pub fn max_drop(&self) -> Decimal {
        self.max_drop
    }

    /// 역대 최대 상승폭.
    pub fn max_gain(&self) -> Decimal {
        self.max_gain
    }
}
