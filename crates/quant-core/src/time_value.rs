//! 슬라이딩 윈도우 극값 추적기.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 시각이 붙은 스칼라 값. 값 기준으로 정렬되며 동률은 시각으로 구분됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    pub time: DateTime<Utc>,
    pub value: Decimal,
}

impl TimeValue {
    pub fn new(time: DateTime<Utc>, value: Decimal) -> Self {
        Self { time, value }
    }
}

/// 최근 N개 [`TimeValue`]의 고정 용량 윈도우.
///
/// FIFO 큐와 `(value, time)` 정렬 인덱스를 함께 유지하여
/// 현재 최소/최대를 준선형 시간에 조회합니다. 용량 초과 시 가장 오래된
/// 엔트리를 정렬 인덱스에서 먼저 제거한 뒤 큐에서 밀어냅니다.
#[derive(Debug, Clone)]
pub struct TimeValueWindow {
    capacity: usize,
    queue: VecDeque<TimeValue>,
    index: BTreeSet<(Decimal, DateTime<Utc>)>,
}

impl TimeValueWindow {
    /// 용량이 `capacity`(> 0)인 빈 윈도우를 만듭니다.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            capacity,
            queue: VecDeque::with_capacity(capacity),
            index: BTreeSet::new(),
        }
    }

    /// 엔트리를 추가합니다. 가득 찬 경우 가장 오래된 엔트리를 먼저
    /// 인덱스에서 제거한 뒤 밀어냅니다.
    pub fn push(&mut self, entry: TimeValue) {
        if self.queue.len() >= self.capacity {
            if let Some(oldest) = self.queue.pop_front() {
                self.index.remove(&(oldest.value, oldest.time));
            }
        }
        self.index.insert((entry.value, entry.time));
        self.queue.push_back(entry);
    }

    /// 현재 최소값 엔트리.
    pub fn min(&self) -> Option<TimeValue> {
        self.index
            .first()
            .map(|&(value, time)| TimeValue { time, value })
    }

    /// 현재 최대값 엔트리.
    pub fn max(&self) -> Option<TimeValue> {
        self.index
            .last()
            .map(|&(value, time)| TimeValue { time, value })
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
