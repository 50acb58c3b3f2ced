//! 실시간 폴링 스케줄.
//!
//! 스케줄 결정은 시계를 직접 읽지 않는 순수 함수입니다.
//! 호출자가 직전 폴링 이후 경과 시간을 넘기면 다음 행동을 돌려줍니다.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// 다음 행동.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// 지금 폴링
    PollNow,
    /// 주어진 시간만큼 대기 후 다시 결정
    Wait(Duration),
    /// 반복 횟수 도달
    Finished,
}

/// 고정 간격 폴링 스케줄러.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: Duration,
    max_iterations: Option<u64>,
    completed: u64,
}

impl PollScheduler {
    /// `max_iterations`가 `None`이면 무한 반복합니다.
    pub fn new(interval: Duration, max_iterations: Option<u64>) -> Self {
        Self {
            interval,
            max_iterations,
            completed: 0,
        }
    }

    /// 직전 폴링 이후 경과 시간으로 다음 행동을 결정합니다.
    ///
    /// `since_last`가 `None`이면 아직 폴링한 적이 없는 상태입니다.
    pub fn decide(&self, since_last: Option<Duration>) -> TickDecision {
        if self
            .max_iterations
            .is_some_and(|max| self.completed >= max)
        {
            return TickDecision::Finished;
        }

        match since_last {
            None => TickDecision::PollNow,
            Some(elapsed) if elapsed >= self.interval => TickDecision::PollNow,
            Some(elapsed) => TickDecision::Wait(self.interval - elapsed),
        }
    }

    /// 폴링 1회 완료 기록.
    pub fn record_poll(&mut self) {
        self.completed += 1;
    }

    /// 완료된 폴링 횟수.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// 폴링 간격.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// 벽시계에 고정된 단조 시계.
///
/// 시작 시점의 UTC 시각에 tokio 단조 시계의 경과 시간을 더하므로,
/// 시스템 시계가 조정되어도 기록 시각은 줄어들지 않습니다.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
}

impl MonotonicClock {
    /// 현재 시각을 기준으로 시작합니다.
    pub fn start() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// 주어진 UTC 시각을 기준으로 시작합니다.
    pub fn anchored_at(wall_origin: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
        }
    }

    /// 현재 UTC 시각 (단조 증가).
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_origin + elapsed
    }
}
