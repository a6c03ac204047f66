//! 碰撞检测状态机
//!
//! 纯状态机，按顺序消费超声波距离读数：
//!
//! - **Impact（撞击）**：`last - new > delta_threshold`，距离骤降
//! - **Proximity（接近）**：`new < proximity_threshold` 且上一次读数不低于阈值（边沿触发）
//! - 以上两者还需满足冷却：`now - last_event > cooldown`
//! - **Stuck（卡住）**：连续 N 次读数都低于阈值且变化量小于容差
//!
//! 检测器本身不发送任何指令，急停由调用方（指令接收线程）负责。

use std::time::{Duration, Instant};

/// 碰撞检测参数
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionConfig {
    /// 撞击阈值：单次距离下降量（cm）
    pub delta_threshold_cm: f64,
    /// 接近阈值（cm）
    pub proximity_threshold_cm: f64,
    /// 两次事件之间的最小间隔
    pub cooldown: Duration,
    /// 卡住判定的距离上限（cm）
    pub stuck_threshold_cm: f64,
    /// 卡住判定的变化量容差（cm）
    pub stuck_tolerance_cm: f64,
    /// 卡住判定所需的连续读数次数（0 表示关闭）
    pub stuck_readings: u32,
    /// 检测到事件时是否自动急停
    pub stop_on_collision: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            delta_threshold_cm: 20.0,
            proximity_threshold_cm: 15.0,
            cooldown: Duration::from_secs(2),
            stuck_threshold_cm: 15.0,
            stuck_tolerance_cm: 2.0,
            stuck_readings: 5,
            stop_on_collision: true,
        }
    }
}

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    /// 距离骤降
    Impact,
    /// 跨越接近阈值
    Proximity,
    /// 长时间贴近障碍物且几乎不动
    Stuck,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionKind::Impact => "impact",
            CollisionKind::Proximity => "proximity",
            CollisionKind::Stuck => "stuck",
        }
    }
}

impl std::fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 碰撞事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    /// 触发事件的读数（cm）
    pub distance_cm: f64,
    /// 上一次读数（cm），首次读数为 `+inf`
    pub previous_cm: f64,
    /// 触发时刻
    pub at: Instant,
}

/// 检测器内部状态
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionState {
    /// 上一次读数，初始为 `+inf`
    pub last_distance: f64,
    /// 上一次撞击/接近事件的时刻，`None` 表示从未触发
    pub last_event_time: Option<Instant>,
    /// 连续"卡住"读数计数
    pub stuck_counter: u32,
}

impl Default for CollisionState {
    fn default() -> Self {
        Self {
            last_distance: f64::INFINITY,
            last_event_time: None,
            stuck_counter: 0,
        }
    }
}

/// 碰撞检测器
///
/// 由指令接收线程独占，不需要同步。
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    config: CollisionConfig,
    state: CollisionState,
}

impl CollisionDetector {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            state: CollisionState::default(),
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn state(&self) -> &CollisionState {
        &self.state
    }

    /// 恢复初始状态（重连后调用）
    pub fn reset(&mut self) {
        self.state = CollisionState::default();
    }

    /// 消费一次距离读数
    ///
    /// 每次调用最多产生一个事件。撞击与接近同时成立时归为 `Proximity`；
    /// 撞击/接近优先于卡住。
    ///
    /// # 参数
    /// - `distance_cm`: 新读数
    /// - `now`: 读数时刻（测试中可注入）
    pub fn observe(&mut self, distance_cm: f64, now: Instant) -> Option<CollisionEvent> {
        let cfg = &self.config;
        let last = self.state.last_distance;

        // 首个读数没有可比较的前值，不判定撞击
        let impact = last.is_finite() && last - distance_cm > cfg.delta_threshold_cm;
        let proximity =
            distance_cm < cfg.proximity_threshold_cm && last >= cfg.proximity_threshold_cm;

        let cooled = match self.state.last_event_time {
            Some(t) => now.saturating_duration_since(t) > cfg.cooldown,
            None => true,
        };

        let mut event = None;
        if (impact || proximity) && cooled {
            let kind = if proximity {
                CollisionKind::Proximity
            } else {
                CollisionKind::Impact
            };
            self.state.last_event_time = Some(now);
            event = Some(CollisionEvent {
                kind,
                distance_cm,
                previous_cm: last,
                at: now,
            });
        }

        // 本次已产生撞击/接近事件的读数不计入卡住；撞击清零计数，接近保持不变
        if let Some(fired) = &event {
            if fired.kind == CollisionKind::Impact {
                self.state.stuck_counter = 0;
            }
        } else if cfg.stuck_readings > 0 {
            let steady = last.is_finite() && (last - distance_cm).abs() < cfg.stuck_tolerance_cm;
            if distance_cm < cfg.stuck_threshold_cm && steady {
                self.state.stuck_counter += 1;
                if self.state.stuck_counter >= cfg.stuck_readings {
                    self.state.stuck_counter = 0;
                    event = Some(CollisionEvent {
                        kind: CollisionKind::Stuck,
                        distance_cm,
                        previous_cm: last,
                        at: now,
                    });
                }
            } else {
                self.state.stuck_counter = 0;
            }
        }

        self.state.last_distance = distance_cm;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(
        detector: &mut CollisionDetector,
        readings: &[f64],
        start: Instant,
    ) -> Vec<CollisionEvent> {
        readings
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| {
                detector.observe(d, start + Duration::from_millis(10 * i as u64))
            })
            .collect()
    }

    #[test]
    fn test_proximity_is_edge_triggered() {
        let mut detector = CollisionDetector::default();
        let events = feed(&mut detector, &[50.0, 48.0, 10.0, 9.0, 8.0], Instant::now());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CollisionKind::Proximity);
        assert_eq!(events[0].distance_cm, 10.0);
        assert_eq!(events[0].previous_cm, 48.0);
        assert_eq!(detector.state().last_distance, 8.0);
    }

    #[test]
    fn test_impact_on_sudden_drop() {
        let mut detector = CollisionDetector::default();
        let events = feed(&mut detector, &[100.0, 100.0, 70.0], Instant::now());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CollisionKind::Impact);
        assert_eq!(events[0].distance_cm, 70.0);
    }

    #[test]
    fn test_drop_of_exactly_threshold_does_not_fire() {
        let mut detector = CollisionDetector::default();
        assert!(feed(&mut detector, &[60.0, 40.0], Instant::now()).is_empty());
    }

    #[test]
    fn test_first_reading_never_impacts() {
        let mut detector = CollisionDetector::default();
        assert!(detector.observe(30.0, Instant::now()).is_none());
    }

    #[test]
    fn test_first_reading_below_threshold_is_proximity() {
        let mut detector = CollisionDetector::default();
        let event = detector.observe(5.0, Instant::now()).unwrap();
        assert_eq!(event.kind, CollisionKind::Proximity);
        assert!(event.previous_cm.is_infinite());
    }

    #[test]
    fn test_cooldown_suppresses_second_event() {
        let mut detector = CollisionDetector::default();
        let t0 = Instant::now();

        assert!(detector.observe(100.0, t0).is_none());
        assert!(detector.observe(70.0, t0 + Duration::from_millis(100)).is_some());
        assert!(detector.observe(100.0, t0 + Duration::from_millis(200)).is_none());
        // 1.5 s 后的第二次撞击被冷却抑制
        assert!(detector.observe(70.0, t0 + Duration::from_millis(1600)).is_none());
    }

    #[test]
    fn test_events_after_cooldown_both_fire() {
        let mut detector = CollisionDetector::default();
        let t0 = Instant::now();

        assert!(detector.observe(100.0, t0).is_none());
        assert!(detector.observe(70.0, t0 + Duration::from_millis(100)).is_some());
        assert!(detector.observe(100.0, t0 + Duration::from_millis(200)).is_none());
        assert!(detector.observe(70.0, t0 + Duration::from_millis(2200)).is_some());
    }

    #[test]
    fn test_stuck_after_consecutive_steady_readings() {
        let mut detector = CollisionDetector::new(CollisionConfig {
            cooldown: Duration::from_secs(60),
            ..Default::default()
        });
        let t0 = Instant::now();

        // 首次跨越阈值为 Proximity
        let first = feed(&mut detector, &[30.0, 10.0], t0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, CollisionKind::Proximity);

        let events = feed(&mut detector, &[10.5, 10.0, 10.8, 11.0, 10.2], t0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CollisionKind::Stuck);
        assert_eq!(detector.state().stuck_counter, 0);
    }

    #[test]
    fn test_proximity_reading_not_counted_as_stuck() {
        let mut detector = CollisionDetector::default();
        let t0 = Instant::now();
        let readings = [16.0, 14.0, 14.0, 14.0, 14.0, 14.0, 14.0, 14.0];

        let fired: Vec<(usize, CollisionKind)> = readings
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| {
                detector
                    .observe(d, t0 + Duration::from_millis(10 * i as u64))
                    .map(|e| (i, e.kind))
            })
            .collect();

        // 16 -> 14 跨越接近阈值；其后第 5 个稳定读数才判定卡住
        assert_eq!(
            fired,
            vec![(1, CollisionKind::Proximity), (6, CollisionKind::Stuck)]
        );
        assert_eq!(detector.state().stuck_counter, 1);
    }

    #[test]
    fn test_stuck_counter_resets_outside_band() {
        let mut detector = CollisionDetector::default();
        let t0 = Instant::now();

        feed(&mut detector, &[10.0, 10.5, 10.0], t0);
        assert_eq!(detector.state().stuck_counter, 2);

        // 变化量超过容差
        detector.observe(13.0, t0);
        assert_eq!(detector.state().stuck_counter, 0);

        feed(&mut detector, &[13.5, 13.0], t0);
        assert_eq!(detector.state().stuck_counter, 2);

        // 超出距离上限
        detector.observe(15.9, t0);
        assert_eq!(detector.state().stuck_counter, 0);
    }

    #[test]
    fn test_stuck_disabled() {
        let mut detector = CollisionDetector::new(CollisionConfig {
            stuck_readings: 0,
            ..Default::default()
        });
        let events = feed(&mut detector, &[10.0; 20], Instant::now());
        // 只有首次读数的 Proximity
        assert_eq!(events.len(), 1);
        assert_eq!(detector.state().stuck_counter, 0);
    }

    #[test]
    fn test_reset() {
        let mut detector = CollisionDetector::default();
        detector.observe(10.0, Instant::now());
        detector.reset();
        assert_eq!(detector.state(), &CollisionState::default());
    }
}
