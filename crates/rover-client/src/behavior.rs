//! 组合动作：自主探索与巡逻
//!
//! 两者都阻塞调用线程，只由 `Rover` 的基础指令组合而成：
//! - 探索：测距 → 前方畅通则前进；遇到障碍则停车、左右扫描、转向空间更大的一侧
//! - 巡逻：按顺序执行一组定时行驶段
//!
//! 结束时都会发出停止指令。

use crate::error::Result;
use crate::rover::Rover;
use crate::types::{DEFAULT_SPEED, DriveDirection, LookDirection};
use rover_driver::SensorChannel;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 巡逻段之间的停顿
const PATROL_GAP: Duration = Duration::from_millis(100);

/// 巡逻航点：方向 + 持续时间
pub type Waypoint = (DriveDirection, Duration);

/// 默认巡逻路线：绕一个方形
pub fn default_patrol_route() -> Vec<Waypoint> {
    let side = (DriveDirection::Forward, Duration::from_millis(1500));
    let corner = (DriveDirection::TurnRight, Duration::from_millis(400));
    [side, corner].repeat(4)
}

/// 探索参数
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreConfig {
    /// 前方距离小于该值视为障碍（cm）
    pub obstacle_cm: f64,
    /// 前进速度
    pub cruise_speed: i32,
    /// 避障转向速度
    pub turn_speed: i32,
    /// 避障转向时长（为 0 时转向后不自动停止）
    pub turn_duration: Duration,
    /// 遇障停车后的等待
    pub settle: Duration,
    /// 云台转动后等待测距的时间
    pub look_settle: Duration,
    /// 每轮循环的间隔
    pub step: Duration,
    /// 单次测距等待读数的上限
    pub reading_timeout: Duration,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            obstacle_cm: 30.0,
            cruise_speed: 1500,
            turn_speed: 1500,
            turn_duration: Duration::from_millis(300),
            settle: Duration::from_millis(200),
            look_settle: Duration::from_millis(300),
            step: Duration::from_millis(100),
            reading_timeout: Duration::from_millis(200),
        }
    }
}

/// 探索结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExploreReport {
    /// 循环轮数
    pub steps: u32,
    /// 遇到障碍的次数
    pub obstacles: u32,
    pub left_turns: u32,
    pub right_turns: u32,
}

impl Rover {
    /// 请求一次测距并等待读数
    ///
    /// 等待期间到达的任何新读数都会结束等待（协议无请求/响应关联）。
    /// 超时后返回快照中上一次的距离；从未收到过测距时返回 `None`。
    pub fn measure_distance(&self, timeout: Duration) -> Result<Option<f64>> {
        let before = self.sensors().sequence;
        self.request_distance()?;
        let snapshot = self
            .wait_for_update(before, timeout)
            .unwrap_or_else(|| self.sensors());
        Ok(snapshot
            .has(SensorChannel::Distance)
            .then_some(snapshot.distance_cm))
    }

    /// 自主探索（默认参数）
    pub fn explore(&self, duration: Duration) -> Result<ExploreReport> {
        self.explore_with(duration, &ExploreConfig::default())
    }

    /// 自主探索 `duration` 时长
    ///
    /// 没有测距读数时按"前方有障碍"处理，左右扫描缺失的一侧按 0 cm 比较；
    /// 两侧相同时右转。
    pub fn explore_with(&self, duration: Duration, config: &ExploreConfig) -> Result<ExploreReport> {
        info!("Exploring for {:?}", duration);
        let start = Instant::now();
        let mut report = ExploreReport::default();

        while start.elapsed() < duration {
            report.steps += 1;
            let ahead = self.measure_distance(config.reading_timeout)?;

            if ahead.is_none_or(|d| d < config.obstacle_cm) {
                report.obstacles += 1;
                self.stop()?;
                spin_sleep::sleep(config.settle);

                let left = self.scan(LookDirection::Left, config)?;
                let right = self.scan(LookDirection::Right, config)?;
                self.look(LookDirection::Center)?;

                let turn = if left.unwrap_or(0.0) > right.unwrap_or(0.0) {
                    report.left_turns += 1;
                    DriveDirection::TurnLeft
                } else {
                    report.right_turns += 1;
                    DriveDirection::TurnRight
                };
                debug!(
                    "Obstacle ahead ({:?} cm), left {:?} cm, right {:?} cm, turning {}",
                    ahead, left, right, turn
                );
                self.drive_for(turn, config.turn_speed, config.turn_duration)?;
            } else {
                self.forward(config.cruise_speed)?;
            }

            spin_sleep::sleep(config.step);
        }

        self.stop()?;
        info!(
            "Exploration finished: {} steps, {} obstacles",
            report.steps, report.obstacles
        );
        Ok(report)
    }

    fn scan(&self, direction: LookDirection, config: &ExploreConfig) -> Result<Option<f64>> {
        self.look(direction)?;
        spin_sleep::sleep(config.look_settle);
        self.measure_distance(config.reading_timeout)
    }

    /// 按默认速度巡逻
    ///
    /// 默认路线见 [`default_patrol_route`]。
    pub fn patrol(&self, waypoints: &[Waypoint]) -> Result<()> {
        self.patrol_at(waypoints, DEFAULT_SPEED)
    }

    /// 依次执行航点，每段结束后停车并停顿片刻，最后再发一次停止
    ///
    /// `Stop` 航点表示原地停留对应时长。
    pub fn patrol_at(&self, waypoints: &[Waypoint], speed: i32) -> Result<()> {
        info!("Patrolling {} waypoints", waypoints.len());
        for (i, &(direction, duration)) in waypoints.iter().enumerate() {
            debug!("Waypoint {}: {} for {:?}", i, direction, duration);
            if direction == DriveDirection::Stop {
                self.stop()?;
                spin_sleep::sleep(duration);
            } else {
                self.drive(direction, speed)?;
                spin_sleep::sleep(duration);
                self.stop()?;
            }
            spin_sleep::sleep(PATROL_GAP);
        }
        self.stop()
    }
}
