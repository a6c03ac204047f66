//! 回调槽位（Hook System）
//!
//! 每类事件只有一个订阅者槽位：重新注册会**替换**旧回调，而不是追加。
//!
//! 回调在接收线程中同步执行，应当尽快返回；耗时工作请转发到
//! 其他线程（例如通过 `crossbeam_channel::Sender::try_send`）。
//!
//! # 使用示例
//!
//! ```rust
//! use rover_driver::hooks::HookManager;
//! use rover_driver::SensorSnapshot;
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! hooks.set_sensor_callback(Arc::new(|s: &SensorSnapshot| {
//!     println!("distance = {}", s.distance_cm);
//! }));
//! hooks.fire_sensor(&SensorSnapshot::default());
//! ```

use crate::collision::CollisionEvent;
use crate::state::{Frame, SensorSnapshot};
use rover_protocol::Response;
use std::sync::Arc;

/// 传感器更新回调（参数为更新后的完整快照）
pub trait SensorCallback: Send + Sync {
    fn on_sensor_update(&self, snapshot: &SensorSnapshot);
}

/// 碰撞事件回调
pub trait CollisionCallback: Send + Sync {
    fn on_collision(&self, event: &CollisionEvent);
}

/// 视频帧回调
pub trait FrameCallback: Send + Sync {
    fn on_frame(&self, frame: &Frame);
}

/// 通用响应回调（每条成功解码的行，包括未识别标签）
pub trait ResponseCallback: Send + Sync {
    fn on_response(&self, line: &str, response: &Response);
}

impl<F: Fn(&SensorSnapshot) + Send + Sync> SensorCallback for F {
    fn on_sensor_update(&self, snapshot: &SensorSnapshot) {
        self(snapshot)
    }
}

impl<F: Fn(&CollisionEvent) + Send + Sync> CollisionCallback for F {
    fn on_collision(&self, event: &CollisionEvent) {
        self(event)
    }
}

impl<F: Fn(&Frame) + Send + Sync> FrameCallback for F {
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

impl<F: Fn(&str, &Response) + Send + Sync> ResponseCallback for F {
    fn on_response(&self, line: &str, response: &Response) {
        self(line, response)
    }
}

/// 回调管理器
///
/// 本身不是线程安全的，需要外部同步（`RoverContext` 中为 `RwLock<HookManager>`）。
/// `fire_*` 方法只需要读锁。
#[derive(Default, Clone)]
pub struct HookManager {
    sensor: Option<Arc<dyn SensorCallback>>,
    collision: Option<Arc<dyn CollisionCallback>>,
    frame: Option<Arc<dyn FrameCallback>>,
    response: Option<Arc<dyn ResponseCallback>>,
}

impl HookManager {
    /// 创建空的回调管理器
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置传感器回调（替换旧回调）
    pub fn set_sensor_callback(&mut self, callback: Arc<dyn SensorCallback>) {
        self.sensor = Some(callback);
    }

    /// 设置碰撞回调（替换旧回调）
    pub fn set_collision_callback(&mut self, callback: Arc<dyn CollisionCallback>) {
        self.collision = Some(callback);
    }

    /// 设置视频帧回调（替换旧回调）
    pub fn set_frame_callback(&mut self, callback: Arc<dyn FrameCallback>) {
        self.frame = Some(callback);
    }

    /// 设置通用响应回调（替换旧回调）
    pub fn set_response_callback(&mut self, callback: Arc<dyn ResponseCallback>) {
        self.response = Some(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 触发传感器回调
    pub fn fire_sensor(&self, snapshot: &SensorSnapshot) {
        if let Some(cb) = &self.sensor {
            cb.on_sensor_update(snapshot);
        }
    }

    /// 触发碰撞回调
    pub fn fire_collision(&self, event: &CollisionEvent) {
        if let Some(cb) = &self.collision {
            cb.on_collision(event);
        }
    }

    /// 触发视频帧回调
    pub fn fire_frame(&self, frame: &Frame) {
        if let Some(cb) = &self.frame {
            cb.on_frame(frame);
        }
    }

    /// 触发通用响应回调
    pub fn fire_response(&self, line: &str, response: &Response) {
        if let Some(cb) = &self.response {
            cb.on_response(line, response);
        }
    }

    /// 已注册的回调数量
    pub fn len(&self) -> usize {
        [
            self.sensor.is_some(),
            self.collision.is_some(),
            self.frame.is_some(),
            self.response.is_some(),
        ]
        .iter()
        .filter(|&&set| set)
        .count()
    }

    /// 是否没有任何回调
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
