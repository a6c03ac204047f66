//! 运动与云台方向

use rover_protocol::SERVO_CENTER_ANGLE;
use std::fmt;
use std::str::FromStr;

/// 默认行驶速度（0-4095）
pub const DEFAULT_SPEED: i32 = 2000;

/// 行驶方向
///
/// 文本解析（[`FromStr`]，大小写不敏感，`_` 等同 `-`）接受以下写法：
///
/// | 方向 | 写法 |
/// |------|------|
/// | `Forward` | `forward`, `fwd` |
/// | `Backward` | `backward`, `back`, `reverse` |
/// | `TurnLeft` | `left`, `turn-left` |
/// | `TurnRight` | `right`, `turn-right`, `spin` |
/// | `StrafeLeft` | `strafe-left` |
/// | `StrafeRight` | `strafe-right` |
/// | `Stop` | `stop` |
///
/// `spin` 来自语音指令（"原地转圈"），按原地右转执行。
/// 其他写法返回错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveDirection {
    Forward,
    Backward,
    /// 原地左转
    TurnLeft,
    /// 原地右转
    TurnRight,
    /// 左平移（仅麦克纳姆轮底盘有效）
    StrafeLeft,
    /// 右平移（仅麦克纳姆轮底盘有效）
    StrafeRight,
    Stop,
}

impl DriveDirection {
    /// 四轮速度 `(fl, bl, fr, br)`，未限幅
    pub fn wheels(self, speed: i32) -> (i32, i32, i32, i32) {
        let s = speed;
        match self {
            DriveDirection::Forward => (s, s, s, s),
            DriveDirection::Backward => (-s, -s, -s, -s),
            DriveDirection::TurnLeft => (-s, -s, s, s),
            DriveDirection::TurnRight => (s, s, -s, -s),
            DriveDirection::StrafeLeft => (-s, s, s, -s),
            DriveDirection::StrafeRight => (s, -s, -s, s),
            DriveDirection::Stop => (0, 0, 0, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveDirection::Forward => "forward",
            DriveDirection::Backward => "backward",
            DriveDirection::TurnLeft => "left",
            DriveDirection::TurnRight => "right",
            DriveDirection::StrafeLeft => "strafe-left",
            DriveDirection::StrafeRight => "strafe-right",
            DriveDirection::Stop => "stop",
        }
    }
}

impl fmt::Display for DriveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriveDirection {
    type Err = String;

    /// `spin` 是原地右转的别名
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "forward" | "fwd" => Ok(DriveDirection::Forward),
            "backward" | "back" | "reverse" => Ok(DriveDirection::Backward),
            "left" | "turn-left" => Ok(DriveDirection::TurnLeft),
            "right" | "turn-right" | "spin" => Ok(DriveDirection::TurnRight),
            "strafe-left" => Ok(DriveDirection::StrafeLeft),
            "strafe-right" => Ok(DriveDirection::StrafeRight),
            "stop" => Ok(DriveDirection::Stop),
            other => Err(format!("unknown drive direction: {}", other)),
        }
    }
}

/// 云台预设方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookDirection {
    Left,
    Right,
    #[default]
    Center,
    Up,
    Down,
}

impl LookDirection {
    /// 舵机角度 `(水平, 垂直)`
    pub fn angles(self) -> (u8, u8) {
        let c = SERVO_CENTER_ANGLE;
        match self {
            LookDirection::Left => (135, c),
            LookDirection::Right => (45, c),
            LookDirection::Center => (c, c),
            LookDirection::Up => (c, 45),
            LookDirection::Down => (c, 135),
        }
    }
}

impl FromStr for LookDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(LookDirection::Left),
            "right" => Ok(LookDirection::Right),
            "center" | "centre" => Ok(LookDirection::Center),
            "up" => Ok(LookDirection::Up),
            "down" => Ok(LookDirection::Down),
            other => Err(format!("unknown look direction: {}", other)),
        }
    }
}
