//! 协议常量定义
//!
//! 集中定义所有协议相关的常量，避免在代码中散落"魔法数"。

/// 指令通道默认端口
pub const DEFAULT_COMMAND_PORT: u16 = 5000;

/// 视频通道默认端口
pub const DEFAULT_VIDEO_PORT: u16 = 8000;

/// 字段分隔符
pub const FIELD_SEPARATOR: char = '#';

/// 行结束符
pub const LINE_TERMINATOR: char = '\n';

/// 电机速度绝对值上限（PWM 占空比）
pub const MOTOR_LIMIT: i32 = 4095;

/// 舵机角度上限（度）
pub const SERVO_MAX_ANGLE: u8 = 180;

/// 舵机居中角度（度）
pub const SERVO_CENTER_ANGLE: u8 = 90;

/// 视频帧长度前缀字节数
pub const FRAME_HEADER_LEN: usize = 4;

/// 视频帧默认长度上限（8 MiB）
///
/// 超过此长度的帧头视为流已损坏。
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

// === 指令名称 ===

pub const TAG_MOTOR: &str = "CMD_MOTOR";
pub const TAG_SERVO: &str = "CMD_SERVO";
pub const TAG_SONIC: &str = "CMD_SONIC";
pub const TAG_POWER: &str = "CMD_POWER";
pub const TAG_LIGHT: &str = "CMD_LIGHT";
pub const TAG_LINE: &str = "CMD_LINE";
pub const TAG_LED: &str = "CMD_LED";
pub const TAG_LED_MODE: &str = "CMD_LED_MOD";
pub const TAG_BUZZER: &str = "CMD_BUZZER";
pub const TAG_AUDIO: &str = "CMD_AUDIO";

/// 遥测响应标签（带子 ID）
pub const TAG_MODE: &str = "CMD_MODE";

// === CMD_MODE 子 ID ===

/// 光敏传感器
pub const SUB_ID_LIGHT: &str = "2";
/// 超声波测距
pub const SUB_ID_ULTRASONIC: &str = "3";
/// 红外循迹
pub const SUB_ID_LINE: &str = "4";
