//! 出站指令编码
//!
//! 每条指令编码为一行文本：`NAME#arg1#arg2#...\n`。
//! 指令构造后不可变，编码后即丢弃。

use crate::constants::*;
use crate::{ProtocolError, parse_i64};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::str::FromStr;

/// 将电机速度限幅到 `[-MOTOR_LIMIT, MOTOR_LIMIT]`
///
/// 超出范围的输入被静默截断，不返回错误。
#[inline]
pub fn clamp_motor(value: i32) -> i32 {
    value.clamp(-MOTOR_LIMIT, MOTOR_LIMIT)
}

/// 将舵机角度限幅到 `[0, SERVO_MAX_ANGLE]`
#[inline]
pub fn clamp_angle(value: i32) -> u8 {
    value.clamp(0, SERVO_MAX_ANGLE as i32) as u8
}

/// 四轮速度（前左、后左、前右、后右）
///
/// 通过 [`MotorSpeeds::new`] 构造时每个分量独立限幅。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorSpeeds {
    pub front_left: i32,
    pub back_left: i32,
    pub front_right: i32,
    pub back_right: i32,
}

impl MotorSpeeds {
    /// 全零（停止）
    pub const STOP: Self = Self {
        front_left: 0,
        back_left: 0,
        front_right: 0,
        back_right: 0,
    };

    /// 创建四轮速度（自动限幅）
    pub fn new(front_left: i32, back_left: i32, front_right: i32, back_right: i32) -> Self {
        Self {
            front_left: clamp_motor(front_left),
            back_left: clamp_motor(back_left),
            front_right: clamp_motor(front_right),
            back_right: clamp_motor(back_right),
        }
    }

    /// 四轮相同速度
    pub fn uniform(speed: i32) -> Self {
        Self::new(speed, speed, speed, speed)
    }

    /// 按线路顺序返回 `[fl, bl, fr, br]`
    pub fn as_array(&self) -> [i32; 4] {
        [
            self.front_left,
            self.back_left,
            self.front_right,
            self.back_right,
        ]
    }

    /// 是否为停止指令
    pub fn is_stop(&self) -> bool {
        *self == Self::STOP
    }
}

/// 舵机通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ServoChannel {
    /// 水平（云台左右）
    Pan = 0,
    /// 垂直（云台俯仰）
    Tilt = 1,
}

/// LED 灯效模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LedMode {
    #[default]
    Off = 0,
    Manual = 1,
    Following = 2,
    Blink = 3,
    Breathe = 4,
    Rainbow = 5,
}

/// 指令参数（标量）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

/// 出站指令
///
/// # 示例
///
/// ```rust
/// use rover_protocol::Command;
///
/// let cmd = Command::motor(5000, -5000, 0, 4095);
/// assert_eq!(cmd.encode(), "CMD_MOTOR#4095#-4095#0#4095\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 四轮电机速度
    Motor(MotorSpeeds),
    /// 舵机角度
    Servo { channel: ServoChannel, angle: u8 },
    /// 请求超声波测距
    RequestDistance,
    /// 请求电池电压
    RequestPower,
    /// 请求光敏传感器读数
    RequestLight,
    /// 请求红外循迹读数
    RequestLine,
    /// 设置单个 LED 颜色（index 0 表示全部）
    Led { index: u8, r: u8, g: u8, b: u8 },
    /// 设置 LED 灯效模式
    LedMode(LedMode),
    /// 蜂鸣器开关
    Buzzer(bool),
    /// 在小车上播放音频文件（需要服务端音频扩展）
    Audio(String),
}

impl Command {
    /// 构建电机指令（四个分量独立限幅）
    pub fn motor(fl: i32, bl: i32, fr: i32, br: i32) -> Self {
        Command::Motor(MotorSpeeds::new(fl, bl, fr, br))
    }

    /// 构建停止指令
    pub fn stop() -> Self {
        Command::Motor(MotorSpeeds::STOP)
    }

    /// 构建舵机指令（角度限幅到 0-180）
    pub fn servo(channel: ServoChannel, angle: i32) -> Self {
        Command::Servo {
            channel,
            angle: clamp_angle(angle),
        }
    }

    /// 指令名称（第一个字段）
    pub fn name(&self) -> &'static str {
        match self {
            Command::Motor(_) => TAG_MOTOR,
            Command::Servo { .. } => TAG_SERVO,
            Command::RequestDistance => TAG_SONIC,
            Command::RequestPower => TAG_POWER,
            Command::RequestLight => TAG_LIGHT,
            Command::RequestLine => TAG_LINE,
            Command::Led { .. } => TAG_LED,
            Command::LedMode(_) => TAG_LED_MODE,
            Command::Buzzer(_) => TAG_BUZZER,
            Command::Audio(_) => TAG_AUDIO,
        }
    }

    /// 有序参数列表
    pub fn args(&self) -> Vec<Arg> {
        match self {
            Command::Motor(speeds) => speeds
                .as_array()
                .iter()
                .map(|&v| Arg::Int(v as i64))
                .collect(),
            Command::Servo { channel, angle } => {
                vec![Arg::Int(u8::from(*channel) as i64), Arg::Int(*angle as i64)]
            },
            Command::RequestDistance
            | Command::RequestPower
            | Command::RequestLight
            | Command::RequestLine => Vec::new(),
            Command::Led { index, r, g, b } => vec![
                Arg::Int(*index as i64),
                Arg::Int(*r as i64),
                Arg::Int(*g as i64),
                Arg::Int(*b as i64),
            ],
            Command::LedMode(mode) => vec![Arg::Int(u8::from(*mode) as i64)],
            Command::Buzzer(on) => vec![Arg::Int(if *on { 1 } else { 0 })],
            Command::Audio(clip) => vec![Arg::Str(clip.clone())],
        }
    }

    /// 编码为一行线路文本（包含结尾换行）
    pub fn encode(&self) -> String {
        let mut line = self.to_string();
        line.push(LINE_TERMINATOR);
        line
    }

    /// 从一行文本解码（允许带结尾换行/空白）
    ///
    /// 主要用于测试与模拟控制器；客户端自身只编码不解码出站指令。
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        line.parse()
    }
}

impl fmt::Display for Command {
    /// 不含换行的线路文本
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        for arg in self.args() {
            write!(f, "{}{}", FIELD_SEPARATOR, arg)?;
        }
        Ok(())
    }
}

/// 取第 `index` 个字段，不存在时返回字段不足错误
fn field<'a>(fields: &[&'a str], index: usize, expected: usize) -> Result<&'a str, ProtocolError> {
    fields.get(index).copied().ok_or(ProtocolError::TooFewFields {
        expected,
        actual: fields.len(),
    })
}

/// 解析 0-255 范围的整数字段
fn parse_u8(name: &'static str, value: &str) -> Result<u8, ProtocolError> {
    let v = parse_i64(name, value)?;
    u8::try_from(v).map_err(|_| ProtocolError::InvalidValue {
        field: name,
        value: v,
    })
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let name = fields[0];

        match name {
            TAG_MOTOR => {
                let mut values = [0i32; 4];
                for (i, slot) in values.iter_mut().enumerate() {
                    let v = parse_i64("motor", field(&fields, i + 1, 5)?)?;
                    if v.unsigned_abs() > MOTOR_LIMIT as u64 {
                        return Err(ProtocolError::InvalidValue {
                            field: "motor",
                            value: v,
                        });
                    }
                    *slot = v as i32;
                }
                Ok(Command::motor(values[0], values[1], values[2], values[3]))
            },
            TAG_SERVO => {
                let raw_channel = parse_u8("servo_channel", field(&fields, 1, 3)?)?;
                let channel = ServoChannel::try_from(raw_channel).map_err(|_| {
                    ProtocolError::InvalidValue {
                        field: "servo_channel",
                        value: raw_channel as i64,
                    }
                })?;
                let angle = parse_u8("servo_angle", field(&fields, 2, 3)?)?;
                if angle > SERVO_MAX_ANGLE {
                    return Err(ProtocolError::InvalidValue {
                        field: "servo_angle",
                        value: angle as i64,
                    });
                }
                Ok(Command::Servo { channel, angle })
            },
            TAG_SONIC => Ok(Command::RequestDistance),
            TAG_POWER => Ok(Command::RequestPower),
            TAG_LIGHT => Ok(Command::RequestLight),
            TAG_LINE => Ok(Command::RequestLine),
            TAG_LED => Ok(Command::Led {
                index: parse_u8("led_index", field(&fields, 1, 5)?)?,
                r: parse_u8("led_r", field(&fields, 2, 5)?)?,
                g: parse_u8("led_g", field(&fields, 3, 5)?)?,
                b: parse_u8("led_b", field(&fields, 4, 5)?)?,
            }),
            TAG_LED_MODE => {
                let raw = parse_u8("led_mode", field(&fields, 1, 2)?)?;
                LedMode::try_from(raw)
                    .map(Command::LedMode)
                    .map_err(|_| ProtocolError::InvalidValue {
                        field: "led_mode",
                        value: raw as i64,
                    })
            },
            TAG_BUZZER => match parse_i64("buzzer", field(&fields, 1, 2)?)? {
                0 => Ok(Command::Buzzer(false)),
                1 => Ok(Command::Buzzer(true)),
                v => Err(ProtocolError::InvalidValue {
                    field: "buzzer",
                    value: v,
                }),
            },
            TAG_AUDIO => Ok(Command::Audio(field(&fields, 1, 2)?.to_string())),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}
