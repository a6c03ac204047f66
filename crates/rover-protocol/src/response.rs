//! 入站响应行解析
//!
//! 控制器以 `TAG#...` 行的形式推送遥测数据：
//!
//! | 线路格式 | 含义 |
//! |----------|------|
//! | `CMD_MODE#3#<distance>` | 超声波测距（cm） |
//! | `CMD_MODE#2#<left>#<right>` | 光敏传感器 |
//! | `CMD_MODE#4#<l>#<c>#<r>` | 红外循迹 |
//! | `CMD_POWER#<voltage>` | 电池电压（V） |
//!
//! 协议没有请求 ID，响应只能通过标签关联，无法对应到具体请求。

use crate::constants::*;
use crate::{ProtocolError, parse_f64};

/// 已解码的入站响应
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    /// 超声波测距（cm）
    Distance(f64),
    /// 光敏传感器读数
    Light { left: f64, right: f64 },
    /// 红外循迹读数
    Line { left: f64, center: f64, right: f64 },
    /// 电池电压（V）
    Power(f64),
    /// 未识别的标签或子 ID（调用方应当忽略）
    Unrecognized,
}

impl Response {
    /// 是否为可忽略的未识别响应
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Response::Unrecognized)
    }
}

/// 解码一行响应
///
/// # 规则
///
/// - 分割后少于 2 个字段的行视为噪声，返回 `TooFewFields`
/// - 未知标签 / 未知子 ID 返回 `Ok(Response::Unrecognized)`
/// - 数值解析失败返回 `InvalidNumber`，调用方应静默丢弃该读数
/// - 多余的尾随字段被忽略
///
/// # 示例
///
/// ```rust
/// use rover_protocol::{Response, decode_response};
///
/// assert_eq!(decode_response("CMD_MODE#3#42.5").unwrap(), Response::Distance(42.5));
/// assert!(decode_response("CMD_FOO#1").unwrap().is_unrecognized());
/// assert!(decode_response("garbage").is_err());
/// ```
pub fn decode_response(line: &str) -> Result<Response, ProtocolError> {
    let line = line.trim();
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < 2 {
        return Err(ProtocolError::TooFewFields {
            expected: 2,
            actual: fields.len(),
        });
    }

    let require = |n: usize| -> Result<(), ProtocolError> {
        if fields.len() < n {
            Err(ProtocolError::TooFewFields {
                expected: n,
                actual: fields.len(),
            })
        } else {
            Ok(())
        }
    };

    match fields[0] {
        TAG_MODE => match fields[1] {
            SUB_ID_ULTRASONIC => {
                require(3)?;
                Ok(Response::Distance(parse_f64("distance", fields[2])?))
            },
            SUB_ID_LIGHT => {
                require(4)?;
                Ok(Response::Light {
                    left: parse_f64("light_left", fields[2])?,
                    right: parse_f64("light_right", fields[3])?,
                })
            },
            SUB_ID_LINE => {
                require(5)?;
                Ok(Response::Line {
                    left: parse_f64("ir_left", fields[2])?,
                    center: parse_f64("ir_center", fields[3])?,
                    right: parse_f64("ir_right", fields[4])?,
                })
            },
            _ => Ok(Response::Unrecognized),
        },
        TAG_POWER => Ok(Response::Power(parse_f64("battery", fields[1])?)),
        _ => Ok(Response::Unrecognized),
    }
}

/// 将响应编码为一行（用于模拟控制器与测试）
pub fn encode_response(response: &Response) -> Option<String> {
    let sep = FIELD_SEPARATOR;
    let line = match response {
        Response::Distance(d) => format!("{TAG_MODE}{sep}{SUB_ID_ULTRASONIC}{sep}{d}"),
        Response::Light { left, right } => {
            format!("{TAG_MODE}{sep}{SUB_ID_LIGHT}{sep}{left}{sep}{right}")
        },
        Response::Line {
            left,
            center,
            right,
        } => format!("{TAG_MODE}{sep}{SUB_ID_LINE}{sep}{left}{sep}{center}{sep}{right}"),
        Response::Power(v) => format!("{TAG_POWER}{sep}{v}"),
        Response::Unrecognized => return None,
    };
    Some(line + "\n")
}
