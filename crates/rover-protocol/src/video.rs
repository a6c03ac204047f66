//! 视频流帧解析
//!
//! 每帧由 4 字节小端长度前缀和紧随其后的 JPEG 数据组成。
//! 读取必须是"精确读取"：流在凑齐 N 字节之前结束时返回错误，
//! 绝不返回残缺帧。

use crate::ProtocolError;
use crate::constants::{DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};
use std::io::{ErrorKind, Read};

/// 解析帧头（小端 u32）
#[inline]
pub fn decode_frame_len(header: [u8; FRAME_HEADER_LEN]) -> u32 {
    u32::from_le_bytes(header)
}

/// 编码帧头（小端 u32）
#[inline]
pub fn encode_frame_len(len: u32) -> [u8; FRAME_HEADER_LEN] {
    len.to_le_bytes()
}

/// 精确读取 `buf.len()` 字节
///
/// # 返回
///
/// - `Ok(())`: 缓冲区已填满
/// - `Err(ProtocolError::Eof)`: 一个字节都没读到流就结束了（帧边界处的正常关闭）
/// - `Err(ProtocolError::ShortRead)`: 读到一部分后流结束
/// - `Err(ProtocolError::Io)`: 底层读错误
pub fn read_exact_or_eof<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), ProtocolError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(if filled == 0 {
                    ProtocolError::Eof
                } else {
                    ProtocolError::ShortRead {
                        expected: buf.len(),
                        actual: filled,
                    }
                });
            },
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::Io(e)),
        }
    }
    Ok(())
}

/// 长度前缀帧读取器
///
/// # 示例
///
/// ```rust
/// use rover_protocol::{FrameReader, encode_frame_len};
///
/// let mut stream = encode_frame_len(3).to_vec();
/// stream.extend_from_slice(b"abc");
///
/// let mut reader = FrameReader::new(stream.as_slice());
/// assert_eq!(reader.read_frame().unwrap(), b"abc");
/// assert!(reader.read_frame().is_err());
/// ```
pub struct FrameReader<R> {
    inner: R,
    max_frame_len: usize,
}

impl<R: Read> FrameReader<R> {
    /// 使用默认帧长上限创建读取器
    pub fn new(inner: R) -> Self {
        Self::with_max_frame_len(inner, DEFAULT_MAX_FRAME_LEN)
    }

    /// 指定帧长上限
    pub fn with_max_frame_len(inner: R, max_frame_len: usize) -> Self {
        Self {
            inner,
            max_frame_len,
        }
    }

    /// 读取下一帧
    ///
    /// 任何错误都意味着流已不可用，调用方应当停止读取。
    pub fn read_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        read_exact_or_eof(&mut self.inner, &mut header)?;

        let len = decode_frame_len(header) as usize;
        if len > self.max_frame_len {
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let mut payload = vec![0u8; len];
        match read_exact_or_eof(&mut self.inner, &mut payload) {
            Ok(()) => Ok(payload),
            // 帧头之后的 EOF 同样是残缺帧
            Err(ProtocolError::Eof) => Err(ProtocolError::ShortRead {
                expected: len,
                actual: 0,
            }),
            Err(e) => Err(e),
        }
    }

    /// 取回底层读取器
    pub fn into_inner(self) -> R {
        self.inner
    }
}
