//! 测试辅助：把指令写端接到内存缓冲区

use crate::config::RoverConfig;
use crate::rover::Rover;
use rover_driver::{CommandWriter, ConnectionState};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

/// 不经过套接字的"已连接"客户端
pub(crate) fn wired_rover() -> (Rover, Capture) {
    let rover = Rover::new(RoverConfig::default());
    let capture = Capture::default();
    rover
        .context()
        .attach_writer(CommandWriter::new(Box::new(capture.clone())));
    rover.context().connection.set(ConnectionState::Connected);
    (rover, capture)
}
