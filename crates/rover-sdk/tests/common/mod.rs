//! 进程内模拟控制器
//!
//! 在 127.0.0.1 的随机端口上监听指令与视频两个端口，
//! 测试通过 `ControllerSession` 读取客户端发来的指令、推送遥测与视频帧。

#![allow(dead_code)]

use crossbeam_channel::{Receiver, unbounded};
use rover_sdk::RoverBuilder;
use rover_sdk::protocol::{Command, Response, encode_frame_len, encode_response};
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(3);

pub struct FakeController {
    pub command_port: u16,
    pub video_port: u16,
    command_conns: Receiver<TcpStream>,
    video_conns: Receiver<TcpStream>,
}

fn spawn_acceptor(listener: TcpListener) -> Receiver<TcpStream> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(s) => {
                    if tx.send(s).is_err() {
                        break;
                    }
                },
                Err(_) => break,
            }
        }
    });
    rx
}

impl FakeController {
    pub fn start() -> Self {
        let command = TcpListener::bind("127.0.0.1:0").unwrap();
        let video = TcpListener::bind("127.0.0.1:0").unwrap();
        Self {
            command_port: command.local_addr().unwrap().port(),
            video_port: video.local_addr().unwrap().port(),
            command_conns: spawn_acceptor(command),
            video_conns: spawn_acceptor(video),
        }
    }

    /// 只启动指令端口，视频端口无人监听
    pub fn start_without_video() -> Self {
        let closed_port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let mut ctrl = Self::start();
        ctrl.video_port = closed_port;
        ctrl
    }

    pub fn builder(&self) -> RoverBuilder {
        RoverBuilder::new()
            .host("127.0.0.1")
            .command_port(self.command_port)
            .video_port(self.video_port)
            .connect_timeout(Duration::from_secs(1))
    }

    /// 等待客户端的两条连接
    pub fn accept(&self) -> ControllerSession {
        let command = self.command_conns.recv_timeout(TIMEOUT).unwrap();
        let video = self.video_conns.recv_timeout(TIMEOUT).unwrap();
        ControllerSession::new(command, video)
    }

    /// 已建立但尚未被测试取走的连接数
    pub fn pending_connections(&self) -> usize {
        self.command_conns.len() + self.video_conns.len()
    }

    /// 等待指令连接（连接失败场景下视频端不会到达）
    pub fn accept_command(&self) -> TcpStream {
        self.command_conns.recv_timeout(TIMEOUT).unwrap()
    }
}

pub struct ControllerSession {
    command: TcpStream,
    reader: BufReader<TcpStream>,
    video: TcpStream,
}

impl ControllerSession {
    fn new(command: TcpStream, video: TcpStream) -> Self {
        command.set_read_timeout(Some(TIMEOUT)).unwrap();
        let reader = BufReader::new(command.try_clone().unwrap());
        Self {
            command,
            reader,
            video,
        }
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.command.write_all(bytes).unwrap();
        self.command.flush().unwrap();
    }

    pub fn send_response(&mut self, response: &Response) {
        let line = encode_response(response).unwrap();
        self.send_raw(line.as_bytes());
    }

    pub fn send_distance(&mut self, cm: f64) {
        self.send_response(&Response::Distance(cm));
    }

    pub fn send_frame(&mut self, payload: &[u8]) {
        self.video
            .write_all(&encode_frame_len(payload.len() as u32))
            .unwrap();
        self.video.write_all(payload).unwrap();
        self.video.flush().unwrap();
    }

    pub fn send_video_bytes(&mut self, bytes: &[u8]) {
        self.video.write_all(bytes).unwrap();
        self.video.flush().unwrap();
    }

    /// 读取客户端发来的下一行（超时或 EOF 返回 None）
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end().to_string()),
        }
    }

    pub fn read_command(&mut self) -> Command {
        let line = self.read_line().expect("expected a command line");
        Command::decode(&line).unwrap()
    }

    pub fn close_video(&self) {
        let _ = self.video.shutdown(Shutdown::Both);
    }

    pub fn close_command(&self) {
        let _ = self.command.shutdown(Shutdown::Both);
    }
}

/// 轮询直到条件成立或超时
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}
