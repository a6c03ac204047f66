//! TCP 通道
//!
//! 每个通道持有一条 `TcpStream`：主线程保留写端（或仅保留关闭句柄），
//! 接收线程持有 `try_clone` 得到的读端。
//! 关闭时先 `shutdown(Both)` 打断阻塞读，再带超时地 join 接收线程。

use crate::collision::CollisionConfig;
use crate::error::DriverError;
use crate::pipeline::{PipelineConfig, ResponseDispatcher, command_rx_loop, video_rx_loop};
use crate::state::RoverContext;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 等待接收线程退出时的轮询间隔
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// 建立 TCP 连接（仅连接阶段有超时）
///
/// 依次尝试主机名解析出的每个地址，返回第一个成功的连接。
/// 连接建立后读超时被清除（稳态读取无限期阻塞），并关闭 Nagle。
///
/// # 错误
/// - `DriverError::Connect`: 解析失败，或所有地址都连接失败/超时
pub fn connect_with_timeout(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<TcpStream, DriverError> {
    let addr = format!("{}:{}", host, port);
    let candidates = (host, port).to_socket_addrs().map_err(|source| DriverError::Connect {
        addr: addr.clone(),
        source,
    })?;

    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no addresses resolved");
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(None)?;
                stream.set_nodelay(true)?;
                debug!("Connected to {} ({})", addr, candidate);
                return Ok(stream);
            },
            Err(e) => {
                debug!("Connect attempt to {} failed: {}", candidate, e);
                last_err = e;
            },
        }
    }

    Err(DriverError::Connect {
        addr,
        source: last_err,
    })
}

/// 串行化的指令写端
///
/// 多个调用方线程与接收线程（碰撞急停）共享同一把锁；
/// 锁内只做 `write_all` + `flush`，从不与读取同时持有。
pub struct CommandWriter {
    inner: Mutex<Box<dyn Write + Send>>,
}

impl CommandWriter {
    pub fn new(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// 整行写入并刷新
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.write_all(line.as_bytes())?;
        inner.flush()
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter").finish_non_exhaustive()
    }
}

/// 关闭套接字并回收接收线程
fn close_and_join(
    name: &str,
    stream: &TcpStream,
    handle: Option<JoinHandle<()>>,
    join_timeout: Duration,
) {
    if let Err(e) = stream.shutdown(Shutdown::Both)
        && e.kind() != io::ErrorKind::NotConnected
    {
        debug!("{} channel shutdown: {}", name, e);
    }

    let Some(handle) = handle else {
        return;
    };

    // 超时后不再等待，线程被分离，进程退出时回收
    let deadline = Instant::now() + join_timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(
                "{} RX thread did not exit within {:?}, detaching",
                name, join_timeout
            );
            return;
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    if handle.join().is_err() {
        warn!("{} RX thread panicked", name);
    }
}

/// 指令通道
pub struct CommandChannel {
    stream: TcpStream,
    ctx: Arc<RoverContext>,
    rx_thread: Option<JoinHandle<()>>,
}

impl CommandChannel {
    /// 连接指令端口，并把写端安装到上下文中
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        ctx: Arc<RoverContext>,
    ) -> Result<Self, DriverError> {
        let stream = connect_with_timeout(host, port, timeout)?;
        ctx.attach_writer(CommandWriter::new(Box::new(stream.try_clone()?)));
        info!("Command channel connected to {}:{}", host, port);
        Ok(Self {
            stream,
            ctx,
            rx_thread: None,
        })
    }

    /// 启动接收线程
    pub fn start(
        &mut self,
        pipeline: PipelineConfig,
        collision: CollisionConfig,
        is_running: Arc<AtomicBool>,
    ) -> Result<(), DriverError> {
        let reader = self.stream.try_clone()?;
        let dispatcher = ResponseDispatcher::new(self.ctx.clone(), collision);
        let handle = thread::Builder::new()
            .name("rover-cmd-rx".into())
            .spawn(move || command_rx_loop(reader, dispatcher, pipeline, is_running))
            .map_err(|e| DriverError::IoThread(e.to_string()))?;
        self.rx_thread = Some(handle);
        Ok(())
    }

    /// 接收线程是否仍在运行
    pub fn is_receiving(&self) -> bool {
        self.rx_thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 关闭通道（移除写端、关闭套接字、回收线程）
    pub fn shutdown(mut self, join_timeout: Duration) {
        self.ctx.detach_writer();
        close_and_join("Command", &self.stream, self.rx_thread.take(), join_timeout);
    }
}

/// 视频通道
pub struct VideoChannel {
    stream: TcpStream,
    ctx: Arc<RoverContext>,
    rx_thread: Option<JoinHandle<()>>,
}

impl VideoChannel {
    /// 连接视频端口
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        ctx: Arc<RoverContext>,
    ) -> Result<Self, DriverError> {
        let stream = connect_with_timeout(host, port, timeout)?;
        info!("Video channel connected to {}:{}", host, port);
        Ok(Self {
            stream,
            ctx,
            rx_thread: None,
        })
    }

    /// 启动接收线程
    pub fn start(
        &mut self,
        pipeline: PipelineConfig,
        is_running: Arc<AtomicBool>,
    ) -> Result<(), DriverError> {
        let reader = self.stream.try_clone()?;
        let ctx = self.ctx.clone();
        let handle = thread::Builder::new()
            .name("rover-video-rx".into())
            .spawn(move || video_rx_loop(reader, ctx, pipeline, is_running))
            .map_err(|e| DriverError::IoThread(e.to_string()))?;
        self.rx_thread = Some(handle);
        Ok(())
    }

    pub fn is_receiving(&self) -> bool {
        self.rx_thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 关闭通道
    pub fn shutdown(mut self, join_timeout: Duration) {
        close_and_join("Video", &self.stream, self.rx_thread.take(), join_timeout);
    }
}
