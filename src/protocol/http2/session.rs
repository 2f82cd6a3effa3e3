// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_stream::StreamExt;
use tracing::Instrument;

use crate::protocol::{Initiator, ProtError, ProtResult, TimeoutError};

use super::{
    codec::{FrameCodec, FramedRead, FramedWrite},
    control::{ConnectionEnd, Dispatch},
    Builder, Control, Priority, Reason, SendStream, StateHandshake, StreamIdentifier,
    StreamMessage,
};

/// 连接关闭时等待写入任务写出GOAWAY的时间
const WRITER_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// 处理对端发起的流, 返回的消息作为响应写回该流,
/// 返回错误则以错误的原因重置该流
#[async_trait]
pub trait StreamHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        stream_id: StreamIdentifier,
        message: StreamMessage,
    ) -> ProtResult<StreamMessage>;
}

/// 拒绝所有对端发起的流, 适用于只发起请求的一端
pub struct RefuseHandler;

#[async_trait]
impl StreamHandler for RefuseHandler {
    async fn handle(
        &self,
        stream_id: StreamIdentifier,
        _message: StreamMessage,
    ) -> ProtResult<StreamMessage> {
        Err(ProtError::Reset(
            stream_id,
            Reason::REFUSED_STREAM,
            Initiator::Library,
        ))
    }
}

/// 一条多路复用的连接
///
/// `start`之后由当前任务负责读取, 另起一个任务负责按优先级写出,
/// 其它任务通过`control`打开或者关闭流.
pub struct Session<T> {
    io: Option<T>,
    control: Arc<Control>,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(io: T, end: ConnectionEnd, builder: Builder) -> Self {
        let control = Arc::new(Control::new(end, builder));
        // 握手后第一个写出的帧
        control.send_local_settings();
        Session {
            io: Some(io),
            control,
        }
    }

    pub fn control(&self) -> Arc<Control> {
        self.control.clone()
    }

    pub fn open_stream(&self, priority: Priority) -> ProtResult<SendStream> {
        self.control.open_stream(priority)
    }

    pub fn close_stream(&self, id: StreamIdentifier) {
        self.control.close_stream(id)
    }

    pub fn reset(&self, id: StreamIdentifier, reason: Reason) {
        self.control.reset_with(id, reason, Initiator::User)
    }

    pub fn go_away(&self, reason: Reason) {
        self.control.go_away(reason, Bytes::new());
        self.control.shutdown(reason);
    }

    /// 完成握手后处理该连接直到关闭
    pub async fn start<H>(mut self, handler: Arc<H>) -> ProtResult<()>
    where
        H: StreamHandler,
    {
        let io = self
            .io
            .take()
            .ok_or(ProtError::Extension("session already started"))?;
        let control = self.control.clone();
        let config = control.config().clone();
        let (mut reader, mut writer) = tokio::io::split(io);

        {
            let mut handshake = match control.end() {
                ConnectionEnd::Client => StateHandshake::new_client(),
                ConnectionEnd::Server => StateHandshake::new_server(),
            };
            let shake =
                futures::future::poll_fn(|cx| handshake.poll_handle(cx, &mut reader, &mut writer));
            match tokio::time::timeout(config.handshake_timeout, shake).await {
                Ok(result) => result?,
                Err(_) => {
                    control.shutdown(Reason::NO_ERROR);
                    return Err(ProtError::Timeout(TimeoutError::Handshake(
                        "connection preface",
                    )));
                }
            }
        }
        log::debug!("{:?} session handshake done", control.end());

        let codec = || {
            FrameCodec::new(
                config.max_frame_size as usize,
                config.header_table_size as usize,
                config.use_huffman,
            )
        };
        let mut framed_read = FramedRead::new(reader, codec());
        let framed_write = FramedWrite::new(writer, codec());

        let span = tracing::debug_span!("session_write", end = ?control.end());
        let mut writer_task =
            tokio::spawn(Self::write_loop(control.clone(), framed_write).instrument(span));

        let result = Self::read_loop(&control, &mut framed_read, &handler).await;
        let reason = match &result {
            Ok(()) => Reason::NO_ERROR,
            Err(e) => e.reason(),
        };
        match &result {
            Ok(()) | Err(ProtError::IoError(_)) => {}
            Err(e) if e.is_remote_go_away() => {}
            Err(e) => {
                log::warn!("session error {}, send go away {:?}", e, reason);
                control.go_away(reason, Bytes::new());
            }
        }
        control.shutdown(reason);

        match tokio::time::timeout(WRITER_CLOSE_TIMEOUT, &mut writer_task).await {
            Ok(Ok(Err(e))) => log::debug!("write loop finish with {}", e),
            Ok(_) => {}
            Err(_) => {
                log::warn!("write loop not finish in time, abort");
                writer_task.abort();
            }
        }

        match result {
            Err(e) if e.is_remote_go_away() && e.reason() == Reason::NO_ERROR => Ok(()),
            result => result,
        }
    }

    async fn read_loop<R, H>(
        control: &Arc<Control>,
        framed: &mut FramedRead<R>,
        handler: &Arc<H>,
    ) -> ProtResult<()>
    where
        R: AsyncRead + Unpin,
        H: StreamHandler,
    {
        loop {
            let next = match control.config().idle_timeout {
                Some(dur) => match tokio::time::timeout(dur, framed.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        return Err(ProtError::Timeout(TimeoutError::Idle(
                            "no frame received",
                        )))
                    }
                },
                None => framed.next().await,
            };
            let frame = match next {
                Some(frame) => frame?,
                None => {
                    log::debug!("peer closed the connection");
                    return Ok(());
                }
            };
            let frame_stream_id = frame.stream_id();
            match control.recv_frame(frame) {
                Ok(Dispatch::None) => {}
                Ok(Dispatch::Request(id, message)) => {
                    Self::spawn_handler(control, handler, id, message);
                }
                Ok(Dispatch::GoAway(goaway)) => {
                    return Err(ProtError::GoAway(
                        goaway.debug_data().clone(),
                        goaway.reason(),
                        Initiator::Remote,
                    ));
                }
                Err(e) if e.is_stream_error() => {
                    let id = match &e {
                        ProtError::StreamClosed(id) | ProtError::Reset(id, _, _) => *id,
                        _ => frame_stream_id,
                    };
                    log::debug!("stream {} error {}, reset", id, e);
                    control.reset(id, e.reason());
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn spawn_handler<H>(
        control: &Arc<Control>,
        handler: &Arc<H>,
        id: StreamIdentifier,
        message: StreamMessage,
    ) where
        H: StreamHandler,
    {
        let stream = control.response_stream(id);
        let control = control.clone();
        let handler = handler.clone();
        let span = tracing::debug_span!("stream_handler", id = %id);
        tokio::spawn(
            async move {
                match handler.handle(id, message).await {
                    Ok(response) => {
                        if let Err(e) = stream.send_message(response).await {
                            log::debug!("stream {} send response failed {}", id, e);
                            control.reset_active(id, e.reason(), Initiator::Library);
                        }
                    }
                    Err(e) => {
                        log::debug!("stream {} handle failed {}", id, e);
                        stream.reset(e.reason());
                    }
                }
            }
            .instrument(span),
        );
    }

    /// 唯一的写入任务, 队列空时刷新并等待
    async fn write_loop<W>(control: Arc<Control>, mut framed: FramedWrite<W>) -> ProtResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let result = Self::write_frames(&control, &mut framed).await;
        if let Err(e) = &result {
            log::debug!("write frame failed {}", e);
            control.shutdown(e.reason());
        }
        let _ = framed.shutdown().await;
        result
    }

    async fn write_frames<W>(control: &Arc<Control>, framed: &mut FramedWrite<W>) -> ProtResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        loop {
            let notified = control.queue_changed();
            loop {
                // 压缩表大小及对端帧长的变化必须在下一个头部块之前生效
                if let Some(size) = control.take_encoder_table_size() {
                    framed.codec_mut().set_encoder_table_size(size);
                }
                framed
                    .codec_mut()
                    .set_send_frame_size(control.max_send_frame_size());
                let frame = match control.dequeue() {
                    Some(frame) => frame,
                    None => break,
                };
                let is_go_away = frame.is_go_away();
                let stream_id = frame.stream_id();
                match framed.send_frame(frame).await {
                    Ok(()) => {}
                    // 单个帧无法写出时只重置所在的流
                    Err(e) if e.is_stream_error() => {
                        log::debug!("stream {} frame not written {}, reset", stream_id, e);
                        control.reset(stream_id, e.reason());
                        continue;
                    }
                    Err(e) => return Err(e),
                }
                if is_go_away {
                    framed.flush().await?;
                    return Ok(());
                }
            }
            framed.flush().await?;
            if control.is_closed() {
                return Ok(());
            }
            notified.await;
        }
    }
}
