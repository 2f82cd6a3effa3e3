// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use bytes::{Bytes, BytesMut};
use tokio::sync::oneshot;

use crate::protocol::{ProtError, ProtResult};

use super::{hpack::HeaderField, Priority, StreamIdentifier};

/// 一次完整的交换: 头部列表加上数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMessage {
    pub headers: Vec<HeaderField>,
    pub body: Bytes,
}

impl StreamMessage {
    pub fn new(headers: Vec<HeaderField>, body: Bytes) -> Self {
        StreamMessage { headers, body }
    }

    /// 按名字查找第一个匹配的值
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .find(|h| h.name == name.as_bytes())
            .map(|h| &h.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Open,
    /// 本地已发送Fin
    HalfClosedLocal,
    /// 对端已发送Fin
    HalfClosedRemote,
    Closed,
}

/// 连接内部的流状态, 由Control统一持有
#[derive(Debug)]
pub struct InnerStream {
    id: StreamIdentifier,
    state: StreamState,
    priority: Priority,
    send_window: i32,
    recv_window: i32,
    /// 已接收但未通过WINDOW_UPDATE归还的字节
    recv_unacked: u32,
    flow_controlled: bool,
    headers: Vec<HeaderField>,
    body: BytesMut,
    /// 本地发起的流通过此通道把对端的响应交给SendStream
    responder: Option<oneshot::Sender<ProtResult<StreamMessage>>>,
    delivered: bool,
}

impl InnerStream {
    pub fn new(id: StreamIdentifier, priority: Priority, send_window: u32, recv_window: u32) -> Self {
        InnerStream {
            id,
            state: StreamState::Idle,
            priority,
            send_window: send_window as i32,
            recv_window: recv_window as i32,
            recv_unacked: 0,
            flow_controlled: true,
            headers: vec![],
            body: BytesMut::new(),
            responder: None,
            delivered: false,
        }
    }

    pub fn id(&self) -> StreamIdentifier {
        self.id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn is_flow_controlled(&self) -> bool {
        self.flow_controlled
    }

    pub(crate) fn set_flow_controlled(&mut self, flow_controlled: bool) {
        self.flow_controlled = flow_controlled;
    }

    pub fn send_window(&self) -> i32 {
        self.send_window
    }

    pub(crate) fn set_send_window(&mut self, window: i32) {
        self.send_window = window;
    }

    pub fn recv_window(&self) -> i32 {
        self.recv_window
    }

    pub(crate) fn set_recv_window(&mut self, window: i32) {
        self.recv_window = window;
    }

    pub(crate) fn recv_unacked(&self) -> u32 {
        self.recv_unacked
    }

    pub(crate) fn set_recv_unacked(&mut self, unacked: u32) {
        self.recv_unacked = unacked;
    }

    pub fn set_responder(&mut self, responder: oneshot::Sender<ProtResult<StreamMessage>>) {
        self.responder = Some(responder);
    }

    pub fn can_send(&self) -> bool {
        matches!(
            self.state,
            StreamState::Idle | StreamState::Open | StreamState::HalfClosedRemote
        )
    }

    pub fn can_recv(&self) -> bool {
        matches!(
            self.state,
            StreamState::Idle | StreamState::Open | StreamState::HalfClosedLocal
        )
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// 对端的数据已经接收完毕
    pub fn is_recv_closed(&self) -> bool {
        matches!(
            self.state,
            StreamState::HalfClosedRemote | StreamState::Closed
        )
    }

    pub fn send_headers(&mut self, end_stream: bool) -> ProtResult<()> {
        if !self.can_send() {
            return Err(ProtError::StreamClosed(self.id));
        }
        if self.state == StreamState::Idle {
            self.state = StreamState::Open;
        }
        if end_stream {
            self.send_end_stream();
        }
        Ok(())
    }

    pub fn send_data(&mut self, end_stream: bool) -> ProtResult<()> {
        if !self.can_send() || self.state == StreamState::Idle {
            return Err(ProtError::StreamClosed(self.id));
        }
        if end_stream {
            self.send_end_stream();
        }
        Ok(())
    }

    fn send_end_stream(&mut self) {
        self.state = match self.state {
            StreamState::Idle | StreamState::Open => StreamState::HalfClosedLocal,
            StreamState::HalfClosedRemote => StreamState::Closed,
            s => s,
        };
    }

    pub fn recv_headers(&mut self, fields: Vec<HeaderField>, end_stream: bool) -> ProtResult<()> {
        if !self.can_recv() {
            return Err(ProtError::StreamClosed(self.id));
        }
        if self.state == StreamState::Idle {
            self.state = StreamState::Open;
        }
        self.headers.extend(fields);
        if end_stream {
            self.recv_end_stream();
        }
        Ok(())
    }

    pub fn recv_data(&mut self, payload: Bytes, end_stream: bool) -> ProtResult<()> {
        if !self.can_recv() || self.state == StreamState::Idle {
            return Err(ProtError::StreamClosed(self.id));
        }
        self.body.extend_from_slice(&payload);
        if end_stream {
            self.recv_end_stream();
        }
        Ok(())
    }

    fn recv_end_stream(&mut self) {
        self.state = match self.state {
            StreamState::Idle | StreamState::Open => StreamState::HalfClosedRemote,
            StreamState::HalfClosedLocal => StreamState::Closed,
            s => s,
        };
    }

    /// 任意状态都可以被重置
    pub fn reset(&mut self) {
        self.state = StreamState::Closed;
    }

    /// 对端发送完毕且尚未交付时取出收到的消息
    pub fn take_message(&mut self) -> Option<StreamMessage> {
        if self.delivered || !self.is_recv_closed() {
            return None;
        }
        self.delivered = true;
        Some(StreamMessage {
            headers: std::mem::take(&mut self.headers),
            body: self.body.split().freeze(),
        })
    }

    /// 把消息交给本地发起方, 返回false表示不是本地发起的流
    pub fn deliver(&mut self, message: StreamMessage) -> bool {
        match self.responder.take() {
            Some(sender) => {
                let _ = sender.send(Ok(message));
                true
            }
            None => false,
        }
    }

    /// 流异常结束, 通知仍在等待响应的发起方
    pub fn fail(&mut self, err: ProtError) {
        if let Some(sender) = self.responder.take() {
            let _ = sender.send(Err(err));
        }
    }
}
