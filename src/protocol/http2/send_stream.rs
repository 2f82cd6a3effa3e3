// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::protocol::{Initiator, ProtError, ProtResult};

use super::{hpack::HeaderField, Control, Priority, Reason, StreamIdentifier, StreamMessage};

/// 单个流的发送端句柄
///
/// 本地打开的流可以通过`recv`等待对端的完整响应,
/// 对端打开的流只用于写回响应.
#[derive(Debug)]
pub struct SendStream {
    stream_id: StreamIdentifier,
    control: Arc<Control>,
    receiver: Option<oneshot::Receiver<ProtResult<StreamMessage>>>,
}

impl SendStream {
    pub fn new(
        stream_id: StreamIdentifier,
        control: Arc<Control>,
        receiver: Option<oneshot::Receiver<ProtResult<StreamMessage>>>,
    ) -> Self {
        SendStream {
            stream_id,
            control,
            receiver,
        }
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        self.stream_id
    }

    pub fn send_headers(&self, fields: Vec<HeaderField>, end_stream: bool) -> ProtResult<()> {
        self.control.send_headers(self.stream_id, fields, end_stream)
    }

    /// 按窗口及对端的最大帧长切分数据, 窗口不足时等待窗口更新
    pub async fn send_data(&self, mut data: Bytes, end_stream: bool) -> ProtResult<()> {
        if data.is_empty() {
            if end_stream {
                return self.control.send_data(self.stream_id, data, true);
            }
            return Ok(());
        }
        while !data.is_empty() {
            // 先注册等待, 避免错过在预留与等待之间到达的窗口更新
            let notified = self.control.window_changed();
            let want = data.len().min(self.control.max_send_frame_size());
            let granted = self.control.reserve_for_send(self.stream_id, want)?;
            if granted == 0 {
                if self.control.is_closed() {
                    return Err(ProtError::StreamClosed(self.stream_id));
                }
                log::trace!("stream {} wait for window", self.stream_id);
                notified.await;
                continue;
            }
            let chunk = data.split_to(granted);
            let fin = end_stream && data.is_empty();
            self.control.send_data(self.stream_id, chunk, fin)?;
        }
        Ok(())
    }

    /// 发送完整的消息, 没有消息体时由HEADERS结束该流
    pub async fn send_message(&self, message: StreamMessage) -> ProtResult<()> {
        let StreamMessage { headers, body } = message;
        if body.is_empty() {
            return self.send_headers(headers, true);
        }
        self.send_headers(headers, false)?;
        self.send_data(body, true).await
    }

    /// 等待对端的完整消息, 只能等待一次
    pub async fn recv(&mut self) -> ProtResult<StreamMessage> {
        match self.receiver.take() {
            Some(receiver) => match receiver.await {
                Ok(result) => result,
                Err(_) => Err(ProtError::StreamClosed(self.stream_id)),
            },
            None => Err(ProtError::Extension("stream has no pending response")),
        }
    }

    pub fn reset(&self, reason: Reason) {
        self.control.reset_with(self.stream_id, reason, Initiator::User);
    }

    pub fn close(&self) {
        self.control.close_stream(self.stream_id);
    }

    pub fn disable_flow_control(&self) -> ProtResult<()> {
        self.control.disable_stream_flow_control(self.stream_id)
    }

    pub fn set_priority(&self, priority: Priority) -> ProtResult<()> {
        self.control.set_stream_priority(self.stream_id, priority)
    }
}
