// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use crate::protocol::{Consts, ProtError, ProtResult};

use super::{frame::WindowUpdate, ActiveStreams, StreamIdentifier};

/// 连接级与流级的窗口管理
///
/// 发送方向的窗口由对端的SETTINGS和WINDOW_UPDATE决定, 接收方向的窗口由本地配置决定.
/// 流级窗口保存在各自的InnerStream上, 这里只保存连接级的窗口.
#[derive(Debug)]
pub struct FlowControl {
    /// 连接级发送窗口
    window_size: i32,
    /// 连接级接收窗口
    recv_window: i32,
    recv_unacked: u32,
    /// 对端通告的流初始窗口
    initial_window_size: u32,
    /// 本地通告的流初始窗口
    local_window_size: u32,
    /// 对端是否校验本端发送的数据
    send_enabled: bool,
    /// 本端是否校验对端发送的数据
    recv_enabled: bool,
}

impl FlowControl {
    pub fn new(local_window_size: u32, enabled: bool) -> Self {
        FlowControl {
            window_size: Consts::DEFAULT_INITIAL_WINDOW_SIZE as i32,
            recv_window: Consts::DEFAULT_INITIAL_WINDOW_SIZE as i32,
            recv_unacked: 0,
            initial_window_size: Consts::DEFAULT_INITIAL_WINDOW_SIZE,
            local_window_size,
            send_enabled: enabled,
            recv_enabled: enabled,
        }
    }

    pub fn window_size(&self) -> i32 {
        self.window_size
    }

    pub fn recv_window(&self) -> i32 {
        self.recv_window
    }

    pub fn initial_window_size(&self) -> u32 {
        self.initial_window_size
    }

    pub fn local_window_size(&self) -> u32 {
        self.local_window_size
    }

    /// 对端声明关闭流控, 整个连接两个方向都不再按窗口限制
    pub fn disable(&mut self) {
        self.send_enabled = false;
        self.recv_enabled = false;
    }

    /// 预留最多count字节的发送额度, 同时扣减连接与流的窗口, 返回实际得到的额度
    pub fn reserve_for_send(
        &mut self,
        streams: &mut ActiveStreams,
        id: StreamIdentifier,
        count: usize,
    ) -> ProtResult<usize> {
        let stream = streams
            .get_mut(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        if !self.send_enabled {
            return Ok(count);
        }
        let mut granted = (count as i64).min(self.window_size.max(0) as i64);
        if stream.is_flow_controlled() {
            granted = granted.min(stream.send_window().max(0) as i64);
        }
        if granted <= 0 {
            return Ok(0);
        }
        self.window_size -= granted as i32;
        if stream.is_flow_controlled() {
            stream.set_send_window(stream.send_window() - granted as i32);
        }
        Ok(granted as usize)
    }

    /// 预留的额度未能使用时归还连接级窗口
    pub fn release(&mut self, streams: &mut ActiveStreams, id: StreamIdentifier, count: usize) {
        if !self.send_enabled || count == 0 {
            return;
        }
        self.window_size = self.window_size.saturating_add(count as i32);
        if let Some(stream) = streams.get_mut(&id) {
            if stream.is_flow_controlled() {
                stream.set_send_window(stream.send_window().saturating_add(count as i32));
            }
        }
    }

    /// 处理WINDOW_UPDATE, id为0时作用于连接
    pub fn on_window_update(
        &mut self,
        streams: &mut ActiveStreams,
        id: StreamIdentifier,
        increment: u32,
    ) -> ProtResult<()> {
        if id.is_zero() {
            self.window_size = Self::grow(self.window_size, increment, id)?;
            return Ok(());
        }
        // 已经关闭的流的窗口更新直接忽略
        if let Some(stream) = streams.get_mut(&id) {
            if stream.is_flow_controlled() {
                stream.set_send_window(Self::grow(stream.send_window(), increment, id)?);
            }
        }
        Ok(())
    }

    fn grow(window: i32, increment: u32, id: StreamIdentifier) -> ProtResult<i32> {
        let next = window as i64 + increment as i64;
        if next > Consts::MAX_WINDOW_SIZE as i64 {
            return Err(ProtError::WindowOverflow(id));
        }
        Ok(next as i32)
    }

    /// 该流之后只受连接级窗口的限制
    pub fn disable_stream_flow_control(
        &mut self,
        streams: &mut ActiveStreams,
        id: StreamIdentifier,
    ) -> ProtResult<()> {
        if streams.set_flow_controlled(&id, false) {
            Ok(())
        } else {
            Err(ProtError::StreamClosed(id))
        }
    }

    /// 对端修改了初始窗口, 所有受流控的流按差值调整, 结果可以为负
    pub fn set_initial_window_size(
        &mut self,
        streams: &mut ActiveStreams,
        size: u32,
    ) -> ProtResult<()> {
        if size > Consts::MAX_WINDOW_SIZE {
            return Err(ProtError::WindowOverflow(StreamIdentifier::zero()));
        }
        let delta = size as i64 - self.initial_window_size as i64;
        for stream in streams.flow_controlled_mut() {
            let next = stream.send_window() as i64 + delta;
            if next > Consts::MAX_WINDOW_SIZE as i64 {
                return Err(ProtError::WindowOverflow(stream.id()));
            }
            stream.set_send_window(next as i32);
        }
        self.initial_window_size = size;
        Ok(())
    }

    /// 收到DATA时扣减接收窗口, 返回需要发送的窗口更新
    ///
    /// 流已经不存在时只计入连接级窗口. 未归还的字节达到初始窗口的一半时归还.
    /// 连接级窗口固定以协议默认值为基准.
    pub fn on_data_received(
        &mut self,
        streams: &mut ActiveStreams,
        id: StreamIdentifier,
        len: usize,
    ) -> ProtResult<Vec<WindowUpdate>> {
        let mut updates = vec![];
        if !self.recv_enabled || len == 0 {
            return Ok(updates);
        }
        let len = len as i64;
        if len > self.recv_window as i64 {
            return Err(ProtError::FlowControl(StreamIdentifier::zero()));
        }
        self.recv_window -= len as i32;
        self.recv_unacked += len as u32;
        if self.recv_unacked >= Consts::DEFAULT_INITIAL_WINDOW_SIZE / 2 {
            updates.push(WindowUpdate::new(StreamIdentifier::zero(), self.recv_unacked));
            self.recv_window += self.recv_unacked as i32;
            self.recv_unacked = 0;
        }

        // 不受流控的流只计入连接级窗口
        if let Some(stream) = streams.get_mut(&id).filter(|s| s.is_flow_controlled()) {
            if len > stream.recv_window() as i64 {
                return Err(ProtError::FlowControl(id));
            }
            stream.set_recv_window(stream.recv_window() - len as i32);
            let unacked = stream.recv_unacked() + len as u32;
            let threshold = (self.local_window_size / 2).max(1);
            // 对端已经发送完毕的流无需再归还窗口
            if unacked >= threshold && !stream.is_recv_closed() {
                updates.push(WindowUpdate::new(id, unacked));
                stream.set_recv_window(stream.recv_window() + unacked as i32);
                stream.set_recv_unacked(0);
            } else {
                stream.set_recv_unacked(unacked);
            }
        }
        Ok(updates)
    }
}
