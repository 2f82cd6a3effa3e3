// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{ProtError, ProtResult};

use super::{get_u31_at, Flag, FrameHeader, Kind, StreamIdentifier};

/// 窗口更新, stream id 为0时作用于整个连接
///
/// 带有END_FLOW_CONTROL标志时表示该流(或连接)不再受流控, 增量被忽略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUpdate {
    stream_id: StreamIdentifier,
    increment: u32,
    end_flow_control: bool,
}

impl WindowUpdate {
    pub fn new(stream_id: StreamIdentifier, increment: u32) -> Self {
        WindowUpdate {
            stream_id,
            increment,
            end_flow_control: false,
        }
    }

    pub fn end_flow_control(stream_id: StreamIdentifier) -> Self {
        WindowUpdate {
            stream_id,
            increment: 0,
            end_flow_control: true,
        }
    }

    pub fn is_end_flow_control(&self) -> bool {
        self.end_flow_control
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        self.stream_id
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn parse(head: FrameHeader, payload: Bytes) -> ProtResult<WindowUpdate> {
        if payload.len() != 4 {
            return Err(ProtError::malformed("window update payload must be 4 bytes"));
        }
        Ok(WindowUpdate {
            stream_id: head.stream_id,
            increment: get_u31_at(&payload, 0),
            end_flow_control: head.flag.is_end_flow_control(),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        let flag = Flag::zero().set_end_flow_control(self.end_flow_control);
        FrameHeader::new(Kind::WindowUpdate, flag, self.stream_id).encode(4, dst);
        dst.put_u32(self.increment & StreamIdentifier::MAX);
        4
    }
}
