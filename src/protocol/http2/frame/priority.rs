// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::protocol::{http2::Priority, FramingError, ProtError, ProtResult};

use super::{Flag, FrameHeader, Kind, StreamIdentifier};

/// 修改流的优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFrame {
    stream_id: StreamIdentifier,
    priority: Priority,
}

impl PriorityFrame {
    pub fn new(stream_id: StreamIdentifier, priority: Priority) -> Self {
        PriorityFrame {
            stream_id,
            priority,
        }
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        self.stream_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn parse(head: FrameHeader, mut payload: Bytes) -> ProtResult<PriorityFrame> {
        if head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        if payload.len() != 4 {
            return Err(ProtError::malformed("priority payload must be 4 bytes"));
        }
        let band = payload.get_u32();
        let priority = u8::try_from(band)
            .ok()
            .and_then(Priority::new)
            .ok_or(ProtError::malformed("priority out of range"))?;
        Ok(PriorityFrame {
            stream_id: head.stream_id,
            priority,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        FrameHeader::new(Kind::Priority, Flag::zero(), self.stream_id).encode(4, dst);
        dst.put_u32(self.priority.band() as u32);
        4
    }
}
