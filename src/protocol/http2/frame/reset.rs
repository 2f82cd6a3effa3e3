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

use crate::protocol::{FramingError, ProtError, ProtResult};

use super::{Flag, FrameHeader, Kind, Reason, StreamIdentifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reset {
    stream_id: StreamIdentifier,
    reason: Reason,
}

impl Reset {
    pub fn new(stream_id: StreamIdentifier, reason: Reason) -> Self {
        Reset { stream_id, reason }
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        self.stream_id
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn parse(head: FrameHeader, mut payload: Bytes) -> ProtResult<Reset> {
        if head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        if payload.len() != 4 {
            return Err(ProtError::malformed("rst_stream payload must be 4 bytes"));
        }
        Ok(Reset {
            stream_id: head.stream_id,
            reason: Reason::from(payload.get_u32()),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        FrameHeader::new(Kind::Reset, Flag::zero(), self.stream_id).encode(4, dst);
        dst.put_u32(self.reason.into());
        4
    }
}
