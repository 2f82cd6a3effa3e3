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

use super::{get_u31_at, Flag, FrameHeader, Kind, Reason, StreamIdentifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAway {
    last_stream_id: StreamIdentifier,
    reason: Reason,
    debug_data: Bytes,
}

impl GoAway {
    pub fn new(last_stream_id: StreamIdentifier, reason: Reason) -> Self {
        GoAway {
            last_stream_id,
            reason,
            debug_data: Bytes::new(),
        }
    }

    pub fn with_debug_data(last_stream_id: StreamIdentifier, reason: Reason, debug_data: Bytes) -> Self {
        GoAway {
            last_stream_id,
            reason,
            debug_data,
        }
    }

    pub fn last_stream_id(&self) -> StreamIdentifier {
        self.last_stream_id
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn debug_data(&self) -> &Bytes {
        &self.debug_data
    }

    pub fn parse(head: FrameHeader, mut payload: Bytes) -> ProtResult<GoAway> {
        if !head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        if payload.len() < 8 {
            return Err(ProtError::malformed("goaway payload shorter than 8 bytes"));
        }
        let last_stream_id = StreamIdentifier::from(get_u31_at(&payload, 0));
        payload.advance(4);
        let reason = Reason::from(payload.get_u32());
        Ok(GoAway {
            last_stream_id,
            reason,
            debug_data: payload,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        let length = 8 + self.debug_data.len();
        FrameHeader::new(Kind::GoAway, Flag::zero(), StreamIdentifier::zero()).encode(length, dst);
        dst.put_u32(self.last_stream_id.value());
        dst.put_u32(self.reason.into());
        dst.put_slice(&self.debug_data);
        length
    }
}
