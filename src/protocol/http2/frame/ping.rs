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

use crate::protocol::{FramingError, ProtError, ProtResult};

use super::{Flag, FrameHeader, Kind, StreamIdentifier};

pub type Payload = [u8; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    ack: bool,
    payload: Payload,
}

impl Ping {
    pub fn new(payload: Payload) -> Ping {
        Ping {
            ack: false,
            payload,
        }
    }

    pub fn pong(payload: Payload) -> Ping {
        Ping { ack: true, payload }
    }

    pub fn is_ack(&self) -> bool {
        self.ack
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn parse(head: FrameHeader, payload: Bytes) -> ProtResult<Ping> {
        if !head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        if payload.len() != 8 {
            return Err(ProtError::malformed("ping payload must be 8 bytes"));
        }
        let mut buf = [0; 8];
        buf.copy_from_slice(&payload);
        Ok(Ping {
            ack: head.flag.is_ack(),
            payload: buf,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        let flag = Flag::zero().set_ack(self.ack);
        FrameHeader::new(Kind::Ping, flag, StreamIdentifier::zero()).encode(8, dst);
        dst.put_slice(&self.payload);
        8
    }
}
