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

use crate::protocol::{FramingError, ProtResult};

use super::{Flag, FrameHeader, Kind, StreamIdentifier};

#[derive(Clone, PartialEq, Eq)]
pub struct Data {
    stream_id: StreamIdentifier,
    flag: Flag,
    payload: Bytes,
}

impl Data {
    pub fn new(stream_id: StreamIdentifier, payload: Bytes) -> Self {
        Data {
            stream_id,
            flag: Flag::zero(),
            payload,
        }
    }

    pub fn parse(head: FrameHeader, payload: Bytes) -> ProtResult<Self> {
        if head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        Ok(Data {
            stream_id: head.stream_id,
            flag: head.flag,
            payload,
        })
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        self.stream_id
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn is_fin(&self) -> bool {
        self.flag.is_fin()
    }

    pub fn set_fin(&mut self, fin: bool) {
        self.flag = self.flag.set_fin(fin);
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn head(&self) -> FrameHeader {
        FrameHeader::new(Kind::Data, self.flag, self.stream_id)
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        self.head().encode(self.payload.len(), dst);
        dst.put_slice(&self.payload);
        self.payload.len()
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("stream_id", &self.stream_id)
            .field("flag", &self.flag)
            .field("len", &self.payload.len())
            .finish()
    }
}
