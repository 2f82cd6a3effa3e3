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

use crate::protocol::{
    http2::{
        hpack::{Decoder, Encoder, HeaderField},
        Priority, Reason,
    },
    FramingError, Initiator, ProtError, ProtResult,
};

use super::{Flag, FrameHeader, Kind, StreamIdentifier};

/// 头部帧, 在内存中保存解压后的头部列表, 压缩在写入的时候进行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    stream_id: StreamIdentifier,
    flag: Flag,
    priority: Option<Priority>,
    fields: Vec<HeaderField>,
}

impl Headers {
    pub fn new(stream_id: StreamIdentifier, fields: Vec<HeaderField>) -> Self {
        Headers {
            stream_id,
            flag: Flag::zero().set_end_headers(true),
            priority: None,
            fields,
        }
    }

    /// 读取负载, 头部块立即交给解压器, 保证压缩状态与对端同步
    pub fn parse(
        head: FrameHeader,
        mut payload: Bytes,
        decoder: &mut Decoder,
        use_huffman: bool,
    ) -> ProtResult<Self> {
        if head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        let priority = if head.flag.has_priority() {
            if payload.len() < 4 {
                return Err(ProtError::malformed("headers priority truncated"));
            }
            let band = payload.get_u32();
            match u8::try_from(band).ok().and_then(Priority::new) {
                Some(p) => Some(p),
                None => return Err(ProtError::malformed("headers priority out of range")),
            }
        } else {
            None
        };
        let fields = decoder.decode(&mut payload, use_huffman)?;
        Ok(Headers {
            stream_id: head.stream_id,
            flag: head.flag,
            priority,
            fields,
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

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.priority = priority;
        self.flag = self.flag.set_priority(priority.is_some());
    }

    pub fn fields(&self) -> &Vec<HeaderField> {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<HeaderField> {
        self.fields
    }

    /// 头部块不支持拆分为多个帧, 超出对端的最大帧长时只重置该流
    ///
    /// 可能超长的头部块先在压缩表的副本上压缩, 失败时压缩表保持不变,
    /// 与对端的解压表依然一致.
    pub fn encode(
        &self,
        encoder: &mut Encoder,
        use_huffman: bool,
        max_frame_size: usize,
        dst: &mut BytesMut,
    ) -> ProtResult<usize> {
        let mut payload = BytesMut::new();
        if let Some(p) = &self.priority {
            payload.put_u32(p.band() as u32);
        }
        if payload.len() + Encoder::encoded_len_bound(&self.fields, use_huffman) <= max_frame_size
        {
            encoder.encode(&self.fields, use_huffman, &mut payload);
        } else {
            let mut trial = encoder.clone();
            trial.encode(&self.fields, use_huffman, &mut payload);
            if payload.len() > max_frame_size {
                log::debug!(
                    "stream {} header block {} exceeds max frame size {}",
                    self.stream_id,
                    payload.len(),
                    max_frame_size
                );
                return Err(ProtError::Reset(
                    self.stream_id,
                    Reason::FRAME_SIZE_ERROR,
                    Initiator::Library,
                ));
            }
            *encoder = trial;
        }
        let head = FrameHeader::new(Kind::Headers, self.flag, self.stream_id);
        head.encode(payload.len(), dst);
        dst.put_slice(&payload);
        Ok(payload.len())
    }
}
