// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

mod framed_read;
mod framed_write;

pub use framed_read::FramedRead;
pub use framed_write::FramedWrite;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder as CodecDecoder, Encoder as CodecEncoder};

use crate::protocol::{Consts, FramingError, ProtError, ProtResult};

use super::{
    frame::{Frame, FrameHeader},
    hpack::{Decoder, Encoder},
};

/// 帧的编解码, 读写两个方向各自持有一份
///
/// 读取方向持有头部解压的状态, 写入方向持有头部压缩的状态,
/// 头部块在读取时立即解压, 在写入时才压缩.
#[derive(Debug)]
pub struct FrameCodec {
    /// 本地接受的最大帧长
    max_frame_size: usize,
    /// 对端接受的最大帧长, 写入头部块时校验
    send_frame_size: usize,
    use_huffman: bool,
    decoder: Decoder,
    encoder: Encoder,
    /// 已读取帧头, 等待负载
    head: Option<FrameHeader>,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize, header_table_size: usize, use_huffman: bool) -> Self {
        FrameCodec {
            max_frame_size,
            send_frame_size: Consts::DEFAULT_MAX_FRAME_SIZE as usize,
            use_huffman,
            decoder: Decoder::new(header_table_size),
            encoder: Encoder::default(),
            head: None,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn send_frame_size(&self) -> usize {
        self.send_frame_size
    }

    pub fn set_send_frame_size(&mut self, send_frame_size: usize) {
        self.send_frame_size = send_frame_size;
    }

    pub fn set_encoder_table_size(&mut self, size: usize) {
        self.encoder.set_max_table_size(size);
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// 读取8字节帧头, 不足时返回None
    pub fn read_preamble(&mut self, src: &mut BytesMut) -> ProtResult<Option<FrameHeader>> {
        if src.len() < Consts::FRAME_PREAMBLE_SIZE {
            return Ok(None);
        }
        let head = FrameHeader::parse(&src[..Consts::FRAME_PREAMBLE_SIZE]);
        if head.length > self.max_frame_size {
            return Err(FramingError::TooLarge {
                length: head.length,
                max: self.max_frame_size,
            }
            .into());
        }
        src.advance(Consts::FRAME_PREAMBLE_SIZE);
        Ok(Some(head))
    }

    /// 读取帧头声明长度的负载, 不足时返回None
    pub fn read_payload(
        &mut self,
        head: FrameHeader,
        src: &mut BytesMut,
    ) -> ProtResult<Option<Frame>> {
        if src.len() < head.length {
            src.reserve(head.length - src.len());
            return Ok(None);
        }
        let payload = src.split_to(head.length).freeze();
        let frame = Frame::parse(head, payload, &mut self.decoder, self.use_huffman)?;
        Ok(Some(frame))
    }

    pub fn write(&mut self, frame: &Frame, dst: &mut BytesMut) -> ProtResult<usize> {
        frame.encode(&mut self.encoder, self.use_huffman, self.send_frame_size, dst)
    }
}

impl CodecDecoder for FrameCodec {
    type Item = Frame;
    type Error = ProtError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, ProtError> {
        let head = match self.head.take() {
            Some(head) => head,
            None => match self.read_preamble(src)? {
                Some(head) => head,
                None => return Ok(None),
            },
        };
        match self.read_payload(head, src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.head = Some(head);
                Ok(None)
            }
        }
    }

    /// 在帧的边界上结束不是错误
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, ProtError> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        match self.head.take() {
            Some(head) => Err(FramingError::Truncated {
                expected: head.length,
                read: buf.len(),
            }
            .into()),
            None if buf.is_empty() => Ok(None),
            None => Err(FramingError::Truncated {
                expected: Consts::FRAME_PREAMBLE_SIZE,
                read: buf.len(),
            }
            .into()),
        }
    }
}

impl CodecEncoder<Frame> for FrameCodec {
    type Error = ProtError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), ProtError> {
        self.write(&frame, dst)?;
        Ok(())
    }
}
