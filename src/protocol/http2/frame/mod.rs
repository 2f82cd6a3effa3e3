// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

mod data;
mod go_away;
mod head;
mod headers;
mod ping;
mod priority;
mod reason;
mod reset;
mod settings;
mod window_update;

use bytes::{Bytes, BytesMut};

pub use data::Data;
pub use go_away::GoAway;
pub use head::{
    get_bit, get_u16_at, get_u31_at, set_bit, set_u16_at, set_u31_at, Flag, FrameHeader, Kind,
    StreamIdentifier,
};
pub use headers::Headers;
pub use ping::Ping;
pub use priority::PriorityFrame;
pub use reason::Reason;
pub use reset::Reset;
pub use settings::{Setting, Settings};
pub use window_update::WindowUpdate;

use crate::protocol::ProtResult;

use super::hpack::{Decoder, Encoder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Data),
    Headers(Headers),
    Priority(PriorityFrame),
    Reset(Reset),
    Settings(Settings),
    Ping(Ping),
    GoAway(GoAway),
    WindowUpdate(WindowUpdate),
    /// 未知类型的帧, 仅保留帧头, 由上层忽略
    Unknown(FrameHeader),
}

impl Frame {
    /// 根据帧头解析负载, 头部块在这里解压
    pub fn parse(
        head: FrameHeader,
        payload: Bytes,
        decoder: &mut Decoder,
        use_huffman: bool,
    ) -> ProtResult<Frame> {
        let frame = match head.kind {
            Kind::Data => Frame::Data(Data::parse(head, payload)?),
            Kind::Headers => Frame::Headers(Headers::parse(head, payload, decoder, use_huffman)?),
            Kind::Priority => Frame::Priority(PriorityFrame::parse(head, payload)?),
            Kind::Reset => Frame::Reset(Reset::parse(head, payload)?),
            Kind::Settings => Frame::Settings(Settings::parse(head, payload)?),
            Kind::Ping => Frame::Ping(Ping::parse(head, payload)?),
            Kind::GoAway => Frame::GoAway(GoAway::parse(head, payload)?),
            Kind::WindowUpdate => Frame::WindowUpdate(WindowUpdate::parse(head, payload)?),
            Kind::Unknown(_) => Frame::Unknown(head),
        };
        Ok(frame)
    }

    /// 写入完整的帧, 返回负载的长度
    pub fn encode(
        &self,
        encoder: &mut Encoder,
        use_huffman: bool,
        max_frame_size: usize,
        dst: &mut BytesMut,
    ) -> ProtResult<usize> {
        let size = match self {
            Frame::Data(v) => v.encode(dst),
            Frame::Headers(v) => v.encode(encoder, use_huffman, max_frame_size, dst)?,
            Frame::Priority(v) => v.encode(dst),
            Frame::Reset(v) => v.encode(dst),
            Frame::Settings(v) => v.encode(dst),
            Frame::Ping(v) => v.encode(dst),
            Frame::GoAway(v) => v.encode(dst),
            Frame::WindowUpdate(v) => v.encode(dst),
            Frame::Unknown(_) => 0,
        };
        Ok(size)
    }

    pub fn stream_id(&self) -> StreamIdentifier {
        match self {
            Frame::Data(v) => v.stream_id(),
            Frame::Headers(v) => v.stream_id(),
            Frame::Priority(v) => v.stream_id(),
            Frame::Reset(v) => v.stream_id(),
            Frame::WindowUpdate(v) => v.stream_id(),
            Frame::Unknown(head) => head.stream_id,
            Frame::Settings(_) | Frame::Ping(_) | Frame::GoAway(_) => StreamIdentifier::zero(),
        }
    }

    pub fn is_fin(&self) -> bool {
        match self {
            Frame::Data(v) => v.is_fin(),
            Frame::Headers(v) => v.is_fin(),
            _ => false,
        }
    }

    pub fn is_go_away(&self) -> bool {
        matches!(self, Frame::GoAway(_))
    }

    /// 归属于某个流的帧, 关闭流时需要一并取消
    pub fn is_stream_frame(&self) -> bool {
        match self {
            Frame::Data(_) | Frame::Headers(_) | Frame::Priority(_) => true,
            // 关闭流控的通知需要跟在该流的HEADERS之后
            Frame::WindowUpdate(v) => v.is_end_flow_control() && !v.stream_id().is_zero(),
            _ => false,
        }
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Self {
        Frame::Data(src)
    }
}

impl From<Headers> for Frame {
    fn from(src: Headers) -> Self {
        Frame::Headers(src)
    }
}

impl From<Reset> for Frame {
    fn from(src: Reset) -> Self {
        Frame::Reset(src)
    }
}

impl From<Settings> for Frame {
    fn from(src: Settings) -> Self {
        Frame::Settings(src)
    }
}

impl From<Ping> for Frame {
    fn from(src: Ping) -> Self {
        Frame::Ping(src)
    }
}

impl From<GoAway> for Frame {
    fn from(src: GoAway) -> Self {
        Frame::GoAway(src)
    }
}

impl From<WindowUpdate> for Frame {
    fn from(src: WindowUpdate) -> Self {
        Frame::WindowUpdate(src)
    }
}
