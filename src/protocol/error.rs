// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::{fmt::Display, io};

use bytes::Bytes;

use crate::protocol::http2::{Reason, StreamIdentifier};

pub type ProtResult<T> = Result<T, ProtError>;

/// 帧层面的错误, 均会导致连接关闭
#[derive(Debug)]
pub enum FramingError {
    /// 声明的长度超过了允许的最大帧长
    TooLarge { length: usize, max: usize },
    /// 数据流在帧的中间结束
    Truncated { expected: usize, read: usize },
    /// 负载不符合该帧类型的格式
    Malformed(&'static str),
    /// 帧指向了一个不合法的流id
    InvalidStreamId(StreamIdentifier),
}

#[derive(Debug)]
pub enum CompressionError {
    /// 索引为0或者超出了当前表的范围
    InvalidIndex(usize),
    /// 头部块在表示的中间结束
    Truncated,
    Huffman(&'static str),
    /// 动态表大小的更新超过了本地允许的上限
    TableSize(usize),
    Malformed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutError {
    Handshake(&'static str),
    Idle(&'static str),
}

#[derive(Debug)]
pub enum ProtError {
    /// 标准错误库的错误类型
    IoError(io::Error),
    Framing(FramingError),
    /// 头部压缩状态不同步, 连接无法继续
    CompressionState(CompressionError),
    /// 变长整数超过了32位
    IntegerOverflow,
    /// 窗口增长超过 2^31-1
    WindowOverflow(StreamIdentifier),
    /// 对端超出了本地的接收窗口
    FlowControl(StreamIdentifier),
    /// 该流已经关闭
    StreamClosed(StreamIdentifier),
    /// 该流被重置, 第二参数为原因
    Reset(StreamIdentifier, Reason, Initiator),
    /// 配置错误
    Config(String),
    Timeout(TimeoutError),
    /// 其它错误信息
    Extension(&'static str),

    /// 发生错误或者收到关闭消息将要关闭该链接
    GoAway(Bytes, Reason, Initiator),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Initiator {
    User,
    Library,
    Remote,
}

impl Display for FramingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingError::TooLarge { length, max } => {
                f.write_fmt(format_args!("frame length {} exceeds max {}", length, max))
            }
            FramingError::Truncated { expected, read } => f.write_fmt(format_args!(
                "stream ended mid-frame, expected {} bytes, read {}",
                expected, read
            )),
            FramingError::Malformed(s) => f.write_fmt(format_args!("malformed frame: {}", s)),
            FramingError::InvalidStreamId(id) => {
                f.write_fmt(format_args!("invalid stream id {}", id))
            }
        }
    }
}

impl Display for CompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionError::InvalidIndex(i) => {
                f.write_fmt(format_args!("header table index {} out of range", i))
            }
            CompressionError::Truncated => f.write_str("header block truncated"),
            CompressionError::Huffman(s) => f.write_fmt(format_args!("huffman: {}", s)),
            CompressionError::TableSize(s) => {
                f.write_fmt(format_args!("header table size update {} over limit", s))
            }
            CompressionError::Malformed(s) => f.write_fmt(format_args!("header block: {}", s)),
        }
    }
}

impl Display for ProtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtError::IoError(e) => f.write_fmt(format_args!("io error {}", e)),
            ProtError::Framing(e) => e.fmt(f),
            ProtError::CompressionState(e) => {
                f.write_fmt(format_args!("compression state error, {}", e))
            }
            ProtError::IntegerOverflow => f.write_str("integer overflow"),
            ProtError::WindowOverflow(id) => {
                f.write_fmt(format_args!("window overflow on stream {}", id))
            }
            ProtError::FlowControl(id) => {
                f.write_fmt(format_args!("flow control violated on stream {}", id))
            }
            ProtError::StreamClosed(id) => f.write_fmt(format_args!("stream {} closed", id)),
            ProtError::Reset(id, reason, _) => {
                f.write_fmt(format_args!("stream {} reset {:?}", id, reason))
            }
            ProtError::Config(s) => f.write_fmt(format_args!("config {}", s)),
            ProtError::Timeout(t) => f.write_fmt(format_args!("timeout {:?}", t)),
            ProtError::GoAway(_, reason, _) => {
                f.write_fmt(format_args!("go away frame {:?}", reason))
            }
            ProtError::Extension(s) => f.write_fmt(format_args!("extension {}", s)),
        }
    }
}

impl std::error::Error for ProtError {}

impl From<io::Error> for ProtError {
    fn from(value: io::Error) -> Self {
        ProtError::IoError(value)
    }
}

impl From<FramingError> for ProtError {
    fn from(value: FramingError) -> Self {
        ProtError::Framing(value)
    }
}

impl From<CompressionError> for ProtError {
    fn from(value: CompressionError) -> Self {
        ProtError::CompressionState(value)
    }
}

impl ProtError {
    pub(crate) fn library_go_away(reason: Reason) -> Self {
        Self::GoAway(Bytes::new(), reason, Initiator::Library)
    }

    pub(crate) fn malformed(s: &'static str) -> Self {
        Self::Framing(FramingError::Malformed(s))
    }

    /// 写入GOAWAY或者RST_STREAM时使用的原因
    pub fn reason(&self) -> Reason {
        match self {
            ProtError::Framing(FramingError::TooLarge { .. }) => Reason::FRAME_SIZE_ERROR,
            ProtError::Framing(_) => Reason::PROTOCOL_ERROR,
            ProtError::CompressionState(_) | ProtError::IntegerOverflow => {
                Reason::COMPRESSION_ERROR
            }
            ProtError::WindowOverflow(_) | ProtError::FlowControl(_) => Reason::FLOW_CONTROL_ERROR,
            ProtError::StreamClosed(_) => Reason::STREAM_CLOSED,
            ProtError::Reset(_, reason, _) | ProtError::GoAway(_, reason, _) => *reason,
            ProtError::Timeout(_) => Reason::NO_ERROR,
            _ => Reason::INTERNAL_ERROR,
        }
    }

    /// 只影响单个流的错误, 重置该流后连接继续
    pub fn is_stream_error(&self) -> bool {
        matches!(self, ProtError::StreamClosed(_) | ProtError::Reset(..))
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_stream_error()
    }

    pub fn is_remote_go_away(&self) -> bool {
        matches!(self, ProtError::GoAway(_, _, Initiator::Remote))
    }
}
