// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::protocol::Consts;

/// 设置字节中第index位(0为最低位), 其它位保持不变
pub fn set_bit(byte: u8, on: bool, index: u8) -> u8 {
    debug_assert!(index < 8);
    if on {
        byte | (1 << index)
    } else {
        byte & !(1 << index)
    }
}

pub fn get_bit(byte: u8, index: u8) -> bool {
    debug_assert!(index < 8);
    byte & (1 << index) != 0
}

pub fn get_u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub fn set_u16_at(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// 读取31位的值, 最高位为保留位, 读取时忽略
pub fn get_u31_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
        & StreamIdentifier::MAX
}

/// 写入31位的值, 保留位永远写0
pub fn set_u31_at(buf: &mut [u8], offset: usize, value: u32) {
    let value = value & StreamIdentifier::MAX;
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StreamIdentifier(u32);

impl StreamIdentifier {
    pub const MAX: u32 = 0x7FFF_FFFF;

    pub fn zero() -> Self {
        StreamIdentifier(0)
    }

    pub fn client_first() -> Self {
        StreamIdentifier(1)
    }

    pub fn server_first() -> Self {
        StreamIdentifier(2)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// 奇数为客户端发起
    pub fn is_client_initiated(&self) -> bool {
        self.0 % 2 == 1
    }

    pub fn is_server_initiated(&self) -> bool {
        self.0 != 0 && self.0 % 2 == 0
    }

    /// 返回当前可用的id, 并将自身向后移动两位
    pub fn next_id(&mut self) -> Option<StreamIdentifier> {
        if self.0 > Self::MAX - 2 {
            return None;
        }
        let id = *self;
        self.0 += 2;
        Some(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for StreamIdentifier {
    fn from(value: u32) -> Self {
        StreamIdentifier(value & Self::MAX)
    }
}

impl fmt::Debug for StreamIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("StreamIdentifier({})", self.0))
    }
}

impl fmt::Display for StreamIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Data,
    Headers,
    Priority,
    Reset,
    Settings,
    Ping,
    GoAway,
    WindowUpdate,
    Unknown(u8),
}

impl Kind {
    pub fn new(byte: u8) -> Kind {
        match byte {
            0 => Kind::Data,
            1 => Kind::Headers,
            2 => Kind::Priority,
            3 => Kind::Reset,
            4 => Kind::Settings,
            6 => Kind::Ping,
            7 => Kind::GoAway,
            9 => Kind::WindowUpdate,
            _ => Kind::Unknown(byte),
        }
    }

    pub fn encode(&self) -> u8 {
        match self {
            Kind::Data => 0,
            Kind::Headers => 1,
            Kind::Priority => 2,
            Kind::Reset => 3,
            Kind::Settings => 4,
            Kind::Ping => 6,
            Kind::GoAway => 7,
            Kind::WindowUpdate => 9,
            Kind::Unknown(byte) => *byte,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(u8);

impl Flag {
    const FIN_BIT: u8 = 0;
    /// WINDOW_UPDATE上与FIN共用第0位
    const END_FLOW_CONTROL_BIT: u8 = 0;
    const ACK_BIT: u8 = 1;
    const END_HEADERS_BIT: u8 = 2;
    const PRIORITY_BIT: u8 = 3;

    pub fn new(bits: u8) -> Flag {
        Flag(bits)
    }

    pub fn zero() -> Flag {
        Flag(0)
    }

    pub fn fin() -> Flag {
        Flag::zero().set_fin(true)
    }

    pub fn ack() -> Flag {
        Flag::zero().set_ack(true)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_fin(&self) -> bool {
        get_bit(self.0, Self::FIN_BIT)
    }

    pub fn set_fin(self, on: bool) -> Flag {
        Flag(set_bit(self.0, on, Self::FIN_BIT))
    }

    pub fn is_ack(&self) -> bool {
        get_bit(self.0, Self::ACK_BIT)
    }

    pub fn set_ack(self, on: bool) -> Flag {
        Flag(set_bit(self.0, on, Self::ACK_BIT))
    }

    pub fn is_end_flow_control(&self) -> bool {
        get_bit(self.0, Self::END_FLOW_CONTROL_BIT)
    }

    pub fn set_end_flow_control(self, on: bool) -> Flag {
        Flag(set_bit(self.0, on, Self::END_FLOW_CONTROL_BIT))
    }

    pub fn is_end_headers(&self) -> bool {
        get_bit(self.0, Self::END_HEADERS_BIT)
    }

    pub fn set_end_headers(self, on: bool) -> Flag {
        Flag(set_bit(self.0, on, Self::END_HEADERS_BIT))
    }

    pub fn has_priority(&self) -> bool {
        get_bit(self.0, Self::PRIORITY_BIT)
    }

    pub fn set_priority(self, on: bool) -> Flag {
        Flag(set_bit(self.0, on, Self::PRIORITY_BIT))
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Flag({:#04x})", self.0))
    }
}

/// 帧的前导8字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: usize,
    pub kind: Kind,
    pub flag: Flag,
    pub stream_id: StreamIdentifier,
}

impl FrameHeader {
    pub fn new(kind: Kind, flag: Flag, stream_id: StreamIdentifier) -> Self {
        FrameHeader {
            length: 0,
            kind,
            flag,
            stream_id,
        }
    }

    /// 调用方需保证至少有8字节
    pub fn parse(buf: &[u8]) -> FrameHeader {
        debug_assert!(buf.len() >= Consts::FRAME_PREAMBLE_SIZE);
        FrameHeader {
            length: get_u16_at(buf, 0) as usize,
            kind: Kind::new(buf[2]),
            flag: Flag::new(buf[3]),
            stream_id: StreamIdentifier::from(get_u31_at(buf, 4)),
        }
    }

    pub fn encode(&self, length: usize, dst: &mut BytesMut) {
        debug_assert!(length <= Consts::MAX_FRAME_SIZE as usize);
        let mut head = [0u8; Consts::FRAME_PREAMBLE_SIZE];
        set_u16_at(&mut head, 0, length as u16);
        head[2] = self.kind.encode();
        head[3] = self.flag.bits();
        set_u31_at(&mut head, 4, self.stream_id.value());
        dst.put_slice(&head);
    }
}
