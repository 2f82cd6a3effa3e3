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

use super::{Flag, FrameHeader, Kind, StreamIdentifier};

const ENTRY_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    HeaderTableSize(u32),
    MaxConcurrentStreams(u32),
    InitialWindowSize(u32),
    MaxFrameSize(u32),
    /// 最低位为1表示发送方不再校验接收窗口
    FlowControlOptions(u32),
}

impl Setting {
    fn from_id(id: u16, val: u32) -> Option<Setting> {
        match id {
            1 => Some(Setting::HeaderTableSize(val)),
            3 => Some(Setting::MaxConcurrentStreams(val)),
            4 => Some(Setting::InitialWindowSize(val)),
            5 => Some(Setting::MaxFrameSize(val)),
            10 => Some(Setting::FlowControlOptions(val)),
            _ => None,
        }
    }

    fn encode(&self, dst: &mut BytesMut) {
        let (id, val) = match *self {
            Setting::HeaderTableSize(v) => (1u16, v),
            Setting::MaxConcurrentStreams(v) => (3, v),
            Setting::InitialWindowSize(v) => (4, v),
            Setting::MaxFrameSize(v) => (5, v),
            Setting::FlowControlOptions(v) => (10, v),
        };
        dst.put_u16(id);
        dst.put_u32(val);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    flag: Flag,
    header_table_size: Option<u32>,
    max_concurrent_streams: Option<u32>,
    initial_window_size: Option<u32>,
    max_frame_size: Option<u32>,
    flow_control_options: Option<u32>,
}

impl Settings {
    pub fn ack() -> Settings {
        Settings {
            flag: Flag::ack(),
            ..Settings::default()
        }
    }

    pub fn is_ack(&self) -> bool {
        self.flag.is_ack()
    }

    pub fn parse(head: FrameHeader, mut payload: Bytes) -> ProtResult<Settings> {
        if !head.stream_id.is_zero() {
            return Err(FramingError::InvalidStreamId(head.stream_id).into());
        }
        if head.flag.is_ack() {
            if !payload.is_empty() {
                return Err(ProtError::malformed("settings ack with payload"));
            }
            return Ok(Settings::ack());
        }
        if payload.len() % ENTRY_SIZE != 0 {
            return Err(ProtError::malformed("settings payload not a multiple of 6"));
        }
        let mut settings = Settings::default();
        while payload.has_remaining() {
            let id = payload.get_u16();
            let val = payload.get_u32();
            // 未知的设置项直接忽略
            if let Some(setting) = Setting::from_id(id, val) {
                settings.apply(setting);
            }
        }
        Ok(settings)
    }

    fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::HeaderTableSize(v) => self.header_table_size = Some(v),
            Setting::MaxConcurrentStreams(v) => self.max_concurrent_streams = Some(v),
            Setting::InitialWindowSize(v) => self.initial_window_size = Some(v),
            Setting::MaxFrameSize(v) => self.max_frame_size = Some(v),
            Setting::FlowControlOptions(v) => self.flow_control_options = Some(v),
        }
    }

    pub fn header_table_size(&self) -> Option<u32> {
        self.header_table_size
    }

    pub fn set_header_table_size(&mut self, size: Option<u32>) {
        self.header_table_size = size;
    }

    pub fn max_concurrent_streams(&self) -> Option<u32> {
        self.max_concurrent_streams
    }

    pub fn set_max_concurrent_streams(&mut self, max: Option<u32>) {
        self.max_concurrent_streams = max;
    }

    pub fn initial_window_size(&self) -> Option<u32> {
        self.initial_window_size
    }

    pub fn set_initial_window_size(&mut self, size: Option<u32>) {
        self.initial_window_size = size;
    }

    pub fn max_frame_size(&self) -> Option<u32> {
        self.max_frame_size
    }

    pub fn set_max_frame_size(&mut self, size: Option<u32>) {
        self.max_frame_size = size;
    }

    pub fn flow_control_options(&self) -> Option<u32> {
        self.flow_control_options
    }

    pub fn set_flow_control_options(&mut self, options: Option<u32>) {
        self.flow_control_options = options;
    }

    /// 对端是否关闭了接收窗口的校验
    pub fn is_flow_control_disabled(&self) -> bool {
        self.flow_control_options.map(|v| v & 1 == 1).unwrap_or(false)
    }

    fn entries(&self) -> Vec<Setting> {
        let mut entries = vec![];
        if let Some(v) = self.header_table_size {
            entries.push(Setting::HeaderTableSize(v));
        }
        if let Some(v) = self.max_concurrent_streams {
            entries.push(Setting::MaxConcurrentStreams(v));
        }
        if let Some(v) = self.initial_window_size {
            entries.push(Setting::InitialWindowSize(v));
        }
        if let Some(v) = self.max_frame_size {
            entries.push(Setting::MaxFrameSize(v));
        }
        if let Some(v) = self.flow_control_options {
            entries.push(Setting::FlowControlOptions(v));
        }
        entries
    }

    pub fn encode(&self, dst: &mut BytesMut) -> usize {
        let head = FrameHeader::new(Kind::Settings, self.flag, StreamIdentifier::zero());
        let entries = if self.is_ack() { vec![] } else { self.entries() };
        let length = entries.len() * ENTRY_SIZE;
        head.encode(length, dst);
        for e in entries {
            e.encode(dst);
        }
        length
    }
}
