// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

pub struct Consts;

impl Consts {
    /// 帧头固定长度 length(2) + type(1) + flags(1) + stream id(4)
    pub const FRAME_PREAMBLE_SIZE: usize = 8;
    pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;
    /// 长度字段只有16位
    pub const MAX_FRAME_SIZE: u32 = 65_535;

    pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65_535;
    pub const MAX_WINDOW_SIZE: u32 = 0x7FFF_FFFF;

    pub const DEFAULT_HEADER_TABLE_SIZE: usize = 4_096;
    pub const DEFAULT_MAX_CONCURRENT_STREAMS: u32 = 100;

    /// 客户端连接上后第一个发送的数据
    pub const CONNECTION_PREFACE: &'static [u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

    pub const HTTP2_PROTOCOL: &'static str = "HTTP-draft-04/2.0";
    pub const HTTP1_PROTOCOL: &'static str = "http/1.1";

    pub const DEFAULT_HANDSHAKE_SECS: u64 = 10;
    pub const DEFAULT_RESET_STREAM_SECS: u64 = 30;
    pub const DEFAULT_RESET_STREAM_MAX: usize = 10;
}
