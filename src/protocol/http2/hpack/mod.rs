// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

//! 头部压缩
//!
//! 头部块由以下几种表示组成, 以首字节的高位区分:
//!
//! ```text
//! 1xxxxxxx  Indexed       7位前缀编号
//! 01xxxxxx  Incremental   6位前缀名字编号(0为字面名字) + 值, 追加到动态表
//! 001xxxxx  SizeUpdate    5位前缀新的表大小
//! 0001xxxx  Substitution  4位前缀被替换的动态表编号 + 值
//! 0000xxxx  NotIndexed    4位前缀名字编号(0为字面名字) + 值
//! ```

mod decoder;
mod encoder;
pub mod huffman;
mod integer;
mod table;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use integer::{
    decode_integer, decode_string, encode_integer, encode_string, MAX_CONTINUATION_BYTES,
};
pub use table::{entry_size, HeaderField, HeaderTable, Indexation, ENTRY_OVERHEAD, STATIC_TABLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Representation {
    Indexed,
    Incremental,
    SizeUpdate,
    Substitution,
    NotIndexed,
}

impl Representation {
    pub fn load(byte: u8) -> Representation {
        if byte & 0x80 == 0x80 {
            Representation::Indexed
        } else if byte & 0xC0 == 0x40 {
            Representation::Incremental
        } else if byte & 0xE0 == 0x20 {
            Representation::SizeUpdate
        } else if byte & 0xF0 == 0x10 {
            Representation::Substitution
        } else {
            Representation::NotIndexed
        }
    }

    /// (前缀位数, 标志位)
    pub fn layout(&self) -> (u8, u8) {
        match self {
            Representation::Indexed => (7, 0x80),
            Representation::Incremental => (6, 0x40),
            Representation::SizeUpdate => (5, 0x20),
            Representation::Substitution => (4, 0x10),
            Representation::NotIndexed => (4, 0x00),
        }
    }

    pub fn prefix(&self) -> u8 {
        self.layout().0
    }
}
