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

use crate::protocol::{CompressionError, ProtError, ProtResult};

use super::huffman;

/// 前缀之后最多允许的续字节数, 5 * 7 位已覆盖32位
pub const MAX_CONTINUATION_BYTES: usize = 5;

const HUFFMAN_FLAG: u8 = 0x80;

/// 按N位前缀写入整数, flags为首字节中前缀以外的高位
///
/// 值小于 2^N-1 时直接存放在前缀中, 否则前缀全1, 余数按7位一组低位在前写入,
/// 除最后一组外都带有0x80的续位
pub fn encode_integer(value: usize, prefix_bits: u8, flags: u8, dst: &mut BytesMut) {
    debug_assert!(prefix_bits <= 8);
    let max_prefix = (1usize << prefix_bits) - 1;
    let flags = flags & !(max_prefix as u8);
    if value < max_prefix {
        dst.put_u8(flags | value as u8);
        return;
    }
    dst.put_u8(flags | max_prefix as u8);
    let mut rest = value - max_prefix;
    while rest >= 0x80 {
        dst.put_u8((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    dst.put_u8(rest as u8);
}

/// 读取N位前缀的整数, 首字节中前缀以外的位由调用方先行判断
pub fn decode_integer(src: &mut Bytes, prefix_bits: u8) -> ProtResult<usize> {
    debug_assert!(prefix_bits <= 8);
    if !src.has_remaining() {
        return Err(CompressionError::Truncated.into());
    }
    let max_prefix = (1usize << prefix_bits) - 1;
    let first = src.get_u8() as usize & max_prefix;
    if first < max_prefix {
        return Ok(first);
    }

    let mut value = max_prefix as u64;
    let mut shift = 0u32;
    for _ in 0..MAX_CONTINUATION_BYTES {
        if !src.has_remaining() {
            return Err(CompressionError::Truncated.into());
        }
        let b = src.get_u8();
        value += ((b & 0x7f) as u64) << shift;
        if value > u32::MAX as u64 {
            return Err(ProtError::IntegerOverflow);
        }
        if b & 0x80 == 0 {
            return Ok(value as usize);
        }
        shift += 7;
    }
    Err(ProtError::IntegerOverflow)
}

/// 写入字符串: H位 + 7位前缀的长度, 之后为原始字节或哈夫曼编码
pub fn encode_string(value: &[u8], use_huffman: bool, dst: &mut BytesMut) {
    if use_huffman {
        encode_integer(huffman::encoded_len(value), 7, HUFFMAN_FLAG, dst);
        huffman::encode(value, dst);
    } else {
        encode_integer(value.len(), 7, 0, dst);
        dst.put_slice(value);
    }
}

/// 读取字符串, 未开启哈夫曼时收到哈夫曼编码的字符串视为错误
pub fn decode_string(src: &mut Bytes, use_huffman: bool) -> ProtResult<Bytes> {
    if !src.has_remaining() {
        return Err(CompressionError::Truncated.into());
    }
    let is_huffman = src[0] & HUFFMAN_FLAG != 0;
    let len = decode_integer(src, 7)?;
    if src.remaining() < len {
        return Err(CompressionError::Truncated.into());
    }
    let raw = src.split_to(len);
    if !is_huffman {
        return Ok(raw);
    }
    if !use_huffman {
        return Err(CompressionError::Huffman("huffman literal not enabled").into());
    }
    Ok(Bytes::from(huffman::decode(&raw)?))
}
