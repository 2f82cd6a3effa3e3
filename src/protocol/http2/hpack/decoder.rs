// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use bytes::{Buf, Bytes};

use crate::protocol::{CompressionError, Consts, ProtResult};

use super::{
    integer::{decode_integer, decode_string},
    HeaderField, HeaderTable, Indexation, Representation,
};

/// 头部解压, 每个连接的接收方向一个, 只由读取任务使用
#[derive(Debug)]
pub struct Decoder {
    table: HeaderTable,
    /// 本地通告的表大小上限, 对端的更新指令不能超过
    max_allowed_size: usize,
}

impl Decoder {
    pub fn new(max_allowed_size: usize) -> Self {
        Decoder {
            table: HeaderTable::new(Consts::DEFAULT_HEADER_TABLE_SIZE),
            max_allowed_size,
        }
    }

    pub fn table(&self) -> &HeaderTable {
        &self.table
    }

    pub fn decompress(&mut self, data: &[u8], use_huffman: bool) -> ProtResult<Vec<HeaderField>> {
        let mut src = Bytes::copy_from_slice(data);
        self.decode(&mut src, use_huffman)
    }

    pub fn decode(&mut self, src: &mut Bytes, use_huffman: bool) -> ProtResult<Vec<HeaderField>> {
        let mut fields = vec![];
        while src.has_remaining() {
            let repr = Representation::load(src[0]);
            match repr {
                Representation::Indexed => {
                    let index = decode_integer(src, repr.prefix())?;
                    let (name, value) = self.table.get(index)?;
                    fields.push(HeaderField::with_indexation(name, value, Indexation::Indexed));
                }
                Representation::Incremental => {
                    let (name, value) = self.decode_literal(repr, src, use_huffman)?;
                    self.table.insert(name.clone(), value.clone());
                    fields.push(HeaderField::with_indexation(
                        name,
                        value,
                        Indexation::Incremental,
                    ));
                }
                Representation::NotIndexed => {
                    let (name, value) = self.decode_literal(repr, src, use_huffman)?;
                    fields.push(HeaderField::with_indexation(
                        name,
                        value,
                        Indexation::NotIndexed,
                    ));
                }
                Representation::Substitution => {
                    let index = decode_integer(src, repr.prefix())?;
                    if !self.table.is_dynamic_index(index) {
                        return Err(CompressionError::InvalidIndex(index).into());
                    }
                    let (name, _) = self.table.get(index)?;
                    let value = decode_string(src, use_huffman)?;
                    self.table.substitute(index, value.clone())?;
                    fields.push(HeaderField::with_indexation(
                        name,
                        value,
                        Indexation::Substitution,
                    ));
                }
                Representation::SizeUpdate => {
                    let size = decode_integer(src, repr.prefix())?;
                    if size > self.max_allowed_size {
                        return Err(CompressionError::TableSize(size).into());
                    }
                    self.table.set_max_size(size);
                }
            }
        }
        Ok(fields)
    }

    fn decode_literal(
        &self,
        repr: Representation,
        src: &mut Bytes,
        use_huffman: bool,
    ) -> ProtResult<(Bytes, Bytes)> {
        let index = decode_integer(src, repr.prefix())?;
        let name = if index == 0 {
            decode_string(src, use_huffman)?
        } else {
            self.table.get(index)?.0
        };
        let value = decode_string(src, use_huffman)?;
        Ok((name, value))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new(Consts::DEFAULT_HEADER_TABLE_SIZE)
    }
}
