// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use bytes::{Bytes, BytesMut};

use super::{
    integer::{encode_integer, encode_string},
    HeaderField, HeaderTable, Indexation, Representation,
};

/// 头部压缩, 每个连接的发送方向一个, 只在写入帧的时候使用
#[derive(Debug, Clone)]
pub struct Encoder {
    table: HeaderTable,
    size_update: Option<usize>,
}

impl Encoder {
    pub fn new(max_size: usize) -> Self {
        Encoder {
            table: HeaderTable::new(max_size),
            size_update: None,
        }
    }

    pub fn table(&self) -> &HeaderTable {
        &self.table
    }

    /// 对端修改了表的大小, 在下一个头部块的起始处发出更新指令
    pub fn set_max_table_size(&mut self, size: usize) {
        self.size_update = Some(size);
    }

    /// 压缩结果长度的上限, 不依赖压缩表的状态
    pub fn encoded_len_bound(fields: &[HeaderField], use_huffman: bool) -> usize {
        // 表示方式及两个长度前缀各不超过6字节, 哈夫曼编码每字节不超过30位
        let string_len = |len: usize| if use_huffman { (len * 30 + 7) / 8 } else { len };
        let fields: usize = fields
            .iter()
            .map(|f| 18 + string_len(f.name.len()) + string_len(f.value.len()))
            .sum();
        fields + 6
    }

    pub fn compress(&mut self, fields: &[HeaderField], use_huffman: bool) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(fields, use_huffman, &mut dst);
        dst.freeze()
    }

    pub fn encode(&mut self, fields: &[HeaderField], use_huffman: bool, dst: &mut BytesMut) {
        if let Some(size) = self.size_update.take() {
            self.table.set_max_size(size);
            Representation::SizeUpdate.encode(size, dst);
        }
        for field in fields {
            self.encode_field(field, use_huffman, dst);
        }
    }

    fn encode_field(&mut self, field: &HeaderField, use_huffman: bool, dst: &mut BytesMut) {
        // 完全匹配时任何方式都只写入编号
        if let Some(index) = self.table.find_exact(&field.name, &field.value) {
            Representation::Indexed.encode(index, dst);
            return;
        }

        match field.indexation {
            Indexation::NotIndexed => {
                self.encode_literal(Representation::NotIndexed, field, use_huffman, dst);
            }
            Indexation::Substitution => match self.table.find_dynamic_name(&field.name) {
                Some(index) => {
                    Representation::Substitution.encode(index, dst);
                    encode_string(&field.value, use_huffman, dst);
                    // 与解码端相同的规则, 替换后超预算则淘汰
                    let _ = self.table.substitute(index, field.value.clone());
                }
                None => self.encode_incremental(field, use_huffman, dst),
            },
            Indexation::Indexed | Indexation::Incremental => {
                self.encode_incremental(field, use_huffman, dst)
            }
        }
    }

    fn encode_incremental(&mut self, field: &HeaderField, use_huffman: bool, dst: &mut BytesMut) {
        self.encode_literal(Representation::Incremental, field, use_huffman, dst);
        self.table.insert(field.name.clone(), field.value.clone());
    }

    fn encode_literal(
        &self,
        repr: Representation,
        field: &HeaderField,
        use_huffman: bool,
        dst: &mut BytesMut,
    ) {
        match self.table.find_name(&field.name) {
            Some(index) => repr.encode(index, dst),
            None => {
                repr.encode(0, dst);
                encode_string(&field.name, use_huffman, dst);
            }
        }
        encode_string(&field.value, use_huffman, dst);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new(crate::protocol::Consts::DEFAULT_HEADER_TABLE_SIZE)
    }
}

impl Representation {
    fn encode(&self, value: usize, dst: &mut BytesMut) {
        let (prefix, flags) = self.layout();
        encode_integer(value, prefix, flags, dst);
    }
}
