// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use lazy_static::lazy_static;

use crate::protocol::{CompressionError, ProtResult};

/// 每个表项除名字与值之外额外计入的开销
pub const ENTRY_OVERHEAD: usize = 32;

/// 头部字段在压缩时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indexation {
    /// 优先引用已有的完全匹配项, 没有则退化为Incremental
    Indexed,
    /// 写入字面值并追加到动态表
    #[default]
    Incremental,
    /// 动态表中有同名项时原地替换其值, 否则退化为Incremental
    Substitution,
    /// 写入字面值, 不修改动态表
    NotIndexed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
    pub indexation: Indexation,
}

impl HeaderField {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        HeaderField {
            name: name.into(),
            value: value.into(),
            indexation: Indexation::default(),
        }
    }

    pub fn with_indexation(
        name: impl Into<Bytes>,
        value: impl Into<Bytes>,
        indexation: Indexation,
    ) -> Self {
        HeaderField {
            name: name.into(),
            value: value.into(),
            indexation,
        }
    }

    pub fn size(&self) -> usize {
        entry_size(&self.name, &self.value)
    }
}

pub fn entry_size(name: &[u8], value: &[u8]) -> usize {
    name.len() + value.len() + ENTRY_OVERHEAD
}

/// 静态表, 下标从1开始
pub static STATIC_TABLE: [(&str, &str); 61] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

lazy_static! {
    /// 名字 => [(值, 编号)]
    static ref STATIC_INDEX: HashMap<&'static [u8], Vec<(&'static [u8], usize)>> = {
        let mut map: HashMap<&'static [u8], Vec<(&'static [u8], usize)>> = HashMap::new();
        for (i, (name, value)) in STATIC_TABLE.iter().enumerate() {
            map.entry(name.as_bytes())
                .or_default()
                .push((value.as_bytes(), i + 1));
        }
        map
    };
}

/// 静态表加上一个方向上的动态表
///
/// 编号从1开始, 1..=61 为静态表, 62起为动态表, 最早插入的项编号最小,
/// 超出字节预算时也最先被淘汰. 编码与解码两端按相同的顺序修改, 结构保持一致.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTable {
    entries: VecDeque<(Bytes, Bytes)>,
    size: usize,
    max_size: usize,
}

impl HeaderTable {
    pub fn new(max_size: usize) -> Self {
        HeaderTable {
            entries: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    pub fn static_len() -> usize {
        STATIC_TABLE.len()
    }

    /// 动态表的项数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn entries(&self) -> impl Iterator<Item = &(Bytes, Bytes)> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> ProtResult<(Bytes, Bytes)> {
        if index == 0 {
            return Err(CompressionError::InvalidIndex(index).into());
        }
        if index <= STATIC_TABLE.len() {
            let (name, value) = STATIC_TABLE[index - 1];
            return Ok((Bytes::from_static(name.as_bytes()), Bytes::from_static(value.as_bytes())));
        }
        match self.entries.get(index - STATIC_TABLE.len() - 1) {
            Some((name, value)) => Ok((name.clone(), value.clone())),
            None => Err(CompressionError::InvalidIndex(index).into()),
        }
    }

    pub fn is_dynamic_index(&self, index: usize) -> bool {
        index > STATIC_TABLE.len() && index - STATIC_TABLE.len() <= self.entries.len()
    }

    /// 查找完全匹配的编号
    pub fn find_exact(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        let found = STATIC_INDEX
            .get(name)
            .and_then(|values| values.iter().find(|(v, _)| *v == value));
        if let Some((_, i)) = found {
            return Some(*i);
        }
        self.entries
            .iter()
            .position(|(n, v)| n == name && v == value)
            .map(|p| p + STATIC_TABLE.len() + 1)
    }

    /// 查找名字匹配的编号, 静态表优先
    pub fn find_name(&self, name: &[u8]) -> Option<usize> {
        if let Some((_, i)) = STATIC_INDEX.get(name).and_then(|values| values.first()) {
            return Some(*i);
        }
        self.find_dynamic_name(name)
    }

    pub fn find_dynamic_name(&self, name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n == name)
            .map(|p| p + STATIC_TABLE.len() + 1)
    }

    /// 追加到动态表末尾, 超出预算时从最早的项开始淘汰
    pub fn insert(&mut self, name: Bytes, value: Bytes) {
        self.size += entry_size(&name, &value);
        self.entries.push_back((name, value));
        self.evict();
    }

    /// 原地替换动态表中某项的值, 编号与顺序不变
    pub fn substitute(&mut self, index: usize, value: Bytes) -> ProtResult<()> {
        if !self.is_dynamic_index(index) {
            return Err(CompressionError::InvalidIndex(index).into());
        }
        let pos = index - STATIC_TABLE.len() - 1;
        let entry = &mut self.entries[pos];
        self.size = self.size - entry_size(&entry.0, &entry.1) + entry_size(&entry.0, &value);
        entry.1 = value;
        self.evict();
        Ok(())
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict();
    }

    fn evict(&mut self) {
        while self.size > self.max_size {
            match self.entries.pop_front() {
                Some((name, value)) => self.size -= entry_size(&name, &value),
                None => break,
            }
        }
    }
}
