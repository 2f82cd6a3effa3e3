// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::collections::{HashMap, HashSet};

use crate::protocol::{FramingError, ProtResult};

use super::{InnerStream, StreamIdentifier};

/// 当前活跃的流, 按是否受流控分为两部分
#[derive(Debug, Default)]
pub struct ActiveStreams {
    streams: HashMap<StreamIdentifier, InnerStream>,
    flow_controlled: HashSet<StreamIdentifier>,
    non_flow_controlled: HashSet<StreamIdentifier>,
}

impl ActiveStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重复插入同一个id返回错误, 集合保持不变
    pub fn insert(&mut self, stream: InnerStream) -> ProtResult<()> {
        let id = stream.id();
        if self.streams.contains_key(&id) {
            return Err(FramingError::InvalidStreamId(id).into());
        }
        if stream.is_flow_controlled() {
            self.flow_controlled.insert(id);
        } else {
            self.non_flow_controlled.insert(id);
        }
        self.streams.insert(id, stream);
        Ok(())
    }

    pub fn remove(&mut self, id: &StreamIdentifier) -> Option<InnerStream> {
        self.flow_controlled.remove(id);
        self.non_flow_controlled.remove(id);
        self.streams.remove(id)
    }

    pub fn get(&self, id: &StreamIdentifier) -> Option<&InnerStream> {
        self.streams.get(id)
    }

    pub fn get_mut(&mut self, id: &StreamIdentifier) -> Option<&mut InnerStream> {
        self.streams.get_mut(id)
    }

    pub fn contains_key(&self, id: &StreamIdentifier) -> bool {
        self.streams.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn flow_controlled_count(&self) -> usize {
        self.flow_controlled.len()
    }

    pub fn non_flow_controlled_count(&self) -> usize {
        self.non_flow_controlled.len()
    }

    /// 在两个分区之间移动, 流不存在时返回false
    pub fn set_flow_controlled(&mut self, id: &StreamIdentifier, flow_controlled: bool) -> bool {
        let stream = match self.streams.get_mut(id) {
            Some(stream) => stream,
            None => return false,
        };
        stream.set_flow_controlled(flow_controlled);
        if flow_controlled {
            self.non_flow_controlled.remove(id);
            self.flow_controlled.insert(*id);
        } else {
            self.flow_controlled.remove(id);
            self.non_flow_controlled.insert(*id);
        }
        true
    }

    pub fn ids(&self) -> Vec<StreamIdentifier> {
        self.streams.keys().copied().collect()
    }

    pub fn flow_controlled_mut(&mut self) -> impl Iterator<Item = &mut InnerStream> {
        self.streams
            .values_mut()
            .filter(|s| s.is_flow_controlled())
    }

    pub fn drain(&mut self) -> Vec<InnerStream> {
        self.flow_controlled.clear();
        self.non_flow_controlled.clear();
        self.streams.drain().map(|(_, v)| v).collect()
    }
}
