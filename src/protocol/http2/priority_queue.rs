// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::cmp::Ordering;

use rbtree::RBTree;

/// 优先级 0-7, 0为最低, 7为最高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const LOWEST: Priority = Priority(0);
    pub const DEFAULT: Priority = Priority(3);
    pub const HIGHEST: Priority = Priority(7);

    pub fn new(band: u8) -> Option<Priority> {
        if band <= Self::HIGHEST.0 {
            Some(Priority(band))
        } else {
            None
        }
    }

    pub fn band(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityEntry<T> {
    pub item: T,
    pub priority: Priority,
}

impl<T> PriorityEntry<T> {
    pub fn new(item: T, priority: Priority) -> Self {
        PriorityEntry { item, priority }
    }
}

/// 排序键, 优先级高的在前, 同优先级按入队顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueKey {
    priority: Priority,
    seq: u64,
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 稳定的最大优先级队列
#[derive(Debug)]
pub struct PriorityQueue<T> {
    send_queue: RBTree<QueueKey, T>,
    next_seq: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        PriorityQueue {
            send_queue: RBTree::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.send_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.send_queue.is_empty()
    }

    pub fn enqueue(&mut self, entry: PriorityEntry<T>) {
        let key = QueueKey {
            priority: entry.priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.send_queue.insert(key, entry.item);
    }

    /// 取出优先级最高且最早入队的项, 空队列返回None
    pub fn dequeue(&mut self) -> Option<PriorityEntry<T>> {
        self.send_queue
            .pop_first()
            .map(|(k, item)| PriorityEntry::new(item, k.priority))
    }

    /// 下一个将被取出的项
    pub fn peek(&self) -> Option<(Priority, &T)> {
        self.send_queue.get_first().map(|(k, v)| (k.priority, v))
    }

    /// 最低优先级一端
    pub fn first(&self) -> Option<(Priority, &T)> {
        self.send_queue.get_last().map(|(k, v)| (k.priority, v))
    }

    /// 最高优先级一端
    pub fn last(&self) -> Option<(Priority, &T)> {
        self.peek()
    }

    /// 移除所有满足条件的项, 返回被移除的项, 其余项的相对顺序不变
    pub fn remove_where<F>(&mut self, mut f: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let keys: Vec<QueueKey> = self
            .send_queue
            .iter()
            .filter(|(_, v)| f(*v))
            .map(|(k, _)| *k)
            .collect();
        keys.iter()
            .filter_map(|k| self.send_queue.remove(k))
            .collect()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        PriorityQueue::new()
    }
}
