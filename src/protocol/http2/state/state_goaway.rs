// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use crate::protocol::http2::{frame::GoAway, Reason};

/// 连接关闭的状态, 保证GOAWAY只发送一次
#[derive(Debug)]
pub struct StateGoAway {
    close_now: bool,
    /// 本地发出的GOAWAY
    goaway: Option<GoAway>,
    /// 对端发来的GOAWAY
    remote: Option<GoAway>,
    reason: Reason,
}

impl StateGoAway {
    pub fn new() -> Self {
        StateGoAway {
            close_now: false,
            goaway: None,
            remote: None,
            reason: Reason::NO_ERROR,
        }
    }

    /// 记录将要发送的GOAWAY, 已经发送过时返回None
    pub fn go_away_now(&mut self, frame: GoAway) -> Option<GoAway> {
        if self.goaway.is_some() {
            return None;
        }
        self.close_now = true;
        self.reason = frame.reason();
        self.goaway = Some(frame.clone());
        Some(frame)
    }

    pub fn recv_go_away(&mut self, frame: GoAway) {
        self.close_now = true;
        if self.goaway.is_none() {
            self.reason = frame.reason();
        }
        self.remote = Some(frame);
    }

    pub fn is_close_now(&self) -> bool {
        self.close_now
    }

    pub fn is_sent(&self) -> bool {
        self.goaway.is_some()
    }

    pub fn remote(&self) -> Option<&GoAway> {
        self.remote.as_ref()
    }

    pub fn reason(&self) -> &Reason {
        &self.reason
    }
}

impl Default for StateGoAway {
    fn default() -> Self {
        StateGoAway::new()
    }
}
