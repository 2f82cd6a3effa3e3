// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use crate::protocol::{http2::frame::Settings, ProtError, ProtResult};

/// 本地SETTINGS的发送与确认状态
#[derive(Debug)]
pub struct StateSettings {
    state: LocalState,
    remote: Option<Settings>,
}

#[derive(Debug, PartialEq, Eq)]
enum LocalState {
    /// 设置发送的settings
    Send(Settings),
    /// 设置等待确认settings
    WaitAck,
    /// 发送并收到了设置
    Done,
}

impl StateSettings {
    pub fn new(settings: Settings) -> Self {
        StateSettings {
            state: LocalState::Send(settings),
            remote: None,
        }
    }

    /// 取出待发送的本地设置, 之后进入等待确认
    pub fn take_local(&mut self) -> Option<Settings> {
        match std::mem::replace(&mut self.state, LocalState::WaitAck) {
            LocalState::Send(settings) => Some(settings),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn recv_ack(&mut self) -> ProtResult<()> {
        match self.state {
            LocalState::WaitAck => {
                self.state = LocalState::Done;
                Ok(())
            }
            _ => Err(ProtError::malformed("unexpected settings ack")),
        }
    }

    pub fn recv_remote(&mut self, settings: Settings) {
        self.remote = Some(settings);
    }

    pub fn remote(&self) -> Option<&Settings> {
        self.remote.as_ref()
    }
}
