// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::net::SocketAddr;

/// 协议协商过程的回调, 每个连接持有一份, 连接结束时释放
pub trait NegotiationMonitor: Send {
    /// 接受连接后立即调用
    fn attach(&mut self, peer: Option<SocketAddr>);
    /// 对端提供了可选的协议列表
    fn on_negotiated(&mut self, offered: &[Vec<u8>]);
    /// 最终选定的协议
    fn on_selected(&mut self, protocol: &str);
}

/// 记录协商过程的默认实现
#[derive(Debug, Default)]
pub struct AlpnMonitor {
    peer: Option<SocketAddr>,
    offered: Vec<String>,
    selected: Option<String>,
}

impl AlpnMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn offered(&self) -> &[String] {
        &self.offered
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

impl NegotiationMonitor for AlpnMonitor {
    fn attach(&mut self, peer: Option<SocketAddr>) {
        log::trace!("negotiation attach peer {:?}", peer);
        self.peer = peer;
    }

    fn on_negotiated(&mut self, offered: &[Vec<u8>]) {
        self.offered = offered
            .iter()
            .map(|p| String::from_utf8_lossy(p).to_string())
            .collect();
        log::debug!("peer {:?} offered protocols {:?}", self.peer, self.offered);
    }

    fn on_selected(&mut self, protocol: &str) {
        log::debug!("peer {:?} selected protocol {}", self.peer, protocol);
        self.selected = Some(protocol.to_string());
    }
}

impl Drop for AlpnMonitor {
    fn drop(&mut self) {
        log::trace!(
            "negotiation release peer {:?} selected {:?}",
            self.peer,
            self.selected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_negotiation() {
        let mut monitor = AlpnMonitor::new();
        let peer: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        monitor.attach(Some(peer));
        monitor.on_negotiated(&[b"HTTP-draft-04/2.0".to_vec(), b"http/1.1".to_vec()]);
        monitor.on_selected("HTTP-draft-04/2.0");
        assert_eq!(monitor.peer(), Some(peer));
        assert_eq!(monitor.offered().len(), 2);
        assert_eq!(monitor.selected(), Some("HTTP-draft-04/2.0"));
    }
}
