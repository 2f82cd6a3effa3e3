// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use rustls::{server::Acceptor, ServerConfig};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream, ToSocketAddrs},
};
use tokio_rustls::{server::TlsStream, LazyConfigAcceptor};

use super::{
    http2::{Builder, StreamHandler},
    AlpnMonitor, Consts, NegotiationMonitor, ProtError, ProtResult, TimeoutError,
};

/// 把接受的TCP连接转换成可用于会话的双工流, 并给出协商的协议
#[async_trait]
pub trait Handshaker: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn handshake(
        &self,
        stream: TcpStream,
        monitor: &mut dyn NegotiationMonitor,
    ) -> ProtResult<(Self::Stream, String)>;
}

/// 明文连接, 双方事先约定使用多路复用协议
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHandshaker;

#[async_trait]
impl Handshaker for PlainHandshaker {
    type Stream = TcpStream;

    async fn handshake(
        &self,
        stream: TcpStream,
        monitor: &mut dyn NegotiationMonitor,
    ) -> ProtResult<(TcpStream, String)> {
        monitor.on_negotiated(&[]);
        monitor.on_selected(Consts::HTTP2_PROTOCOL);
        Ok((stream, Consts::HTTP2_PROTOCOL.to_string()))
    }
}

/// TLS连接, 通过ALPN选择协议
#[derive(Clone)]
pub struct TlsHandshaker {
    config: Arc<ServerConfig>,
}

impl TlsHandshaker {
    pub fn new(mut config: ServerConfig) -> Self {
        if config.alpn_protocols.is_empty() {
            config.alpn_protocols = vec![
                Consts::HTTP2_PROTOCOL.as_bytes().to_vec(),
                Consts::HTTP1_PROTOCOL.as_bytes().to_vec(),
            ];
        }
        TlsHandshaker {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl Handshaker for TlsHandshaker {
    type Stream = TlsStream<TcpStream>;

    async fn handshake(
        &self,
        stream: TcpStream,
        monitor: &mut dyn NegotiationMonitor,
    ) -> ProtResult<(TlsStream<TcpStream>, String)> {
        let start = LazyConfigAcceptor::new(Acceptor::default(), stream).await?;
        let offered: Vec<Vec<u8>> = start
            .client_hello()
            .alpn()
            .map(|protocols| protocols.map(|p| p.to_vec()).collect())
            .unwrap_or_default();
        monitor.on_negotiated(&offered);

        let tls = start.into_stream(self.config.clone()).await?;
        // 未协商时按HTTP/1.1处理
        let protocol = match tls.get_ref().1.alpn_protocol() {
            Some(p) => String::from_utf8_lossy(p).to_string(),
            None => Consts::HTTP1_PROTOCOL.to_string(),
        };
        monitor.on_selected(&protocol);
        Ok((tls, protocol))
    }
}

/// 接受连接, 每个连接在独立的任务中完成握手及会话
pub struct Server<H, S> {
    listener: TcpListener,
    handshaker: Arc<H>,
    handler: Arc<S>,
    builder: Builder,
}

impl<H, S> Server<H, S>
where
    H: Handshaker,
    S: StreamHandler,
{
    pub fn new(listener: TcpListener, handshaker: H, handler: S, builder: Builder) -> Self {
        Server {
            listener,
            handshaker: Arc::new(handshaker),
            handler: Arc::new(handler),
            builder,
        }
    }

    pub async fn bind<A: ToSocketAddrs>(
        addr: A,
        handshaker: H,
        handler: S,
        builder: Builder,
    ) -> ProtResult<Self> {
        builder.validate()?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, handshaker, handler, builder))
    }

    pub fn local_addr(&self) -> ProtResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> ProtResult<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            log::trace!("accept connection from {}", addr);
            let handshaker = self.handshaker.clone();
            let handler = self.handler.clone();
            let builder = self.builder.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    Self::handle_accepted(handshaker, handler, builder, stream, addr).await
                {
                    log::info!("connection {} end with {}", addr, e);
                }
            });
        }
    }

    pub async fn handle_accepted(
        handshaker: Arc<H>,
        handler: Arc<S>,
        builder: Builder,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> ProtResult<()> {
        let _ = stream.set_nodelay(true);
        let mut monitor = AlpnMonitor::new();
        monitor.attach(Some(addr));
        let (io, protocol) = match tokio::time::timeout(
            builder.handshake_timeout,
            handshaker.handshake(stream, &mut monitor),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(ProtError::Timeout(TimeoutError::Handshake("tls handshake"))),
        };
        if protocol != Consts::HTTP2_PROTOCOL {
            log::warn!("peer {} negotiated {}, not supported, close", addr, protocol);
            return Ok(());
        }
        builder.server_session(io).start(handler).await
    }
}
