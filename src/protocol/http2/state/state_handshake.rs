// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::{
    io,
    pin::Pin,
    task::{ready, Context, Poll},
};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::protocol::{Consts, ProtError, ProtResult};

/// 连接前言的交换, 客户端写出前言, 服务端读取并校验
pub struct StateHandshake {
    /// 当前握手状态
    state: Handshaking,
    /// 握手日志信息
    span: tracing::Span,
}

/// 握手状态
enum Handshaking {
    /// 写出前言
    Flushing(Flush),
    /// 等待读取前言
    ReadingPreface(ReadPreface),
    /// 已完成握手, 不可重复握手
    Done,
}

struct Flush {
    pos: usize,
}

/// Read the client connection preface
struct ReadPreface {
    pos: usize,
}

impl ReadPreface {
    pub fn new() -> Self {
        ReadPreface { pos: 0 }
    }

    pub fn poll_handle<R>(&mut self, cx: &mut Context<'_>, reader: &mut R) -> Poll<ProtResult<()>>
    where
        R: AsyncRead + Unpin,
    {
        let preface = Consts::CONNECTION_PREFACE;
        let mut buf = [0; 24];
        let mut rem = preface.len() - self.pos;

        while rem > 0 {
            let mut buf = ReadBuf::new(&mut buf[..rem]);
            ready!(Pin::new(&mut *reader).poll_read(cx, &mut buf)).map_err(ProtError::from)?;
            let n = buf.filled().len();
            if n == 0 {
                return Poll::Ready(Err(ProtError::from(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before reading preface",
                ))));
            }

            if &preface[self.pos..self.pos + n] != buf.filled() {
                return Poll::Ready(Err(ProtError::malformed("invalid connection preface")));
            }

            self.pos += n;
            rem -= n;
        }

        Poll::Ready(Ok(()))
    }
}

impl Flush {
    pub fn poll_handle<W>(&mut self, cx: &mut Context<'_>, writer: &mut W) -> Poll<ProtResult<()>>
    where
        W: AsyncWrite + Unpin,
    {
        let preface = Consts::CONNECTION_PREFACE;
        while self.pos < preface.len() {
            let n = ready!(Pin::new(&mut *writer).poll_write(cx, &preface[self.pos..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::WriteZero).into()));
            }
            self.pos += n;
        }
        ready!(Pin::new(&mut *writer).poll_flush(cx))?;
        Poll::Ready(Ok(()))
    }
}

impl StateHandshake {
    pub fn new_server() -> StateHandshake {
        StateHandshake {
            state: Handshaking::ReadingPreface(ReadPreface::new()),
            span: tracing::trace_span!("server_handshake"),
        }
    }

    pub fn new_client() -> StateHandshake {
        StateHandshake {
            state: Handshaking::Flushing(Flush { pos: 0 }),
            span: tracing::trace_span!("client_handshake"),
        }
    }

    pub fn poll_handle<R, W>(
        &mut self,
        cx: &mut Context<'_>,
        reader: &mut R,
        writer: &mut W,
    ) -> Poll<ProtResult<()>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let span = self.span.clone();
        let _e = span.enter();
        loop {
            match &mut self.state {
                Handshaking::Flushing(flush) => {
                    ready!(flush.poll_handle(cx, writer))?;
                    tracing::trace!(flush.poll = %"Ready");
                    self.state = Handshaking::Done;
                }
                Handshaking::ReadingPreface(read) => {
                    ready!(read.poll_handle(cx, reader))?;
                    tracing::trace!(read.poll = %"Ready");
                    self.state = Handshaking::Done;
                }
                Handshaking::Done => {
                    return Poll::Ready(Ok(()));
                }
            }
        }
    }
}
