// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use futures::SinkExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedWrite as InnerFramedWrite;
use tracing::Instrument;

use crate::protocol::{http2::frame::Frame, ProtResult};

use super::FrameCodec;

/// 唯一的写入通道, 所有帧都经过这里按序写出
#[derive(Debug)]
pub struct FramedWrite<T> {
    inner: InnerFramedWrite<T, FrameCodec>,
}

impl<T> FramedWrite<T>
where
    T: AsyncWrite + Unpin,
{
    pub fn new(io: T, codec: FrameCodec) -> FramedWrite<T> {
        FramedWrite {
            inner: InnerFramedWrite::new(io, codec),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn codec(&self) -> &FrameCodec {
        self.inner.encoder()
    }

    pub fn codec_mut(&mut self) -> &mut FrameCodec {
        self.inner.encoder_mut()
    }

    /// 写入缓冲区, 不等待刷新
    pub async fn send_frame(&mut self, frame: Frame) -> ProtResult<()> {
        log::trace!("send frame = {:?}", frame);
        self.inner.feed(frame).await
    }

    pub async fn flush(&mut self) -> ProtResult<()> {
        SinkExt::<Frame>::flush(&mut self.inner)
            .instrument(tracing::trace_span!("FramedWrite::flush"))
            .await
    }

    pub async fn shutdown(&mut self) -> ProtResult<()> {
        self.flush().await?;
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}
