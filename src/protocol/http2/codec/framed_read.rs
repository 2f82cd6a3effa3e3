// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::Stream;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead as InnerFramedRead;

use crate::protocol::{http2::frame::Frame, ProtResult};

use super::FrameCodec;

#[derive(Debug)]
pub struct FramedRead<T> {
    inner: InnerFramedRead<T, FrameCodec>,
}

impl<T> FramedRead<T>
where
    T: AsyncRead + Unpin,
{
    pub fn new(io: T, codec: FrameCodec) -> FramedRead<T> {
        FramedRead {
            inner: InnerFramedRead::new(io, codec),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn codec(&self) -> &FrameCodec {
        self.inner.decoder()
    }

    pub fn codec_mut(&mut self) -> &mut FrameCodec {
        self.inner.decoder_mut()
    }
}

impl<T> Stream for FramedRead<T>
where
    T: AsyncRead + Unpin,
{
    type Item = ProtResult<Frame>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let span = tracing::trace_span!("FramedRead::poll_next");
        let _e = span.enter();
        match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
            Some(Ok(frame)) => {
                log::trace!("received frame = {:?}", frame);
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                tracing::debug!(error = ?e, "decode frame failed");
                Poll::Ready(Some(Err(e)))
            }
            None => Poll::Ready(None),
        }
    }
}
