// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

//! 单条安全连接上的多路复用二进制传输
//!
//! 帧的编解码, 多个流的生命周期, 连接与流两级的流量控制,
//! 以及读写两个方向各自维护的头部压缩状态.
//!
//! ```no_run
//! use std::sync::Arc;
//! use duolu::{Builder, Priority, RefuseHandler, StreamMessage};
//! use duolu::http2::hpack::HeaderField;
//!
//! # async fn run() -> duolu::ProtResult<()> {
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:8080").await?;
//! let session = Builder::new().client_session(stream);
//! let control = session.control();
//! tokio::spawn(session.start(Arc::new(RefuseHandler)));
//!
//! let mut send = control.open_stream(Priority::DEFAULT)?;
//! let headers = vec![HeaderField::new(":path", "/index.html")];
//! send.send_message(StreamMessage::new(headers, Default::default())).await?;
//! let response = send.recv().await?;
//! println!("{:?}", response.headers);
//! # Ok(())
//! # }
//! ```

mod protocol;

pub use protocol::*;
