// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

mod consts;
mod error;
pub mod http2;
mod negotiation;
mod server;

pub use self::consts::Consts;
pub use self::error::{
    CompressionError, FramingError, Initiator, ProtError, ProtResult, TimeoutError,
};
pub use self::http2::{
    Builder, ConnectionEnd, Control, Priority, Reason, RefuseHandler, SendStream, Session,
    StreamHandler, StreamIdentifier, StreamMessage,
};
pub use self::negotiation::{AlpnMonitor, NegotiationMonitor};
pub use self::server::{Handshaker, PlainHandshaker, Server, TlsHandshaker};
