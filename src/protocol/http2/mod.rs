// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

mod active_streams;
mod builder;
pub mod codec;
mod control;
mod flow_control;
pub mod frame;
pub mod hpack;
mod inner_stream;
mod priority_queue;
mod send_stream;
mod session;
mod state;

pub use active_streams::ActiveStreams;
pub use builder::Builder;
pub use codec::{FrameCodec, FramedRead, FramedWrite};
pub use control::{ConnectionEnd, Control, Dispatch};
pub use flow_control::FlowControl;
pub use frame::{Frame, Reason, StreamIdentifier};
pub use inner_stream::{InnerStream, StreamMessage, StreamState};
pub use priority_queue::{Priority, PriorityEntry, PriorityQueue};
pub use send_stream::SendStream;
pub use session::{RefuseHandler, Session, StreamHandler};
pub use state::*;
