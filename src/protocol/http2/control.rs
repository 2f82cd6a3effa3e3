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
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use bytes::Bytes;
use tokio::sync::{futures::Notified, oneshot, Notify};

use crate::protocol::{Consts, FramingError, Initiator, ProtError, ProtResult};

use super::{
    frame::{Data, Frame, GoAway, Headers, Ping, PriorityFrame, Reset, Settings, WindowUpdate},
    hpack::HeaderField,
    ActiveStreams, Builder, FlowControl, InnerStream, Priority, PriorityEntry, PriorityQueue,
    Reason, SendStream, StateGoAway, StateSettings, StreamIdentifier, StreamMessage, StreamState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    Client,
    Server,
}

/// 读取到一帧后需要由Session继续处理的事情
#[derive(Debug)]
pub enum Dispatch {
    None,
    /// 对端发起的流已接收完毕, 交给处理者
    Request(StreamIdentifier, StreamMessage),
    /// 对端发送了GOAWAY
    GoAway(GoAway),
}

enum Route {
    Active,
    New,
    /// 宽限期内的已关闭流, 直接丢弃
    Ignore,
    Closed,
}

struct ControlInner {
    streams: ActiveStreams,
    flow: FlowControl,
    send_queue: PriorityQueue<Frame>,
    /// 最近关闭的流及关闭的时间
    closed_streams: VecDeque<(StreamIdentifier, Instant)>,
    next_stream_id: StreamIdentifier,
    last_remote_id: StreamIdentifier,
    remote_max_frame_size: usize,
    remote_max_streams: Option<usize>,
    encoder_table_size: Option<usize>,
    setting: StateSettings,
    goaway: StateGoAway,
    is_closed: bool,
}

/// 连接级的共享状态, 读取任务, 写入任务以及各个SendStream只通过这里的方法访问
pub struct Control {
    end: ConnectionEnd,
    config: Builder,
    inner: Mutex<ControlInner>,
    /// 发送队列有新的帧
    queue_notify: Notify,
    /// 发送窗口有变化或者连接关闭
    window_notify: Notify,
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("end", &self.end)
            .field("config", &self.config)
            .finish()
    }
}

impl Control {
    pub fn new(end: ConnectionEnd, config: Builder) -> Self {
        let next_stream_id = match end {
            ConnectionEnd::Client => StreamIdentifier::client_first(),
            ConnectionEnd::Server => StreamIdentifier::server_first(),
        };
        let inner = ControlInner {
            streams: ActiveStreams::new(),
            flow: FlowControl::new(config.initial_window_size, config.use_flow_control),
            send_queue: PriorityQueue::new(),
            closed_streams: VecDeque::new(),
            next_stream_id,
            last_remote_id: StreamIdentifier::zero(),
            remote_max_frame_size: Consts::DEFAULT_MAX_FRAME_SIZE as usize,
            remote_max_streams: None,
            encoder_table_size: None,
            setting: StateSettings::new(config.settings()),
            goaway: StateGoAway::new(),
            is_closed: false,
        };
        Control {
            end,
            config,
            inner: Mutex::new(inner),
            queue_notify: Notify::new(),
            window_notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn end(&self) -> ConnectionEnd {
        self.end
    }

    pub fn config(&self) -> &Builder {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_closed
    }

    pub fn is_local_id(&self, id: StreamIdentifier) -> bool {
        match self.end {
            ConnectionEnd::Client => id.is_client_initiated(),
            ConnectionEnd::Server => id.is_server_initiated(),
        }
    }

    fn band(&self, priority: Priority) -> Priority {
        if self.config.use_priorities {
            priority
        } else {
            Priority::DEFAULT
        }
    }

    /// 控制帧总是最高优先级, 流上的帧按流的优先级
    fn enqueue(&self, inner: &mut ControlInner, frame: Frame, priority: Priority) {
        let priority = if frame.is_stream_frame() {
            self.band(priority)
        } else {
            Priority::HIGHEST
        };
        inner.send_queue.enqueue(PriorityEntry::new(frame, priority));
        self.queue_notify.notify_one();
    }

    /// 写入任务在队列为空时等待
    pub fn queue_changed(&self) -> Notified<'_> {
        self.queue_notify.notified()
    }

    /// 发送数据时窗口不足则等待
    pub fn window_changed(&self) -> Notified<'_> {
        self.window_notify.notified()
    }

    pub fn dequeue(&self) -> Option<Frame> {
        self.lock().send_queue.dequeue().map(|e| e.item)
    }

    pub fn pending_frames(&self) -> usize {
        self.lock().send_queue.len()
    }

    pub fn take_encoder_table_size(&self) -> Option<usize> {
        self.lock().encoder_table_size.take()
    }

    pub fn max_send_frame_size(&self) -> usize {
        self.lock().remote_max_frame_size
    }

    pub fn active_streams(&self) -> usize {
        self.lock().streams.len()
    }

    /// 连接级的发送窗口
    pub fn send_window(&self) -> i32 {
        self.lock().flow.window_size()
    }

    /// 握手后发送本地的SETTINGS
    pub fn send_local_settings(&self) {
        let mut guard = self.lock();
        if let Some(settings) = guard.setting.take_local() {
            log::trace!("send local settings {:?}", settings);
            self.enqueue(&mut guard, settings.into(), Priority::HIGHEST);
        }
    }

    pub fn open_stream(self: &Arc<Self>, priority: Priority) -> ProtResult<SendStream> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.is_closed || inner.goaway.is_close_now() {
            return Err(ProtError::library_go_away(*inner.goaway.reason()));
        }
        if let Some(max) = inner.remote_max_streams {
            let opened = inner
                .streams
                .ids()
                .into_iter()
                .filter(|id| self.is_local_id(*id))
                .count();
            if opened >= max {
                return Err(ProtError::Extension("max concurrent streams reached"));
            }
        }
        let id = inner
            .next_stream_id
            .next_id()
            .ok_or(ProtError::Extension("stream id exhausted"))?;
        let mut stream = InnerStream::new(
            id,
            priority,
            inner.flow.initial_window_size(),
            inner.flow.local_window_size(),
        );
        let (sender, receiver) = oneshot::channel();
        stream.set_responder(sender);
        inner.streams.insert(stream)?;
        log::debug!("open local stream {}", id);
        Ok(SendStream::new(id, self.clone(), Some(receiver)))
    }

    /// 对端发起的流, 用于写回响应
    pub fn response_stream(self: &Arc<Self>, id: StreamIdentifier) -> SendStream {
        SendStream::new(id, self.clone(), None)
    }

    pub fn send_headers(
        &self,
        id: StreamIdentifier,
        fields: Vec<HeaderField>,
        end_stream: bool,
    ) -> ProtResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.is_closed {
            return Err(ProtError::StreamClosed(id));
        }
        let stream = inner
            .streams
            .get_mut(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        let opening = stream.state() == StreamState::Idle;
        stream.send_headers(end_stream)?;
        let priority = stream.priority();
        let closed = stream.is_closed();
        let flow_controlled = stream.is_flow_controlled();

        let mut frame = Headers::new(id, fields);
        frame.set_fin(end_stream);
        if opening && self.config.use_priorities && priority != Priority::DEFAULT {
            frame.set_priority(Some(priority));
        }
        self.enqueue(inner, frame.into(), priority);
        if opening && !flow_controlled {
            self.enqueue(inner, WindowUpdate::end_flow_control(id).into(), priority);
        }
        if closed {
            self.finish_stream(inner, id);
        }
        Ok(())
    }

    /// 预留发送额度, 返回0表示需要等待窗口更新
    pub fn reserve_for_send(&self, id: StreamIdentifier, len: usize) -> ProtResult<usize> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.is_closed {
            return Err(ProtError::StreamClosed(id));
        }
        inner.flow.reserve_for_send(&mut inner.streams, id, len)
    }

    /// 发送已经预留过额度的数据, 失败时归还额度
    pub fn send_data(&self, id: StreamIdentifier, payload: Bytes, end_stream: bool) -> ProtResult<()> {
        let len = payload.len();
        let mut guard = self.lock();
        let inner = &mut *guard;
        let state = match inner.streams.get_mut(&id) {
            Some(stream) if !inner.is_closed => stream
                .send_data(end_stream)
                .map(|_| (stream.priority(), stream.is_closed())),
            _ => Err(ProtError::StreamClosed(id)),
        };
        let (priority, closed) = match state {
            Ok(v) => v,
            Err(e) => {
                inner.flow.release(&mut inner.streams, id, len);
                return Err(e);
            }
        };
        let mut frame = Data::new(id, payload);
        frame.set_fin(end_stream);
        self.enqueue(inner, frame.into(), priority);
        if closed {
            self.finish_stream(inner, id);
        }
        Ok(())
    }

    /// 该流两个方向都不再受流级窗口的限制, 通过END_FLOW_CONTROL通知对端
    ///
    /// 尚未发送HEADERS的流在HEADERS之后再通知, 对端此时还不知道这个流.
    pub fn disable_stream_flow_control(&self, id: StreamIdentifier) -> ProtResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let stream = inner
            .streams
            .get(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        if !stream.is_flow_controlled() {
            return Ok(());
        }
        let announced = stream.state() != StreamState::Idle;
        let priority = stream.priority();
        inner.flow.disable_stream_flow_control(&mut inner.streams, id)?;
        if announced {
            self.enqueue(inner, WindowUpdate::end_flow_control(id).into(), priority);
        }
        self.window_notify.notify_waiters();
        Ok(())
    }

    pub fn set_stream_priority(&self, id: StreamIdentifier, priority: Priority) -> ProtResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let stream = inner
            .streams
            .get_mut(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        stream.set_priority(priority);
        if self.config.use_priorities {
            self.requeue_stream(inner, id, priority);
            self.enqueue(inner, Frame::Priority(PriorityFrame::new(id, priority)), Priority::HIGHEST);
        }
        Ok(())
    }

    /// 优先级变化后该流尚未写出的帧移到新的优先级, 保持原有的先后顺序
    fn requeue_stream(&self, inner: &mut ControlInner, id: StreamIdentifier, priority: Priority) {
        let pending = inner
            .send_queue
            .remove_where(|f| f.is_stream_frame() && f.stream_id() == id);
        for frame in pending {
            inner.send_queue.enqueue(PriorityEntry::new(frame, priority));
        }
    }

    /// 关闭流, 取消该流尚未写出的帧, 未结束的流以CANCEL重置
    pub fn close_stream(&self, id: StreamIdentifier) {
        self.reset_active(id, Reason::CANCEL, Initiator::User);
    }

    /// 只重置仍然活跃的流, 已关闭的流不再发送RST
    pub fn reset_active(&self, id: StreamIdentifier, reason: Reason, initiator: Initiator) {
        let mut guard = self.lock();
        match guard.streams.get(&id) {
            Some(stream) if !stream.is_closed() => {
                self.reset_stream(&mut guard, id, reason, initiator)
            }
            _ => log::trace!("stream {} already closed", id),
        }
    }

    pub fn reset(&self, id: StreamIdentifier, reason: Reason) {
        self.reset_with(id, reason, Initiator::Library);
    }

    pub fn reset_with(&self, id: StreamIdentifier, reason: Reason, initiator: Initiator) {
        let mut guard = self.lock();
        self.reset_stream(&mut guard, id, reason, initiator);
    }

    fn reset_stream(
        &self,
        inner: &mut ControlInner,
        id: StreamIdentifier,
        reason: Reason,
        initiator: Initiator,
    ) {
        let removed = inner
            .send_queue
            .remove_where(|f| f.is_stream_frame() && f.stream_id() == id);
        let released: usize = removed
            .iter()
            .map(|f| match f {
                Frame::Data(d) => d.len(),
                _ => 0,
            })
            .sum();
        inner.flow.release(&mut inner.streams, id, released);

        if let Some(mut stream) = inner.streams.remove(&id) {
            stream.reset();
            stream.fail(ProtError::Reset(id, reason, initiator));
        }
        self.remember_closed(inner, id);
        log::debug!(
            "reset stream {} reason {:?} by {:?}, cancel {} frames",
            id,
            reason,
            initiator,
            removed.len()
        );
        if initiator != Initiator::Remote && !inner.is_closed {
            self.enqueue(inner, Reset::new(id, reason).into(), Priority::HIGHEST);
        }
        self.window_notify.notify_waiters();
    }

    /// 发送GOAWAY, 重复调用只发送一次
    pub fn go_away(&self, reason: Reason, debug_data: Bytes) {
        let mut guard = self.lock();
        let frame = GoAway::with_debug_data(guard.last_remote_id, reason, debug_data);
        if let Some(frame) = guard.goaway.go_away_now(frame) {
            log::debug!("send go away {:?}", frame);
            self.enqueue(&mut guard, frame.into(), Priority::HIGHEST);
        }
    }

    /// 关闭连接: 取消所有的流及待发送的帧, 只保留GOAWAY
    pub fn shutdown(&self, reason: Reason) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.is_closed {
            return;
        }
        inner.is_closed = true;
        let streams = inner.streams.drain();
        log::debug!("shutdown session, cancel {} streams", streams.len());
        for mut stream in streams {
            stream.reset();
            stream.fail(ProtError::GoAway(Bytes::new(), reason, Initiator::Library));
        }
        inner.send_queue.remove_where(|f| !f.is_go_away());
        self.queue_notify.notify_one();
        self.window_notify.notify_waiters();
    }

    pub fn recv_frame(&self, frame: Frame) -> ProtResult<Dispatch> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match frame {
            Frame::Settings(settings) => self.recv_settings(inner, settings)?,
            Frame::Ping(ping) => {
                if !ping.is_ack() {
                    self.enqueue(inner, Ping::pong(*ping.payload()).into(), Priority::HIGHEST);
                }
            }
            Frame::GoAway(goaway) => {
                log::debug!("recv go away {:?}", goaway);
                inner.goaway.recv_go_away(goaway.clone());
                return Ok(Dispatch::GoAway(goaway));
            }
            Frame::WindowUpdate(update) if update.is_end_flow_control() => {
                let id = update.stream_id();
                if id.is_zero() {
                    inner.flow.disable();
                } else if !inner.streams.set_flow_controlled(&id, false) {
                    log::trace!("end flow control on closed stream {}", id);
                }
                log::debug!("peer end flow control on {}", id);
                self.window_notify.notify_waiters();
            }
            Frame::WindowUpdate(update) => {
                let id = update.stream_id();
                if update.increment() == 0 {
                    if id.is_zero() {
                        return Err(ProtError::malformed("window update with zero increment"));
                    }
                    return Err(ProtError::Reset(id, Reason::PROTOCOL_ERROR, Initiator::Library));
                }
                inner
                    .flow
                    .on_window_update(&mut inner.streams, id, update.increment())?;
                self.window_notify.notify_waiters();
            }
            Frame::Reset(reset) => {
                let id = reset.stream_id();
                if id.is_zero() {
                    return Err(FramingError::InvalidStreamId(id).into());
                }
                self.reset_stream(inner, id, reset.reason(), Initiator::Remote);
            }
            Frame::Priority(frame) => {
                if self.config.use_priorities {
                    if let Some(stream) = inner.streams.get_mut(&frame.stream_id()) {
                        stream.set_priority(frame.priority());
                        self.requeue_stream(inner, frame.stream_id(), frame.priority());
                    }
                }
            }
            Frame::Headers(headers) => return self.recv_headers(inner, headers),
            Frame::Data(data) => return self.recv_data(inner, data),
            Frame::Unknown(head) => {
                log::trace!("ignore unknown frame {:?}", head);
            }
        }
        Ok(Dispatch::None)
    }

    fn recv_settings(&self, inner: &mut ControlInner, settings: Settings) -> ProtResult<()> {
        if settings.is_ack() {
            return inner.setting.recv_ack();
        }
        if let Some(size) = settings.initial_window_size() {
            inner.flow.set_initial_window_size(&mut inner.streams, size)?;
        }
        if let Some(size) = settings.max_frame_size() {
            if size < Consts::DEFAULT_MAX_FRAME_SIZE || size > Consts::MAX_FRAME_SIZE {
                return Err(ProtError::malformed("max frame size out of range"));
            }
            inner.remote_max_frame_size = size as usize;
        }
        if let Some(size) = settings.header_table_size() {
            inner.encoder_table_size = Some(size as usize);
        }
        if let Some(max) = settings.max_concurrent_streams() {
            inner.remote_max_streams = Some(max as usize);
        }
        if settings.is_flow_control_disabled() {
            inner.flow.disable();
        }
        inner.setting.recv_remote(settings);
        self.enqueue(inner, Settings::ack().into(), Priority::HIGHEST);
        self.window_notify.notify_waiters();
        Ok(())
    }

    fn recv_headers(&self, inner: &mut ControlInner, headers: Headers) -> ProtResult<Dispatch> {
        let id = headers.stream_id();
        match self.route(inner, id, true)? {
            Route::Ignore => {
                log::trace!("ignore headers on closed stream {}", id);
                return Ok(Dispatch::None);
            }
            Route::Closed => return Err(ProtError::StreamClosed(id)),
            Route::New => {
                inner.last_remote_id = id;
                if inner.goaway.is_sent()
                    || inner.streams.len() >= self.config.max_concurrent_streams as usize
                {
                    return Err(ProtError::Reset(id, Reason::REFUSED_STREAM, Initiator::Library));
                }
                let stream = InnerStream::new(
                    id,
                    headers.priority().unwrap_or_default(),
                    inner.flow.initial_window_size(),
                    inner.flow.local_window_size(),
                );
                inner.streams.insert(stream)?;
                log::debug!("peer open stream {}", id);
            }
            Route::Active => {}
        }
        let end_stream = headers.is_fin();
        let stream = inner
            .streams
            .get_mut(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        if let (Some(p), true) = (headers.priority(), self.config.use_priorities) {
            stream.set_priority(p);
        }
        stream.recv_headers(headers.into_fields(), end_stream)?;
        Ok(self.complete_recv(inner, id))
    }

    fn recv_data(&self, inner: &mut ControlInner, data: Data) -> ProtResult<Dispatch> {
        let id = data.stream_id();
        let updates = inner
            .flow
            .on_data_received(&mut inner.streams, id, data.len())?;
        for update in updates {
            self.enqueue(inner, update.into(), Priority::HIGHEST);
        }
        match self.route(inner, id, false)? {
            Route::Active => {}
            Route::Ignore => {
                log::trace!("ignore data on closed stream {}", id);
                return Ok(Dispatch::None);
            }
            Route::Closed | Route::New => return Err(ProtError::StreamClosed(id)),
        }
        let end_stream = data.is_fin();
        let stream = inner
            .streams
            .get_mut(&id)
            .ok_or(ProtError::StreamClosed(id))?;
        stream.recv_data(data.into_payload(), end_stream)?;
        Ok(self.complete_recv(inner, id))
    }

    /// 对端发送完毕后交付消息, 本地发起的流交给等待的SendStream
    fn complete_recv(&self, inner: &mut ControlInner, id: StreamIdentifier) -> Dispatch {
        let stream = match inner.streams.get_mut(&id) {
            Some(stream) => stream,
            None => return Dispatch::None,
        };
        let message = match stream.take_message() {
            Some(message) => message,
            None => return Dispatch::None,
        };
        let closed = stream.is_closed();
        let dispatch = if self.is_local_id(id) {
            stream.deliver(message);
            Dispatch::None
        } else {
            Dispatch::Request(id, message)
        };
        if closed {
            self.finish_stream(inner, id);
        }
        dispatch
    }

    fn route(&self, inner: &mut ControlInner, id: StreamIdentifier, is_headers: bool) -> ProtResult<Route> {
        if id.is_zero() {
            return Err(FramingError::InvalidStreamId(id).into());
        }
        if inner.streams.contains_key(&id) {
            return Ok(Route::Active);
        }
        if self.is_recently_closed(inner, id) {
            return Ok(Route::Ignore);
        }
        if self.is_local_id(id) {
            // 本端从未打开过的流
            if id >= inner.next_stream_id {
                return Err(FramingError::InvalidStreamId(id).into());
            }
            return Ok(Route::Closed);
        }
        if id > inner.last_remote_id {
            if is_headers {
                return Ok(Route::New);
            }
            return Err(FramingError::InvalidStreamId(id).into());
        }
        Ok(Route::Closed)
    }

    fn finish_stream(&self, inner: &mut ControlInner, id: StreamIdentifier) {
        if inner.streams.remove(&id).is_some() {
            log::debug!("stream {} closed", id);
            self.remember_closed(inner, id);
        }
    }

    fn purge_closed(&self, inner: &mut ControlInner) {
        let now = Instant::now();
        while let Some((_, at)) = inner.closed_streams.front() {
            if now.duration_since(*at) <= self.config.reset_stream_duration {
                break;
            }
            inner.closed_streams.pop_front();
        }
    }

    fn remember_closed(&self, inner: &mut ControlInner, id: StreamIdentifier) {
        self.purge_closed(inner);
        if self.config.reset_stream_max == 0 {
            return;
        }
        inner.closed_streams.retain(|(v, _)| *v != id);
        inner.closed_streams.push_back((id, Instant::now()));
        while inner.closed_streams.len() > self.config.reset_stream_max {
            inner.closed_streams.pop_front();
        }
    }

    fn is_recently_closed(&self, inner: &mut ControlInner, id: StreamIdentifier) -> bool {
        self.purge_closed(inner);
        inner.closed_streams.iter().any(|(v, _)| *v == id)
    }
}
