// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

#![deny(rust_2018_idioms)]

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use duolu::{
        http2::{
            frame::{Frame, Headers},
            hpack::HeaderField,
            ActiveStreams, ConnectionEnd, Control, Dispatch, FlowControl, InnerStream,
            PriorityEntry, PriorityQueue, StreamState,
        },
        Builder, Consts, Initiator, Priority, ProtError, Reason, StreamIdentifier,
    };

    fn id(v: u32) -> StreamIdentifier {
        StreamIdentifier::from(v)
    }

    fn stream(v: u32) -> InnerStream {
        InnerStream::new(
            id(v),
            Priority::DEFAULT,
            Consts::DEFAULT_INITIAL_WINDOW_SIZE,
            Consts::DEFAULT_INITIAL_WINDOW_SIZE,
        )
    }

    #[test]
    fn scheduler_orders_by_band_then_arrival() {
        let bands = [0u8, 7, 3, 5, 2, 6, 2, 4, 1, 6, 0];
        let mut queue = PriorityQueue::new();
        for (i, band) in bands.iter().enumerate() {
            queue.enqueue(PriorityEntry::new(i, Priority::new(*band).unwrap()));
        }
        assert_eq!(queue.len(), bands.len());
        assert_eq!(queue.last().map(|(p, _)| p.band()), Some(7));
        assert_eq!(queue.first().map(|(p, _)| p.band()), Some(0));
        assert_eq!(queue.first().map(|(_, v)| *v), Some(10));

        let mut order = vec![];
        let mut items = vec![];
        while let Some(entry) = queue.dequeue() {
            order.push(entry.priority.band());
            items.push(entry.item);
        }
        assert_eq!(order, vec![7, 6, 6, 5, 4, 3, 2, 2, 1, 0, 0]);
        // 同一优先级内先进先出
        assert_eq!(items, vec![1, 5, 9, 3, 7, 2, 4, 6, 8, 0, 10]);
        assert!(queue.is_empty());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn scheduler_remove_where_keeps_others() {
        let mut queue = PriorityQueue::new();
        for i in 0..6u32 {
            queue.enqueue(PriorityEntry::new(i, Priority::new((i % 3) as u8).unwrap()));
        }
        let removed = queue.remove_where(|v| v % 2 == 0);
        assert_eq!(removed, vec![2, 4, 0]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue().map(|e| e.item), Some(5));
        assert!(Priority::new(8).is_none());
    }

    #[test]
    fn active_streams_partitions() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        streams.insert(stream(3)).unwrap();
        streams.insert(stream(5)).unwrap();
        assert_eq!(streams.len(), 3);
        assert_eq!(streams.flow_controlled_count(), 3);

        assert!(streams.insert(stream(3)).is_err());
        assert_eq!(streams.len(), 3);
        assert_eq!(streams.flow_controlled_count(), 3);

        assert!(streams.set_flow_controlled(&id(3), false));
        assert_eq!(streams.flow_controlled_count(), 2);
        assert_eq!(streams.non_flow_controlled_count(), 1);
        assert!(!streams.set_flow_controlled(&id(9), false));

        assert!(streams.remove(&id(3)).is_some());
        assert_eq!(streams.non_flow_controlled_count(), 0);
        assert_eq!(streams.len(), 2);
        assert!(streams.remove(&id(3)).is_none());

        assert!(streams.remove(&id(1)).is_some());
        assert_eq!(streams.len(), 1);
        assert_eq!(streams.flow_controlled_count(), 1);
        assert_eq!(streams.ids(), vec![id(5)]);
    }

    #[test]
    fn flow_control_caps_reservations() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        streams.insert(stream(3)).unwrap();
        let mut flow = FlowControl::new(Consts::DEFAULT_INITIAL_WINDOW_SIZE, true);

        assert_eq!(flow.reserve_for_send(&mut streams, id(1), 40000).unwrap(), 40000);
        // 连接窗口只剩25535
        assert_eq!(flow.reserve_for_send(&mut streams, id(3), 40000).unwrap(), 25535);
        assert_eq!(flow.reserve_for_send(&mut streams, id(3), 10).unwrap(), 0);
        assert_eq!(flow.window_size(), 0);

        flow.on_window_update(&mut streams, StreamIdentifier::zero(), 100000)
            .unwrap();
        // 流1的窗口只剩25535
        assert_eq!(flow.reserve_for_send(&mut streams, id(1), 40000).unwrap(), 25535);
        assert_eq!(streams.get(&id(1)).unwrap().send_window(), 0);

        flow.release(&mut streams, id(1), 535);
        assert_eq!(streams.get(&id(1)).unwrap().send_window(), 535);

        assert!(matches!(
            flow.reserve_for_send(&mut streams, id(7), 1),
            Err(ProtError::StreamClosed(_))
        ));
    }

    #[test]
    fn flow_control_disabled_stream_uses_connection_only() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        let mut flow = FlowControl::new(Consts::DEFAULT_INITIAL_WINDOW_SIZE, true);
        flow.on_window_update(&mut streams, StreamIdentifier::zero(), 100000)
            .unwrap();
        flow.disable_stream_flow_control(&mut streams, id(1)).unwrap();
        assert_eq!(flow.reserve_for_send(&mut streams, id(1), 150000).unwrap(), 150000);
        assert_eq!(
            streams.get(&id(1)).unwrap().send_window(),
            Consts::DEFAULT_INITIAL_WINDOW_SIZE as i32
        );
    }

    #[test]
    fn flow_control_window_overflow() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        let mut flow = FlowControl::new(Consts::DEFAULT_INITIAL_WINDOW_SIZE, true);
        assert!(matches!(
            flow.on_window_update(&mut streams, StreamIdentifier::zero(), Consts::MAX_WINDOW_SIZE),
            Err(ProtError::WindowOverflow(_))
        ));
        assert!(matches!(
            flow.on_window_update(&mut streams, id(1), Consts::MAX_WINDOW_SIZE),
            Err(ProtError::WindowOverflow(_))
        ));
        // 恰好达到上限是允许的
        flow.on_window_update(
            &mut streams,
            id(1),
            Consts::MAX_WINDOW_SIZE - Consts::DEFAULT_INITIAL_WINDOW_SIZE,
        )
        .unwrap();
        assert_eq!(
            streams.get(&id(1)).unwrap().send_window(),
            Consts::MAX_WINDOW_SIZE as i32
        );
        // 已关闭的流的更新被忽略
        flow.on_window_update(&mut streams, id(9), 10).unwrap();
    }

    #[test]
    fn flow_control_settings_shrink_goes_negative() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        let mut flow = FlowControl::new(Consts::DEFAULT_INITIAL_WINDOW_SIZE, true);
        flow.reserve_for_send(&mut streams, id(1), 60000).unwrap();
        flow.set_initial_window_size(&mut streams, 1000).unwrap();
        assert_eq!(streams.get(&id(1)).unwrap().send_window(), 5535 - 64535);
        assert_eq!(flow.initial_window_size(), 1000);
        flow.on_window_update(&mut streams, StreamIdentifier::zero(), 1000)
            .unwrap();
        assert_eq!(flow.reserve_for_send(&mut streams, id(1), 10).unwrap(), 0);
    }

    #[test]
    fn flow_control_receive_side() {
        let mut streams = ActiveStreams::new();
        streams.insert(stream(1)).unwrap();
        let mut flow = FlowControl::new(Consts::DEFAULT_INITIAL_WINDOW_SIZE, true);

        let updates = flow.on_data_received(&mut streams, id(1), 30000).unwrap();
        assert!(updates.is_empty());
        let updates = flow.on_data_received(&mut streams, id(1), 10000).unwrap();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].stream_id().is_zero());
        assert_eq!(updates[0].increment(), 40000);
        assert_eq!(updates[1].stream_id(), id(1));
        assert_eq!(flow.recv_window(), Consts::DEFAULT_INITIAL_WINDOW_SIZE as i32);

        assert!(matches!(
            flow.on_data_received(&mut streams, id(3), 70000),
            Err(ProtError::FlowControl(_))
        ));
    }

    #[test]
    fn flow_control_receive_skips_disabled_stream() {
        let mut streams = ActiveStreams::new();
        streams
            .insert(InnerStream::new(id(1), Priority::DEFAULT, 65535, 1000))
            .unwrap();
        let mut flow = FlowControl::new(1000, true);
        assert!(matches!(
            flow.on_data_received(&mut streams, id(1), 2000),
            Err(ProtError::FlowControl(_))
        ));

        assert!(streams.set_flow_controlled(&id(1), false));
        let updates = flow.on_data_received(&mut streams, id(1), 20000).unwrap();
        assert!(updates.is_empty());
        assert_eq!(streams.get(&id(1)).map(|s| s.recv_window()), Some(1000));
        // 连接级窗口仍然计入两次接收
        assert_eq!(
            flow.recv_window(),
            Consts::DEFAULT_INITIAL_WINDOW_SIZE as i32 - 22000
        );
    }

    #[test]
    fn stream_state_transitions() {
        let mut s = stream(1);
        assert_eq!(s.state(), StreamState::Idle);
        assert!(s.send_data(false).is_err());

        s.recv_headers(vec![HeaderField::new(":path", "/")], false)
            .unwrap();
        assert_eq!(s.state(), StreamState::Open);
        s.recv_data(Bytes::from_static(b"body"), true).unwrap();
        assert_eq!(s.state(), StreamState::HalfClosedRemote);
        assert!(s.recv_data(Bytes::from_static(b"more"), false).is_err());

        let message = s.take_message().unwrap();
        assert_eq!(&message.body[..], b"body");
        assert_eq!(message.header(":path").map(|v| &v[..]), Some(&b"/"[..]));
        assert!(s.take_message().is_none());

        s.send_headers(false).unwrap();
        s.send_data(true).unwrap();
        assert_eq!(s.state(), StreamState::Closed);
        assert!(s.is_closed());
        assert!(s.send_headers(false).is_err());
    }

    #[test]
    fn stream_local_half_close_then_reset() {
        let mut s = stream(2);
        s.send_headers(true).unwrap();
        assert_eq!(s.state(), StreamState::HalfClosedLocal);
        assert!(s.send_data(false).is_err());
        s.recv_headers(vec![HeaderField::new(":status", "200")], false)
            .unwrap();
        assert_eq!(s.state(), StreamState::HalfClosedLocal);
        s.reset();
        assert_eq!(s.state(), StreamState::Closed);
    }

    /// 取出队列中的所有帧
    fn drain(control: &Control) -> Vec<Frame> {
        let mut frames = vec![];
        while control.pending_frames() > 0 {
            frames.extend(control.dequeue());
        }
        frames
    }

    #[test]
    fn reset_active_skips_closed_streams() {
        let control = Control::new(ConnectionEnd::Server, Builder::new());
        let mut frame = Headers::new(id(1), vec![HeaderField::new(":path", "/")]);
        frame.set_fin(true);
        let dispatch = control.recv_frame(frame.into()).unwrap();
        assert!(matches!(dispatch, Dispatch::Request(v, _) if v == id(1)));
        assert_eq!(control.active_streams(), 1);
        drain(&control);

        // 响应发送失败时由处理任务重置
        control.reset_active(id(1), Reason::INTERNAL_ERROR, Initiator::Library);
        assert_eq!(control.active_streams(), 0);
        let frames = drain(&control);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::Reset(reset) => {
                assert_eq!(reset.stream_id(), id(1));
                assert_eq!(reset.reason(), Reason::INTERNAL_ERROR);
            }
            other => panic!("expect reset, got {:?}", other),
        }

        control.reset_active(id(1), Reason::INTERNAL_ERROR, Initiator::Library);
        control.close_stream(id(1));
        assert_eq!(control.pending_frames(), 0);
    }
}
